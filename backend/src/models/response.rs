// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::grading::{accuracy::ResponseStats, score::TestProgress};

/// Represents the 'user_responses' table.
/// Rows are written once and never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub user_id: String,
    pub question_id: String,
    pub test_id: Option<i64>,
    pub selected_answers: Vec<String>,
    pub is_correct: bool,
    pub attempt_number: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A graded submission ready to be persisted. The store assigns id,
/// attempt number and timestamp.
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub user_id: String,
    pub question_id: String,
    pub test_id: Option<i64>,
    pub selected_answers: Vec<String>,
    pub is_correct: bool,
}

/// DTO for answering a question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(
        min = 1,
        max = 26,
        message = "Select at least one option."
    ))]
    pub selected_answers: Vec<String>,

    /// Set when the question is answered as part of a test.
    pub test_id: Option<i64>,
}

/// Result of a submission.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub response: UserResponse,
    pub correct_answer: Vec<String>,
    pub explanation: Option<String>,
    /// Recomputed test progress for test-scoped submissions.
    pub progress: Option<TestProgress>,
}

/// History row, joined with the question it answers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseHistoryEntry {
    pub id: i64,
    pub question_id: String,
    pub question: String,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub test_id: Option<i64>,
    pub selected_answers: Vec<String>,
    pub is_correct: bool,
    pub attempt_number: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Whether the user has bookmarked the question.
    pub is_favorite: bool,
}

/// Query parameters for the history listing. Every filter is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    /// Certification slug.
    pub certification: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub test_id: Option<i64>,
    pub question_id: Option<String>,
    pub is_correct: Option<bool>,
    /// Page size. Applied by the handler after the statistics are taken,
    /// so the stores ignore it.
    pub limit: Option<i64>,
}

/// History page payload.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub stats: ResponseStats,
    pub responses: Vec<ResponseHistoryEntry>,
}

/// Minimal projection used by the accuracy report.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseOutcome {
    pub question_id: String,
    pub subsection_id: Option<i64>,
    pub is_correct: bool,
}
