// src/models/test.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    grading::score::TestProgress,
    models::{question::PublicQuestion, response::ResponseHistoryEntry},
};

/// Represents the 'tests' table together with its ordered questions.
#[derive(Debug, Clone, Serialize)]
pub struct Test {
    pub id: i64,
    pub user_id: String,
    /// Slug of the certification the questions were drawn from.
    pub certification: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// NULL while the test is in progress.
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Last persisted score, 0-100.
    pub score: Option<i32>,
    /// Sorted by `order`.
    pub questions: Vec<TestQuestion>,
}

impl Test {
    pub fn contains(&self, question_id: &str) -> bool {
        self.questions.iter().any(|q| q.question_id == question_id)
    }
}

/// Represents the 'test_questions' link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestQuestion {
    pub order: i32,
    pub question_id: String,
}

/// DTO for composing a new random test.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(range(min = 1, max = 100))]
    pub questions_count: Option<i64>,
    /// Certification slug to draw from. Absent means every certification.
    pub certification: Option<String>,
    /// Section names to draw from. Empty means all.
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub subsections: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Resolved composition request passed to the store.
#[derive(Debug, Clone)]
pub struct TestComposition {
    pub questions_count: i64,
    pub certification: Option<String>,
    pub sections: Vec<String>,
    pub subsections: Vec<String>,
    pub tags: Vec<String>,
}

/// Row of the test listing.
#[derive(Debug, Serialize)]
pub struct TestSummary {
    pub id: i64,
    pub certification: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub total_questions: i64,
    pub completed_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
}

impl TestSummary {
    pub fn new(test: &Test, progress: &TestProgress) -> Self {
        Self {
            id: test.id,
            certification: test.certification.clone(),
            created_at: test.created_at,
            completed_at: test.completed_at,
            score: test.score,
            total_questions: progress.total_questions,
            completed_questions: progress.completed_questions,
            correct_answers: progress.correct_answers,
            wrong_answers: progress.wrong_answers,
        }
    }
}

/// Query parameters for the test listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestListParams {
    /// Certification slug.
    pub certification: Option<String>,
}

/// Totals shown above the test listing.
#[derive(Debug, Default, Serialize)]
pub struct TestOverview {
    pub total_tests: i64,
    pub completed_tests: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
}

#[derive(Debug, Serialize)]
pub struct TestListResponse {
    pub overview: TestOverview,
    pub tests: Vec<TestSummary>,
}

/// Full test page payload.
#[derive(Debug, Serialize)]
pub struct TestDetail {
    pub id: i64,
    pub certification: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub progress: TestProgress,
    pub questions: Vec<TestQuestionView>,
}

#[derive(Debug, Serialize)]
pub struct TestQuestionView {
    pub order: i32,
    pub question: PublicQuestion,
    /// Present once the question has been answered in this test.
    pub answer: Option<RevealedAnswer>,
}

/// Latest response to a test question, with the answer key revealed.
#[derive(Debug, Serialize)]
pub struct RevealedAnswer {
    pub response: ResponseHistoryEntry,
    pub correct_answer: Vec<String>,
    pub explanation: Option<String>,
}
