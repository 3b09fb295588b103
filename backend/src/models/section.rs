// src/models/section.rs

use serde::Serialize;
use sqlx::FromRow;

/// A top-level classification with its subsections.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subsection {
    pub id: i64,
    pub name: String,
}

/// Number of questions filed under a subsection.
#[derive(Debug, Clone, FromRow)]
pub struct SubsectionCount {
    pub subsection_id: i64,
    pub question_count: i64,
}

/// Accuracy report for one section.
#[derive(Debug, Serialize)]
pub struct SectionAccuracy {
    pub id: i64,
    pub name: String,
    pub total_questions: i64,
    pub attempted_questions: i64,
    pub responses: i64,
    pub accuracy: i32,
    pub subsections: Vec<SubsectionAccuracy>,
}

#[derive(Debug, Serialize)]
pub struct SubsectionAccuracy {
    pub id: i64,
    pub name: String,
    pub total_questions: i64,
    /// Distinct questions with at least one response.
    pub attempted_questions: i64,
    pub responses: i64,
    /// Correct responses over all responses, 0 when there are none.
    pub accuracy: i32,
}
