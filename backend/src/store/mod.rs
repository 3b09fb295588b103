// src/store/mod.rs

//! Data access. Handlers only talk to [`Store`]; `PgStore` backs production
//! and `MemoryStore` backs local runs and the integration tests.

pub mod memory;
pub mod pg;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    grading::score::TestProgress,
    models::{
        certification::{Certification, CertificationInput},
        favorite::Favorite,
        question::{Question, QuestionFilter, QuestionSummary},
        response::{HistoryParams, NewResponse, ResponseHistoryEntry, ResponseOutcome, UserResponse},
        section::{Section, SubsectionCount},
        test::{Test, TestComposition},
    },
};

pub use memory::MemoryStore;
pub use pg::PgStore;

pub type DynStore = Arc<dyn Store>;

/// Attempts made to insert a response before giving up on attempt-number
/// collisions from concurrent submissions.
pub const MAX_ATTEMPT_RETRIES: usize = 3;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or replaces a certification, keyed by slug.
    async fn upsert_certification(
        &self,
        certification: &CertificationInput,
    ) -> Result<Certification, AppError>;

    async fn get_certification(&self, slug: &str) -> Result<Option<Certification>, AppError>;

    /// Sorted by name.
    async fn list_certifications(&self) -> Result<Vec<Certification>, AppError>;

    /// Inserts or replaces a question. Sections, subsections and tags are
    /// created by name when missing. A named certification must exist.
    async fn upsert_question(&self, question: &Question) -> Result<(), AppError>;

    async fn get_question(&self, id: &str) -> Result<Option<Question>, AppError>;

    /// Fetches several questions; unknown ids are skipped.
    async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, AppError>;

    /// Id following `id` in catalogue order.
    async fn next_question_id(&self, id: &str) -> Result<Option<String>, AppError>;

    async fn list_questions(
        &self,
        user_id: &str,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionSummary>, AppError>;

    async fn list_sections(&self) -> Result<Vec<Section>, AppError>;

    async fn question_counts_by_subsection(&self) -> Result<Vec<SubsectionCount>, AppError>;

    /// Draws distinct random questions matching the composition and creates
    /// a test owned by `user_id`. Returns the new test id.
    async fn create_random_test(
        &self,
        user_id: &str,
        composition: &TestComposition,
    ) -> Result<i64, AppError>;

    /// Tests of a user, newest first.
    async fn list_tests(&self, user_id: &str) -> Result<Vec<Test>, AppError>;

    /// A test, only if it belongs to `user_id`.
    async fn get_test(&self, user_id: &str, test_id: i64) -> Result<Option<Test>, AppError>;

    /// Deletes a test and its question links. Responses are kept and
    /// detached. Returns false when the user owns no such test.
    async fn delete_test(&self, user_id: &str, test_id: i64) -> Result<bool, AppError>;

    /// Persists a graded response, assigning the next attempt number for
    /// the (user, question) pair atomically.
    async fn record_response(&self, response: &NewResponse) -> Result<UserResponse, AppError>;

    /// Persists a test-scoped response and recomputes the test's score as
    /// one unit: either both happen or neither does. The test must belong
    /// to the responding user and contain the question.
    async fn record_test_response(
        &self,
        response: &NewResponse,
    ) -> Result<(UserResponse, TestProgress), AppError>;

    /// Recomputes and persists a test's score from its responses. Marks the
    /// test completed once every question has been answered.
    async fn update_test_score(&self, test_id: i64) -> Result<TestProgress, AppError>;

    /// Responses of a user matching `params`, newest first. `params.limit`
    /// is not applied here.
    async fn list_responses(
        &self,
        user_id: &str,
        params: &HistoryParams,
    ) -> Result<Vec<ResponseHistoryEntry>, AppError>;

    async fn response_outcomes(&self, user_id: &str) -> Result<Vec<ResponseOutcome>, AppError>;

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, AppError>;

    /// Idempotent.
    async fn add_favorite(&self, user_id: &str, question_id: &str) -> Result<(), AppError>;

    async fn remove_favorite(&self, user_id: &str, question_id: &str) -> Result<bool, AppError>;
}
