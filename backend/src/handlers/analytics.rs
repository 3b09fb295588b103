// src/handlers/analytics.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, grading::accuracy::accuracy_report, store::DynStore, utils::jwt::Claims,
};

/// Lists sections with their subsections, sorted by name.
pub async fn list_sections(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let mut sections = store.list_sections().await?;
    sections.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(sections))
}

/// Accuracy and coverage per section and subsection for the current user.
pub async fn get_accuracy(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sections = store.list_sections().await?;
    let counts = store.question_counts_by_subsection().await?;
    let outcomes = store.response_outcomes(claims.user_id()).await?;

    Ok(Json(accuracy_report(&sections, &counts, &outcomes)))
}
