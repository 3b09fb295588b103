// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::{certification::CertificationInput, question::UpsertQuestionRequest},
    store::DynStore,
};

/// Creates or updates a certification, keyed by slug.
/// Admin only.
pub async fn upsert_certification(
    State(store): State<DynStore>,
    Json(payload): Json<CertificationInput>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let certification = store.upsert_certification(&payload).await?;

    tracing::info!("Certification {} saved", certification.slug);
    Ok(Json(certification))
}

/// Creates or replaces a question.
/// Admin only.
///
/// This is the single place where the answer key is normalized; everything
/// downstream reads the canonical sorted key list.
pub async fn upsert_question(
    State(store): State<DynStore>,
    Json(payload): Json<UpsertQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = payload.into_question()?;

    store.upsert_question(&question).await.map_err(|e| {
        tracing::error!("Failed to upsert question {}: {:?}", question.id, e);
        e
    })?;

    tracing::info!("Question {} saved", question.id);
    Ok(Json(question))
}
