// src/handlers/certifications.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, models::certification::Certification, store::DynStore};

/// Lists the certifications questions can belong to, by name.
pub async fn list_certifications(
    State(store): State<DynStore>,
) -> Result<impl IntoResponse, AppError> {
    let certifications = store.list_certifications().await?;
    Ok(Json(certifications))
}

pub async fn get_certification(
    State(store): State<DynStore>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let certification = resolve_certification(&store, &slug).await?;
    Ok(Json(certification))
}

/// Looks up a certification by slug, or 404.
pub async fn resolve_certification(
    store: &DynStore,
    slug: &str,
) -> Result<Certification, AppError> {
    store
        .get_certification(slug)
        .await?
        .ok_or(AppError::NotFound("Certification not found".to_string()))
}
