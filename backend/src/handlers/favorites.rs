// src/handlers/favorites.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, store::DynStore, utils::jwt::Claims};

/// List questions bookmarked by the current user, newest first.
pub async fn list_favorites(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let favorites = store.list_favorites(claims.user_id()).await?;
    Ok(Json(favorites))
}

/// Bookmark a question. Repeating the call is a no-op.
pub async fn add_favorite(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store
        .get_question(&question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    store.add_favorite(claims.user_id(), &question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a bookmark.
pub async fn remove_favorite(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store.remove_favorite(claims.user_id(), &question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
