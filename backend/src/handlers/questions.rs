// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::certifications::resolve_certification,
    models::{
        question::{PublicQuestion, QuestionDetail, QuestionFilter},
        response::HistoryParams,
    },
    store::DynStore,
    utils::jwt::Claims,
};

/// Lists the question catalogue with per-user attempt status.
///
/// Supports `certification`, `section`, `subsection`, `tag` and
/// `favorites_only` filters. An unknown certification is a 404.
pub async fn list_questions(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<QuestionFilter>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(slug) = &filter.certification {
        resolve_certification(&store, slug).await?;
    }

    let questions = store.list_questions(claims.user_id(), &filter).await?;
    Ok(Json(questions))
}

/// Returns one question without its answer key, along with the user's
/// previous attempts and the id of the next question.
pub async fn get_question(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let question = store
        .get_question(&id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let next_id = store.next_question_id(&id).await?;

    let is_favorite = store
        .list_favorites(user_id)
        .await?
        .iter()
        .any(|f| f.question_id == question.id);

    let history = store
        .list_responses(
            user_id,
            &HistoryParams {
                question_id: Some(question.id.clone()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(QuestionDetail {
        question: PublicQuestion::from(&question),
        is_favorite,
        next_id,
        history,
    }))
}
