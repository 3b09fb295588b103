// src/handlers/responses.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    grading::{accuracy::response_stats, grade, normalize_keys},
    handlers::certifications::resolve_certification,
    models::{
        question::{Question, QuestionType},
        response::{
            HistoryParams, HistoryResponse, NewResponse, SubmitAnswerRequest, SubmitAnswerResponse,
        },
    },
    store::DynStore,
    utils::jwt::Claims,
};

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// Grades and records an answer to a question.
///
/// * Rejects empty or malformed selections before grading.
/// * Persists the response with the next attempt number.
/// * For test-scoped answers the store also checks the test belongs to the
///   caller and contains the question, and rescores the test in the same
///   step, so a failed rescore leaves no response behind.
pub async fn submit_answer(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id();

    let question = store
        .get_question(&question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let selected = normalize_keys(&req.selected_answers);
    check_selection(&question, &selected)?;

    let is_correct = grade(question.question_type, &question.correct_answer, &selected);

    let new_response = NewResponse {
        user_id: user_id.to_string(),
        question_id: question.id.clone(),
        test_id: req.test_id,
        selected_answers: selected,
        is_correct,
    };

    let (response, progress) = match req.test_id {
        Some(_) => {
            let (response, progress) = store
                .record_test_response(&new_response)
                .await
                .map_err(AppError::on_save)?;
            (response, Some(progress))
        }
        None => (
            store
                .record_response(&new_response)
                .await
                .map_err(AppError::on_save)?,
            None,
        ),
    };

    tracing::info!(
        "User {} answered {} (attempt {}, correct: {})",
        user_id,
        question.id,
        response.attempt_number,
        is_correct
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitAnswerResponse {
            response,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            progress,
        }),
    ))
}

/// Lists the caller's responses, newest first, with statistics.
///
/// Filters: `certification`, `section`, `subsection`, `test_id`,
/// `question_id` and `is_correct`. The statistics cover every matching
/// response; `limit` (default 100) only trims the returned list.
pub async fn list_history(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(slug) = &params.certification {
        resolve_certification(&store, slug).await?;
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT) as usize;

    let mut responses = store.list_responses(claims.user_id(), &params).await?;
    let stats = response_stats(
        responses
            .iter()
            .map(|entry| (entry.question_id.as_str(), entry.is_correct)),
    );
    responses.truncate(limit);

    Ok(Json(HistoryResponse { stats, responses }))
}

/// Validates a normalized selection against the question it answers.
fn check_selection(question: &Question, selected: &[String]) -> Result<(), AppError> {
    if selected.is_empty() {
        return Err(AppError::BadRequest("Select at least one option.".to_string()));
    }

    if question.question_type == QuestionType::SingleChoice && selected.len() != 1 {
        return Err(AppError::BadRequest("Select exactly one option.".to_string()));
    }

    if let Some(unknown) = selected.iter().find(|key| !question.has_option(key)) {
        return Err(AppError::BadRequest(format!("Unknown option '{}'", unknown)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn question(kind: QuestionType) -> Question {
        Question {
            id: "Q001".to_string(),
            question: "Pick".to_string(),
            question_type: kind,
            options: BTreeMap::from([
                ("A".to_string(), "One".to_string()),
                ("B".to_string(), "Two".to_string()),
            ]),
            correct_answer: vec!["A".to_string()],
            explanation: None,
            certification: None,
            section: None,
            subsection: None,
            tags: Vec::new(),
        }
    }

    fn keys(raw: &[&str]) -> Vec<String> {
        normalize_keys(raw)
    }

    #[test]
    fn empty_selection_is_rejected() {
        let q = question(QuestionType::MultipleChoice);
        assert!(check_selection(&q, &keys(&["[]"])).is_err());
    }

    #[test]
    fn single_choice_accepts_exactly_one_key() {
        let q = question(QuestionType::SingleChoice);
        assert!(check_selection(&q, &keys(&["a"])).is_ok());
        assert!(check_selection(&q, &keys(&["a", "b"])).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let q = question(QuestionType::MultipleChoice);
        assert!(check_selection(&q, &keys(&["A", "Z"])).is_err());
    }
}
