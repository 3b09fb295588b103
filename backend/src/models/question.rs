// src/models/question.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    grading::normalize::{RawAnswer, normalize},
    utils::html::clean_html,
};

/// How many option keys a submission may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "SINGLE_CHOICE",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SINGLE_CHOICE" => Ok(QuestionType::SingleChoice),
            "MULTIPLE_CHOICE" => Ok(QuestionType::MultipleChoice),
            other => Err(AppError::InternalServerError(format!(
                "Unknown question type '{}'",
                other
            ))),
        }
    }
}

/// A question as stored, including its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier such as "Q001".
    pub id: String,

    /// Question stem.
    pub question: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Option key -> option text. Display order is key order.
    pub options: BTreeMap<String, String>,

    /// Sorted upper-case option keys, normalized at ingestion.
    pub correct_answer: Vec<String>,

    pub explanation: Option<String>,
    /// Slug of the certification the question belongs to.
    pub certification: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub tags: Vec<String>,
}

impl Question {
    /// Whether `key` names one of the options, ignoring case.
    pub fn has_option(&self, key: &str) -> bool {
        self.options.keys().any(|k| k.eq_ignore_ascii_case(key))
    }
}

/// DTO for sending question to client (excludes answer and explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: BTreeMap<String, String>,
    pub certification: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub tags: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            question: q.question.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            certification: q.certification.clone(),
            section: q.section.clone(),
            subsection: q.subsection.clone(),
            tags: q.tags.clone(),
        }
    }
}

/// Row of the question catalogue, annotated for the requesting user.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSummary {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub attempts: i64,
    /// Correct attempts over all attempts, 0 when never attempted.
    pub accuracy: i32,
    /// Outcome of the most recent attempt, if any.
    pub last_is_correct: Option<bool>,
}

/// Query parameters for the question catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionFilter {
    /// Certification slug.
    pub certification: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub favorites_only: bool,
}

/// Question detail page payload.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: PublicQuestion,
    pub is_favorite: bool,
    pub next_id: Option<String>,
    pub history: Vec<crate::models::response::ResponseHistoryEntry>,
}

/// DTO for creating or replacing a question (admin ingestion).
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertQuestionRequest {
    #[validate(length(min = 1, max = 32), custom(function = validate_question_id))]
    pub id: String,
    #[validate(length(min = 1, max = 4000))]
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(custom(function = validate_options))]
    pub options: BTreeMap<String, String>,
    /// Accepts a bare key, a comma-joined or bracketed string, or an array.
    pub correct_answer: RawAnswer,
    #[validate(length(max = 8000))]
    pub explanation: Option<String>,
    /// Slug of an existing certification.
    #[validate(length(min = 1, max = 64))]
    pub certification: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub section: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub subsection: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_tags))]
    pub tags: Vec<String>,
}

impl UpsertQuestionRequest {
    /// Normalizes the answer key once and sanitizes free text, producing the
    /// representation every other component relies on.
    pub fn into_question(self) -> Result<Question, AppError> {
        let correct_answer = normalize(&self.correct_answer);

        if correct_answer.is_empty() {
            return Err(AppError::BadRequest(
                "correct_answer must name at least one option".to_string(),
            ));
        }
        if self.question_type == QuestionType::SingleChoice && correct_answer.len() != 1 {
            return Err(AppError::BadRequest(
                "A single choice question needs exactly one correct option".to_string(),
            ));
        }
        if self.subsection.is_some() && self.section.is_none() {
            return Err(AppError::BadRequest(
                "subsection requires a section".to_string(),
            ));
        }

        let question = clean_html(&self.question);
        if question.is_empty() {
            return Err(AppError::BadRequest(
                "question is empty once sanitized".to_string(),
            ));
        }

        let options: BTreeMap<String, String> = self
            .options
            .into_iter()
            .map(|(key, text)| (key.to_ascii_uppercase(), clean_html(&text)))
            .collect();

        if let Some((key, _)) = options.iter().find(|(_, text)| text.is_empty()) {
            return Err(AppError::BadRequest(format!(
                "option '{}' is empty once sanitized",
                key
            )));
        }

        if let Some(missing) = correct_answer.iter().find(|k| !options.contains_key(*k)) {
            return Err(AppError::BadRequest(format!(
                "correct_answer references unknown option '{}'",
                missing
            )));
        }

        let mut tags: Vec<String> = self.tags.iter().map(|t| t.trim().to_string()).collect();
        tags.sort();
        tags.dedup();

        Ok(Question {
            id: self.id,
            question,
            question_type: self.question_type,
            options,
            correct_answer,
            explanation: self.explanation.as_deref().map(clean_html),
            certification: self
                .certification
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            section: self.section.map(|s| s.trim().to_string()),
            subsection: self.subsection.map(|s| s.trim().to_string()),
            tags,
        })
    }
}

fn validate_question_id(id: &str) -> Result<(), validator::ValidationError> {
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(validator::ValidationError::new("invalid_question_id"));
    }
    Ok(())
}

fn validate_options(options: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    if options.len() < 2 || options.len() > 26 {
        return Err(validator::ValidationError::new("options_count_out_of_range"));
    }
    let mut seen = std::collections::HashSet::new();
    for (key, text) in options {
        if key.is_empty() || key.len() > 8 || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(validator::ValidationError::new("invalid_option_key"));
        }
        if !seen.insert(key.to_ascii_uppercase()) {
            return Err(validator::ValidationError::new("duplicate_option_key"));
        }
        if text.trim().is_empty() || text.len() > 2000 {
            return Err(validator::ValidationError::new("invalid_option_text"));
        }
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), validator::ValidationError> {
    if tags.len() > 32 {
        return Err(validator::ValidationError::new("too_many_tags"));
    }
    if tags.iter().any(|t| t.trim().is_empty() || t.len() > 64) {
        return Err(validator::ValidationError::new("invalid_tag"));
    }
    Ok(())
}
