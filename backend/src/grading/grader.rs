// src/grading/grader.rs

use crate::models::question::QuestionType;

use super::normalize::normalize_keys;

/// Decides whether a submission is correct.
///
/// Both sides are normalized first, so callers may pass raw keys. There is
/// no partial credit for multiple choice questions. Empty submissions must be
/// rejected before reaching this function.
pub fn grade<C, S>(question_type: QuestionType, correct: C, selected: S) -> bool
where
    C: IntoIterator,
    C::Item: AsRef<str>,
    S: IntoIterator,
    S::Item: AsRef<str>,
{
    let correct = normalize_keys(correct);
    let selected = normalize_keys(selected);

    match question_type {
        QuestionType::SingleChoice => {
            correct.len() == 1 && selected.len() == 1 && correct[0] == selected[0]
        }
        QuestionType::MultipleChoice => correct == selected,
    }
}
