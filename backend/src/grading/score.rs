// src/grading/score.rs

use std::collections::HashSet;

use serde::Serialize;

/// Derived progress of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestProgress {
    pub total_questions: i64,
    /// Distinct questions with at least one response in this test.
    pub completed_questions: i64,
    /// Response rows graded correct.
    pub correct_answers: i64,
    pub wrong_answers: i64,
    /// Percentage of completed questions answered correctly.
    /// `None` while nothing has been answered yet.
    pub score: Option<i32>,
}

impl TestProgress {
    /// Every question of a non-empty test has been answered at least once.
    pub fn is_finished(&self) -> bool {
        self.total_questions > 0 && self.completed_questions >= self.total_questions
    }
}

/// Aggregates the responses of one test.
///
/// `responses` yields `(question_id, is_correct)` for every response row whose
/// test id matches. The score is measured against completed questions, not
/// against the test size, so a half-finished test with every answer right
/// scores 100.
pub fn aggregate<'a, I>(total_questions: usize, responses: I) -> TestProgress
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut answered: HashSet<&str> = HashSet::new();
    let mut correct_answers: i64 = 0;

    for (question_id, is_correct) in responses {
        answered.insert(question_id);
        if is_correct {
            correct_answers += 1;
        }
    }

    let completed_questions = answered.len() as i64;

    TestProgress {
        total_questions: total_questions as i64,
        completed_questions,
        correct_answers,
        wrong_answers: (completed_questions - correct_answers).max(0),
        score: percentage(correct_answers, completed_questions),
    }
}

/// `round(part / whole * 100)` with halves rounded up, capped at 100.
/// `None` when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> Option<i32> {
    if whole <= 0 {
        return None;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    Some(rounded.clamp(0, 100) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Q{:03}", i)).collect()
    }

    #[test]
    fn four_of_ten_scores_forty() {
        let questions = ids(10);
        let responses: Vec<(&str, bool)> = questions
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i < 4))
            .collect();

        let progress = aggregate(10, responses);

        assert_eq!(progress.completed_questions, 10);
        assert_eq!(progress.correct_answers, 4);
        assert_eq!(progress.wrong_answers, 6);
        assert_eq!(progress.score, Some(40));
        assert!(progress.is_finished());
    }

    #[test]
    fn no_responses_means_pending_score() {
        let progress = aggregate(10, Vec::<(&str, bool)>::new());
        assert_eq!(progress.completed_questions, 0);
        assert_eq!(progress.score, None);
        assert!(!progress.is_finished());
    }

    #[test]
    fn score_is_measured_against_completed_questions() {
        let progress = aggregate(5, [("Q001", true), ("Q002", false)]);

        assert_eq!(progress.total_questions, 5);
        assert_eq!(progress.completed_questions, 2);
        assert_eq!(progress.correct_answers, 1);
        assert_eq!(progress.score, Some(50));
        assert_ne!(progress.score, percentage(1, 5));
    }

    #[test]
    fn repeated_answers_count_once_for_completion() {
        let progress = aggregate(3, [("Q001", false), ("Q001", true), ("Q002", true)]);
        assert_eq!(progress.completed_questions, 2);
        assert_eq!(progress.correct_answers, 2);
        assert_eq!(progress.score, Some(100));
    }

    #[test]
    fn score_never_exceeds_one_hundred() {
        let progress = aggregate(1, [("Q001", true), ("Q001", true)]);
        assert_eq!(progress.score, Some(100));
        assert_eq!(progress.wrong_answers, 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), Some(13));
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(1, 3), Some(33));
        assert_eq!(percentage(0, 4), Some(0));
        assert_eq!(percentage(3, 0), None);
    }
}
