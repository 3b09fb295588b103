// src/grading/accuracy.rs

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{
    response::ResponseOutcome,
    section::{Section, SectionAccuracy, SubsectionAccuracy, SubsectionCount},
};

use super::score::percentage;

#[derive(Default)]
struct Tally<'a> {
    questions: HashSet<&'a str>,
    responses: i64,
    correct: i64,
}

/// Builds the per-section accuracy report of one user.
///
/// Accuracy counts response rows (every attempt), while "attempted" counts
/// distinct questions. Responses to unclassified questions are ignored.
/// Sections and their subsections are sorted by name.
pub fn accuracy_report(
    sections: &[Section],
    counts: &[SubsectionCount],
    outcomes: &[ResponseOutcome],
) -> Vec<SectionAccuracy> {
    let totals: HashMap<i64, i64> = counts
        .iter()
        .map(|c| (c.subsection_id, c.question_count))
        .collect();

    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for outcome in outcomes {
        let Some(subsection_id) = outcome.subsection_id else {
            continue;
        };
        let tally = tallies.entry(subsection_id).or_default();
        tally.questions.insert(outcome.question_id.as_str());
        tally.responses += 1;
        if outcome.is_correct {
            tally.correct += 1;
        }
    }

    let mut report: Vec<SectionAccuracy> = sections
        .iter()
        .map(|section| {
            let mut subsections: Vec<SubsectionAccuracy> = section
                .subsections
                .iter()
                .map(|sub| {
                    let tally = tallies.get(&sub.id);
                    let responses = tally.map_or(0, |t| t.responses);
                    let correct = tally.map_or(0, |t| t.correct);
                    SubsectionAccuracy {
                        id: sub.id,
                        name: sub.name.clone(),
                        total_questions: totals.get(&sub.id).copied().unwrap_or(0),
                        attempted_questions: tally.map_or(0, |t| t.questions.len() as i64),
                        responses,
                        accuracy: percentage(correct, responses).unwrap_or(0),
                    }
                })
                .collect();
            subsections.sort_by(|a, b| a.name.cmp(&b.name));

            let responses: i64 = subsections.iter().map(|s| s.responses).sum();
            let correct: i64 = section
                .subsections
                .iter()
                .filter_map(|sub| tallies.get(&sub.id))
                .map(|t| t.correct)
                .sum();

            SectionAccuracy {
                id: section.id,
                name: section.name.clone(),
                total_questions: subsections.iter().map(|s| s.total_questions).sum(),
                attempted_questions: subsections.iter().map(|s| s.attempted_questions).sum(),
                responses,
                accuracy: percentage(correct, responses).unwrap_or(0),
                subsections,
            }
        })
        .collect();

    report.sort_by(|a, b| a.name.cmp(&b.name));
    report
}

/// Totals shown above a response history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResponseStats {
    pub total_responses: i64,
    pub unique_questions: i64,
    pub correct_answers: i64,
    /// Correct rows over all rows, 0 when there are none.
    pub accuracy: i32,
}

/// Summarizes `(question_id, is_correct)` response rows.
pub fn response_stats<'a, I>(responses: I) -> ResponseStats
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut questions: HashSet<&str> = HashSet::new();
    let mut stats = ResponseStats::default();

    for (question_id, is_correct) in responses {
        questions.insert(question_id);
        stats.total_responses += 1;
        if is_correct {
            stats.correct_answers += 1;
        }
    }

    stats.unique_questions = questions.len() as i64;
    stats.accuracy = percentage(stats.correct_answers, stats.total_responses).unwrap_or(0);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::section::Subsection;

    #[test]
    fn stats_count_rows_and_distinct_questions() {
        let stats = response_stats([("Q1", true), ("Q1", false), ("Q2", true)]);
        assert_eq!(
            stats,
            ResponseStats {
                total_responses: 3,
                unique_questions: 2,
                correct_answers: 2,
                accuracy: 67,
            }
        );
    }

    #[test]
    fn empty_history_has_zero_accuracy() {
        assert_eq!(response_stats(std::iter::empty::<(&str, bool)>()), ResponseStats::default());
    }

    fn outcome(question_id: &str, subsection_id: Option<i64>, is_correct: bool) -> ResponseOutcome {
        ResponseOutcome {
            question_id: question_id.to_string(),
            subsection_id,
            is_correct,
        }
    }

    fn sections() -> Vec<Section> {
        vec![
            Section {
                id: 2,
                name: "Security".to_string(),
                subsections: vec![Subsection { id: 20, name: "Crypto".to_string() }],
            },
            Section {
                id: 1,
                name: "Networking".to_string(),
                subsections: vec![
                    Subsection { id: 11, name: "Routing".to_string() },
                    Subsection { id: 10, name: "Ports".to_string() },
                ],
            },
        ]
    }

    fn counts() -> Vec<SubsectionCount> {
        vec![
            SubsectionCount { subsection_id: 10, question_count: 4 },
            SubsectionCount { subsection_id: 11, question_count: 6 },
            SubsectionCount { subsection_id: 20, question_count: 3 },
        ]
    }

    #[test]
    fn report_is_sorted_and_totals_subsections() {
        let report = accuracy_report(&sections(), &counts(), &[]);

        let names: Vec<&str> = report.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Networking", "Security"]);

        let networking = &report[0];
        assert_eq!(networking.total_questions, 10);
        assert_eq!(networking.subsections[0].name, "Ports");
        assert_eq!(networking.accuracy, 0);
        assert_eq!(networking.attempted_questions, 0);
    }

    #[test]
    fn accuracy_counts_rows_and_attempted_counts_questions() {
        let outcomes = vec![
            outcome("Q1", Some(10), false),
            outcome("Q1", Some(10), true),
            outcome("Q2", Some(10), true),
            outcome("Q3", Some(11), false),
            outcome("Q9", None, true),
        ];

        let report = accuracy_report(&sections(), &counts(), &outcomes);
        let networking = &report[0];
        let ports = &networking.subsections[0];

        assert_eq!(ports.attempted_questions, 2);
        assert_eq!(ports.responses, 3);
        assert_eq!(ports.accuracy, 67);

        assert_eq!(networking.attempted_questions, 3);
        assert_eq!(networking.responses, 4);
        assert_eq!(networking.accuracy, 50);

        assert_eq!(report[1].responses, 0);
    }
}
