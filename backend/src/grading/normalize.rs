// src/grading/normalize.rs

use serde::{Deserialize, Serialize};

/// A correct answer (or a submission) as it arrives from outside.
///
/// Historical question data stores the answer as a bare key (`"B"`), a
/// comma-joined string (`"A,C"`), a bracket/quote wrapped string
/// (`"['A', 'C']"`) or a JSON array (`["A", "C"]`). All of them deserialize
/// into this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        RawAnswer::Text(value.to_string())
    }
}

impl From<Vec<String>> for RawAnswer {
    fn from(value: Vec<String>) -> Self {
        RawAnswer::List(value)
    }
}

/// Canonicalizes a raw answer into a sorted list of upper-case option keys.
///
/// Never fails: anything that is not an ASCII letter, digit or comma is
/// dropped before splitting. Duplicates are kept.
pub fn normalize(raw: &RawAnswer) -> Vec<String> {
    match raw {
        RawAnswer::Text(text) => normalize_keys([text]),
        RawAnswer::List(items) => normalize_keys(items),
    }
}

/// Same as [`normalize`] for any sequence of strings. Each element may itself
/// be a comma-joined list.
pub fn normalize_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = keys
        .into_iter()
        .flat_map(|key| split_keys(key.as_ref()))
        .collect();
    out.sort();
    out
}

fn split_keys(input: &str) -> Vec<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ',')
        .collect();

    cleaned
        .split(',')
        .filter(|piece| !piece.is_empty())
        .map(|piece| piece.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawAnswer {
        RawAnswer::from(s)
    }

    fn list(items: &[&str]) -> RawAnswer {
        RawAnswer::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn single_key_is_upper_cased() {
        assert_eq!(normalize(&text(" b ")), vec!["B"]);
    }

    #[test]
    fn equivalent_shapes_normalize_identically() {
        let expected = vec!["A".to_string(), "B".to_string()];
        assert_eq!(normalize(&text("[A, B]")), expected);
        assert_eq!(normalize(&text("a,b")), expected);
        assert_eq!(normalize(&list(&["A", "B"])), expected);
        assert_eq!(normalize(&text("['b', \"a\"]")), expected);
    }

    #[test]
    fn output_is_sorted_and_keeps_duplicates() {
        assert_eq!(normalize(&text("C,a,A")), vec!["A", "A", "C"]);
    }

    #[test]
    fn array_elements_may_hold_joined_keys() {
        assert_eq!(normalize(&list(&["d, b", "[a]"])), vec!["A", "B", "D"]);
    }

    #[test]
    fn malformed_input_degrades_to_best_effort() {
        assert_eq!(normalize(&text(",,;x;,")), vec!["X"]);
        assert!(normalize(&text("[]")).is_empty());
        assert!(normalize(&list(&[])).is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            text("[A, C]"),
            text("c"),
            text("'b','a','b'"),
            list(&["e", "A,d"]),
            text(""),
        ];
        for input in inputs {
            let once = normalize(&input);
            let twice = normalize(&RawAnswer::List(once.clone()));
            assert_eq!(once, twice, "input {:?}", input);
        }
    }
}
