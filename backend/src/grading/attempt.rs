// src/grading/attempt.rs

/// Next attempt number for a (user, question) pair given its prior attempts.
///
/// Accepts the full history or just the latest number (`Option<i32>`).
pub fn next_attempt_number<I>(prior: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    prior.into_iter().max().map_or(1, |latest| latest + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_one() {
        assert_eq!(next_attempt_number(None::<i32>), 1);
        assert_eq!(next_attempt_number(Vec::<i32>::new()), 1);
    }

    #[test]
    fn sequential_attempts_count_up() {
        let mut history = Vec::new();
        for expected in 1..=5 {
            let next = next_attempt_number(history.iter().copied());
            assert_eq!(next, expected);
            history.push(next);
        }
    }

    #[test]
    fn unordered_history_uses_maximum() {
        assert_eq!(next_attempt_number([3, 1, 2]), 4);
        assert_eq!(next_attempt_number(Some(7)), 8);
    }
}
