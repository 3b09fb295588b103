// src/grading/mod.rs

//! Answer evaluation and scoring. Everything here is pure and synchronous;
//! the stores and handlers feed it data and persist what it decides.

pub mod accuracy;
pub mod attempt;
pub mod grader;
pub mod normalize;
pub mod score;

pub use attempt::next_attempt_number;
pub use grader::grade;
pub use normalize::{RawAnswer, normalize, normalize_keys};
pub use score::{TestProgress, aggregate};
