//! Benchmark records and their on-disk formats
//!
//! ## Predictions
//!
//! ```text
//! #1
//! Prompt: What is the secret ingredient?
//! Output: The secret ingredient is
//! cardamom.
//! #2
//! ...
//! ```
//!
//! Lines that are neither an id, a `Prompt:` nor an `Output:` line continue
//! the previous field.
//!
//! ## Groundtruth
//!
//! One line per question; the answer is the first double-quoted substring.
//!
//! ## Aliases
//!
//! ```text
//! "NYC" "New York City" "Big Apple"
//! ```
//!
//! ## Needle positions
//!
//! CSV, page number in the second column: `needle-1,14`.

pub mod loader;

use serde::{Deserialize, Serialize};

/// One graded question as produced by the inference run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// 1-based sequential id
    pub id: u64,
    pub prompt: String,
    /// Model output
    pub output: String,
}

impl AnswerRecord {
    pub fn new(id: u64, prompt: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            output: output.into(),
        }
    }
}

/// Expected answer for one question; `None` when extraction failed
pub type ExpectedAnswer = Option<String>;

pub use loader::{
    extract_quoted, load_aliases, load_groundtruth, load_needle_pages, load_predictions,
    parse_aliases, parse_groundtruth, parse_needle_pages, parse_predictions,
};
