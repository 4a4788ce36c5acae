//! Error types for scoring and depth analysis.
//!
//! Every variant is fatal for the stage that raises it. These are data
//! integrity problems, so nothing here is retried.

use thiserror::Error;

/// Errors raised by the scoring core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Two aligned record sets have different lengths
    #[error("Input mismatch: {what} has {actual} entries, expected {expected}")]
    InputMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A prediction's declared id does not match its 1-based position
    #[error("Prompt IDs do not match for entry {position}: found id {id}")]
    SequenceIntegrity { position: usize, id: u64 },

    /// Invalid combination of evaluation options
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Depth buckets are not balanced (or lost/duplicated scores)
    #[error("Bucket balance violation: sizes {sizes:?} for {total} scores")]
    BucketBalanceViolation { sizes: Vec<usize>, total: usize },

    /// Needle page numbers are 1-based
    #[error("Invalid page position at entry {index}: page {page} (pages start at 1)")]
    InvalidPagePosition { index: usize, page: u32 },
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_inputs() {
        let err = EvalError::InputMismatch {
            what: "groundtruth",
            expected: 5,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Input mismatch: groundtruth has 4 entries, expected 5"
        );

        let err = EvalError::SequenceIntegrity { position: 3, id: 7 };
        assert!(err.to_string().contains("entry 3"));
        assert!(err.to_string().contains("id 7"));

        let err = EvalError::BucketBalanceViolation {
            sizes: vec![2, 1, 0, 1],
            total: 4,
        };
        assert!(err.to_string().contains("[2, 1, 0, 1]"));
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            let result: EvalResult<()> = Err(EvalError::Configuration("zero buckets".to_string()));
            result?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<EvalError>().is_some());
    }
}
