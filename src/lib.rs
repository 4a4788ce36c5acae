//! Needle-in-a-haystack evaluation library
//!
//! Scores model answers against expected answers (with aliases) and reports
//! accuracy as a function of where the needle sat in the document.

pub mod config;
pub mod error;
pub mod matrix;
pub mod output;
pub mod records;
pub mod scoring;

pub use error::{EvalError, EvalResult};
