//! Scoring and depth analysis
//!
//! ## Modules
//!
//! - `alias` - Alternate phrasings accepted for an expected answer
//! - `matcher` - Case-insensitive substring matching of one answer
//! - `depth` - Depth bucketing (position or page mode) with balance check
//! - `report` - Validation and aggregation over a full run

pub mod alias;
pub mod depth;
pub mod matcher;
pub mod report;

pub use alias::AliasTable;
pub use depth::{
    bucket_scores, check_balance, partition_by_page, partition_by_position, BucketAccuracy,
    BucketMode, DepthBucket, DepthProfile, DepthRange, NeedlePages, DEFAULT_NUM_BUCKETS,
};
pub use matcher::{check_answer, Score};
pub use report::{evaluate, EvalInputs, EvalOptions, EvalReport, QuestionResult, ScoreSheet};
