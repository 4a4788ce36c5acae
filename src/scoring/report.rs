//! Aggregate scoring over a full benchmark run
//!
//! Validates the aligned inputs, scores every prediction, and optionally
//! builds the depth profile. All validation happens before the first answer
//! is scored, so a failing run never produces a partial report.

use serde::{Deserialize, Serialize};

use super::alias::AliasTable;
use super::depth::{bucket_scores, DepthProfile, NeedlePages, DEFAULT_NUM_BUCKETS};
use super::matcher::{check_answer, Score};
use crate::error::{EvalError, EvalResult};
use crate::records::{AnswerRecord, ExpectedAnswer};

/// Inputs of one evaluation run, aligned by index
#[derive(Debug, Clone, Copy)]
pub struct EvalInputs<'a> {
    pub predictions: &'a [AnswerRecord],
    pub expected: &'a [ExpectedAnswer],
    pub aliases: Option<&'a AliasTable>,
    /// Needle page per question (page mode); requires `total_pages`
    pub needle_pages: Option<&'a [u32]>,
    pub total_pages: Option<u32>,
}

impl<'a> EvalInputs<'a> {
    pub fn new(predictions: &'a [AnswerRecord], expected: &'a [ExpectedAnswer]) -> Self {
        Self {
            predictions,
            expected,
            aliases: None,
            needle_pages: None,
            total_pages: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &'a AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_needle_pages(mut self, pages: &'a [u32]) -> Self {
        self.needle_pages = Some(pages);
        self
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = Some(total_pages);
        self
    }

    /// Check every precondition and resolve the bucketing mode
    fn validate(&self) -> EvalResult<Option<NeedlePages>> {
        let needles = match (self.needle_pages, self.total_pages) {
            (None, None) => None,
            (Some(pages), Some(total_pages)) => {
                if total_pages == 0 {
                    return Err(EvalError::Configuration(
                        "total page count must be positive".to_string(),
                    ));
                }
                Some(NeedlePages::new(pages.to_vec(), total_pages))
            }
            _ => {
                return Err(EvalError::Configuration(
                    "needle page positions and total page count must be provided together"
                        .to_string(),
                ))
            }
        };

        if let Some(needles) = &needles {
            if needles.pages.len() != self.predictions.len() {
                return Err(EvalError::InputMismatch {
                    what: "needle page positions",
                    expected: self.predictions.len(),
                    actual: needles.pages.len(),
                });
            }
            if let Some(index) = needles.pages.iter().position(|&p| p == 0) {
                return Err(EvalError::InvalidPagePosition {
                    index: index + 1,
                    page: 0,
                });
            }
        }

        if self.expected.len() != self.predictions.len() {
            return Err(EvalError::InputMismatch {
                what: "groundtruth",
                expected: self.predictions.len(),
                actual: self.expected.len(),
            });
        }

        for (i, record) in self.predictions.iter().enumerate() {
            if record.id != (i + 1) as u64 {
                return Err(EvalError::SequenceIntegrity {
                    position: i + 1,
                    id: record.id,
                });
            }
        }

        Ok(needles)
    }
}

/// Evaluation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalOptions {
    /// Compute the depth profile
    pub depth_analysis: bool,
    pub num_buckets: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            depth_analysis: false,
            num_buckets: DEFAULT_NUM_BUCKETS,
        }
    }
}

impl EvalOptions {
    pub fn with_depth_analysis(num_buckets: usize) -> Self {
        Self {
            depth_analysis: true,
            num_buckets,
        }
    }
}

/// Result for a single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub id: u64,
    pub prompt: String,
    pub expected: ExpectedAnswer,
    pub score: Score,
}

/// Validated, scored run, before any depth analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    pub questions: Vec<QuestionResult>,
    needles: Option<NeedlePages>,
}

impl ScoreSheet {
    /// Validate inputs, then score every prediction against its expected answer
    pub fn score(inputs: &EvalInputs<'_>) -> EvalResult<Self> {
        let needles = inputs.validate()?;

        let no_aliases = AliasTable::new();
        let aliases = inputs.aliases.unwrap_or(&no_aliases);

        let questions = inputs
            .predictions
            .iter()
            .zip(inputs.expected)
            .map(|(record, expected)| {
                let score = match expected {
                    Some(answer) => check_answer(answer, &record.output, aliases),
                    None => {
                        tracing::warn!(
                            "No expected answer for question #{}, scoring as incorrect",
                            record.id
                        );
                        0
                    }
                };
                QuestionResult {
                    id: record.id,
                    prompt: record.prompt.clone(),
                    expected: expected.clone(),
                    score,
                }
            })
            .collect();

        Ok(Self { questions, needles })
    }

    /// Scores in question order
    pub fn scores(&self) -> Vec<Score> {
        self.questions.iter().map(|q| q.score).collect()
    }

    pub fn correct(&self) -> usize {
        self.questions.iter().filter(|q| q.score == 1).count()
    }

    /// Mean score, 0.0 for an empty run
    pub fn average_accuracy(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.questions.len() as f64
    }

    /// Bucket the scores by depth (page mode if needle pages were given)
    pub fn depth_profile(&self, num_buckets: usize) -> EvalResult<DepthProfile> {
        bucket_scores(&self.scores(), num_buckets, self.needles.as_ref())
    }

    /// Finish the run with an optional depth profile
    pub fn into_report(self, depth: Option<DepthProfile>) -> EvalReport {
        EvalReport {
            total: self.questions.len(),
            correct: self.correct(),
            average_accuracy: self.average_accuracy(),
            depth,
            questions: self.questions,
        }
    }
}

/// Final report of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub questions: Vec<QuestionResult>,
    pub total: usize,
    pub correct: usize,
    /// Fraction of correct answers in [0, 1]
    pub average_accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthProfile>,
}

impl EvalReport {
    pub fn scores(&self) -> Vec<Score> {
        self.questions.iter().map(|q| q.score).collect()
    }

    /// Format as a summary string
    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Accuracy: {:.1}% ({}/{})",
            self.average_accuracy * 100.0,
            self.correct,
            self.total
        );
        if let Some(depth) = &self.depth {
            summary.push_str(&format!(
                " | Depth: {} buckets ({} mode)",
                depth.num_buckets(),
                depth.mode.name()
            ));
        }
        summary
    }
}

/// Score a run and, if requested, analyse accuracy by depth
///
/// Fails before scoring on any input mismatch, id mismatch or invalid
/// option. A bucket balance violation fails the whole call; use
/// [`ScoreSheet`] directly to keep the average when depth analysis fails.
pub fn evaluate(inputs: &EvalInputs<'_>, options: &EvalOptions) -> EvalResult<EvalReport> {
    if options.depth_analysis && options.num_buckets == 0 {
        return Err(EvalError::Configuration(
            "number of buckets must be positive".to_string(),
        ));
    }

    let sheet = ScoreSheet::score(inputs)?;
    let depth = if options.depth_analysis {
        Some(sheet.depth_profile(options.num_buckets)?)
    } else {
        None
    };

    let report = sheet.into_report(depth);

    tracing::info!("{}", report.format_summary());
    Ok(report)
}
