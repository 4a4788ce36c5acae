//! Writers for evaluation results
//!
//! The text layout is the one downstream tooling greps for ("Depth Analysis",
//! "Average accuracy"), and `matrix` reads its depth section back. The JSON
//! layout wraps the full report with a timestamp and the run configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scoring::{BucketAccuracy, DepthRange, EvalReport};

const DEPTH_HEADER: &str = "Depth Analysis";

/// Render a report in the plain-text results layout
pub fn render_results_text(report: &EvalReport) -> String {
    let mut out: String = report
        .questions
        .iter()
        .enumerate()
        .map(|(i, question)| format!("{}. {} {}\n", i + 1, question.prompt, question.score))
        .collect();

    if let Some(depth) = &report.depth {
        out.push_str(&format!("\n{}\n", DEPTH_HEADER));
        for bucket in &depth.buckets {
            out.push_str(&format!("{} accuracy: {}\n", bucket.range, bucket.accuracy));
        }
    }

    out.push_str(&format!("\nAverage accuracy: {:.2}\n", report.average_accuracy));
    out
}

/// Read the depth section back from a text results file
///
/// Returns `None` when the run was scored without depth analysis. Accuracies
/// carry the two decimals the file was written with.
pub fn parse_depth_section(text: &str) -> Result<Option<Vec<(DepthRange, BucketAccuracy)>>> {
    let mut lines = text.lines().skip_while(|line| line.trim() != DEPTH_HEADER);
    if lines.next().is_none() {
        return Ok(None);
    }

    let mut buckets = Vec::new();
    for line in lines.take_while(|line| !line.trim().is_empty()) {
        let (label, value) = line
            .split_once(" accuracy: ")
            .with_context(|| format!("Malformed depth line: {:?}", line))?;
        let range = parse_depth_range(label.trim())
            .with_context(|| format!("Invalid depth range: {:?}", label))?;
        let accuracy = match value.trim() {
            "No scores" => BucketAccuracy::NoScores,
            v => BucketAccuracy::Accuracy(
                v.parse()
                    .with_context(|| format!("Invalid accuracy in depth line: {:?}", line))?,
            ),
        };
        buckets.push((range, accuracy));
    }
    Ok(Some(buckets))
}

/// Parse a `<start>-<end>%` label
fn parse_depth_range(label: &str) -> Option<DepthRange> {
    let (start, end) = label.strip_suffix('%')?.split_once('-')?;
    Some(DepthRange {
        start_percent: start.parse().ok()?,
        end_percent: end.parse().ok()?,
    })
}

/// Inputs and options recorded alongside a JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRunConfig {
    pub predictions: String,
    pub groundtruth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needles_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub depth_analysis: bool,
    pub num_buckets: usize,
}

/// JSON results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub timestamp: String,
    pub config: ScoreRunConfig,
    pub report: EvalReport,
}

impl ScoreOutput {
    pub fn new(config: ScoreRunConfig, report: EvalReport) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            config,
            report,
        }
    }

    /// Load a JSON results file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        create_parent(path)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write results file: {}", path.display()))
    }
}

/// Write the text results file, creating parent directories
pub fn write_results_text(path: &Path, report: &EvalReport) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, render_results_text(report))
        .with_context(|| format!("Failed to write results file: {}", path.display()))
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AnswerRecord;
    use crate::scoring::{evaluate, EvalInputs, EvalOptions};

    fn sample_report(depth: bool) -> EvalReport {
        let preds = vec![
            AnswerRecord::new(1, "Where is the key?", "under the mat"),
            AnswerRecord::new(2, "What colour?", "blue"),
        ];
        let truth = vec![Some("mat".to_string()), Some("red".to_string())];
        let options = if depth {
            EvalOptions::with_depth_analysis(4)
        } else {
            EvalOptions::default()
        };
        evaluate(&EvalInputs::new(&preds, &truth), &options).unwrap()
    }

    #[test]
    fn test_render_without_depth() {
        let text = render_results_text(&sample_report(false));
        assert_eq!(
            text,
            "1. Where is the key? 1\n2. What colour? 0\n\nAverage accuracy: 0.50\n"
        );
    }

    #[test]
    fn test_render_with_depth() {
        let text = render_results_text(&sample_report(true));
        assert!(text.contains("\nDepth Analysis\n0-25% accuracy: 1.00\n25-50% accuracy: 0.00\n"));
        assert!(text.contains("50-75% accuracy: No scores\n75-100% accuracy: No scores\n"));
        assert!(text.ends_with("\nAverage accuracy: 0.50\n"));
    }

    #[test]
    fn test_depth_section_read_back() {
        let report = sample_report(true);
        let buckets = parse_depth_section(&render_results_text(&report))
            .unwrap()
            .unwrap();
        assert_eq!(buckets, report.depth.as_ref().unwrap().rows());
    }

    #[test]
    fn test_depth_section_absent() {
        let text = render_results_text(&sample_report(false));
        assert_eq!(parse_depth_section(&text).unwrap(), None);
    }

    #[test]
    fn test_depth_section_rounded_values() {
        let text = "1. Q? 1\n\nDepth Analysis\n0-50% accuracy: 0.67\n50-100% accuracy: No scores\n\nAverage accuracy: 0.67\n";
        let buckets = parse_depth_section(text).unwrap().unwrap();
        assert_eq!(buckets[0].0.to_string(), "0-50%");
        assert_eq!(buckets[0].1, BucketAccuracy::Accuracy(0.67));
        assert_eq!(buckets[1].1, BucketAccuracy::NoScores);
    }

    #[test]
    fn test_depth_section_malformed() {
        assert!(parse_depth_section("Depth Analysis\n0-50% accuracy: high\n").is_err());
        assert!(parse_depth_section("Depth Analysis\nsomewhere: 0.5\n").is_err());
    }

    #[test]
    fn test_json_output_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results_scores.json");
        let output = ScoreOutput::new(
            ScoreRunConfig {
                predictions: "preds.txt".to_string(),
                groundtruth: "truth.txt".to_string(),
                aliases: None,
                needles_info: None,
                total_pages: None,
                depth_analysis: true,
                num_buckets: 4,
            },
            sample_report(true),
        );
        output.save(&path).unwrap();
        assert_eq!(ScoreOutput::load(&path).unwrap(), output);
    }
}
