//! Depth x document-length accuracy matrix across benchmark runs
//!
//! Each run contributes its depth profile to the column of its page count.
//! A cell is the mean of the bucket accuracies of the runs that have that
//! bucket populated; runs that are missing on disk are skipped with a warning.
//!
//! Runs are read from the text results file every `score` writes, or from a
//! JSON report when `report_file` ends in `.json`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::MatrixConfig;
use crate::output::{parse_depth_section, ScoreOutput};
use crate::scoring::{BucketAccuracy, DepthProfile, DepthRange};

/// Averaged accuracy matrix: rows are depth buckets, columns page counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMatrix {
    /// Depth range labels, shallowest first
    pub rows: Vec<String>,
    /// Page counts (plus "Average" when requested)
    pub columns: Vec<String>,
    /// `cells[row][column]`, `None` when no run populated the cell
    pub cells: Vec<Vec<Option<f64>>>,
    /// Number of runs contributing to each cell
    pub runs: Vec<Vec<usize>>,
}

impl DepthMatrix {
    /// Render as an aligned text table with percentages
    pub fn format_table(&self) -> String {
        let mut out = format!("{:>10}", "Depth");
        for column in &self.columns {
            out.push_str(&format!(" {:>8}", column));
        }
        out.push('\n');

        for (label, row) in self.rows.iter().zip(&self.cells) {
            out.push_str(&format!("{:>10}", label));
            for cell in row {
                let value = match cell {
                    Some(v) => format!("{:.0}%", v * 100.0),
                    None => "-".to_string(),
                };
                out.push_str(&format!(" {:>8}", value));
            }
            out.push('\n');
        }
        out
    }
}

/// Accumulates depth profiles per page-count column
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    page_counts: Vec<u32>,
    rows: Vec<String>,
    sums: Vec<Vec<f64>>,
    counts: Vec<Vec<usize>>,
}

impl MatrixBuilder {
    pub fn new(page_counts: Vec<u32>) -> Self {
        Self {
            page_counts,
            rows: Vec::new(),
            sums: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Add one run's profile to the column at `column`
    pub fn add(&mut self, column: usize, profile: &DepthProfile) -> Result<()> {
        self.add_rows(column, &profile.rows())
    }

    /// Add one run's per-bucket accuracies to the column at `column`
    ///
    /// The first run fixes the number of depth rows; later runs must have the
    /// same number of buckets.
    pub fn add_rows(&mut self, column: usize, rows: &[(DepthRange, BucketAccuracy)]) -> Result<()> {
        if column >= self.page_counts.len() {
            bail!("Column {} out of range ({} page counts)", column, self.page_counts.len());
        }
        if self.rows.is_empty() {
            self.rows = rows.iter().map(|(range, _)| range.to_string()).collect();
            self.sums = vec![vec![0.0; self.page_counts.len()]; self.rows.len()];
            self.counts = vec![vec![0; self.page_counts.len()]; self.rows.len()];
        } else if rows.len() != self.rows.len() {
            bail!(
                "Depth profile has {} buckets, matrix has {}",
                rows.len(),
                self.rows.len()
            );
        }

        for (row, (_, accuracy)) in rows.iter().enumerate() {
            if let Some(accuracy) = accuracy.value() {
                self.sums[row][column] += accuracy;
                self.counts[row][column] += 1;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Average the accumulated runs
    pub fn build(&self, include_average: bool) -> DepthMatrix {
        let mut columns: Vec<String> = self.page_counts.iter().map(|p| p.to_string()).collect();
        let mut cells: Vec<Vec<Option<f64>>> = self
            .sums
            .iter()
            .zip(&self.counts)
            .map(|(sums, counts)| {
                sums.iter()
                    .zip(counts)
                    .map(|(&sum, &n)| (n > 0).then(|| sum / n as f64))
                    .collect()
            })
            .collect();
        let mut runs = self.counts.clone();

        if include_average {
            columns.push("Average".to_string());
            for (row, row_runs) in cells.iter_mut().zip(runs.iter_mut()) {
                let present: Vec<f64> = row.iter().flatten().copied().collect();
                let average = (!present.is_empty())
                    .then(|| present.iter().sum::<f64>() / present.len() as f64);
                row.push(average);
                row_runs.push(row_runs.iter().sum());
            }
        }

        DepthMatrix {
            rows: self.rows.clone(),
            columns,
            cells,
            runs,
        }
    }
}

/// Path of one run's report: `<root>/<benchmark>/<benchmark>_<pages>Pages/<file>`
pub fn run_report_path(root: &Path, benchmark: &str, pages: u32, report_file: &str) -> PathBuf {
    root.join(benchmark)
        .join(format!("{}_{}Pages", benchmark, pages))
        .join(report_file)
}

/// Depth rows of one run, `None` if it was scored without depth analysis
pub fn load_run_rows(path: &Path) -> Result<Option<Vec<(DepthRange, BucketAccuracy)>>> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let output = ScoreOutput::load(path)?;
        return Ok(output.report.depth.map(|profile| profile.rows()));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;
    parse_depth_section(&content)
        .with_context(|| format!("Failed to parse results file: {}", path.display()))
}

/// Load every configured run under `root` and build the matrix
pub fn collect_matrix(root: &Path, config: &MatrixConfig) -> Result<DepthMatrix> {
    let mut builder = MatrixBuilder::new(config.page_counts.clone());
    let mut loaded = 0usize;

    for benchmark in &config.benchmarks {
        for (column, &pages) in config.page_counts.iter().enumerate() {
            let path = run_report_path(root, benchmark, pages, &config.report_file);
            if !path.exists() {
                tracing::warn!("File not found - {}", path.display());
                continue;
            }

            let rows = match load_run_rows(&path) {
                Ok(Some(rows)) => rows,
                Ok(None) => {
                    tracing::warn!("No depth analysis in {}, skipping", path.display());
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error processing {}: {:#}", path.display(), e);
                    continue;
                }
            };

            builder.add_rows(column, &rows)?;
            loaded += 1;
        }
    }

    if builder.is_empty() {
        bail!("No depth profiles found under {}", root.display());
    }
    tracing::info!("Built depth matrix from {} runs", loaded);

    Ok(builder.build(config.include_average))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::bucket_scores;

    fn profile(scores: &[u8], buckets: usize) -> DepthProfile {
        bucket_scores(scores, buckets, None).unwrap()
    }

    #[test]
    fn test_average_across_runs() {
        let mut builder = MatrixBuilder::new(vec![25, 50]);
        builder.add(0, &profile(&[1, 0], 2)).unwrap();
        builder.add(0, &profile(&[0, 0], 2)).unwrap();
        builder.add(1, &profile(&[1, 1], 2)).unwrap();

        let matrix = builder.build(false);
        assert_eq!(matrix.rows, vec!["0-50%", "50-100%"]);
        assert_eq!(matrix.columns, vec!["25", "50"]);
        assert_eq!(matrix.cells[0], vec![Some(0.5), Some(1.0)]);
        assert_eq!(matrix.cells[1], vec![Some(0.0), Some(1.0)]);
        assert_eq!(matrix.runs[0], vec![2, 1]);
    }

    #[test]
    fn test_average_column() {
        let mut builder = MatrixBuilder::new(vec![25, 50, 75]);
        builder.add(0, &profile(&[1, 0], 2)).unwrap();
        builder.add(1, &profile(&[0, 0], 2)).unwrap();

        let matrix = builder.build(true);
        assert_eq!(matrix.columns.last().map(String::as_str), Some("Average"));
        // Column 75 has no runs and does not drag the average down
        assert_eq!(matrix.cells[0], vec![Some(1.0), Some(0.0), None, Some(0.5)]);
        assert_eq!(matrix.runs[0], vec![1, 1, 0, 2]);
    }

    #[test]
    fn test_empty_buckets_do_not_count() {
        let mut builder = MatrixBuilder::new(vec![25]);
        builder.add(0, &profile(&[1], 2)).unwrap();
        builder.add(0, &profile(&[0, 1], 2)).unwrap();
        let matrix = builder.build(false);
        assert_eq!(matrix.cells[0], vec![Some(0.5)]);
        assert_eq!(matrix.cells[1], vec![Some(1.0)]);
    }

    #[test]
    fn test_bucket_count_mismatch() {
        let mut builder = MatrixBuilder::new(vec![25]);
        builder.add(0, &profile(&[1, 0], 2)).unwrap();
        assert!(builder.add(0, &profile(&[1, 0, 1], 3)).is_err());
        assert!(builder.add(4, &profile(&[1, 0], 2)).is_err());
    }

    #[test]
    fn test_format_table() {
        let mut builder = MatrixBuilder::new(vec![25]);
        builder.add(0, &profile(&[1, 0], 2)).unwrap();
        let table = builder.build(false).format_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Depth"));
        assert!(lines[1].trim_end().ends_with("100%"));
        assert!(lines[2].trim_end().ends_with("0%"));
    }

    #[test]
    fn test_run_report_path() {
        let path = run_report_path(Path::new("Results"), "HSBC", 50, "results_scores.txt");
        assert_eq!(
            path,
            Path::new("Results/HSBC/HSBC_50Pages/results_scores.txt")
        );
    }

    #[test]
    fn test_load_run_rows_from_text_and_json() {
        use crate::output::{render_results_text, ScoreRunConfig};
        use crate::scoring::EvalReport;

        let dir = tempfile::tempdir().unwrap();
        let depth = profile(&[1, 0, 1, 1], 2);
        let report = EvalReport {
            questions: Vec::new(),
            total: 4,
            correct: 3,
            average_accuracy: 0.75,
            depth: Some(depth.clone()),
        };

        let text_path = dir.path().join("results_scores.txt");
        std::fs::write(&text_path, render_results_text(&report)).unwrap();
        assert_eq!(load_run_rows(&text_path).unwrap(), Some(depth.rows()));

        let json_path = dir.path().join("results_scores.json");
        let run = ScoreRunConfig {
            predictions: "preds.txt".to_string(),
            groundtruth: "truth.txt".to_string(),
            aliases: None,
            needles_info: None,
            total_pages: None,
            depth_analysis: true,
            num_buckets: 2,
        };
        ScoreOutput::new(run, report).save(&json_path).unwrap();
        assert_eq!(load_run_rows(&json_path).unwrap(), Some(depth.rows()));
    }
}
