//! Configuration for needle-eval
//!
//! Defines the `needle-eval.toml` schema. Command-line flags override values
//! from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scoring::{EvalOptions, DEFAULT_NUM_BUCKETS};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "needle-eval.toml";

/// Evaluation configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of depth buckets
    #[serde(default = "default_num_buckets")]
    pub num_buckets: usize,

    /// Compute accuracy by depth
    #[serde(default)]
    pub depth_analysis: bool,

    /// Cross-run depth matrix settings
    #[serde(default)]
    pub matrix: MatrixConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            depth_analysis: false,
            matrix: MatrixConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default location (./needle-eval.toml) or return defaults
    pub fn load_default() -> Result<Self> {
        let local_path = Path::new(DEFAULT_CONFIG_FILE);
        if local_path.exists() {
            return Self::load(local_path);
        }
        Ok(Self::default())
    }

    /// Load from an explicit path, falling back to the default location
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Save config to TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            anyhow::bail!("num_buckets must be positive");
        }
        if self.matrix.page_counts.iter().any(|&p| p == 0) {
            anyhow::bail!("matrix.page_counts must be positive");
        }
        Ok(())
    }

    /// Scoring options derived from this config
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            depth_analysis: self.depth_analysis,
            num_buckets: self.num_buckets,
        }
    }

    /// Scoring options with command-line overrides applied
    ///
    /// `depth_analysis` is `Some` when a flag turned depth analysis on or off.
    pub fn run_options(&self, depth_analysis: Option<bool>, num_buckets: Option<usize>) -> EvalOptions {
        EvalOptions {
            depth_analysis: depth_analysis.unwrap_or(self.depth_analysis),
            num_buckets: num_buckets.unwrap_or(self.num_buckets),
        }
    }
}

/// Which runs make up the depth matrix
///
/// Runs are read from `<results>/<benchmark>/<benchmark>_<pages>Pages/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Benchmark (document) names
    #[serde(default = "default_benchmarks")]
    pub benchmarks: Vec<String>,

    /// Document lengths, one matrix column each
    #[serde(default = "default_page_counts")]
    pub page_counts: Vec<u32>,

    /// Append a column averaging each depth row
    #[serde(default = "default_include_average")]
    pub include_average: bool,

    /// Report file name inside each run directory
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            benchmarks: default_benchmarks(),
            page_counts: default_page_counts(),
            include_average: default_include_average(),
            report_file: default_report_file(),
        }
    }
}

fn default_num_buckets() -> usize { DEFAULT_NUM_BUCKETS }
fn default_include_average() -> bool { true }
fn default_report_file() -> String { "results_scores.txt".to_string() }
fn default_page_counts() -> Vec<u32> { vec![25, 50, 75, 100, 150, 200] }

fn default_benchmarks() -> Vec<String> {
    [
        "AIG", "AmericanAirlines", "APA", "BankOfMontreal", "Barclays",
        "BlackRock", "BNYMellon", "CapitalOne", "CitiGroup", "Cofinimmo",
        "CVS", "DWS", "Entain", "GoldmanSachs", "HSBC", "JPMorgan",
        "Kroger", "NewRiver", "PNC", "Reach", "Sagicor", "United",
        "UPS", "Vesuvius", "WoltersKluwer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
