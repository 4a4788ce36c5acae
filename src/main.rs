//! needle-eval CLI
//!
//! Grades needle-in-a-haystack benchmark runs and summarises accuracy by depth.
//!
//! ## Quick Start
//!
//! ```bash
//! # Score a run, with accuracy per 10% of document depth
//! ./needle-eval score \
//!     --input-pred ./preds.txt \
//!     --input-groundtruth ./groundtruth.txt \
//!     --output-file ./results/results_scores.txt \
//!     --depth-analysis
//!
//! # Bucket by needle page instead of question order
//! ./needle-eval score \
//!     --input-pred ./preds.txt \
//!     --input-groundtruth ./groundtruth.txt \
//!     --output-file ./results/results_scores.txt \
//!     --json ./results/results_scores.json \
//!     --depth-analysis \
//!     --needles-info-file ./needles.csv \
//!     --n-pages 100
//!
//! # Average depth profiles of many runs into one matrix
//! ./needle-eval matrix --results-path ./Results
//! ```
//!
//! ## Configuration
//!
//! Defaults come from `needle-eval.toml` in the working directory when
//! present (or `--config`); flags override it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use needle_eval::config::EvalConfig;
use needle_eval::matrix::collect_matrix;
use needle_eval::output::{write_results_text, ScoreOutput, ScoreRunConfig};
use needle_eval::records::{load_aliases, load_groundtruth, load_needle_pages, load_predictions};
use needle_eval::scoring::{AliasTable, EvalInputs, ScoreSheet};
use needle_eval::EvalError;

#[derive(Parser)]
#[command(name = "needle-eval")]
#[command(about = "Score needle-in-a-haystack benchmark runs and analyse accuracy by depth")]
#[command(version)]
struct Cli {
    /// Path to config file (TOML); defaults to ./needle-eval.toml if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate predictions against groundtruth
    Score {
        /// Input file containing predictions
        #[arg(long)]
        input_pred: PathBuf,

        /// Input file containing groundtruths
        #[arg(long)]
        input_groundtruth: PathBuf,

        /// Output file to summarize the score
        #[arg(long)]
        output_file: PathBuf,

        /// Also write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Perform depth analysis of accuracy
        #[arg(long)]
        depth_analysis: bool,

        /// Skip depth analysis even if the config enables it
        #[arg(long, conflicts_with = "depth_analysis")]
        no_depth_analysis: bool,

        /// Optional alias file
        #[arg(long)]
        alias_file: Option<PathBuf>,

        /// Number of buckets for depth analysis (default 10)
        #[arg(long)]
        num_buckets: Option<usize>,

        /// CSV file containing needle page information
        #[arg(long)]
        needles_info_file: Option<PathBuf>,

        /// Total number of pages
        #[arg(long)]
        n_pages: Option<u32>,
    },

    /// Average depth profiles across benchmark runs
    ///
    /// Reads the depth section of
    /// <results-path>/<benchmark>/<benchmark>_<pages>Pages/results_scores.txt
    /// for every benchmark and page count in the config.
    Matrix {
        /// Path to the results directory
        #[arg(long, default_value = "Results")]
        results_path: PathBuf,

        /// Leave out the Average column
        #[arg(long)]
        no_average: bool,

        /// Also write the matrix as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = EvalConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Score {
            input_pred,
            input_groundtruth,
            output_file,
            json,
            depth_analysis,
            no_depth_analysis,
            alias_file,
            num_buckets,
            needles_info_file,
            n_pages,
        } => {
            let depth_flag = if no_depth_analysis {
                Some(false)
            } else if depth_analysis {
                Some(true)
            } else {
                None
            };
            let options = config.run_options(depth_flag, num_buckets);
            let run = ScoreRunConfig {
                predictions: input_pred.to_string_lossy().to_string(),
                groundtruth: input_groundtruth.to_string_lossy().to_string(),
                aliases: alias_file.as_ref().map(|p| p.to_string_lossy().to_string()),
                needles_info: needles_info_file.as_ref().map(|p| p.to_string_lossy().to_string()),
                total_pages: n_pages,
                depth_analysis: options.depth_analysis,
                num_buckets: options.num_buckets,
            };
            run_score(
                &input_pred,
                &input_groundtruth,
                alias_file.as_deref(),
                needles_info_file.as_deref(),
                &output_file,
                json.as_deref(),
                run,
            )?;
        }

        Commands::Matrix {
            results_path,
            no_average,
            json,
        } => {
            run_matrix(&results_path, &config, no_average, json.as_deref())?;
        }
    }

    Ok(())
}

/// Load inputs, score, and write the results files
fn run_score(
    pred_path: &Path,
    groundtruth_path: &Path,
    alias_path: Option<&Path>,
    needles_path: Option<&Path>,
    output: &Path,
    json_output: Option<&Path>,
    run: ScoreRunConfig,
) -> Result<()> {
    if needles_path.is_some() != run.total_pages.is_some() {
        return Err(EvalError::Configuration(
            "Both needles_info_file and n_pages must be provided together".to_string(),
        )
        .into());
    }
    if run.depth_analysis && run.num_buckets == 0 {
        return Err(
            EvalError::Configuration("number of buckets must be positive".to_string()).into(),
        );
    }

    eprintln!("Loading predictions from {:?}...", pred_path);
    let predictions = load_predictions(pred_path)?;
    let expected = load_groundtruth(groundtruth_path)?;
    eprintln!(
        "  {} predictions, {} groundtruth entries",
        predictions.len(),
        expected.len()
    );

    let aliases = match alias_path {
        Some(path) => load_aliases(path)?,
        None => AliasTable::new(),
    };
    let needle_pages = needles_path.map(load_needle_pages).transpose()?;

    let mut inputs = EvalInputs::new(&predictions, &expected).with_aliases(&aliases);
    if let (Some(pages), Some(total)) = (needle_pages.as_deref(), run.total_pages) {
        inputs = inputs.with_needle_pages(pages).with_total_pages(total);
    }

    let sheet = ScoreSheet::score(&inputs)?;
    let depth = if run.depth_analysis {
        match sheet.depth_profile(run.num_buckets) {
            Ok(profile) => Some(profile),
            Err(e) => {
                eprintln!(
                    "Depth analysis failed; average accuracy was {:.2}",
                    sheet.average_accuracy()
                );
                return Err(e.into());
            }
        }
    } else {
        None
    };

    let report = sheet.into_report(depth);

    write_results_text(output, &report)?;
    println!("{}", report.format_summary());
    if let Some(depth) = &report.depth {
        for bucket in &depth.buckets {
            println!(
                "  {:>8}  {:>9}  (n={})",
                bucket.range.to_string(),
                bucket.accuracy.to_string(),
                bucket.size
            );
        }
    }
    println!("\nResults saved to {:?}", output);

    if let Some(path) = json_output {
        ScoreOutput::new(run, report).save(path)?;
        println!("JSON report saved to {:?}", path);
    }

    Ok(())
}

/// Build and print the cross-run depth matrix
fn run_matrix(
    results_path: &Path,
    config: &EvalConfig,
    no_average: bool,
    json_output: Option<&Path>,
) -> Result<()> {
    let mut matrix_config = config.matrix.clone();
    if no_average {
        matrix_config.include_average = false;
    }

    eprintln!(
        "Collecting {} benchmarks x {} page counts from {:?}...",
        matrix_config.benchmarks.len(),
        matrix_config.page_counts.len(),
        results_path
    );
    let matrix = collect_matrix(results_path, &matrix_config)?;
    print!("{}", matrix.format_table());

    if let Some(path) = json_output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&matrix)?;
        std::fs::write(path, json)?;
        println!("\nMatrix saved to {:?}", path);
    }

    Ok(())
}
