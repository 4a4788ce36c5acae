//! End-to-end tests: record files on disk through scoring to results files.

use std::fs;
use std::path::Path;

use needle_eval::config::MatrixConfig;
use needle_eval::matrix::{collect_matrix, run_report_path};
use needle_eval::output::{render_results_text, write_results_text, ScoreOutput, ScoreRunConfig};
use needle_eval::records::{load_aliases, load_groundtruth, load_needle_pages, load_predictions};
use needle_eval::scoring::{evaluate, BucketMode, EvalInputs, EvalOptions, EvalReport};
use needle_eval::EvalError;

const PREDICTIONS: &str = "\
#1
Prompt: What is the code word hidden on the first pages?
Output: The code word is Albatross.
#2
Prompt: Which city hosts the annual meeting?
Output: The meeting is held in the
Big Apple every spring.
#3
Prompt: What is the CEO's favourite fruit?
Output: I could not find this in the document.
#4
Prompt: What colour is the logo?
Output: TEAL
";

const GROUNDTRUTH: &str = "\
1. \"albatross\"
2. \"NYC\"
3. \"mango\"
4. \"teal\"
";

const ALIASES: &str = "\"NYC\" \"New York City\" \"Big Apple\"\n";

const NEEDLES: &str = "needle-1,2\nneedle-2,9\nneedle-3,14\nneedle-4,20\n";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn score_run(dir: &Path, depth: bool, with_pages: bool) -> Result<EvalReport, EvalError> {
    let predictions = load_predictions(&write(dir, "preds.txt", PREDICTIONS)).unwrap();
    let expected = load_groundtruth(&write(dir, "truth.txt", GROUNDTRUTH)).unwrap();
    let aliases = load_aliases(&write(dir, "aliases.txt", ALIASES)).unwrap();
    let pages = load_needle_pages(&write(dir, "needles.csv", NEEDLES)).unwrap();

    let mut inputs = EvalInputs::new(&predictions, &expected).with_aliases(&aliases);
    if with_pages {
        inputs = inputs.with_needle_pages(&pages).with_total_pages(20);
    }
    let options = if depth {
        EvalOptions::with_depth_analysis(4)
    } else {
        EvalOptions::default()
    };
    evaluate(&inputs, &options)
}

#[test]
fn scores_files_with_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let report = score_run(dir.path(), false, false).unwrap();
    assert_eq!(report.scores(), vec![1, 1, 0, 1]);
    assert_eq!(report.average_accuracy, 0.75);
}

#[test]
fn page_mode_depth_profile() {
    let dir = tempfile::tempdir().unwrap();
    let report = score_run(dir.path(), true, true).unwrap();
    let depth = report.depth.as_ref().unwrap();
    assert_eq!(depth.mode, BucketMode::Page { total_pages: 20 });
    assert_eq!(depth.sizes(), vec![1, 1, 1, 1]);

    let text = render_results_text(&report);
    assert!(text.starts_with("1. What is the code word hidden on the first pages? 1\n"));
    assert!(text.contains("Depth Analysis\n0-25% accuracy: 1.00\n25-50% accuracy: 1.00\n50-75% accuracy: 0.00\n75-100% accuracy: 1.00\n"));
    assert!(text.ends_with("Average accuracy: 0.75\n"));
}

#[test]
fn mismatched_files_produce_no_report() {
    let dir = tempfile::tempdir().unwrap();
    let predictions = load_predictions(&write(dir.path(), "preds.txt", PREDICTIONS)).unwrap();
    let expected = load_groundtruth(&write(dir.path(), "truth.txt", "1. \"albatross\"\n")).unwrap();

    let err = evaluate(&EvalInputs::new(&predictions, &expected), &EvalOptions::default()).unwrap_err();
    assert_eq!(
        err,
        EvalError::InputMismatch {
            what: "groundtruth",
            expected: 4,
            actual: 1
        }
    );
}

#[test]
fn written_reports_feed_the_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let inputs_dir = dir.path().join("inputs");
    fs::create_dir_all(&inputs_dir).unwrap();
    let report = score_run(&inputs_dir, true, false).unwrap();

    let results = dir.path().join("Results");
    let config = MatrixConfig {
        benchmarks: vec!["HSBC".to_string(), "UPS".to_string()],
        page_counts: vec![25, 50],
        include_average: true,
        report_file: "results_scores.json".to_string(),
    };

    // Only two of the four runs exist
    for (benchmark, pages) in [("HSBC", 25), ("UPS", 25)] {
        let path = run_report_path(&results, benchmark, pages, &config.report_file);
        let run = ScoreRunConfig {
            predictions: "preds.txt".to_string(),
            groundtruth: "truth.txt".to_string(),
            aliases: Some("aliases.txt".to_string()),
            needles_info: None,
            total_pages: None,
            depth_analysis: true,
            num_buckets: 4,
        };
        ScoreOutput::new(run, report.clone()).save(&path).unwrap();
        write_results_text(&path.with_extension("txt"), &report).unwrap();
    }

    let matrix = collect_matrix(&results, &config).unwrap();
    assert_eq!(matrix.rows, vec!["0-25%", "25-50%", "50-75%", "75-100%"]);
    assert_eq!(matrix.columns, vec!["25", "50", "Average"]);
    assert_eq!(matrix.cells[2], vec![Some(0.0), None, Some(0.0)]);
    assert_eq!(matrix.cells[0], vec![Some(1.0), None, Some(1.0)]);
    assert_eq!(matrix.runs[0], vec![2, 0, 2]);
}

#[test]
fn text_results_feed_the_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let inputs_dir = dir.path().join("inputs");
    fs::create_dir_all(&inputs_dir).unwrap();
    let with_pages = score_run(&inputs_dir, true, true).unwrap();
    let without_depth = score_run(&inputs_dir, false, false).unwrap();

    let results = dir.path().join("Results");
    let config = MatrixConfig {
        benchmarks: vec!["HSBC".to_string(), "UPS".to_string()],
        page_counts: vec![25],
        ..MatrixConfig::default()
    };

    // Only the text results file, as written by every scoring run
    let hsbc = run_report_path(&results, "HSBC", 25, &config.report_file);
    write_results_text(&hsbc, &with_pages).unwrap();
    let ups = run_report_path(&results, "UPS", 25, &config.report_file);
    write_results_text(&ups, &without_depth).unwrap();

    let matrix = collect_matrix(&results, &config).unwrap();
    assert_eq!(matrix.rows, vec!["0-25%", "25-50%", "50-75%", "75-100%"]);
    assert_eq!(matrix.columns, vec!["25", "Average"]);
    assert_eq!(matrix.cells[0], vec![Some(1.0), Some(1.0)]);
    assert_eq!(matrix.cells[2], vec![Some(0.0), Some(0.0)]);
    assert_eq!(matrix.runs[0], vec![1, 1]);
}

#[test]
fn matrix_without_runs_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = MatrixConfig {
        benchmarks: vec!["HSBC".to_string()],
        page_counts: vec![25],
        ..MatrixConfig::default()
    };
    assert!(collect_matrix(dir.path(), &config).is_err());
}
