//! CLI entry point for the survey cleaning pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use survey_clean::reporting::{ANALYSIS_CHART_FILE, QUALITY_CHART_FILE, REPORT_FILE};
use survey_clean::{
    CleaningConfig, CleaningError, CleaningStep, Dataset, DatasetLoader, OutputConfig, Pipeline,
    QualityMetrics,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Customer survey cleaning pipeline",
    long_about = "Cleans a customer survey table: fills or drops missing values, removes \
                  duplicates, corrects out-of-range ages and ratings, standardizes text and \
                  normalizes dates. Writes the cleaned CSV, validation charts and a JSON report.\n\n\
                  EXAMPLES:\n  \
                  # Clean the embedded sample into ./output\n  \
                  survey-clean\n\n  \
                  # Clean a CSV file with a custom configuration\n  \
                  survey-clean -i survey.csv -c cleaning.json -o results/\n\n  \
                  # Assess quality without writing anything\n  \
                  survey-clean -i survey.csv --dry-run"
)]
struct Args {
    /// Path to the survey CSV file
    ///
    /// If not specified, the embedded sample dataset is used
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the cleaned CSV, charts and report
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// JSON file with the cleaning configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Output the JSON report to stdout instead of the summary
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Skip rendering the validation charts
    #[arg(long)]
    no_charts: bool,

    /// Assess the input and show what would be cleaned, without writing anything
    #[arg(long)]
    dry_run: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let result = run(&args);
    if let Err(e) = &result
        && args.json
        && let Some(cleaning_error) = e.downcast_ref::<CleaningError>()
    {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "error": cleaning_error }))?
        );
    }
    result
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CleaningConfig::from_json_file(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?
        }
        None => CleaningConfig::default(),
    };

    let (dataset, source) = load_dataset(args)?;
    info!("Dataset loaded: {} rows x {} columns", dataset.height(), dataset.width());

    if args.dry_run {
        return run_dry_run(args, &config, &dataset, &source);
    }

    let output = OutputConfig::default()
        .output_dir(&args.output)
        .write_charts(!args.no_charts);

    let mut builder = Pipeline::builder()
        .config(config)
        .output(output)
        .input_source(&source);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let pipeline = builder.build()?;
    let result = pipeline.run(dataset).map_err(|e| {
        error!("Pipeline failed: {}", e);
        e
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
    } else {
        println!();
        println!("{}", result.report.summary_text());
    }

    Ok(())
}

/// Load the input file, or the embedded sample when none is given.
fn load_dataset(args: &Args) -> Result<(Dataset, String)> {
    match &args.input {
        Some(path) => {
            info!("Loading dataset from: {}", path.display());
            let dataset = DatasetLoader::load_csv(path)?;
            Ok((dataset, path.display().to_string()))
        }
        None => {
            info!("No input given, using the embedded sample dataset");
            let dataset = DatasetLoader::load_embedded()?;
            Ok((dataset, DatasetLoader::EMBEDDED_SOURCE.to_string()))
        }
    }
}

/// Run dry-run mode - assess the input without cleaning or writing.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(
    args: &Args,
    config: &CleaningConfig,
    dataset: &Dataset,
    source: &str,
) -> Result<()> {
    let metrics = QualityMetrics::assess(dataset, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Data quality assessment");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Input: {}", source);
    println!("  Rows: {}", metrics.rows);
    println!("  Columns: {}", dataset.width());
    println!();
    println!("{}", dataset.frame().head(Some(10)));
    println!();

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    for (column, missing) in &metrics.missing_by_column {
        println!("  {:<22} {}", column, missing);
    }
    println!();

    println!("DATA QUALITY ISSUES");
    println!("{}", "-".repeat(40));
    let issues = metrics.issues();
    if issues.is_empty() {
        println!("  No data quality issues detected");
    } else {
        for issue in &issues {
            println!("  - {}", issue.description);
        }
    }
    println!("  Quality score: {:.1}", metrics.quality_score());
    println!();

    println!("PRODUCT CATEGORY SPELLINGS");
    println!("{}", "-".repeat(40));
    for (category, count) in &metrics.category_values {
        println!("  {:<22} {}", category, count);
    }
    println!();

    println!("CLEANING STEPS");
    println!("{}", "-".repeat(40));
    for (i, step) in CleaningStep::ORDER.iter().enumerate() {
        println!("  {}. {}", i + 1, step.display_name());
    }
    println!();

    let output = OutputConfig::default()
        .output_dir(&args.output)
        .write_charts(!args.no_charts);
    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    println!("  - {}", output.csv_path().display());
    if output.write_charts {
        for chart in [QUALITY_CHART_FILE, ANALYSIS_CHART_FILE] {
            println!("  - {}", output.output_dir.join(chart).display());
        }
    }
    println!("  - {}", output.output_dir.join(REPORT_FILE).display());
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean the dataset, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}
