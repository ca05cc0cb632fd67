//! The cleaning pipeline and its builder.
//!
//! A run assesses the input, cleans it, writes the cleaned CSV, assesses the
//! output and renders charts and the JSON report.

use crate::cleaner::Cleaner;
use crate::config::{CleaningConfig, OutputConfig};
use crate::error::{Result, ResultExt};
use crate::loader::DatasetLoader;
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::quality::{QualityComparison, QualityMetrics};
use crate::reporting::{ChartRenderer, CleaningReport, ReportGenerator, ReportParams};
use crate::types::{CleaningOutcome, Dataset, RowIssue, StepReport};
use crate::writer::DatasetWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned dataset
    pub dataset: Dataset,
    /// What each cleaning step did
    pub steps: Vec<StepReport>,
    /// Rows dropped because they could not be cleaned
    pub row_issues: Vec<RowIssue>,
    /// Quality of the input and of the cleaned output
    pub comparison: QualityComparison,
    /// The run report (also written to disk when enabled)
    pub report: CleaningReport,
    /// Every file the run wrote
    pub output_files: Vec<PathBuf>,
    pub duration_ms: u64,
}

/// The survey cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use survey_clean::{DatasetLoader, OutputConfig, Pipeline};
///
/// let result = Pipeline::builder()
///     .output(OutputConfig::default().output_dir("out").write_charts(false))
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(DatasetLoader::load_embedded()?)?;
///
/// println!("{}", result.report.summary_text());
/// ```
pub struct Pipeline {
    cleaner: Cleaner,
    output: OutputConfig,
    input_source: String,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        self.cleaner.config()
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Assess a dataset without cleaning or writing anything.
    pub fn assess(&self, dataset: &Dataset) -> Result<QualityMetrics> {
        QualityMetrics::assess(dataset, self.cleaner.config())
    }

    /// Run the pipeline over a dataset.
    ///
    /// # Errors
    ///
    /// Fails on write errors, chart failures and, when the configuration
    /// asks to abort, on rows that cannot be cleaned.
    pub fn run(&self, dataset: Dataset) -> Result<PipelineResult> {
        match self.run_internal(dataset) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Cleaned {} rows in {} ms",
                    result.dataset.height(),
                    result.duration_ms
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, dataset: Dataset) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let config = self.cleaner.config();
        info!("Starting cleaning pipeline for {}", self.input_source);

        self.report_progress(ProgressUpdate::started(CleaningStage::Assessing));
        let before = self.assess(&dataset).context("Assessing input quality")?;
        info!(
            "Input: {} rows, {} issue(s), quality score {:.1}",
            before.rows,
            before.issue_count(),
            before.quality_score()
        );
        for issue in before.issues() {
            info!("  {}", issue.description);
        }

        let outcome = self.cleaner.clean_with(dataset, |step, _| {
            self.report_progress(ProgressUpdate::started(CleaningStage::from(step)));
        })?;
        for issue in &outcome.row_issues {
            warn!("Dropped row {}: {}", issue.row, issue.reason);
        }

        let mut output_files = Vec::new();
        if self.output.save_to_disk {
            self.report_progress(ProgressUpdate::started(CleaningStage::Writing));
            let csv_path = DatasetWriter::write_csv(&outcome.dataset, self.output.csv_path())?;
            output_files.push(csv_path);
        } else {
            debug!("Saving disabled, skipping CSV output");
        }

        self.report_progress(ProgressUpdate::started(CleaningStage::Reporting));
        let after = self
            .assess(&outcome.dataset)
            .context("Assessing cleaned output")?;
        let comparison = QualityComparison::new(before, after);
        info!(
            "Quality score {:.1} -> {:.1}",
            comparison.before.quality_score(),
            comparison.after.quality_score()
        );

        if self.output.save_to_disk && self.output.write_charts {
            let renderer = ChartRenderer::new(&self.output.output_dir);
            output_files.extend(renderer.render_all(&comparison, &outcome.dataset)?);
        }

        let duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        let report = ReportGenerator::build_report(ReportParams {
            input_source: &self.input_source,
            outcome: &outcome,
            comparison: &comparison,
            config,
            output_files: &output_files,
            duration_ms,
        });

        if self.output.save_to_disk && self.output.write_report {
            let generator = ReportGenerator::new(&self.output.output_dir);
            output_files.push(generator.write_report_to_file(&report)?);
        }

        let CleaningOutcome {
            dataset,
            steps,
            row_issues,
        } = outcome;

        Ok(PipelineResult {
            dataset,
            steps,
            row_issues,
            comparison,
            report,
            output_files,
            duration_ms,
        })
    }
}

/// Builder for creating a [`Pipeline`].
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = Pipeline::builder()
///     .config(CleaningConfig::builder().remove_duplicates(false).build()?)
///     .input_source("survey.csv")
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    output: Option<OutputConfig>,
    input_source: Option<String>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the cleaning configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set where and what the pipeline writes.
    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    /// Name of the input, recorded in the report.
    ///
    /// Defaults to the embedded sample marker.
    pub fn input_source(mut self, source: impl Into<String>) -> Self {
        self.input_source = Some(source.into());
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let cleaner = Cleaner::new(self.config.unwrap_or_default())?;

        Ok(Pipeline {
            cleaner,
            output: self.output.unwrap_or_default(),
            input_source: self
                .input_source
                .unwrap_or_else(|| DatasetLoader::EMBEDDED_SOURCE.to_string()),
            progress_reporter: self.progress_reporter,
        })
    }
}
