//! Progress reporting for the cleaning pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_clean::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(dataset)?;
//! ```

use crate::types::CleaningStep;
use serde::{Deserialize, Serialize};

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Assessing quality of the input
    Assessing,
    /// Filling or dropping missing values
    MissingValues,
    /// Removing duplicate rows
    Duplicates,
    /// Correcting out-of-range values
    Outliers,
    /// Standardizing text
    Text,
    /// Normalizing dates
    Dates,
    /// Writing the cleaned CSV
    Writing,
    /// Assessing the output, rendering charts and the report
    Reporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// Stages of a successful run, in order.
    pub const RUN_ORDER: [CleaningStage; 8] = [
        Self::Assessing,
        Self::MissingValues,
        Self::Duplicates,
        Self::Outliers,
        Self::Text,
        Self::Dates,
        Self::Writing,
        Self::Reporting,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Assessing => "Assessing Data Quality",
            Self::MissingValues => CleaningStep::MissingValues.display_name(),
            Self::Duplicates => CleaningStep::Duplicates.display_name(),
            Self::Outliers => CleaningStep::Outliers.display_name(),
            Self::Text => CleaningStep::Text.display_name(),
            Self::Dates => CleaningStep::Dates.display_name(),
            Self::Writing => "Writing Output",
            Self::Reporting => "Generating Reports",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run taken by this stage (0.0 - 1.0).
    ///
    /// Weights of [`RUN_ORDER`](Self::RUN_ORDER) sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Assessing => 0.10,
            Self::MissingValues => 0.15,
            Self::Duplicates => 0.10,
            Self::Outliers => 0.10,
            Self::Text => 0.10,
            Self::Dates => 0.10,
            Self::Writing => 0.15,
            Self::Reporting => 0.20,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            stage => Self::RUN_ORDER
                .iter()
                .take_while(|s| *s != stage)
                .map(|s| s.weight())
                .sum(),
        }
    }
}

impl From<CleaningStep> for CleaningStage {
    fn from(step: CleaningStep) -> Self {
        match step {
            CleaningStep::MissingValues => Self::MissingValues,
            CleaningStep::Duplicates => Self::Duplicates,
            CleaningStep::Outliers => Self::Outliers,
            CleaningStep::Text => Self::Text,
            CleaningStep::Dates => Self::Dates,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: CleaningStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Update marking the start of a stage.
    pub fn started(stage: CleaningStage) -> Self {
        Self::new(stage, 0.0, stage.display_name())
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates during a run.
///
/// # Example
///
/// ```rust,ignore
/// use survey_clean::{ProgressReporter, ProgressUpdate};
///
/// struct StderrReporter;
///
/// impl ProgressReporter for StderrReporter {
///     fn report(&self, update: ProgressUpdate) {
///         eprintln!("{:>3.0}% {}", update.progress * 100.0, update.message);
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
