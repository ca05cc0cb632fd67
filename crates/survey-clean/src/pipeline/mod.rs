//! Pipeline module.
//!
//! Wires the loader output through the cleaner, writer and reporters, and
//! reports progress along the way.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use progress::{CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
