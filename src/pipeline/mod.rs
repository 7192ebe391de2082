//! Pipeline orchestration
//!
//! A run moves through `Searching → ExtractingUrls → BuildingIndex →
//! Retrieving → Presenting`, reporting progress as it goes and ending in
//! either [`PipelineOutput`] or a [`PipelineError`].

mod cancel;
mod error;
mod orchestrator;
mod progress;
mod stage;

pub use cancel::{CancelGuard, CancelHandle, CancelToken};
pub use error::PipelineError;
pub use orchestrator::{Pipeline, PipelineOutput, StageTiming};
pub use progress::{ChannelReporter, NoopReporter, ProgressEvent, ProgressReporter, TracingReporter};
pub use stage::PipelineStage;
