//! Progress reporting

use super::stage::PipelineStage;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A notification emitted as a run advances
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Entered a stage
    Stage {
        stage: PipelineStage,
        progress: f32,
        status: String,
    },
    /// Results are ready
    Done,
    /// The run stopped with an error
    Failed {
        message: String,
        detail: Option<String>,
    },
}

impl ProgressEvent {
    pub fn stage(stage: PipelineStage, status: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            progress: stage.progress(),
            status: status.into(),
        }
    }

    /// The stage the run is in once this event is reported
    pub fn pipeline_stage(&self) -> PipelineStage {
        match self {
            Self::Stage { stage, .. } => *stage,
            Self::Done => PipelineStage::Done,
            Self::Failed { .. } => PipelineStage::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.pipeline_stage().is_terminal()
    }
}

/// Receiver of progress events
///
/// Reporting is synchronous and must not block; slow consumers should
/// buffer on their side.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        let stage = event.pipeline_stage();
        match event {
            ProgressEvent::Stage {
                progress, status, ..
            } => debug!("[{:>3.0}%] {} - {}", progress * 100.0, stage, status),
            ProgressEvent::Done => info!("Pipeline {}", stage),
            ProgressEvent::Failed { message, .. } => warn!("Pipeline {}: {}", stage, message),
        }
    }
}

/// Forwards events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a reporter together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) {
        // receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}
