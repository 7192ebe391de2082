//! Pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// The states a pipeline run moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Searching,
    ExtractingUrls,
    BuildingIndex,
    Retrieving,
    Presenting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::ExtractingUrls => "extracting_urls",
            Self::BuildingIndex => "building_index",
            Self::Retrieving => "retrieving",
            Self::Presenting => "presenting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Progress fraction shown on entering the stage
    pub fn progress(&self) -> f32 {
        match self {
            Self::Idle | Self::Searching => 0.0,
            Self::ExtractingUrls => 0.3,
            Self::BuildingIndex => 0.5,
            Self::Retrieving => 0.8,
            Self::Presenting | Self::Done => 1.0,
            Self::Failed => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
