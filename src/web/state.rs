//! Application state shared across handlers

use crate::config::{Settings, UiSettings};
use crate::pipeline::Pipeline;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// The search-then-retrieve pipeline
    pub pipeline: Arc<Pipeline>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, pipeline: Pipeline) -> anyhow::Result<Self> {
        Ok(Self {
            settings: Arc::new(settings),
            pipeline: Arc::new(pipeline),
            templates: Arc::new(super::Templates::new()?),
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    pub fn ui(&self) -> &UiSettings {
        &self.settings.ui
    }
}
