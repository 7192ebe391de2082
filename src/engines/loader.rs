//! Engine loader for initializing the configured engine

use super::traits::Engine;
use super::{brave, duckduckgo};
use crate::config::SearchSettings;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Create and initialize the engine named in the settings
    pub fn load(settings: &SearchSettings) -> Result<Arc<dyn Engine>> {
        let engine = Self::create_engine(&settings.engine, settings)?;
        info!("Loaded search engine: {}", engine.name());
        Ok(engine)
    }

    /// Create an engine instance by name
    fn create_engine(engine_type: &str, settings: &SearchSettings) -> Result<Arc<dyn Engine>> {
        let mut engine: Box<dyn Engine> = match engine_type {
            "duckduckgo" => Box::new(duckduckgo::DuckDuckGo::new()),
            "brave" => Box::new(brave::Brave::new()),
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown engine type: {} (available: {})",
                    engine_type,
                    Self::available_engines().join(", ")
                ));
            }
        };

        engine.init(settings)?;

        if engine.about().require_api_key && settings.api_key.is_none() {
            return Err(anyhow::anyhow!(
                "Engine {} requires search.api_key to be set",
                engine_type
            ));
        }

        Ok(Arc::from(engine))
    }

    /// Get list of available engine types
    pub fn available_engines() -> Vec<&'static str> {
        vec!["duckduckgo", "brave"]
    }
}
