//! Template rendering with Tera

use crate::pipeline::{PipelineError, PipelineOutput};
use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Error shown in the output region
#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub message: String,
    pub detail: Option<String>,
}

impl From<&PipelineError> for ErrorView {
    fn from(error: &PipelineError) -> Self {
        Self {
            message: error.to_string(),
            detail: error.detail(),
        }
    }
}

/// Template renderer
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Create a new template renderer with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template("base.html", include_str!("../templates/base.html"))?;
        tera.add_raw_template("index.html", include_str!("../templates/index.html"))?;

        // Fragments, also sent on their own over the event stream
        tera.add_raw_template("results.html", include_str!("../templates/results.html"))?;
        tera.add_raw_template("error.html", include_str!("../templates/error.html"))?;

        Ok(Self { tera })
    }

    /// Render a template with a Tera Context
    pub fn render(&self, template: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template, context)?)
    }

    /// Render the results fragment for a finished run
    pub fn render_results(&self, output: &PipelineOutput) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("output", output);
        self.render("results.html", &ctx)
    }

    /// Render the error fragment for a failed run
    pub fn render_error(&self, error: &PipelineError) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("error", &ErrorView::from(error));
        self.render("error.html", &ctx)
    }
}
