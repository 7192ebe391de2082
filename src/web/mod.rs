//! Web server module
//!
//! Serves the search form, runs the pipeline for submitted queries and
//! streams its progress to the browser.

mod handlers;
mod routes;
mod state;
mod templates;

pub use routes::create_router;
pub use state::AppState;
pub use templates::{ErrorView, Templates};
