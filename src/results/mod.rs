//! Search result records and URL extraction
//!
//! This module defines the records the search stage hands to the rest of the pipeline.

mod extract;
mod types;

pub use extract::extract_urls;
pub use types::*;
