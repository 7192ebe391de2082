//! Search engine module
//!
//! Defines the Engine trait and the engines the search stage can be backed by.

mod loader;
mod traits;

// Engine implementations
pub mod brave;
pub mod duckduckgo;

pub use loader::EngineLoader;
pub use traits::*;
