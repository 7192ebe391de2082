//! HTTP networking module
//!
//! Provides the HTTP client used for engine requests, page fetches and embedding calls.

mod client;
mod user_agent;

pub use client::HttpClient;
pub use user_agent::generate_user_agent;
