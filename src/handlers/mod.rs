//! HTTP request handlers
//!
//! - `api` - Health check and service descriptor
//! - `generate` - Topic-to-podcast generation

pub mod api;
pub mod generate;

pub use generate::generate_script;
