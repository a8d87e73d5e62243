//! Client library for the coverage-verified summarization backend.
//!
//! Holds the HTTP/SSE client, the result model, text formatting and the
//! HTML renderer shared by the page controller and the CLI.

pub mod api;
pub mod config;
pub mod format;
pub mod interrupt;
pub mod logging;
pub mod render;
pub mod result;

pub use config::Config;
