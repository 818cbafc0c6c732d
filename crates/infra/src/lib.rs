//! # Weekplan Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The retrying HTTP client and error conversions
//! - The configuration loader (environment and TOML/JSON files)
//! - External service integrations: Google Calendar/Tasks, the school
//!   timetable service and the OpenAI planning service
//!
//! ## Architecture
//! - Implements traits defined in `weekplan-core`
//! - Contains all "impure" code (network and file I/O)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::*;
