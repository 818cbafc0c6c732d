//! OpenAI planning service
//!
//! [`OpenAIClient`] implements the core `PlanningService` port on top of the
//! Responses API: it renders the planning context into a single prompt
//! ([`build_prompt`]) and returns the model's output text untouched. Parsing
//! and validation of that text happen in the core pipeline.
//!
//! # Error Handling
//!
//! - **401/403**: `OpenAIError::Authentication`, fatal for the run
//! - **429**: `OpenAIError::RateLimit` with the `Retry-After` hint
//! - **Network errors**: `OpenAIError::Network`, mapped to transport errors
//!
//! Submissions are never retried; a failed submission fails the run.

pub mod client;
pub mod prompt;
pub mod types;

pub use client::OpenAIClient;
pub use prompt::build_prompt;
pub use types::OpenAIError;
