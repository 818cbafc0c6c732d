//! OpenAI Responses API types

use serde::{Deserialize, Serialize};
use weekplan_domain::PlanError;

/// OpenAI API error types
#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// OpenAI API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded - should retry after delay
    #[error("Rate limit exceeded (retry after {0}s)")]
    RateLimit(u64),

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body doesn't match expected schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),
}

impl From<OpenAIError> for PlanError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Network(message) => Self::transport(message),
            OpenAIError::Api { status, message } => Self::Api { status, message },
            OpenAIError::RateLimit(secs) => {
                Self::Api { status: 429, message: format!("rate limited, retry after {secs}s") }
            }
            OpenAIError::Authentication(message) => Self::auth(message),
            OpenAIError::InvalidSchema(message) => Self::internal(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Response from the Responses API
///
/// The REST payload carries the text in `output[].content[]`; some proxies
/// and SDK-shaped fixtures add the aggregated `output_text` as well.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesResponse {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ResponsesResponse {
    /// Aggregated output text, `None` when the response carries none
    pub fn text(&self) -> Option<String> {
        if let Some(text) = self.output_text.as_ref().filter(|t| !t.is_empty()) {
            return Some(text.clone());
        }
        let text: String = self
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.part_type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputItem {
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}
