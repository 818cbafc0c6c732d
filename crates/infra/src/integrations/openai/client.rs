//! OpenAI Responses API client for plan generation

use async_trait::async_trait;
use reqwest::{Method, Response};
use tracing::{debug, info};
use weekplan_core::PlanningService;
use weekplan_domain::constants::{DEFAULT_PLANNER_MODEL, DEFAULT_PLANNER_URL};
use weekplan_domain::{PlanError, PlannerConfig, PlanningContext, Result};

use super::prompt::build_prompt;
use super::types::{OpenAIError, ResponsesRequest, ResponsesResponse};
use crate::http::HttpClient;

/// Wait suggested when a 429 response carries no `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// OpenAI API client that turns a planning context into a plan text
pub struct OpenAIClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key (required)
    /// * `http_client` - shared HTTP client
    pub fn new(api_key: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            model: DEFAULT_PLANNER_MODEL.to_string(),
            api_url: DEFAULT_PLANNER_URL.to_string(),
        }
    }

    /// Build from the planner section of the configuration
    ///
    /// # Errors
    /// Returns `PlanError::Config` when no API key is configured.
    pub fn from_config(config: &PlannerConfig, http_client: HttpClient) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PlanError::config("planner API key is not set"))?;
        Ok(Self::new(api_key.expose(), http_client)
            .with_model(&config.model)
            .with_api_url(&config.api_url))
    }

    /// Override the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the Responses endpoint, e.g. for a proxy
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Send a prompt and return the model's output text
    ///
    /// # Errors
    /// Returns `OpenAIError` for network failures, API errors, or responses
    /// without any output text.
    pub async fn complete(&self, prompt: &str) -> std::result::Result<String, OpenAIError> {
        let payload = ResponsesRequest { model: &self.model, input: prompt };
        let request = self
            .http_client
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload);

        let response = self.http_client.send(request).await.map_err(|err| match err {
            PlanError::Transport { message } => OpenAIError::Network(message),
            other => OpenAIError::Network(format!("HTTP error: {other}")),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received OpenAI API response");
        if !status.is_success() {
            return Err(handle_error_status(status.as_u16(), response).await);
        }

        let body: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| OpenAIError::InvalidSchema(format!("Failed to parse response: {e}")))?;
        if let Some(usage) = &body.usage {
            info!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "OpenAI usage"
            );
        }

        body.text().ok_or_else(|| {
            OpenAIError::InvalidSchema("response contained no output text".to_string())
        })
    }
}

#[async_trait]
impl PlanningService for OpenAIClient {
    async fn submit(&self, context: &PlanningContext) -> Result<String> {
        let prompt = build_prompt(context)?;
        info!(model = %self.model, prompt_chars = prompt.len(), "Requesting plan from OpenAI");
        Ok(self.complete(&prompt).await?)
    }
}

async fn handle_error_status(status: u16, response: Response) -> OpenAIError {
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    match status {
        401 | 403 => OpenAIError::Authentication(format!("Invalid API key ({status})")),
        429 => OpenAIError::RateLimit(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
        _ => OpenAIError::Api { status, message },
    }
}
