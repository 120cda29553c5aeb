// src/core/completion_client.rs
//! HTTP client for the OpenAI-compatible chat-completion provider

use anyhow::Context;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::CompletionConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::response::{CompletionRequest, CompletionResponse};

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Raw upstream body, chunk by chunk, exactly as received.
pub type ByteChunkStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

#[rocket::async_trait]
pub trait ChatCompletions: Send + Sync {
    /// Sends a streaming request and returns the upstream body once headers report success.
    async fn stream(&self, api_key: &str, request: &CompletionRequest)
        -> ApiResult<ByteChunkStream>;

    /// Sends a non-streaming request and decodes the whole JSON answer.
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> ApiResult<CompletionResponse>;
}

pub struct GroqClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        // No overall timeout on the client: streamed bodies may legitimately run for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT)
    }

    async fn send(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> ApiResult<reqwest::Response> {
        let url = self.url();
        info!(
            "Calling completion API: {} (model: {}, messages: {}, stream: {})",
            url,
            request.model,
            request.messages.len(),
            request.stream
        );

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request);
        if !request.stream {
            builder = builder.timeout(self.timeout);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        let status = response.status();
        debug!("Completion API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("AI gateway error: {} {}", status.as_u16(), error_text);

        Err(ApiError::from_upstream_status(status.as_u16()))
    }
}

#[rocket::async_trait]
impl ChatCompletions for GroqClient {
    async fn stream(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> ApiResult<ByteChunkStream> {
        let response = self.send(api_key, request).await?;

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));

        Ok(Box::pin(body))
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> ApiResult<CompletionResponse> {
        let response = self.send(api_key, request).await?;

        let completion = response
            .json::<CompletionResponse>()
            .await
            .context("Failed to decode completion response")?;

        Ok(completion)
    }
}
