// src/client/mod.rs
//! HTTP client for a running Voke server, plus the stream consumer the terminal uses

pub mod consumer;
pub mod speech;
pub mod sse;

pub use consumer::{Conversation, Speaker, StreamConsumer, StreamOutcome};
pub use speech::CommandSpeaker;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::types::{ChatMessage, InterviewMode, SkillGaps, TrendRecord};
use crate::web::types::{
    AdaptiveChatRequest, ErrorResponse, InterviewChatRequest, ResearchTrendsRequest,
    TrendsResponse,
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct VokeClient {
    client: reqwest::Client,
    base_url: String,
}

impl VokeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        error!("{} failed: {}", url, message);
        anyhow::bail!(message)
    }

    pub async fn interview_chat(
        &self,
        messages: &[ChatMessage],
        mode: InterviewMode,
        resume_content: Option<&str>,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>> {
        let request = InterviewChatRequest {
            messages: Some(messages.to_vec()),
            interview_type: Some(mode.as_str().to_string()),
            resume_content: resume_content.map(str::to_string),
        };
        let response = self.post("/interview-chat", &request).await?;
        Ok(response.bytes_stream())
    }

    pub async fn adaptive_chat(
        &self,
        messages: &[ChatMessage],
        user_id: &str,
        skill_gaps: Option<&SkillGaps>,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>> {
        let request = AdaptiveChatRequest {
            messages: Some(messages.to_vec()),
            user_id: Some(user_id.to_string()),
            skill_gaps: skill_gaps.cloned(),
        };
        let response = self.post("/adaptive-interview-chat", &request).await?;
        Ok(response.bytes_stream())
    }

    pub async fn research_trends(&self, category: &str) -> Result<Vec<TrendRecord>> {
        let request = ResearchTrendsRequest {
            category: Some(category.to_string()),
        };
        let response = self.post("/research-job-trends", &request).await?;
        let body: TrendsResponse = response
            .json()
            .await
            .context("Failed to decode trends response")?;
        Ok(body.trends)
    }
}

/// Message from a `{ "error": ... }` envelope, or the status when the body is something else.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(envelope) => format!("{} ({})", envelope.error, status),
        Err(_) => format!("Server returned {}", status),
    }
}
