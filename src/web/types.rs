// src/web/types.rs
//! Request bodies, response envelopes and shared state for the HTTP layer

use futures_util::{future, StreamExt};
use rocket::http::ContentType;
use rocket::response::stream::ByteStream;
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;
use serde::de::{DeserializeOwned, Deserializer};
use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;
use crate::core::completion_client::ByteChunkStream;
use crate::core::{ChatCompletions, Database};
use crate::types::{ChatMessage, SessionStatus, SkillGaps, TrendRecord, VideoStatus};

// ===== Shared State =====

/// Managed by Rocket. Everything in here is immutable or internally synchronized.
pub struct AppState {
    pub config: AppConfig,
    pub upstream: Arc<dyn ChatCompletions>,
    pub db: Database,
}

// ===== Envelopes =====

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self { error }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct TrendsResponse {
    pub success: bool,
    pub trends: Vec<TrendRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

// ===== Request Bodies =====

/// A field of the wrong shape reads as absent, so handlers answer with their
/// own 400 message instead of a generic deserialization failure.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A body that is not a JSON object (`[]`, `null`) reads as `T::default()`,
/// so the endpoint reports its own missing-parameter error.
#[derive(Debug, Default)]
pub struct Body<T>(pub T);

impl<'de, T> Deserialize<'de> for Body<T>
where
    T: DeserializeOwned + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Ok(Body(T::default()));
        }
        serde_json::from_value(value).map(Body).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct InterviewChatRequest {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub interview_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resume_content: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AdaptiveChatRequest {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_gaps: Option<SkillGaps>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ResearchTrendsRequest {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CreateInterviewSessionRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub interview_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub job_profile_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UpdateInterviewSessionRequest {
    pub status: Option<SessionStatus>,
    pub overall_score: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CreateVideoSessionRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
    pub question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UpdateVideoSessionRequest {
    pub status: Option<VideoStatus>,
    pub video_url: Option<String>,
    pub overall_score: Option<i64>,
}

/// Treats an empty or whitespace-only value as missing.
pub fn required(value: Option<String>, message: &str) -> Result<String, crate::error::ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| crate::error::ApiError::InvalidInput(message.to_string()))
}

// ===== Streaming Response =====

/// Relays upstream bytes unchanged as `text/event-stream`.
///
/// A read error ends the body where it happened; bytes already sent stay sent.
/// Dropping the response (client gone) drops the upstream body with it.
pub struct EventStreamResponse {
    body: ByteChunkStream,
}

impl EventStreamResponse {
    pub fn new(body: ByteChunkStream) -> Self {
        Self { body }
    }
}

impl<'r> Responder<'r, 'r> for EventStreamResponse {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'r> {
        let body = self
            .body
            .take_while(|chunk| {
                if let Err(e) = chunk {
                    warn!("Upstream stream ended with error: {}", e);
                }
                future::ready(chunk.is_ok())
            })
            .filter_map(|chunk| future::ready(chunk.ok()));

        (
            ContentType::new("text", "event-stream"),
            ByteStream(Box::pin(body)),
        )
            .respond_to(request)
    }
}
