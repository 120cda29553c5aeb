// src/web/handlers/chat_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::core::history::load_history;
use crate::core::{PromptBuilder, PromptContext};
use crate::error::{ApiError, ApiResult};
use crate::types::response::CompletionRequest;
use crate::types::{ChatMessage, InterviewMode};
use crate::web::types::*;

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 2000;

const MISSING_MESSAGES: &str = "Missing or invalid 'messages' parameter";
const MISSING_USER_ID: &str = "Missing 'userId' parameter";

fn require_messages(messages: Option<Vec<ChatMessage>>) -> ApiResult<Vec<ChatMessage>> {
    messages.ok_or_else(|| ApiError::InvalidInput(MISSING_MESSAGES.to_string()))
}

/// Prepends the system prompt and relays the upstream stream as-is.
async fn relay(
    state: &AppState,
    api_key: &str,
    system_prompt: String,
    messages: Vec<ChatMessage>,
) -> ApiResult<EventStreamResponse> {
    let mut conversation = Vec::with_capacity(messages.len() + 1);
    conversation.push(ChatMessage::system(system_prompt));
    conversation.extend(messages);

    let request = CompletionRequest {
        model: state.config.completion.model.clone(),
        messages: conversation,
        stream: true,
        temperature: CHAT_TEMPERATURE,
        max_tokens: Some(CHAT_MAX_TOKENS),
    };

    let body = state.upstream.stream(api_key, &request).await?;
    Ok(EventStreamResponse::new(body))
}

pub async fn interview_chat_handler(
    request: Json<Body<InterviewChatRequest>>,
    state: &State<AppState>,
) -> ApiResult<EventStreamResponse> {
    let request = request.into_inner().0;
    let messages = require_messages(request.messages)?;

    // The adaptive prompt needs a user; this endpoint only serves the fixed flavours.
    let mode = match InterviewMode::parse(request.interview_type.as_deref()) {
        InterviewMode::Adaptive => InterviewMode::General,
        mode => mode,
    };
    info!(
        "Interview chat request: type={}, messages={}",
        mode,
        messages.len()
    );

    let api_key = state.config.completion.require_api_key()?;

    let system_prompt = PromptBuilder::build(&PromptContext {
        mode,
        resume_content: request.resume_content.as_deref(),
        ..Default::default()
    });

    relay(state, api_key, system_prompt, messages).await
}

pub async fn adaptive_interview_chat_handler(
    request: Json<Body<AdaptiveChatRequest>>,
    state: &State<AppState>,
) -> ApiResult<EventStreamResponse> {
    let request = request.into_inner().0;
    let messages = require_messages(request.messages)?;
    let user_id = required(request.user_id, MISSING_USER_ID)?;

    info!(
        "Adaptive interview request for user: {} with {} messages",
        user_id,
        messages.len()
    );

    let api_key = state.config.completion.require_api_key()?;

    let history = load_history(&state.db, &user_id).await;
    let system_prompt = PromptBuilder::build(&PromptContext {
        mode: InterviewMode::Adaptive,
        resume_content: None,
        skill_gaps: request.skill_gaps.as_ref(),
        history: Some(&history.summary),
        history_degraded: history.degraded,
    });

    relay(state, api_key, system_prompt, messages).await
}
