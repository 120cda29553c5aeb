// src/client/consumer.rs
//! Turns a proxied event stream into an assistant message that grows delta by delta

use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::client::sse::{SseDecoder, StreamFrame};
use crate::types::{ChatMessage, Role};

/// Something that can read a finished answer aloud.
#[rocket::async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Ordered transcript whose last assistant message may still be streaming.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Appends the empty assistant placeholder that streaming fills in.
    fn begin_assistant(&mut self) {
        self.messages.push(ChatMessage::assistant(String::new()));
    }

    fn replace_last_assistant(&mut self, content: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content = content.to_string(),
            _ => self.messages.push(ChatMessage::assistant(content)),
        }
    }

    /// Drops an assistant placeholder that never received text.
    fn discard_empty_assistant(&mut self) {
        if matches!(self.messages.last(), Some(m) if m.role == Role::Assistant && m.content.is_empty()) {
            self.messages.pop();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub text: String,
    pub deltas: usize,
    pub skipped_frames: usize,
    /// Whether the `[DONE]` sentinel was seen before the body ended.
    pub finished: bool,
}

#[derive(Default)]
pub struct StreamConsumer<'a> {
    speaker: Option<&'a dyn Speaker>,
}

impl<'a> StreamConsumer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speaker(mut self, speaker: &'a dyn Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Reads `body` to its end (or to `[DONE]`), keeping the conversation's last
    /// assistant message equal to the text accumulated so far. `on_delta` sees
    /// each delta right after the message was updated.
    pub async fn consume<S, E, F>(
        &self,
        body: S,
        conversation: &mut Conversation,
        mut on_delta: F,
    ) -> Result<StreamOutcome>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
        F: FnMut(&str),
    {
        let mut body = std::pin::pin!(body);
        let mut decoder = SseDecoder::new();
        let mut outcome = StreamOutcome::default();
        conversation.begin_assistant();

        'read: loop {
            let (frames, ended) = match body.next().await {
                Some(chunk) => {
                    let chunk = chunk.context("Stream read failed")?;
                    (decoder.push(&chunk), false)
                }
                None => (decoder.finish(), true),
            };

            for frame in frames {
                match frame {
                    StreamFrame::Delta(text) => {
                        outcome.text.push_str(&text);
                        outcome.deltas += 1;
                        conversation.replace_last_assistant(&outcome.text);
                        on_delta(&text);
                    }
                    StreamFrame::Empty => {}
                    StreamFrame::Done => {
                        outcome.finished = true;
                        break 'read;
                    }
                    StreamFrame::Malformed(payload) => {
                        outcome.skipped_frames += 1;
                        warn!("Skipped malformed frame ({} bytes)", payload.len());
                    }
                }
            }

            if ended {
                break;
            }
        }

        if outcome.text.is_empty() {
            conversation.discard_empty_assistant();
        }

        debug!(
            "Stream consumed: {} deltas, {} skipped, finished: {}",
            outcome.deltas, outcome.skipped_frames, outcome.finished
        );

        if let Some(speaker) = self.speaker {
            if !outcome.text.is_empty() {
                if let Err(e) = speaker.speak(&outcome.text).await {
                    warn!("Text-to-speech failed: {}", e);
                }
            }
        }

        Ok(outcome)
    }
}
