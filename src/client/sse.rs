// src/client/sse.rs
//! Incremental decoder for `data:` lines of a chat-completion event stream

use tracing::debug;

use crate::types::response::ChatCompletionChunk;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Non-empty text to append.
    Delta(String),
    /// Valid chunk without text (role announcement, finish reason, usage).
    Empty,
    /// Terminal `[DONE]` payload.
    Done,
    /// Payload that is not valid chunk JSON.
    Malformed(String),
}

/// Splits arbitrary byte chunks into lines and decodes `data:` payloads.
///
/// Bytes after the last newline are held back until the next chunk completes
/// the line, so a JSON object or a UTF-8 sequence cut by a chunk boundary is
/// decoded whole instead of being dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(frame) = parse_line(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let rest = std::mem::take(&mut self.pending);
        parse_line(&rest).into_iter().collect()
    }
}

fn parse_line(raw: &[u8]) -> Option<StreamFrame> {
    let line = String::from_utf8_lossy(raw);
    let line = line.strip_suffix('\r').unwrap_or(&line);

    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload == DONE_SENTINEL {
        return Some(StreamFrame::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => Some(match chunk.delta_text() {
            Some(text) => StreamFrame::Delta(text.to_string()),
            None => StreamFrame::Empty,
        }),
        Err(e) => {
            debug!("Skipping malformed stream frame: {}", e);
            Some(StreamFrame::Malformed(payload.to_string()))
        }
    }
}
