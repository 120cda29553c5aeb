// src/types/chat.rs
//! Conversation and interview-context types shared by the proxy and the client

use serde::{Deserialize, Serialize};
use std::fmt;

// ===== Conversation =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ===== Interview Context =====

/// Interview flavour selected by the caller. Anything unrecognised is treated as general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewMode {
    #[default]
    General,
    Technical,
    Behavioral,
    Resume,
    Adaptive,
}

impl InterviewMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("technical") => Self::Technical,
            Some("behavioral") | Some("behavioural") => Self::Behavioral,
            Some("resume") => Self::Resume,
            Some("adaptive") => Self::Adaptive,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Technical => "technical",
            Self::Behavioral => "behavioral",
            Self::Resume => "resume",
            Self::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for InterviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub learning_resource: String,
}

/// Skill gaps exactly as the client sent them. Normally a list of [`SkillGap`],
/// but career guidance rows written by older clients may hold any JSON shape.
/// The document is rendered into prompts untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillGaps(serde_json::Value);

impl SkillGaps {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn to_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Typed view, when the document is a list of skill gaps.
    pub fn list(&self) -> Option<Vec<SkillGap>> {
        serde_json::from_value(self.0.clone()).ok()
    }
}
