// src/core/mod.rs
//! Completion proxying, prompt building and persistence

pub mod completion_client;
pub mod database;
pub mod history;
pub mod prompt_builder;
pub mod sessions;
pub mod trend_research;
pub mod trends;

pub use completion_client::{ChatCompletions, GroqClient};
pub use database::Database;
pub use prompt_builder::{PromptBuilder, PromptContext};
pub use trend_research::TrendResearcher;
