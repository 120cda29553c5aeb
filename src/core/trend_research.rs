// src/core/trend_research.rs
//! One research run: ask the model, pull the embedded JSON out of its answer,
//! replace the category's stored trends.

use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error, info};

use crate::core::completion_client::ChatCompletions;
use crate::core::prompt_builder::PromptBuilder;
use crate::core::trends::TrendRepository;
use crate::core::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::response::CompletionRequest;
use crate::types::trend::{TrendDocument, TrendRecord};
use crate::types::ChatMessage;

const RESEARCH_TEMPERATURE: f32 = 0.7;

fn fenced_json() -> &'static Regex {
    static FENCED_JSON: OnceLock<Regex> = OnceLock::new();
    FENCED_JSON.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*(\{[\s\S]*\})\s*```").expect("fenced JSON pattern is valid")
    })
}

/// Parses the trend document out of a model answer: the fenced block when there
/// is one, otherwise the whole text.
pub fn extract_trend_document(answer: &str) -> ApiResult<TrendDocument> {
    let json = fenced_json()
        .captures(answer)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or(answer);

    serde_json::from_str::<TrendDocument>(json).map_err(|e| {
        error!("Failed to parse AI response: {}", e);
        ApiError::ParseFailed
    })
}

pub struct TrendResearcher<'a> {
    upstream: &'a dyn ChatCompletions,
    api_key: &'a str,
    model: &'a str,
}

impl<'a> TrendResearcher<'a> {
    pub fn new(upstream: &'a dyn ChatCompletions, api_key: &'a str, model: &'a str) -> Self {
        Self {
            upstream,
            api_key,
            model,
        }
    }

    pub async fn research(&self, db: &Database, category: &str) -> ApiResult<Vec<TrendRecord>> {
        info!("Researching job trends for category: {}", category);

        let request = CompletionRequest {
            model: self.model.to_string(),
            messages: vec![ChatMessage::user(PromptBuilder::research(category))],
            stream: false,
            temperature: RESEARCH_TEMPERATURE,
            max_tokens: None,
        };

        let completion = self.upstream.complete(self.api_key, &request).await?;
        let answer = completion.first_content().ok_or_else(|| {
            error!("Completion response carried no message content");
            ApiError::ParseFailed
        })?;
        debug!("AI response: {}", answer);

        // Nothing is written unless the whole document parsed.
        let document = extract_trend_document(answer)?;
        let last_updated = Utc::now();
        let records: Vec<TrendRecord> = document
            .trends
            .into_iter()
            .map(|entry| TrendRecord::from_entry(category, entry, last_updated))
            .collect();

        TrendRepository::new(db.pool())
            .replace_category(category, &records)
            .await?;

        info!(
            "Successfully updated {} job market trends for {}",
            records.len(),
            category
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::completion_client::ByteChunkStream;
    use crate::types::response::CompletionResponse;
    use crate::types::DemandLevel;

    struct CannedAnswer(String);

    #[rocket::async_trait]
    impl ChatCompletions for CannedAnswer {
        async fn stream(&self, _: &str, _: &CompletionRequest) -> ApiResult<ByteChunkStream> {
            unreachable!("research never streams")
        }

        async fn complete(&self, _: &str, request: &CompletionRequest) -> ApiResult<CompletionResponse> {
            assert!(!request.stream);
            assert_eq!(request.messages.len(), 1);
            let body = serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": self.0 } }]
            });
            Ok(serde_json::from_value(body).unwrap())
        }
    }

    const TWO_TRENDS: &str = r#"Here is the analysis:
```json
{
  "trends": [
    {
      "title": "Platform engineering",
      "description": "Internal developer platforms",
      "trending_skills": ["Kubernetes", "Terraform"],
      "salary_range": "$120k-$180k",
      "demand_level": "high",
      "growth_rate": "+18% YoY",
      "key_companies": ["Stripe", "Shopify"],
      "preparation_tips": ["Build a golden path demo"]
    },
    {
      "title": "Rust services",
      "description": "Memory-safe backends",
      "trending_skills": ["Rust", "Tokio"],
      "salary_range": "$130k-$190k",
      "demand_level": "medium",
      "growth_rate": "+9% YoY",
      "key_companies": ["Cloudflare"],
      "preparation_tips": ["Ship an async service"]
    }
  ]
}
```
Good luck!"#;

    #[test]
    fn test_extract_fenced_block() {
        let document = extract_trend_document(TWO_TRENDS).unwrap();
        assert_eq!(document.trends.len(), 2);
        assert_eq!(document.trends[1].title, "Rust services");
    }

    #[test]
    fn test_extract_bare_json_and_unlabelled_fence() {
        let bare = r#"{"trends":[{"title":"AI tooling"}]}"#;
        assert_eq!(extract_trend_document(bare).unwrap().trends.len(), 1);

        let unlabelled = format!("```\n{}\n```", bare);
        assert_eq!(extract_trend_document(&unlabelled).unwrap().trends[0].title, "AI tooling");
    }

    #[test]
    fn test_extract_rejects_non_json() {
        assert!(matches!(
            extract_trend_document("The market is hot right now."),
            Err(ApiError::ParseFailed)
        ));
        assert!(matches!(
            extract_trend_document("```json\n{ not json }\n```"),
            Err(ApiError::ParseFailed)
        ));
    }

    #[tokio::test]
    async fn test_research_replaces_only_its_category() {
        let db = Database::in_memory().await.unwrap();
        let repo = TrendRepository::new(db.pool());
        let stale = TrendRecord::from_entry(
            "backend",
            serde_json::from_value(serde_json::json!({ "title": "stale" })).unwrap(),
            Utc::now(),
        );
        let other = TrendRecord::from_entry(
            "frontend",
            serde_json::from_value(serde_json::json!({ "title": "react" })).unwrap(),
            Utc::now(),
        );
        repo.replace_category("backend", &[stale.clone(), stale]).await.unwrap();
        repo.replace_category("frontend", &[other]).await.unwrap();

        let upstream = CannedAnswer(TWO_TRENDS.to_string());
        let records = TrendResearcher::new(&upstream, "key", "model")
            .research(&db, "backend")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        let backend = repo.list_category("backend").await.unwrap();
        let titles: Vec<_> = backend.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Platform engineering", "Rust services"]);
        assert_eq!(backend[1].demand_level, DemandLevel::Medium);
        assert_eq!(repo.list_category("frontend").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_null_fields_are_stored_as_empty() {
        let answer = r#"```json
{"trends":[{"title":"AI infra","description":null,"trending_skills":null,"salary_range":null,
"demand_level":null,"growth_rate":null,"key_companies":null,"preparation_tips":null}]}
```"#;
        let document = extract_trend_document(answer).unwrap();
        assert_eq!(document.trends[0].title, "AI infra");
        assert!(document.trends[0].key_companies.is_empty());

        let db = Database::in_memory().await.unwrap();
        let upstream = CannedAnswer(answer.to_string());
        TrendResearcher::new(&upstream, "key", "model")
            .research(&db, "infra")
            .await
            .unwrap();

        let stored = TrendRepository::new(db.pool()).list_category("infra").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, "");
        assert_eq!(stored[0].salary_range, "");
        assert_eq!(stored[0].demand_level, DemandLevel::Medium);
        assert!(stored[0].trending_skills.is_empty());
        assert!(stored[0].preparation_tips.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_answer_leaves_store_untouched() {
        let db = Database::in_memory().await.unwrap();
        let repo = TrendRepository::new(db.pool());
        let existing = TrendRecord::from_entry(
            "backend",
            serde_json::from_value(serde_json::json!({ "title": "existing" })).unwrap(),
            Utc::now(),
        );
        repo.replace_category("backend", &[existing]).await.unwrap();

        let upstream = CannedAnswer("Sorry, I cannot help with that.".to_string());
        let result = TrendResearcher::new(&upstream, "key", "model")
            .research(&db, "backend")
            .await;
        assert!(matches!(result, Err(ApiError::ParseFailed)));

        let backend = repo.list_category("backend").await.unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend[0].title, "existing");
    }
}
