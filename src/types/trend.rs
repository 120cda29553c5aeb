// src/types/trend.rs
//! Job-market trend records produced by trend research

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
}

impl DemandLevel {
    /// Models answer with "high", "High demand", "medium/high"... keep the first level named.
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        let position = |needle: &str| lower.find(needle).unwrap_or(usize::MAX);

        let candidates = [
            (position("high"), Self::High),
            (position("medium"), Self::Medium),
            (position("low"), Self::Low),
        ];

        match candidates.iter().min_by_key(|(pos, _)| *pos) {
            Some((pos, level)) if *pos != usize::MAX => *level,
            _ => {
                warn!("Unknown demand level '{}', defaulting to medium", raw);
                Self::Medium
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for DemandLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Models write `null` for fields they have nothing to say about; read it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the `{"trends": [...]}` document the model is asked to produce.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendEntry {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trending_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub salary_range: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub demand_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub growth_rate: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_companies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preparation_tips: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendDocument {
    pub trends: Vec<TrendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub category: String,
    pub title: String,
    pub description: String,
    pub trending_skills: Vec<String>,
    pub salary_range: String,
    pub demand_level: DemandLevel,
    pub growth_rate: String,
    pub key_companies: Vec<String>,
    pub preparation_tips: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl TrendRecord {
    pub fn from_entry(category: &str, entry: TrendEntry, last_updated: DateTime<Utc>) -> Self {
        let mut trending_skills = entry.trending_skills;
        // Skills are a set; keep first occurrence order.
        let mut seen = std::collections::HashSet::new();
        trending_skills.retain(|skill| seen.insert(skill.to_lowercase()));

        Self {
            category: category.to_string(),
            title: entry.title,
            description: entry.description,
            trending_skills,
            salary_range: entry.salary_range,
            demand_level: DemandLevel::normalize(&entry.demand_level),
            growth_rate: entry.growth_rate,
            key_companies: entry.key_companies,
            preparation_tips: entry.preparation_tips,
            last_updated,
        }
    }
}
