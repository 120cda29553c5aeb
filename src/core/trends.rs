// src/core/trends.rs
//! Job-market trend storage. A category is always replaced as a whole.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::types::{DemandLevel, TrendRecord};

#[derive(sqlx::FromRow)]
struct TrendRow {
    category: String,
    title: String,
    description: String,
    trending_skills: String,
    salary_range: String,
    demand_level: String,
    growth_rate: String,
    key_companies: String,
    preparation_tips: String,
    last_updated: DateTime<Utc>,
}

impl TrendRow {
    fn into_record(self) -> TrendRecord {
        TrendRecord {
            category: self.category,
            title: self.title,
            description: self.description,
            trending_skills: decode_list(&self.trending_skills),
            salary_range: self.salary_range,
            demand_level: DemandLevel::normalize(&self.demand_level),
            growth_rate: self.growth_rate,
            key_companies: decode_list(&self.key_companies),
            preparation_tips: decode_list(&self.preparation_tips),
            last_updated: self.last_updated,
        }
    }
}

fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Malformed list column '{}': {}", raw, e);
        Vec::new()
    })
}

pub struct TrendRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrendRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Deletes every row of `category`, then inserts `records`, in one transaction.
    /// Readers never observe the category empty or holding old and new rows together.
    pub async fn replace_category(
        &self,
        category: &str,
        records: &[TrendRecord],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM job_market_trends WHERE category = ?")
            .bind(category)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO job_market_trends
                    (category, title, description, trending_skills, salary_range, demand_level,
                     growth_rate, key_companies, preparation_tips, last_updated)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(category)
            .bind(&record.title)
            .bind(&record.description)
            .bind(encode_list(&record.trending_skills))
            .bind(&record.salary_range)
            .bind(record.demand_level.as_str())
            .bind(&record.growth_rate)
            .bind(encode_list(&record.key_companies))
            .bind(encode_list(&record.preparation_tips))
            .bind(record.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Replaced trends for category '{}': {} removed, {} inserted",
            category,
            deleted,
            records.len()
        );
        Ok(())
    }

    pub async fn list_category(&self, category: &str) -> Result<Vec<TrendRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TrendRow>(
            r#"
            SELECT category, title, description, trending_skills, salary_range, demand_level,
                   growth_rate, key_companies, preparation_tips, last_updated
            FROM job_market_trends
            WHERE category = ?
            ORDER BY id ASC
            "#,
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(TrendRow::into_record).collect())
    }
}
