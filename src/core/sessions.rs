// src/core/sessions.rs
//! Interview and video session persistence

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::types::{InterviewSession, SessionStatus, VideoInterviewSession, VideoStatus};

pub const DEFAULT_HISTORY_LIMIT: i64 = 5;

#[derive(Debug, Default, Clone)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub overall_score: Option<i64>,
}

#[derive(Debug, Default, Clone)]
pub struct VideoSessionUpdate {
    pub status: Option<VideoStatus>,
    pub video_url: Option<String>,
    pub overall_score: Option<i64>,
}

pub struct InterviewSessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> InterviewSessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        interview_type: &str,
        job_profile_id: Option<&str>,
    ) -> Result<InterviewSession, sqlx::Error> {
        let now = Utc::now();
        let session = InterviewSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            interview_type: interview_type.to_string(),
            job_profile_id: job_profile_id.map(str::to_string),
            status: SessionStatus::InProgress,
            overall_score: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (id, user_id, interview_type, job_profile_id, status, overall_score, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.interview_type)
        .bind(&session.job_profile_id)
        .bind(session.status)
        .bind(session.overall_score)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(self.pool)
        .await?;

        info!(
            "Created {} interview session {} for user {}",
            session.interview_type, session.id, session.user_id
        );
        Ok(session)
    }

    /// Newest first.
    pub async fn recent_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<InterviewSession>, sqlx::Error> {
        sqlx::query_as::<_, InterviewSession>(
            r#"
            SELECT id, user_id, interview_type, job_profile_id, status, overall_score, created_at, updated_at
            FROM interview_sessions
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<InterviewSession>, sqlx::Error> {
        sqlx::query_as::<_, InterviewSession>(
            r#"
            SELECT id, user_id, interview_type, job_profile_id, status, overall_score, created_at, updated_at
            FROM interview_sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    /// Returns the updated row, or `None` when no session has this id.
    pub async fn update(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<Option<InterviewSession>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE interview_sessions
            SET status = COALESCE(?, status),
                overall_score = COALESCE(?, overall_score),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status)
        .bind(update.overall_score)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }
}

pub struct VideoSessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoSessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        question: Option<&str>,
    ) -> Result<VideoInterviewSession, sqlx::Error> {
        let now = Utc::now();
        let session = VideoInterviewSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            question: question.map(str::to_string),
            video_url: None,
            status: VideoStatus::Recording,
            overall_score: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO video_interview_sessions
                (id, user_id, question, video_url, status, overall_score, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.question)
        .bind(&session.video_url)
        .bind(session.status)
        .bind(session.overall_score)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(self.pool)
        .await?;

        info!("Created video session {} for user {}", session.id, session.user_id);
        Ok(session)
    }

    /// Completed sessions only, newest first.
    pub async fn recent_completed_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<VideoInterviewSession>, sqlx::Error> {
        sqlx::query_as::<_, VideoInterviewSession>(
            r#"
            SELECT id, user_id, question, video_url, status, overall_score, created_at, updated_at
            FROM video_interview_sessions
            WHERE user_id = ? AND status = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(VideoStatus::Completed)
        .bind(limit)
        .fetch_all(self.pool)
        .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<VideoInterviewSession>, sqlx::Error> {
        sqlx::query_as::<_, VideoInterviewSession>(
            r#"
            SELECT id, user_id, question, video_url, status, overall_score, created_at, updated_at
            FROM video_interview_sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &VideoSessionUpdate,
    ) -> Result<Option<VideoInterviewSession>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE video_interview_sessions
            SET status = COALESCE(?, status),
                video_url = COALESCE(?, video_url),
                overall_score = COALESCE(?, overall_score),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status)
        .bind(&update.video_url)
        .bind(update.overall_score)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }
}
