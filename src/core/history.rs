// src/core/history.rs
//! Past-session enrichment for adaptive interviews. Lookups never fail the request.

use tracing::{info, warn};

use crate::core::sessions::{
    InterviewSessionRepository, VideoSessionRepository, DEFAULT_HISTORY_LIMIT,
};
use crate::core::Database;
use crate::types::VideoInterviewSession;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub text_sessions: usize,
    pub video_sessions: usize,
    pub average_video_score: Option<i64>,
}

impl HistorySummary {
    pub fn from_sessions(text_sessions: usize, videos: &[VideoInterviewSession]) -> Self {
        let average_video_score = if videos.is_empty() {
            None
        } else {
            // Unscored sessions count as zero.
            let total: i64 = videos.iter().map(|s| s.overall_score.unwrap_or(0)).sum();
            Some((total as f64 / videos.len() as f64).round() as i64)
        };

        Self {
            text_sessions,
            video_sessions: videos.len(),
            average_video_score,
        }
    }
}

/// Summary plus whether any lookup behind it failed.
#[derive(Debug, Default, Clone)]
pub struct HistoryContext {
    pub summary: HistorySummary,
    pub degraded: bool,
}

pub async fn load_history(db: &Database, user_id: &str) -> HistoryContext {
    let mut degraded = false;

    let text_sessions = match InterviewSessionRepository::new(db.pool())
        .recent_for_user(user_id, DEFAULT_HISTORY_LIMIT)
        .await
    {
        Ok(sessions) => sessions.len(),
        Err(e) => {
            warn!("Error fetching past sessions for {}: {}", user_id, e);
            degraded = true;
            0
        }
    };

    let videos = match VideoSessionRepository::new(db.pool())
        .recent_completed_for_user(user_id, DEFAULT_HISTORY_LIMIT)
        .await
    {
        Ok(videos) => videos,
        Err(e) => {
            warn!("Error fetching video sessions for {}: {}", user_id, e);
            degraded = true;
            Vec::new()
        }
    };

    let summary = HistorySummary::from_sessions(text_sessions, &videos);
    info!(
        "History for {}: {} text, {} video sessions{}",
        user_id,
        summary.text_sessions,
        summary.video_sessions,
        if degraded { " (degraded)" } else { "" }
    );

    HistoryContext { summary, degraded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sessions::VideoSessionUpdate;
    use crate::types::VideoStatus;

    #[test]
    fn test_average_rounds_and_counts_missing_as_zero() {
        let now = chrono::Utc::now();
        let video = |score: Option<i64>| VideoInterviewSession {
            id: "v".to_string(),
            user_id: "u".to_string(),
            question: None,
            video_url: None,
            status: VideoStatus::Completed,
            overall_score: score,
            created_at: now,
            updated_at: now,
        };

        let summary = HistorySummary::from_sessions(2, &[video(Some(80)), video(Some(75)), video(None)]);
        assert_eq!(summary.video_sessions, 3);
        assert_eq!(summary.average_video_score, Some(52));

        assert_eq!(HistorySummary::from_sessions(0, &[]).average_video_score, None);
    }

    #[tokio::test]
    async fn test_load_history_from_store() {
        let db = Database::in_memory().await.unwrap();
        InterviewSessionRepository::new(db.pool())
            .create("user-1", "technical", None)
            .await
            .unwrap();
        let videos = VideoSessionRepository::new(db.pool());
        let video = videos.create("user-1", None).await.unwrap();
        videos
            .update(
                &video.id,
                &VideoSessionUpdate {
                    status: Some(VideoStatus::Completed),
                    overall_score: Some(91),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let context = load_history(&db, "user-1").await;
        assert!(!context.degraded);
        assert_eq!(
            context.summary,
            HistorySummary {
                text_sessions: 1,
                video_sessions: 1,
                average_video_score: Some(91),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade_instead_of_failing() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("DROP TABLE video_interview_sessions")
            .execute(db.pool())
            .await
            .unwrap();

        let context = load_history(&db, "user-1").await;
        assert!(context.degraded);
        assert_eq!(context.summary.video_sessions, 0);
        assert_eq!(context.summary.average_video_score, None);
    }
}
