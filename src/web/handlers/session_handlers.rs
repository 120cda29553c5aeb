// src/web/handlers/session_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::core::sessions::{
    InterviewSessionRepository, SessionUpdate, VideoSessionRepository, VideoSessionUpdate,
    DEFAULT_HISTORY_LIMIT,
};
use crate::error::{ApiError, ApiResult};
use crate::types::{InterviewMode, InterviewSession, VideoInterviewSession};
use crate::web::types::*;

const MISSING_USER_ID: &str = "Missing 'userId' parameter";
const MAX_LIST_LIMIT: i64 = 100;

pub async fn create_interview_session_handler(
    request: Json<Body<CreateInterviewSessionRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<InterviewSession>> {
    let request = request.into_inner().0;
    let user_id = required(request.user_id, MISSING_USER_ID)?;
    let interview_type = InterviewMode::parse(request.interview_type.as_deref());

    let session = InterviewSessionRepository::new(state.db.pool())
        .create(
            &user_id,
            interview_type.as_str(),
            request.job_profile_id.as_deref(),
        )
        .await?;

    Ok(Json(session))
}

pub async fn list_interview_sessions_handler(
    user_id: Option<String>,
    limit: Option<i64>,
    state: &State<AppState>,
) -> ApiResult<Json<Vec<InterviewSession>>> {
    let user_id = required(user_id, MISSING_USER_ID)?;
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let sessions = InterviewSessionRepository::new(state.db.pool())
        .recent_for_user(&user_id, limit)
        .await?;
    Ok(Json(sessions))
}

pub async fn update_interview_session_handler(
    id: &str,
    request: Json<UpdateInterviewSessionRequest>,
    state: &State<AppState>,
) -> ApiResult<Json<InterviewSession>> {
    let request = request.into_inner();
    let update = SessionUpdate {
        status: request.status,
        overall_score: request.overall_score,
    };

    InterviewSessionRepository::new(state.db.pool())
        .update(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Interview session not found: {}", id)))
}

pub async fn create_video_session_handler(
    request: Json<Body<CreateVideoSessionRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<VideoInterviewSession>> {
    let request = request.into_inner().0;
    let user_id = required(request.user_id, MISSING_USER_ID)?;

    let session = VideoSessionRepository::new(state.db.pool())
        .create(&user_id, request.question.as_deref())
        .await?;

    Ok(Json(session))
}

pub async fn update_video_session_handler(
    id: &str,
    request: Json<UpdateVideoSessionRequest>,
    state: &State<AppState>,
) -> ApiResult<Json<VideoInterviewSession>> {
    let request = request.into_inner();
    let update = VideoSessionUpdate {
        status: request.status,
        video_url: request.video_url,
        overall_score: request.overall_score,
    };

    VideoSessionRepository::new(state.db.pool())
        .update(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Video session not found: {}", id)))
}
