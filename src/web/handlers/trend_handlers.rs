// src/web/handlers/trend_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::core::trends::TrendRepository;
use crate::core::TrendResearcher;
use crate::error::ApiResult;
use crate::web::types::*;

const MISSING_CATEGORY: &str = "Missing 'category' parameter";

pub async fn research_job_trends_handler(
    request: Json<Body<ResearchTrendsRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<TrendsResponse>> {
    let category = required(request.into_inner().0.category, MISSING_CATEGORY)?;
    let api_key = state.config.completion.require_api_key()?;

    let trends = TrendResearcher::new(
        state.upstream.as_ref(),
        api_key,
        &state.config.completion.model,
    )
    .research(&state.db, &category)
    .await?;

    Ok(Json(TrendsResponse {
        success: true,
        trends,
    }))
}

pub async fn list_job_trends_handler(
    category: Option<String>,
    state: &State<AppState>,
) -> ApiResult<Json<TrendsResponse>> {
    let category = required(category, MISSING_CATEGORY)?;
    let trends = TrendRepository::new(state.db.pool())
        .list_category(&category)
        .await?;

    info!("Listed {} trends for {}", trends.len(), category);
    Ok(Json(TrendsResponse {
        success: true,
        trends,
    }))
}
