// src/web/handlers/system_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::web::types::*;

pub async fn health_handler(state: &State<AppState>) -> (Status, Json<HealthResponse>) {
    match state.db.health_check().await {
        Ok(()) => {
            info!("Health check ok");
            (
                Status::Ok,
                Json(HealthResponse {
                    status: "ok".to_string(),
                    database: "ok".to_string(),
                }),
            )
        }
        Err(e) => {
            error!("Health check failed: {:#}", e);
            (
                Status::ServiceUnavailable,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    database: "unavailable".to_string(),
                }),
            )
        }
    }
}
