// src/error.rs
//! Request-boundary error type rendered as `{ "error": "..." }`

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use tracing::{error, warn};

use crate::web::types::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0} is not configured")]
    Configuration(&'static str),

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI credits depleted. Please contact support.")]
    QuotaExhausted,

    #[error("AI gateway error: {0}")]
    Upstream(u16),

    #[error("Failed to parse trends data")]
    ParseFailed,

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::InvalidInput(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::RateLimited => Status::TooManyRequests,
            ApiError::QuotaExhausted => Status::PaymentRequired,
            ApiError::Configuration(_)
            | ApiError::Upstream(_)
            | ApiError::ParseFailed
            | ApiError::Store(_)
            | ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Maps a non-success upstream status to the caller-visible kind.
    pub fn from_upstream_status(status: u16) -> Self {
        match status {
            429 => ApiError::RateLimited,
            402 => ApiError::QuotaExhausted,
            other => ApiError::Upstream(other),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {} failed: {:#}", request.method(), request.uri(), self);
        } else {
            warn!("{} {} rejected: {}", request.method(), request.uri(), self);
        }

        (status, Json(ErrorResponse::new(self.to_string()))).respond_to(request)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
