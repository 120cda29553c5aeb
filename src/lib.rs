pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use web::start_web_server;
