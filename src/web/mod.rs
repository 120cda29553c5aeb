// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, patch, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::core::{Database, GroqClient};
use crate::error::ApiResult;
use crate::types::{InterviewSession, VideoInterviewSession};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, OPTIONS",
        ));
    }
}

// Interview and research routes, mounted at the root and under /functions/v1

#[post("/interview-chat", data = "<request>")]
pub async fn interview_chat(
    request: Json<Body<InterviewChatRequest>>,
    state: &State<AppState>,
) -> ApiResult<EventStreamResponse> {
    handlers::interview_chat_handler(request, state).await
}

#[post("/adaptive-interview-chat", data = "<request>")]
pub async fn adaptive_interview_chat(
    request: Json<Body<AdaptiveChatRequest>>,
    state: &State<AppState>,
) -> ApiResult<EventStreamResponse> {
    handlers::adaptive_interview_chat_handler(request, state).await
}

#[post("/research-job-trends", data = "<request>")]
pub async fn research_job_trends(
    request: Json<Body<ResearchTrendsRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<TrendsResponse>> {
    handlers::research_job_trends_handler(request, state).await
}

// Session and trend records under /api

#[post("/interview-sessions", data = "<request>")]
pub async fn create_interview_session(
    request: Json<Body<CreateInterviewSessionRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<InterviewSession>> {
    handlers::create_interview_session_handler(request, state).await
}

#[get("/interview-sessions?<user_id>&<limit>")]
pub async fn list_interview_sessions(
    user_id: Option<String>,
    limit: Option<i64>,
    state: &State<AppState>,
) -> ApiResult<Json<Vec<InterviewSession>>> {
    handlers::list_interview_sessions_handler(user_id, limit, state).await
}

#[patch("/interview-sessions/<id>", data = "<request>")]
pub async fn update_interview_session(
    id: &str,
    request: Json<UpdateInterviewSessionRequest>,
    state: &State<AppState>,
) -> ApiResult<Json<InterviewSession>> {
    handlers::update_interview_session_handler(id, request, state).await
}

#[post("/video-sessions", data = "<request>")]
pub async fn create_video_session(
    request: Json<Body<CreateVideoSessionRequest>>,
    state: &State<AppState>,
) -> ApiResult<Json<VideoInterviewSession>> {
    handlers::create_video_session_handler(request, state).await
}

#[patch("/video-sessions/<id>", data = "<request>")]
pub async fn update_video_session(
    id: &str,
    request: Json<UpdateVideoSessionRequest>,
    state: &State<AppState>,
) -> ApiResult<Json<VideoInterviewSession>> {
    handlers::update_video_session_handler(id, request, state).await
}

#[get("/job-trends?<category>")]
pub async fn list_job_trends(
    category: Option<String>,
    state: &State<AppState>,
) -> ApiResult<Json<TrendsResponse>> {
    handlers::list_job_trends_handler(category, state).await
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> (Status, Json<HealthResponse>) {
    handlers::health_handler(state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request format".to_string()))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(format!("Not found: {}", request.uri())))
}

#[rocket::catch(422)]
pub fn unprocessable_entity() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request body".to_string()))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error".to_string()))
}

/// Assembles the server around already-initialized state. Nothing is bound until launch.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", state.config.port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable_entity, internal_error],
        )
        .mount(
            "/",
            routes![
                interview_chat,
                adaptive_interview_chat,
                research_job_trends,
                options,
            ],
        )
        .mount(
            "/functions/v1",
            routes![interview_chat, adaptive_interview_chat, research_job_trends],
        )
        .mount(
            "/api",
            routes![
                create_interview_session,
                list_interview_sessions,
                update_interview_session,
                create_video_session,
                update_video_session,
                list_job_trends,
                health,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let db = match Database::connect(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    let upstream = Arc::new(GroqClient::new(&config.completion)?);

    info!("Starting Voke interview API server");
    info!("Environment: {}", config.environment);
    info!("Database: {}", config.database_url);
    info!("Completion API: {} (model: {})", config.completion.api_url, config.completion.model);
    info!("Server: http://0.0.0.0:{}", config.port);

    let state = AppState {
        config,
        upstream,
        db,
    };

    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server stopped with error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;
    use crate::core::completion_client::{ByteChunkStream, ChatCompletions};
    use crate::core::prompt_builder::SKILL_GAPS_PLACEHOLDER;
    use crate::core::sessions::VideoSessionUpdate;
    use crate::core::trends::TrendRepository;
    use crate::error::ApiError;
    use crate::types::response::{CompletionRequest, CompletionResponse};
    use crate::types::{Role, VideoStatus};
    use bytes::Bytes;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Reply {
        Chunks(Vec<&'static str>),
        BrokenAfter(&'static str),
        Answer(&'static str),
        Status(u16),
    }

    /// Completion upstream that records every call instead of touching the network.
    struct RecordingUpstream {
        calls: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
        reply: Reply,
    }

    impl RecordingUpstream {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn record(&self, request: &CompletionRequest) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
        }
    }

    #[rocket::async_trait]
    impl ChatCompletions for RecordingUpstream {
        async fn stream(&self, _: &str, request: &CompletionRequest) -> ApiResult<ByteChunkStream> {
            self.record(request);
            let items: Vec<std::io::Result<Bytes>> = match &self.reply {
                Reply::Chunks(chunks) => chunks.iter().map(|c| Ok(Bytes::from(c.to_string()))).collect(),
                Reply::BrokenAfter(chunk) => vec![
                    Ok(Bytes::from(chunk.to_string())),
                    Err(std::io::Error::other("connection reset")),
                    Ok(Bytes::from("data: never sent\n\n")),
                ],
                Reply::Status(code) => return Err(ApiError::from_upstream_status(*code)),
                Reply::Answer(_) => panic!("chat endpoints always stream"),
            };
            Ok(Box::pin(futures_util::stream::iter(items)))
        }

        async fn complete(&self, _: &str, request: &CompletionRequest) -> ApiResult<CompletionResponse> {
            self.record(request);
            match &self.reply {
                Reply::Answer(text) => Ok(serde_json::from_value(json!({
                    "choices": [{ "message": { "role": "assistant", "content": text } }]
                }))
                .unwrap()),
                Reply::Status(code) => Err(ApiError::from_upstream_status(*code)),
                _ => panic!("research never streams"),
            }
        }
    }

    const HELLO_STREAM: [&str; 2] = [
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
    ];

    const TWO_BACKEND_TRENDS: &str = "```json\n{\"trends\":[{\"title\":\"Platform engineering\",\"demand_level\":\"high\",\"trending_skills\":[\"Kubernetes\"]},{\"title\":\"Rust services\",\"demand_level\":\"very high\"}]}\n```";

    fn test_config(api_key: Option<&str>) -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            port: 0,
            completion: CompletionConfig {
                api_key: api_key.map(str::to_string),
                api_url: "http://127.0.0.1:9".to_string(),
                model: "test-model".to_string(),
                timeout_seconds: 5,
            },
            database_url: "sqlite::memory:".to_string(),
        }
    }

    async fn client_with(upstream: Arc<RecordingUpstream>, api_key: Option<&str>) -> (Client, Database) {
        let db = Database::in_memory().await.unwrap();
        let state = AppState {
            config: test_config(api_key),
            upstream,
            db: db.clone(),
        };
        let client = Client::tracked(build_rocket(state)).await.unwrap();
        (client, db)
    }

    async fn post_json(client: &Client, path: &str, body: Value) -> (Status, Option<ContentType>, String) {
        let response = client
            .post(path)
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        let content_type = response.content_type();
        (status, content_type, response.into_string().await.unwrap_or_default())
    }

    fn error_of(body: &str) -> String {
        let value: Value = serde_json::from_str(body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_interview_chat_relays_stream_verbatim() {
        let upstream = RecordingUpstream::new(Reply::Chunks(HELLO_STREAM.to_vec()));
        let (client, _db) = client_with(upstream.clone(), Some("key")).await;

        let (status, content_type, body) = post_json(
            &client,
            "/interview-chat",
            json!({ "messages": [{ "role": "user", "content": "Explain hashing" }], "interviewType": "technical" }),
        )
        .await;

        assert_eq!(status, Status::Ok);
        assert_eq!(content_type, Some(ContentType::new("text", "event-stream")));
        assert_eq!(body, HELLO_STREAM.concat());

        let request = upstream.last_request();
        assert_eq!(request.model, "test-model");
        assert!(request.stream);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, Some(2000));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Focus on technical skills"));
        assert_eq!(request.messages[1].content, "Explain hashing");
    }

    #[tokio::test]
    async fn test_adaptive_prompt_without_skill_gaps_uses_placeholder() {
        let upstream = RecordingUpstream::new(Reply::Chunks(HELLO_STREAM.to_vec()));
        let (client, _db) = client_with(upstream.clone(), Some("key")).await;

        let (status, _, _) = post_json(
            &client,
            "/adaptive-interview-chat",
            json!({ "messages": [{ "role": "user", "content": "Start" }], "userId": "u-1" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let request = upstream.last_request();
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains(SKILL_GAPS_PLACEHOLDER));
        assert_eq!(request.messages[1], crate::types::ChatMessage::user("Start"));
    }

    #[tokio::test]
    async fn test_adaptive_prompt_reflects_stored_history() {
        let upstream = RecordingUpstream::new(Reply::Chunks(HELLO_STREAM.to_vec()));
        let (client, db) = client_with(upstream.clone(), Some("key")).await;

        let (status, _, body) = post_json(
            &client,
            "/api/interview-sessions",
            json!({ "userId": "u-1", "interviewType": "technical" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        let session: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(session["status"], "in_progress");

        let videos = crate::core::sessions::VideoSessionRepository::new(db.pool());
        for score in [70, 81] {
            let video = videos.create("u-1", Some("Tell me about a conflict")).await.unwrap();
            let update = VideoSessionUpdate {
                status: Some(VideoStatus::Completed),
                overall_score: Some(score),
                ..Default::default()
            };
            videos.update(&video.id, &update).await.unwrap();
        }

        post_json(
            &client,
            "/adaptive-interview-chat",
            json!({ "messages": [], "userId": "u-1", "skillGaps": [{ "skill": "System Design" }] }),
        )
        .await;

        let prompt = upstream.last_request().messages[0].content.clone();
        assert!(prompt.contains("- Completed 1 text interview sessions"));
        assert!(prompt.contains("- Completed 2 video interview sessions"));
        assert!(prompt.contains("- Average video score: 76"));
        assert!(prompt.contains("System Design"));
        assert!(!prompt.contains("history is incomplete"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_upstream_call() {
        let upstream = RecordingUpstream::new(Reply::Answer(TWO_BACKEND_TRENDS));
        let (client, _db) = client_with(upstream.clone(), None).await;

        let requests = [
            ("/interview-chat", json!({ "messages": [] })),
            ("/adaptive-interview-chat", json!({ "messages": [], "userId": "u-1" })),
            ("/research-job-trends", json!({ "category": "backend" })),
        ];
        for (path, body) in requests {
            let (status, _, body) = post_json(&client, path, body).await;
            assert_eq!(status, Status::InternalServerError, "{}", path);
            assert_eq!(error_of(&body), "GROQ_API_KEY is not configured");
        }

        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_input_validation_runs_before_key_check() {
        let upstream = RecordingUpstream::new(Reply::Chunks(HELLO_STREAM.to_vec()));
        let (client, _db) = client_with(upstream.clone(), None).await;

        let cases = [
            ("/interview-chat", json!({}), "Missing or invalid 'messages' parameter"),
            ("/interview-chat", json!({ "messages": "hi" }), "Missing or invalid 'messages' parameter"),
            ("/adaptive-interview-chat", json!({ "userId": "u-1" }), "Missing or invalid 'messages' parameter"),
            ("/adaptive-interview-chat", json!({ "messages": [] }), "Missing 'userId' parameter"),
            ("/adaptive-interview-chat", json!({ "messages": [], "userId": "" }), "Missing 'userId' parameter"),
            ("/research-job-trends", json!({}), "Missing 'category' parameter"),
            ("/interview-chat", json!([]), "Missing or invalid 'messages' parameter"),
            ("/adaptive-interview-chat", json!(null), "Missing or invalid 'messages' parameter"),
            ("/research-job-trends", json!(null), "Missing 'category' parameter"),
            ("/research-job-trends", json!(["backend"]), "Missing 'category' parameter"),
        ];
        for (path, body, message) in cases {
            let (status, _, body) = post_json(&client, path, body).await;
            assert_eq!(status, Status::BadRequest, "{}", path);
            assert_eq!(error_of(&body), message);
        }

        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_statuses_are_mapped() {
        let cases = [
            (429, Status::TooManyRequests, "Rate limit exceeded. Please try again in a moment."),
            (402, Status::PaymentRequired, "AI credits depleted. Please contact support."),
            (503, Status::InternalServerError, "AI gateway error: 503"),
        ];
        for (upstream_status, expected, message) in cases {
            let upstream = RecordingUpstream::new(Reply::Status(upstream_status));
            let (client, _db) = client_with(upstream, Some("key")).await;

            let (status, _, body) =
                post_json(&client, "/interview-chat", json!({ "messages": [] })).await;
            assert_eq!(status, expected);
            assert_eq!(error_of(&body), message);
        }
    }

    #[tokio::test]
    async fn test_mid_stream_error_ends_body() {
        let upstream = RecordingUpstream::new(Reply::BrokenAfter(HELLO_STREAM[0]));
        let (client, _db) = client_with(upstream, Some("key")).await;

        let (status, _, body) =
            post_json(&client, "/interview-chat", json!({ "messages": [] })).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body, HELLO_STREAM[0]);
    }

    #[tokio::test]
    async fn test_research_replaces_category_through_endpoint() {
        let upstream = RecordingUpstream::new(Reply::Answer(TWO_BACKEND_TRENDS));
        let (client, db) = client_with(upstream.clone(), Some("key")).await;

        let repo = TrendRepository::new(db.pool());
        let seed = |category: &str, title: &str| {
            crate::types::TrendRecord::from_entry(
                category,
                serde_json::from_value(json!({ "title": title })).unwrap(),
                chrono::Utc::now(),
            )
        };
        repo.replace_category("backend", &[seed("backend", "old-1"), seed("backend", "old-2"), seed("backend", "old-3")])
            .await
            .unwrap();
        repo.replace_category("data", &[seed("data", "dbt")]).await.unwrap();

        let (status, _, body) = post_json(
            &client,
            "/functions/v1/research-job-trends",
            json!({ "category": "backend" }),
        )
        .await;
        assert_eq!(status, Status::Ok);

        let response: TrendsResponse = serde_json::from_str(&body).unwrap();
        assert!(response.success);
        assert_eq!(response.trends.len(), 2);
        assert!(response.trends.iter().all(|t| t.category == "backend"));

        let request = upstream.last_request();
        assert!(!request.stream);
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.messages[0].role, Role::User);

        let listed = client.get("/api/job-trends?category=backend").dispatch().await;
        assert_eq!(listed.status(), Status::Ok);
        let listed: TrendsResponse = listed.into_json().await.unwrap();
        let titles: Vec<_> = listed.trends.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Platform engineering", "Rust services"]);

        assert_eq!(repo.list_category("data").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_research_answer_is_500() {
        let upstream = RecordingUpstream::new(Reply::Answer("no json here"));
        let (client, _db) = client_with(upstream, Some("key")).await;

        let (status, _, body) =
            post_json(&client, "/research-job-trends", json!({ "category": "backend" })).await;
        assert_eq!(status, Status::InternalServerError);
        assert_eq!(error_of(&body), "Failed to parse trends data");
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let upstream = RecordingUpstream::new(Reply::Chunks(vec![]));
        let (client, _db) = client_with(upstream, Some("key")).await;

        for path in ["/interview-chat", "/functions/v1/research-job-trends", "/api/video-sessions/x"] {
            let response = client.options(path).dispatch().await;
            assert_eq!(response.status(), Status::Ok);
            let headers = response.headers();
            assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some("*"));
            assert_eq!(
                headers.get_one("Access-Control-Allow-Headers"),
                Some("authorization, x-client-info, apikey, content-type")
            );
            assert_eq!(
                headers.get_one("Access-Control-Allow-Methods"),
                Some("POST, GET, PATCH, OPTIONS")
            );
            assert!(response.into_string().await.unwrap_or_default().is_empty());
        }
    }

    #[tokio::test]
    async fn test_session_updates_and_missing_ids() {
        let upstream = RecordingUpstream::new(Reply::Chunks(vec![]));
        let (client, _db) = client_with(upstream, Some("key")).await;

        let (_, _, body) = post_json(
            &client,
            "/api/interview-sessions",
            json!({ "userId": "u-2", "interviewType": "behavioral" }),
        )
        .await;
        let created: Value = serde_json::from_str(&body).unwrap();
        let id = created["id"].as_str().unwrap();

        let response = client
            .patch(format!("/api/interview-sessions/{}", id))
            .header(ContentType::JSON)
            .body(json!({ "status": "completed", "overallScore": 88 }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: Value = response.into_json().await.unwrap();
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["overall_score"], 88);

        let listed = client
            .get("/api/interview-sessions?user_id=u-2")
            .dispatch()
            .await;
        let listed: Vec<Value> = listed.into_json().await.unwrap();
        assert_eq!(listed.len(), 1);

        let missing = client
            .patch("/api/video-sessions/does-not-exist")
            .header(ContentType::JSON)
            .body(json!({ "status": "failed" }).to_string())
            .dispatch()
            .await;
        assert_eq!(missing.status(), Status::NotFound);

        let (status, _, body) = post_json(&client, "/api/video-sessions", json!({ "question": "q" })).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(error_of(&body), "Missing 'userId' parameter");
    }

    #[tokio::test]
    async fn test_catchers_use_error_envelope() {
        let upstream = RecordingUpstream::new(Reply::Chunks(vec![]));
        let (client, _db) = client_with(upstream, Some("key")).await;

        let response = client.get("/nope").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
        let body = response.into_string().await.unwrap();
        assert!(error_of(&body).starts_with("Not found"));

        let response = client
            .post("/interview-chat")
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_string().await.unwrap();
        assert_eq!(error_of(&body), "Invalid request format");
    }

    #[tokio::test]
    async fn test_health() {
        let upstream = RecordingUpstream::new(Reply::Chunks(vec![]));
        let (client, _db) = client_with(upstream, None).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let health: HealthResponse = response.into_json().await.unwrap();
        assert_eq!(health.database, "ok");
    }
}
