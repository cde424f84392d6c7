//! The API gateway: a stateless axum router over the [`Workflow`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};

use crate::config::UpstreamConfig;
use crate::error::{retry_async_with_config, with_deadline, ErrorKind, RetryConfig, StudioError, StudioResult};
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, DraftPostRequest, DraftPostResponse, ErrorBody,
    GenerateIdeasRequest, GenerateIdeasResponse, HealthResponse, PublishRequest, PublishResponse,
    SponsorshipRequest, SponsorshipResponse,
};
use crate::workflow::{accept_draft, accept_ideas, Workflow};

pub const SERVICE_NAME: &str = "Creator Studio API";

/// Deadline applied to every delegated call, plus the retry policy used for
/// the idempotent ones.
#[derive(Debug, Clone)]
pub struct UpstreamPolicy {
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl UpstreamPolicy {
    pub fn new(timeout: Duration, retry: RetryConfig) -> Self {
        Self { timeout, retry }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.timeout(), config.retry_config())
    }

    /// Each attempt gets its own deadline; transient failures are retried.
    async fn idempotent<T, F, Fut>(&self, operation: &str, call: F) -> StudioResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StudioResult<T>>,
    {
        let timeout = self.timeout;
        retry_async_with_config(|| with_deadline(operation, timeout, call()), self.retry.clone())
            .await
    }

    /// Exactly one attempt, for calls with external side effects.
    async fn once<T, Fut>(&self, operation: &str, call: Fut) -> StudioResult<T>
    where
        Fut: Future<Output = StudioResult<T>>,
    {
        with_deadline(operation, self.timeout, call).await
    }
}

impl Default for UpstreamPolicy {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub workflow: Workflow,
    pub policy: UpstreamPolicy,
}

pub fn app_state(workflow: Workflow, policy: UpstreamPolicy) -> AppState {
    Arc::new(AppStateInner { workflow, policy })
}

impl StudioError {
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}

fn rejected(rejection: JsonRejection) -> StudioError {
    StudioError::MalformedRequest(rejection.body_text())
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/generate-ideas": "Generate content ideas",
            "POST /api/draft-post": "Draft a post or video script",
            "POST /api/publish": "Publish content",
            "POST /api/youtube/analyze": "Analyze YouTube comments",
            "POST /api/sponsorship/send": "Send sponsorship emails",
            "GET /api/health": "Health check"
        }
    }))
}

async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

async fn api_generate_ideas(
    State(state): State<AppState>,
    payload: Result<Json<GenerateIdeasRequest>, JsonRejection>,
) -> Result<Json<GenerateIdeasResponse>, StudioError> {
    let Json(request) = payload.map_err(rejected)?;
    let input = request.validate()?;

    let ideation = &state.workflow.ideation;
    let input_ref = &input;
    let ideas = state
        .policy
        .idempotent("idea generation", || async move {
            accept_ideas(ideation.generate_ideas(input_ref).await?)
        })
        .await?;

    info!(count = ideas.len(), niche = %input.niche, "Ideas generated");

    Ok(Json(GenerateIdeasResponse {
        ideas,
        platform: input.platform,
        niche: input.niche,
    }))
}

async fn api_draft_post(
    State(state): State<AppState>,
    payload: Result<Json<DraftPostRequest>, JsonRejection>,
) -> Result<Json<DraftPostResponse>, StudioError> {
    let Json(request) = payload.map_err(rejected)?;
    let input = request.validate()?;

    let ideation = &state.workflow.ideation;
    let input_ref = &input;
    let post_draft = state
        .policy
        .idempotent("drafting", || async move {
            accept_draft(ideation.draft(input_ref).await?)
        })
        .await?;

    Ok(Json(DraftPostResponse {
        post_draft,
        platform: input.platform,
    }))
}

async fn api_publish(
    State(state): State<AppState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, StudioError> {
    let Json(request) = payload.map_err(rejected)?;
    let input = request.validate()?;

    let response = state
        .policy
        .once("publishing", state.workflow.publisher.publish(&input))
        .await?;

    Ok(Json(response))
}

async fn api_youtube_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, StudioError> {
    let Json(request) = payload.map_err(rejected)?;
    let input = request.validate()?;

    let analyzer = &state.workflow.analyzer;
    let input_ref = &input;
    let response = state
        .policy
        .idempotent("comment analysis", || async move {
            analyzer.analyze(input_ref).await
        })
        .await?;

    Ok(Json(response))
}

async fn api_sponsorship_send(
    State(state): State<AppState>,
    payload: Result<Json<SponsorshipRequest>, JsonRejection>,
) -> Result<Json<SponsorshipResponse>, StudioError> {
    let Json(request) = payload.map_err(rejected)?;
    let niche = request.validate()?;

    let response = state
        .policy
        .once("sponsorship", state.workflow.sponsorship.send(niche))
        .await?;

    Ok(Json(response))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_root))
        .route("/api/health", get(api_health))
        .route("/api/generate-ideas", post(api_generate_ideas))
        .route("/api/draft-post", post(api_draft_post))
        .route("/api/publish", post(api_publish))
        .route("/api/youtube/analyze", post(api_youtube_analyze))
        .route("/api/sponsorship/send", post(api_sponsorship_send))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<S>(listener: TcpListener, state: AppState, shutdown: S) -> StudioResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> StudioResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API server listening on {}", listener.local_addr()?);

    serve_on(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await
}
