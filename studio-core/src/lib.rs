pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod workflow;

pub use config::{
    get_config_dir, ConfigLoadError, LinkedInConfig, LlmConfig, LoggingConfig, ServerConfig,
    SmtpConfig, SponsorshipConfig, StudioConfig, UpstreamConfig, YouTubeConfig,
};
pub use error::{
    retry_async_with_config, with_deadline, ErrorKind, RetryConfig, StudioError, StudioResult,
};
pub use http::{app_state, router, serve, serve_on, AppState, UpstreamPolicy, SERVICE_NAME};
pub use logging::init_logging;
pub use models::{
    AnalyzeRequest, AnalyzeResponse, CreatorProfile, DraftPostRequest, DraftPostResponse,
    ErrorBody, GenerateIdeasRequest, GenerateIdeasResponse, HealthResponse, Idea, IdeaCandidate,
    Platform, PublishRequest, PublishResponse, SponsorNiche, SponsorshipRequest,
    SponsorshipResponse,
};
pub use workflow::{CommentAnalyzer, Ideation, Publisher, SponsorMailer, Workflow};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
