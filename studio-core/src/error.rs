//! Error types for the Creator Studio core library.
//!
//! Every failure that can reach the API gateway is a [`StudioError`]. The
//! gateway only distinguishes two caller-facing kinds, validation and
//! upstream, plus an internal bucket for local faults; the finer variants
//! exist for logging, retry decisions and user suggestions.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Validation | Missing or malformed request fields |
//! | E2001-E2099 | Upstream | LLM, platform API, comment source and mail delivery failures |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Caller-facing classification of a [`StudioError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The request was rejected at the boundary before any delegation.
    Validation,
    /// The workflow collaborator failed, timed out or returned garbage.
    Upstream,
    /// A local fault unrelated to the request contents.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 for doubling)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry policy for idempotent upstream calls (idea generation, drafting,
    /// comment analysis). `retries` counts attempts after the first one.
    pub fn for_upstream(retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: retries + 1,
            initial_delay,
            ..Self::default()
        }
    }

    /// Single attempt. Used for calls with external side effects.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            // up to 25% extra
            let jitter_factor = 1.0 + (rand_jitter() * 0.25);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Cheap jitter source in [0.0, 1.0) derived from the clock.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// The main error type for the Creator Studio core library.
#[derive(Debug, Error)]
pub enum StudioError {
    // ========================================================================
    // Validation Errors (E1001-E1099)
    // ========================================================================
    /// A required field is absent or blank
    #[error("[E1001] Missing required field: {0}")]
    MissingField(String),

    /// A field is present but its value is unusable
    #[error("[E1002] Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Platform is not one of the supported publishing targets
    #[error("[E1003] Unsupported platform '{0}' (expected 'linkedin' or 'youtube')")]
    InvalidPlatform(String),

    /// The link does not resolve to a YouTube video id
    #[error("[E1004] Not a YouTube video link: {0}")]
    InvalidVideoLink(String),

    /// Sponsorship niche is not one of the known recipient lists
    #[error("[E1005] Unknown sponsorship niche: {0}")]
    InvalidSponsorNiche(String),

    /// The body could not be decoded as the expected JSON shape
    #[error("[E1006] Malformed request body: {0}")]
    MalformedRequest(String),

    // ========================================================================
    // Upstream Errors (E2001-E2099)
    // ========================================================================
    /// Request to an upstream service failed
    #[error("[E2001] {service} request failed: {message}")]
    UpstreamRequestFailed { service: String, message: String },

    /// Upstream responded with a body we could not interpret
    #[error("[E2002] Failed to parse {service} response: {message}")]
    UpstreamParseError { service: String, message: String },

    /// Upstream rate limit hit
    #[error("[E2003] Rate limit exceeded for {service}, retry after {retry_after_secs} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: u64,
    },

    /// Upstream rejected our credentials
    #[error("[E2004] Authentication failed for {service}: {message}")]
    AuthenticationFailed { service: String, message: String },

    /// Upstream could not be reached
    #[error("[E2005] Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream call exceeded its deadline
    #[error("[E2006] {operation} timed out after {secs} seconds")]
    UpstreamTimeout { operation: String, secs: u64 },

    /// Upstream answered but produced nothing usable
    #[error("[E2007] {operation} produced no usable output")]
    EmptyResult { operation: String },

    /// Platform publish call failed
    #[error("[E2008] Publishing to {platform} failed: {message}")]
    PublishFailed { platform: String, message: String },

    /// SMTP delivery failed
    #[error("[E2009] Email delivery failed: {0}")]
    EmailDeliveryFailed(String),

    /// Sponsor recipient list could not be loaded
    #[error("[E2010] Sponsor assets unavailable at {path}: {message}")]
    AssetsUnavailable { path: String, message: String },

    /// A credential needed to reach an upstream service is not configured
    #[error("[E2011] Missing credential: {0}")]
    MissingCredential(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Operation not supported by this build
    #[error("[E9002] Operation not supported: {0}")]
    NotSupported(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Creator Studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

impl StudioError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::UpstreamRequestFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn upstream_parse(service: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::UpstreamParseError {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn empty_result(operation: impl Into<String>) -> Self {
        StudioError::EmptyResult {
            operation: operation.into(),
        }
    }

    pub fn publish_failed(platform: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::PublishFailed {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Map an upstream HTTP status to the matching variant.
    pub fn from_status(service: &str, status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, truncate(body.trim(), 300))
        };

        match status {
            429 => StudioError::RateLimited {
                service: service.to_string(),
                retry_after_secs: 60,
            },
            401 | 403 => StudioError::AuthenticationFailed {
                service: service.to_string(),
                message,
            },
            502..=504 => StudioError::ServiceUnavailable(format!("{}: {}", service, message)),
            _ => StudioError::upstream(service, message),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

fn service_of(err: &reqwest::Error) -> String {
    err.url()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "upstream".to_string())
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        let service = service_of(&err);
        if err.is_timeout() {
            StudioError::UpstreamTimeout {
                operation: format!("{} request", service),
                secs: 0,
            }
        } else if err.is_connect() {
            StudioError::ServiceUnavailable(format!("{}: {}", service, err))
        } else if err.is_status() {
            match err.status() {
                Some(status) => StudioError::from_status(&service, status.as_u16(), ""),
                None => StudioError::upstream(service, err.to_string()),
            }
        } else if err.is_decode() {
            StudioError::upstream_parse(service, err.to_string())
        } else {
            StudioError::upstream(service, err.to_string())
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::IoError(err.to_string())
    }
}

#[cfg(feature = "email")]
impl From<lettre::transport::smtp::Error> for StudioError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        if err.is_transient() {
            StudioError::ServiceUnavailable(format!("smtp: {}", err))
        } else {
            StudioError::EmailDeliveryFailed(err.to_string())
        }
    }
}

#[cfg(feature = "email")]
impl From<lettre::error::Error> for StudioError {
    fn from(err: lettre::error::Error) -> Self {
        StudioError::EmailDeliveryFailed(format!("could not build message: {}", err))
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl StudioError {
    /// Fold the variant into the caller-facing kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudioError::MissingField(_)
            | StudioError::InvalidField { .. }
            | StudioError::InvalidPlatform(_)
            | StudioError::InvalidVideoLink(_)
            | StudioError::InvalidSponsorNiche(_)
            | StudioError::MalformedRequest(_) => ErrorKind::Validation,

            StudioError::UpstreamRequestFailed { .. }
            | StudioError::UpstreamParseError { .. }
            | StudioError::RateLimited { .. }
            | StudioError::AuthenticationFailed { .. }
            | StudioError::ServiceUnavailable(_)
            | StudioError::UpstreamTimeout { .. }
            | StudioError::EmptyResult { .. }
            | StudioError::PublishFailed { .. }
            | StudioError::EmailDeliveryFailed(_)
            | StudioError::AssetsUnavailable { .. }
            | StudioError::MissingCredential(_) => ErrorKind::Upstream,

            StudioError::Internal(_)
            | StudioError::NotSupported(_)
            | StudioError::IoError(_)
            | StudioError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_upstream_error(&self) -> bool {
        self.kind() == ErrorKind::Upstream
    }

    /// Returns true if this error is transient and the operation might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StudioError::RateLimited { .. }
                | StudioError::ServiceUnavailable(_)
                | StudioError::UpstreamTimeout { .. }
                | StudioError::UpstreamParseError { .. }
                | StudioError::EmptyResult { .. }
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            StudioError::MissingField(_) => "E1001",
            StudioError::InvalidField { .. } => "E1002",
            StudioError::InvalidPlatform(_) => "E1003",
            StudioError::InvalidVideoLink(_) => "E1004",
            StudioError::InvalidSponsorNiche(_) => "E1005",
            StudioError::MalformedRequest(_) => "E1006",
            StudioError::UpstreamRequestFailed { .. } => "E2001",
            StudioError::UpstreamParseError { .. } => "E2002",
            StudioError::RateLimited { .. } => "E2003",
            StudioError::AuthenticationFailed { .. } => "E2004",
            StudioError::ServiceUnavailable(_) => "E2005",
            StudioError::UpstreamTimeout { .. } => "E2006",
            StudioError::EmptyResult { .. } => "E2007",
            StudioError::PublishFailed { .. } => "E2008",
            StudioError::EmailDeliveryFailed(_) => "E2009",
            StudioError::AssetsUnavailable { .. } => "E2010",
            StudioError::MissingCredential(_) => "E2011",
            StudioError::Internal(_) => "E9001",
            StudioError::NotSupported(_) => "E9002",
            StudioError::IoError(_) => "E9003",
            StudioError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            StudioError::InvalidPlatform(_) => Some("Use 'linkedin' or 'youtube'"),
            StudioError::InvalidVideoLink(_) => {
                Some("Pass a full link such as https://www.youtube.com/watch?v=<id>")
            }
            StudioError::RateLimited { .. } => {
                Some("Wait for the rate limit to reset or use a different API key")
            }
            StudioError::AuthenticationFailed { .. } => {
                Some("Check the API key or access token in the configuration")
            }
            StudioError::MissingCredential(_) => {
                Some("Set the credential in a .env file or the STUDIO_* environment variables")
            }
            StudioError::AssetsUnavailable { .. } => {
                Some("Point sponsorship.assets_path at a JSON file of recipient lists")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_validation_error() {
            info!(error_code = %code, "Request rejected: {}", self);
        } else if self.is_transient() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Transient error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// Deadline and retry utilities
// ============================================================================

/// Run `fut` under a deadline, mapping expiry to [`StudioError::UpstreamTimeout`].
pub async fn with_deadline<T, Fut>(operation: &str, deadline: Duration, fut: Fut) -> StudioResult<T>
where
    Fut: Future<Output = StudioResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StudioError::UpstreamTimeout {
            operation: operation.to_string(),
            secs: deadline.as_secs(),
        }),
    }
}

/// Execute an async operation with retry logic based on error configuration.
///
/// Non-transient errors are returned immediately; transient ones are retried
/// until `config.max_attempts` is reached.
pub async fn retry_async_with_config<F, Fut, T>(
    operation: F,
    config: RetryConfig,
) -> StudioResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = StudioResult<T>>,
{
    let mut last_error = None;
    let max_attempts = config.max_attempts.max(1);

    for attempt in 0..max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        "Operation succeeded on attempt {} after {} retries",
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_transient() || attempt == max_attempts - 1 {
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Attempt {} failed ({}), retrying in {:?}",
                    attempt + 1,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| StudioError::Internal("Retry loop exhausted without error".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_error_display() {
        let err = StudioError::MissingField("user_niche".to_string());
        assert!(err.to_string().contains("E1001"));
        assert!(err.to_string().contains("user_niche"));

        let err = StudioError::publish_failed("linkedin", "token expired");
        assert!(err.to_string().contains("E2008"));
        assert!(err.to_string().contains("linkedin"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            StudioError::MissingField("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            StudioError::InvalidPlatform("tiktok".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            StudioError::upstream("groq", "boom").kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            StudioError::MissingCredential("GROQ_API_KEY".to_string()).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            StudioError::Internal("oops".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(ErrorKind::Upstream.to_string(), "upstream");
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            StudioError::from_status("groq", 429, ""),
            StudioError::RateLimited { .. }
        ));
        assert!(matches!(
            StudioError::from_status("linkedin", 401, "bad token"),
            StudioError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            StudioError::from_status("youtube", 503, ""),
            StudioError::ServiceUnavailable(_)
        ));
        let err = StudioError::from_status("groq", 400, "bad request body");
        assert!(matches!(err, StudioError::UpstreamRequestFailed { .. }));
        assert!(err.to_string().contains("bad request body"));
    }

    #[test]
    fn test_is_transient() {
        assert!(StudioError::ServiceUnavailable("503".to_string()).is_transient());
        assert!(StudioError::empty_result("idea generation").is_transient());
        assert!(StudioError::UpstreamTimeout {
            operation: "draft".to_string(),
            secs: 30
        }
        .is_transient());

        assert!(!StudioError::MissingField("niche".to_string()).is_transient());
        assert!(!StudioError::EmailDeliveryFailed("550".to_string()).is_transient());
        assert!(!StudioError::publish_failed("linkedin", "422").is_transient());
    }

    #[test]
    fn test_retry_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn test_retry_presets() {
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
        assert_eq!(
            RetryConfig::for_upstream(2, Duration::from_millis(10)).max_attempts,
            3
        );
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: StudioResult<()> = retry_async_with_config(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StudioError::publish_failed("linkedin", "rejected"))
                }
            },
            RetryConfig::for_upstream(3, Duration::from_millis(1)),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_async_with_config(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(StudioError::ServiceUnavailable("groq".to_string()))
                    } else {
                        Ok("ok")
                    }
                }
            },
            RetryConfig::for_upstream(2, Duration::from_millis(50)),
        )
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_times_out() {
        let result: StudioResult<()> =
            with_deadline("idea generation", Duration::from_secs(2), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        match result {
            Err(StudioError::UpstreamTimeout { operation, secs }) => {
                assert_eq!(operation, "idea generation");
                assert_eq!(secs, 2);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_result: Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let err: StudioError = json_result.unwrap_err().into();
        assert!(matches!(err, StudioError::SerializationError(_)));
    }

    #[test]
    fn test_user_suggestions() {
        assert!(StudioError::InvalidPlatform("x".to_string())
            .user_suggestion()
            .is_some());
        assert!(StudioError::Internal("err".to_string())
            .user_suggestion()
            .is_none());
    }
}
