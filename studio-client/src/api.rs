//! HTTP access to the gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use studio_core::{
    AnalyzeRequest, AnalyzeResponse, DraftPostRequest, DraftPostResponse, ErrorBody,
    GenerateIdeasRequest, GenerateIdeasResponse, HealthResponse, PublishRequest, PublishResponse,
    SponsorshipRequest, SponsorshipResponse,
};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The gateway endpoints the wizard drives.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn health(&self) -> ClientResult<HealthResponse>;

    async fn generate_ideas(
        &self,
        request: &GenerateIdeasRequest,
    ) -> ClientResult<GenerateIdeasResponse>;

    async fn draft_post(&self, request: &DraftPostRequest) -> ClientResult<DraftPostResponse>;

    async fn publish(&self, request: &PublishRequest) -> ClientResult<PublishResponse>;

    async fn analyze_youtube(&self, request: &AnalyzeRequest) -> ClientResult<AnalyzeResponse>;

    async fn send_sponsorship(
        &self,
        request: &SponsorshipRequest,
    ) -> ClientResult<SponsorshipResponse>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    async fn health(&self) -> ClientResult<HealthResponse> {
        (**self).health().await
    }

    async fn generate_ideas(
        &self,
        request: &GenerateIdeasRequest,
    ) -> ClientResult<GenerateIdeasResponse> {
        (**self).generate_ideas(request).await
    }

    async fn draft_post(&self, request: &DraftPostRequest) -> ClientResult<DraftPostResponse> {
        (**self).draft_post(request).await
    }

    async fn publish(&self, request: &PublishRequest) -> ClientResult<PublishResponse> {
        (**self).publish(request).await
    }

    async fn analyze_youtube(&self, request: &AnalyzeRequest) -> ClientResult<AnalyzeResponse> {
        (**self).analyze_youtube(request).await
    }

    async fn send_sponsorship(
        &self,
        request: &SponsorshipRequest,
    ) -> ClientResult<SponsorshipResponse> {
        (**self).send_sponsorship(request).await
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {}{}", self.base_url, path);
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(response).await
    }
}

/// Turn a gateway response into `T`, or into `ClientError::Api` carrying the
/// gateway's `detail` for non-2xx statuses.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let (detail, error_code) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => (error.detail, Some(error.error_code)),
            Err(_) if body.trim().is_empty() => (
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                None,
            ),
            Err(_) => (body, None),
        };
        return Err(ClientError::Api {
            status: status.as_u16(),
            detail,
            error_code,
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("/api/health").await
    }

    async fn generate_ideas(
        &self,
        request: &GenerateIdeasRequest,
    ) -> ClientResult<GenerateIdeasResponse> {
        self.post("/api/generate-ideas", request).await
    }

    async fn draft_post(&self, request: &DraftPostRequest) -> ClientResult<DraftPostResponse> {
        self.post("/api/draft-post", request).await
    }

    async fn publish(&self, request: &PublishRequest) -> ClientResult<PublishResponse> {
        self.post("/api/publish", request).await
    }

    async fn analyze_youtube(&self, request: &AnalyzeRequest) -> ClientResult<AnalyzeResponse> {
        self.post("/api/youtube/analyze", request).await
    }

    async fn send_sponsorship(
        &self,
        request: &SponsorshipRequest,
    ) -> ClientResult<SponsorshipResponse> {
        self.post("/api/sponsorship/send", request).await
    }
}
