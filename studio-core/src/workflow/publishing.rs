use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::Publisher;
use crate::config::LinkedInConfig;
use crate::error::{StudioError, StudioResult};
use crate::models::{Platform, PublishInput, PublishResponse};

const SERVICE: &str = "linkedin";

pub const YOUTUBE_PREPARED_MESSAGE: &str = "YouTube script prepared (no direct publish integration)";
pub const LINKEDIN_PUBLISHED_MESSAGE: &str = "Successfully published to LinkedIn";

const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaCategory {
    Image,
    Video,
}

impl MediaCategory {
    fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        if [".mp4", ".mov", ".m4v", ".webm"]
            .iter()
            .any(|ext| path.ends_with(ext))
        {
            MediaCategory::Video
        } else {
            MediaCategory::Image
        }
    }

    fn recipe(&self) -> &'static str {
        match self {
            MediaCategory::Image => "urn:li:digitalmediaRecipe:feedshare-image",
            MediaCategory::Video => "urn:li:digitalmediaRecipe:feedshare-video",
        }
    }

    fn share_category(&self) -> &'static str {
        match self {
            MediaCategory::Image => "IMAGE",
            MediaCategory::Video => "VIDEO",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadValue {
    asset: String,
    upload_mechanism: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UgcPostResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Publishes LinkedIn posts through the UGC API. YouTube drafts are only
/// acknowledged; there is no upload integration for scripts.
pub struct LinkedInPublisher {
    client: Client,
    api_base: String,
    access_token: Option<String>,
    author_urn: Option<String>,
}

struct UploadedMedia {
    asset: String,
    category: MediaCategory,
}

impl LinkedInPublisher {
    pub fn new(client: Client, config: &LinkedInConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            author_urn: config.author_urn.clone(),
        }
    }

    fn credentials(&self) -> StudioResult<(&str, &str)> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            StudioError::MissingCredential("LINKEDIN_ACCESS_TOKEN (linkedin.access_token)".into())
        })?;
        let author = self.author_urn.as_deref().ok_or_else(|| {
            StudioError::MissingCredential("LINKEDIN_AUTHOR_URN (linkedin.author_urn)".into())
        })?;
        Ok((token, author))
    }

    async fn upload_media(
        &self,
        token: &str,
        author: &str,
        media_url: &str,
    ) -> StudioResult<UploadedMedia> {
        let category = MediaCategory::from_url(media_url);

        let register_body = json!({
            "registerUploadRequest": {
                "recipes": [category.recipe()],
                "owner": author,
                "serviceRelationships": [{
                    "relationshipType": "OWNER",
                    "identifier": "urn:li:userGeneratedContent"
                }]
            }
        });

        let response = self
            .client
            .post(format!("{}/v2/assets?action=registerUpload", self.api_base))
            .bearer_auth(token)
            .json(&register_body)
            .send()
            .await?;
        let registered: RegisterUploadResponse = check(response, "register upload")
            .await?
            .json()
            .await
            .map_err(|e| StudioError::upstream_parse(SERVICE, e.to_string()))?;

        let upload_url = registered
            .value
            .upload_mechanism
            .get(UPLOAD_MECHANISM)
            .and_then(|m| m.get("uploadUrl"))
            .and_then(|u| u.as_str())
            .ok_or_else(|| {
                StudioError::upstream_parse(SERVICE, "registerUpload response has no uploadUrl")
            })?
            .to_string();

        debug!(asset = %registered.value.asset, "Registered LinkedIn upload");

        let media = self.client.get(media_url).send().await?;
        let status = media.status();
        if !status.is_success() {
            return Err(StudioError::publish_failed(
                SERVICE,
                format!("could not fetch media from {} (HTTP {})", media_url, status.as_u16()),
            ));
        }
        let bytes = media.bytes().await?;

        let response = self
            .client
            .put(&upload_url)
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await?;
        check(response, "media upload").await?;

        info!(asset = %registered.value.asset, "Uploaded media to LinkedIn");

        Ok(UploadedMedia {
            asset: registered.value.asset,
            category,
        })
    }

    async fn create_post(
        &self,
        token: &str,
        author: &str,
        text: &str,
        media: Option<&UploadedMedia>,
    ) -> StudioResult<Option<String>> {
        let share_content = match media {
            Some(media) => json!({
                "shareCommentary": { "text": text },
                "shareMediaCategory": media.category.share_category(),
                "media": [{ "status": "READY", "media": media.asset }]
            }),
            None => json!({
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }),
        };

        let body = json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": { "com.linkedin.ugc.ShareContent": share_content },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
        });

        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await?;
        let response = check(response, "create post").await?;

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body_id = response
            .json::<UgcPostResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        Ok(header_id.or(body_id))
    }
}

/// Turn a non-2xx LinkedIn response into an error that names the failed step.
async fn check(response: Response, step: &str) -> StudioResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match StudioError::from_status(SERVICE, status.as_u16(), &body) {
        StudioError::UpstreamRequestFailed { message, .. } => Err(StudioError::publish_failed(
            SERVICE,
            format!("{} failed: {}", step, message),
        )),
        other => Err(other),
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish(&self, input: &PublishInput) -> StudioResult<PublishResponse> {
        if input.platform == Platform::YouTube {
            info!("YouTube draft acknowledged without upload");
            return Ok(PublishResponse {
                success: true,
                message: YOUTUBE_PREPARED_MESSAGE.to_string(),
                post_id: None,
            });
        }

        let (token, author) = self.credentials()?;

        let media = match &input.media_url {
            Some(url) => Some(self.upload_media(token, author, url).await?),
            None => None,
        };

        let post_id = self
            .create_post(token, author, &input.post_draft, media.as_ref())
            .await?;

        info!(post_id = ?post_id, "Published to LinkedIn");

        Ok(PublishResponse {
            success: true,
            message: LINKEDIN_PUBLISHED_MESSAGE.to_string(),
            post_id,
        })
    }
}
