//! Request and response payloads of the gateway API.
//!
//! Request bodies are deserialized leniently (missing fields default to empty)
//! and then checked by `validate()`, which produces the typed input handed to
//! the workflow. That keeps every shape problem a validation error with a
//! useful message instead of a generic decode failure.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::idea::{Idea, IdeaCandidate, Platform};
use super::sponsorship::SponsorNiche;
use crate::error::{ErrorKind, StudioError, StudioResult};

fn required(field: &str, value: &str) -> StudioResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StudioError::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

fn optional_url(field: &str, value: Option<&str>) -> StudioResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(StudioError::invalid_field(
            field,
            "must be an http:// or https:// URL",
        )),
    }
}

fn platform(field: &str, value: &str) -> StudioResult<Platform> {
    required(field, value)?.parse()
}

static RE_VIDEO_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .ok()
});

/// Extract the 11-character video id from a YouTube link.
///
/// Handles `watch?v=`, `youtu.be/`, `shorts/`, `embed/` and `live/` forms.
pub fn youtube_video_id(link: &str) -> Option<String> {
    let captures = RE_VIDEO_ID.as_ref()?.captures(link.trim())?;
    captures.get(1).map(|m| m.as_str().to_string())
}

// ============================================================================
// Ideation
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateIdeasRequest {
    #[serde(default)]
    pub user_niche: String,
    #[serde(default)]
    pub platform_choice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeationInput {
    pub niche: String,
    pub platform: Platform,
    pub media_url: Option<String>,
}

impl GenerateIdeasRequest {
    pub fn new(niche: impl Into<String>, platform: Platform, media_url: Option<String>) -> Self {
        Self {
            user_niche: niche.into(),
            platform_choice: platform.to_string(),
            media_url,
        }
    }

    pub fn validate(&self) -> StudioResult<IdeationInput> {
        Ok(IdeationInput {
            niche: required("user_niche", &self.user_niche)?,
            platform: platform("platform_choice", &self.platform_choice)?,
            media_url: optional_url("media_url", self.media_url.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateIdeasResponse {
    pub ideas: Vec<Idea>,
    pub platform: Platform,
    pub niche: String,
}

// ============================================================================
// Drafting
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedIdeaPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl From<&Idea> for SelectedIdeaPayload {
    fn from(idea: &Idea) -> Self {
        Self {
            id: Some(idea.id),
            title: idea.title.clone(),
            summary: idea.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftPostRequest {
    #[serde(default)]
    pub selected_idea: Option<SelectedIdeaPayload>,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub niche: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftInput {
    pub idea: IdeaCandidate,
    pub platform: Platform,
    /// May be empty.
    pub niche: String,
    pub media_url: Option<String>,
}

impl DraftPostRequest {
    pub fn new(
        idea: &Idea,
        platform: Platform,
        niche: impl Into<String>,
        media_url: Option<String>,
    ) -> Self {
        Self {
            selected_idea: Some(SelectedIdeaPayload::from(idea)),
            platform: platform.to_string(),
            niche: niche.into(),
            media_url,
        }
    }

    pub fn validate(&self) -> StudioResult<DraftInput> {
        let idea = self
            .selected_idea
            .as_ref()
            .ok_or_else(|| StudioError::MissingField("selected_idea".to_string()))?;

        Ok(DraftInput {
            idea: IdeaCandidate::new(
                required("selected_idea.title", &idea.title)?,
                idea.summary.trim(),
            ),
            platform: platform("platform", &self.platform)?,
            niche: self.niche.trim().to_string(),
            media_url: optional_url("media_url", self.media_url.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPostResponse {
    pub post_draft: String,
    pub platform: Platform,
}

// ============================================================================
// Publishing
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub post_draft: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishInput {
    pub post_draft: String,
    pub platform: Platform,
    pub media_url: Option<String>,
}

impl PublishRequest {
    pub fn new(post_draft: impl Into<String>, platform: Platform, media_url: Option<String>) -> Self {
        Self {
            post_draft: post_draft.into(),
            platform: platform.to_string(),
            media_url,
        }
    }

    pub fn validate(&self) -> StudioResult<PublishInput> {
        Ok(PublishInput {
            post_draft: required("post_draft", &self.post_draft)?,
            platform: platform("platform", &self.platform)?,
            media_url: optional_url("media_url", self.media_url.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub post_id: Option<String>,
}

// ============================================================================
// Comment analysis
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub video_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeInput {
    pub video_link: String,
    pub video_id: String,
}

impl AnalyzeRequest {
    pub fn new(video_link: impl Into<String>) -> Self {
        Self {
            video_link: video_link.into(),
        }
    }

    pub fn validate(&self) -> StudioResult<AnalyzeInput> {
        let video_link = required("video_link", &self.video_link)?;
        let video_id = youtube_video_id(&video_link)
            .ok_or_else(|| StudioError::InvalidVideoLink(video_link.clone()))?;
        Ok(AnalyzeInput {
            video_link,
            video_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub video_link: String,
    pub video_id: String,
    pub comments_analyzed: usize,
    pub report: String,
}

// ============================================================================
// Sponsorship
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorshipRequest {
    #[serde(default)]
    pub niche: String,
}

impl SponsorshipRequest {
    pub fn new(niche: SponsorNiche) -> Self {
        Self {
            niche: niche.to_string(),
        }
    }

    pub fn validate(&self) -> StudioResult<SponsorNiche> {
        required("niche", &self.niche)?.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorshipResponse {
    pub niche: SponsorNiche,
    /// Entries in the recipient list, valid or not.
    pub emails_found: usize,
    pub emails_sent: Vec<String>,
    pub email_body: String,
}

// ============================================================================
// Service info
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of every non-2xx gateway response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub error_code: String,
    pub kind: ErrorKind,
}

impl From<&StudioError> for ErrorBody {
    fn from(err: &StudioError) -> Self {
        Self {
            detail: err.to_string(),
            error_code: err.error_code().to_string(),
            kind: err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_forms() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            id
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42"),
            id
        );
        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), id);
        assert_eq!(
            youtube_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            id
        );
    }

    #[test]
    fn test_video_id_rejects() {
        assert_eq!(youtube_video_id("https://vimeo.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(youtube_video_id(""), None);
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQx"),
            None
        );
    }

    #[test]
    fn test_video_id_embed_and_live() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(
            youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            id
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/live/dQw4w9WgXcQ?feature=share"),
            id
        );
    }

    #[test]
    fn test_generate_ideas_validation() {
        let ok = GenerateIdeasRequest {
            user_niche: "  Digital Marketing ".to_string(),
            platform_choice: "linkedin".to_string(),
            media_url: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.niche, "Digital Marketing");
        assert_eq!(ok.platform, Platform::LinkedIn);
        assert_eq!(ok.media_url, None);

        let empty_niche = GenerateIdeasRequest {
            user_niche: "   ".to_string(),
            platform_choice: "linkedin".to_string(),
            media_url: None,
        };
        assert!(matches!(
            empty_niche.validate(),
            Err(StudioError::MissingField(f)) if f == "user_niche"
        ));

        let bad_platform = GenerateIdeasRequest {
            user_niche: "Fitness".to_string(),
            platform_choice: "myspace".to_string(),
            media_url: None,
        };
        assert!(matches!(
            bad_platform.validate(),
            Err(StudioError::InvalidPlatform(_))
        ));

        let bad_media = GenerateIdeasRequest {
            user_niche: "Fitness".to_string(),
            platform_choice: "youtube".to_string(),
            media_url: Some("file:///etc/passwd".to_string()),
        };
        assert!(bad_media.validate().unwrap_err().is_validation_error());
    }

    #[test]
    fn test_lenient_decoding() {
        let req: GenerateIdeasRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());

        let req: DraftPostRequest =
            serde_json::from_str(r#"{"platform": "youtube", "niche": ""}"#).unwrap();
        assert!(matches!(
            req.validate(),
            Err(StudioError::MissingField(f)) if f == "selected_idea"
        ));
    }

    #[test]
    fn test_draft_validation_allows_empty_niche() {
        let idea = Idea::new("Hooks that work", "Three opening lines");
        let input = DraftPostRequest::new(&idea, Platform::YouTube, "", None)
            .validate()
            .unwrap();
        assert_eq!(input.idea.title, "Hooks that work");
        assert_eq!(input.niche, "");
        assert_eq!(input.platform, Platform::YouTube);
    }

    #[test]
    fn test_draft_request_carries_idea_id() {
        let idea = Idea::new("A", "B");
        let json = serde_json::to_value(DraftPostRequest::new(&idea, Platform::LinkedIn, "n", None))
            .unwrap();
        assert_eq!(json["selected_idea"]["id"], idea.id.to_string());
        assert_eq!(json["platform"], "linkedin");
        assert!(json.get("media_url").is_none());
    }

    #[test]
    fn test_publish_and_analyze_validation() {
        assert!(PublishRequest::new("  ", Platform::LinkedIn, None)
            .validate()
            .is_err());
        assert!(PublishRequest::new("Hello", Platform::YouTube, None)
            .validate()
            .is_ok());

        assert!(matches!(
            AnalyzeRequest::new("https://example.com/video").validate(),
            Err(StudioError::InvalidVideoLink(_))
        ));
        let input = AnalyzeRequest::new("https://youtu.be/dQw4w9WgXcQ")
            .validate()
            .unwrap();
        assert_eq!(input.video_id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_sponsorship_validation() {
        assert_eq!(
            SponsorshipRequest::new(SponsorNiche::MarketingMails)
                .validate()
                .unwrap(),
            SponsorNiche::MarketingMails
        );
        assert!(matches!(
            SponsorshipRequest::default().validate(),
            Err(StudioError::MissingField(_))
        ));
    }

    #[test]
    fn test_error_body_from_error() {
        let body = ErrorBody::from(&StudioError::MissingField("user_niche".to_string()));
        assert_eq!(body.error_code, "E1001");
        assert_eq!(body.kind, ErrorKind::Validation);
        assert!(body.detail.contains("user_niche"));
    }
}
