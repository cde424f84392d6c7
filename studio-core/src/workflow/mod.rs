//! The workflow collaborator behind the gateway.
//!
//! Each concern is a trait so the gateway can run against mocks; the concrete
//! implementations talk to an OpenAI-compatible LLM, LinkedIn, the YouTube
//! Data API and SMTP.

pub mod analysis;
pub mod ideation;
pub mod llm;
pub mod publishing;
pub mod sponsorship;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::models::{
    AnalyzeInput, AnalyzeResponse, DraftInput, Idea, IdeaCandidate, IdeationInput, PublishInput,
    PublishResponse, SponsorNiche, SponsorshipResponse,
};

pub use analysis::{YouTubeCommentAnalyzer, YouTubeComments, NO_COMMENTS_REPORT};
pub use ideation::LlmIdeation;
pub use llm::ChatClient;
pub use publishing::{LinkedInPublisher, LINKEDIN_PUBLISHED_MESSAGE, YOUTUBE_PREPARED_MESSAGE};
#[cfg(feature = "email")]
pub use sponsorship::SmtpTransport;
pub use sponsorship::{DisabledTransport, LlmSponsorMailer, MailTransport};

#[async_trait]
pub trait Ideation: Send + Sync {
    async fn generate_ideas(&self, input: &IdeationInput) -> StudioResult<Vec<IdeaCandidate>>;

    /// LinkedIn gets a post, YouTube a video script.
    async fn draft(&self, input: &DraftInput) -> StudioResult<String>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, input: &PublishInput) -> StudioResult<PublishResponse>;
}

#[async_trait]
pub trait CommentAnalyzer: Send + Sync {
    async fn analyze(&self, input: &AnalyzeInput) -> StudioResult<AnalyzeResponse>;
}

#[async_trait]
pub trait SponsorMailer: Send + Sync {
    async fn send(&self, niche: SponsorNiche) -> StudioResult<SponsorshipResponse>;
}

/// Shared, immutable bundle of collaborators.
#[derive(Clone)]
pub struct Workflow {
    pub ideation: Arc<dyn Ideation>,
    pub publisher: Arc<dyn Publisher>,
    pub analyzer: Arc<dyn CommentAnalyzer>,
    pub sponsorship: Arc<dyn SponsorMailer>,
}

impl Workflow {
    pub fn new(
        ideation: Arc<dyn Ideation>,
        publisher: Arc<dyn Publisher>,
        analyzer: Arc<dyn CommentAnalyzer>,
        sponsorship: Arc<dyn SponsorMailer>,
    ) -> Self {
        Self {
            ideation,
            publisher,
            analyzer,
            sponsorship,
        }
    }

    /// Wire the HTTP/SMTP-backed collaborators from configuration.
    pub fn from_config(config: &StudioConfig) -> StudioResult<Self> {
        let timeout = config.upstream.timeout();
        let client = Client::builder()
            .user_agent(concat!("creator-studio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let chat = ChatClient::new(client.clone(), &config.llm);

        let ideation = LlmIdeation::new(
            chat.clone(),
            config.llm.ideation_temperature,
            config.llm.temperature,
        );
        let publisher = LinkedInPublisher::new(client.clone(), &config.linkedin);
        let analyzer = YouTubeCommentAnalyzer::new(
            YouTubeComments::new(client, &config.youtube),
            chat.clone(),
            config.llm.temperature,
        );

        #[cfg(feature = "email")]
        let transport: Arc<dyn MailTransport> =
            Arc::new(SmtpTransport::new(config.sponsorship.smtp.clone(), timeout));
        #[cfg(not(feature = "email"))]
        let transport: Arc<dyn MailTransport> = Arc::new(DisabledTransport);

        let sponsorship =
            LlmSponsorMailer::new(chat, config.llm.temperature, transport, &config.sponsorship);

        Ok(Self::new(
            Arc::new(ideation),
            Arc::new(publisher),
            Arc::new(analyzer),
            Arc::new(sponsorship),
        ))
    }
}

/// Drop candidates with a blank title or summary and assign ids.
/// Nothing left is an upstream failure.
pub fn accept_ideas(candidates: Vec<IdeaCandidate>) -> StudioResult<Vec<Idea>> {
    let total = candidates.len();
    let ideas: Vec<Idea> = candidates
        .into_iter()
        .filter_map(IdeaCandidate::into_idea)
        .collect();

    if ideas.len() < total {
        tracing::debug!("Dropped {} incomplete ideas", total - ideas.len());
    }

    if ideas.is_empty() {
        return Err(StudioError::empty_result("idea generation"));
    }
    Ok(ideas)
}

/// Reject blank drafts.
pub fn accept_draft(draft: String) -> StudioResult<String> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return Err(StudioError::empty_result("drafting"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_ideas_filters_incomplete() {
        let ideas = accept_ideas(vec![
            IdeaCandidate::new("Good", "Complete"),
            IdeaCandidate::new("", "No title"),
            IdeaCandidate::new("No summary", " "),
        ])
        .unwrap();

        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Good");
    }

    #[test]
    fn test_accept_ideas_empty_is_upstream() {
        let err = accept_ideas(vec![IdeaCandidate::default()]).unwrap_err();
        assert!(err.is_upstream_error());
        assert!(accept_ideas(Vec::new()).is_err());
    }

    #[test]
    fn test_accept_draft() {
        assert_eq!(accept_draft("  Hello  ".to_string()).unwrap(), "Hello");
        assert!(accept_draft("\n\n".to_string()).unwrap_err().is_upstream_error());
    }

    #[test]
    fn test_from_config_builds() {
        assert!(Workflow::from_config(&StudioConfig::default()).is_ok());
    }
}
