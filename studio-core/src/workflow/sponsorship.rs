use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::llm::ChatClient;
use super::SponsorMailer;
use crate::config::SponsorshipConfig;
use crate::error::{StudioError, StudioResult};
use crate::models::{
    address_tokens, is_valid_email, CreatorProfile, SponsorNiche, SponsorshipResponse,
};

/// Delivers one plain-text message to a list of recipients.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, recipients: &[String], subject: &str, body: &str) -> StudioResult<()>;
}

/// Load the raw recipient list for `niche` from the assets JSON file.
///
/// The file is an object of `niche key -> [address, ...]`. A missing key is an
/// empty list; a missing or unreadable file is an error.
pub async fn load_recipients(path: &Path, niche: SponsorNiche) -> StudioResult<Vec<String>> {
    let unavailable = |message: String| StudioError::AssetsUnavailable {
        path: path.display().to_string(),
        message,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    let mut lists: HashMap<String, Vec<String>> =
        serde_json::from_str(&raw).map_err(|e| unavailable(e.to_string()))?;

    Ok(lists.remove(niche.assets_key()).unwrap_or_default())
}

/// Recipients of one send: every address-shaped token across the list's
/// entries (`found`) and the valid subset that is actually mailed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSet {
    pub found: usize,
    pub deliverable: Vec<String>,
}

pub fn recipient_set(entries: &[String]) -> RecipientSet {
    let mut tokens: Vec<String> = Vec::new();
    for entry in entries {
        for token in address_tokens(entry) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }

    RecipientSet {
        found: tokens.len(),
        deliverable: tokens.into_iter().filter(|t| is_valid_email(t)).collect(),
    }
}

fn draft_prompt(profile: &CreatorProfile) -> String {
    format!(
        "You are an expert ghostwriter for a social media influencer. Your task is to draft a \
         professional, concise, and compelling sponsorship email.\n\
         Here is the influencer's data:\n\
         - Niche: {}\n\
         - YouTube Subscribers: {}\n\
         - Instagram Followers: {}\n\
         - LinkedIn Followers: {}\n\
         - YouTube Profile: {}\n\
         - Instagram Profile: {}\n\
         - LinkedIn Profile: {}\n\
         Draft a short email suitable for a marketing department. The tone should be friendly \
         yet professional. Clearly state the influencer's niche, audience size, and a brief \
         value proposition. Do not include a subject line or a salutation (e.g., \"Hi,\"). \
         End with \"Best regards,\" followed by \"{}\".\n\
         Draft:",
        profile.niche,
        profile.youtube_subscribers,
        profile.insta_followers,
        profile.linkedin_followers,
        profile.youtube_url,
        profile.insta_url,
        profile.linkedin_url,
        profile.signature,
    )
}

/// Drafts a sponsorship pitch from the creator profile and mails it to a
/// niche's recipient list.
pub struct LlmSponsorMailer {
    chat: ChatClient,
    temperature: f32,
    transport: Arc<dyn MailTransport>,
    assets_path: PathBuf,
    subject: String,
    profile: CreatorProfile,
}

impl LlmSponsorMailer {
    pub fn new(
        chat: ChatClient,
        temperature: f32,
        transport: Arc<dyn MailTransport>,
        config: &SponsorshipConfig,
    ) -> Self {
        Self {
            chat,
            temperature,
            transport,
            assets_path: config.assets_path.clone(),
            subject: config.subject.clone(),
            profile: config.creator.clone(),
        }
    }
}

#[async_trait]
impl SponsorMailer for LlmSponsorMailer {
    async fn send(&self, niche: SponsorNiche) -> StudioResult<SponsorshipResponse> {
        let entries = load_recipients(&self.assets_path, niche).await?;
        let RecipientSet {
            found,
            deliverable: recipients,
        } = recipient_set(&entries);

        info!(
            niche = %niche,
            entries = entries.len(),
            found,
            deliverable = recipients.len(),
            "Loaded sponsor recipients"
        );

        let email_body = self
            .chat
            .complete(&draft_prompt(&self.profile), self.temperature)
            .await?;

        if recipients.is_empty() {
            warn!(niche = %niche, "No deliverable addresses, nothing sent");
            return Ok(SponsorshipResponse {
                niche,
                emails_found: found,
                emails_sent: Vec::new(),
                email_body,
            });
        }

        self.transport
            .deliver(&recipients, &self.subject, &email_body)
            .await?;

        info!(niche = %niche, sent = recipients.len(), "Sponsorship emails sent");

        Ok(SponsorshipResponse {
            niche,
            emails_found: found,
            emails_sent: recipients,
            email_body,
        })
    }
}

#[cfg(feature = "email")]
pub use smtp::SmtpTransport;

#[cfg(feature = "email")]
mod smtp {
    use std::time::Duration;

    use async_trait::async_trait;
    use lettre::message::{header::ContentType, Mailbox};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
    use tracing::debug;

    use super::MailTransport;
    use crate::config::SmtpConfig;
    use crate::error::{StudioError, StudioResult};

    /// STARTTLS SMTP delivery via lettre.
    pub struct SmtpTransport {
        config: SmtpConfig,
        timeout: Duration,
    }

    impl SmtpTransport {
        pub fn new(config: SmtpConfig, timeout: Duration) -> Self {
            Self { config, timeout }
        }

        fn credentials(&self) -> StudioResult<(String, Credentials)> {
            let missing = || {
                StudioError::MissingCredential(
                    "EMAIL_ADDRESS / EMAIL_PASSWORD (sponsorship.smtp)".to_string(),
                )
            };
            let username = self.config.username.clone().ok_or_else(missing)?;
            // app passwords are often pasted with spaces
            let password = self
                .config
                .password
                .as_deref()
                .ok_or_else(missing)?
                .replace(' ', "");
            let sender = self.config.sender().ok_or_else(missing)?.to_string();
            Ok((sender, Credentials::new(username, password)))
        }
    }

    fn mailbox(address: &str) -> StudioResult<Mailbox> {
        address.parse::<Mailbox>().map_err(|e| {
            StudioError::EmailDeliveryFailed(format!("invalid address '{}': {}", address, e))
        })
    }

    #[async_trait]
    impl MailTransport for SmtpTransport {
        async fn deliver(
            &self,
            recipients: &[String],
            subject: &str,
            body: &str,
        ) -> StudioResult<()> {
            let (sender, credentials) = self.credentials()?;

            let mut builder = Message::builder()
                .from(mailbox(&sender)?)
                .subject(subject)
                .header(ContentType::TEXT_PLAIN);
            for recipient in recipients {
                builder = builder.to(mailbox(recipient)?);
            }
            let message = builder.body(body.to_string())?;

            let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
                .port(self.config.port)
                .credentials(credentials)
                .timeout(Some(self.timeout))
                .build();

            debug!(host = %self.config.host, port = self.config.port, "Sending via SMTP");
            mailer.send(message).await?;
            Ok(())
        }
    }
}

/// Stand-in used when the crate is built without the `email` feature.
pub struct DisabledTransport;

#[async_trait]
impl MailTransport for DisabledTransport {
    async fn deliver(&self, _: &[String], _: &str, _: &str) -> StudioResult<()> {
        Err(StudioError::NotSupported(
            "email delivery (built without the `email` feature)".to_string(),
        ))
    }
}
