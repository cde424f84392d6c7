use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// Named recipient list in the sponsor assets file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorNiche {
    MarketingMails,
    TechMails,
    FinanceMails,
    LifestyleMails,
}

impl SponsorNiche {
    pub const ALL: [SponsorNiche; 4] = [
        SponsorNiche::MarketingMails,
        SponsorNiche::TechMails,
        SponsorNiche::FinanceMails,
        SponsorNiche::LifestyleMails,
    ];

    /// Key of this list in the assets JSON object.
    pub fn assets_key(&self) -> &'static str {
        match self {
            SponsorNiche::MarketingMails => "marketing_mails",
            SponsorNiche::TechMails => "tech_mails",
            SponsorNiche::FinanceMails => "finance_mails",
            SponsorNiche::LifestyleMails => "lifestyle_mails",
        }
    }
}

impl std::fmt::Display for SponsorNiche {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.assets_key())
    }
}

impl FromStr for SponsorNiche {
    type Err = StudioError;

    /// Accepts the full key (`tech_mails`) or its short form (`tech`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let short = normalized.strip_suffix("_mails").unwrap_or(&normalized);
        match short {
            "marketing" => Ok(SponsorNiche::MarketingMails),
            "tech" => Ok(SponsorNiche::TechMails),
            "finance" => Ok(SponsorNiche::FinanceMails),
            "lifestyle" => Ok(SponsorNiche::LifestyleMails),
            _ => Err(StudioError::InvalidSponsorNiche(s.trim().to_string())),
        }
    }
}

/// Audience facts the sponsorship email is drafted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    #[serde(default = "default_niche")]
    pub niche: String,
    #[serde(default = "default_youtube_subscribers")]
    pub youtube_subscribers: u64,
    #[serde(default = "default_insta_followers")]
    pub insta_followers: u64,
    #[serde(default = "default_linkedin_followers")]
    pub linkedin_followers: u64,
    #[serde(default = "default_youtube_url")]
    pub youtube_url: String,
    #[serde(default = "default_insta_url")]
    pub insta_url: String,
    #[serde(default = "default_linkedin_url")]
    pub linkedin_url: String,
    #[serde(default = "default_signature")]
    pub signature: String,
}

fn default_niche() -> String {
    "tech reviews".to_string()
}

fn default_youtube_subscribers() -> u64 {
    55_000
}

fn default_insta_followers() -> u64 {
    15_000
}

fn default_linkedin_followers() -> u64 {
    8_000
}

fn default_youtube_url() -> String {
    "youtube.com/mytechchannel".to_string()
}

fn default_insta_url() -> String {
    "instagram.com/mytechchannel".to_string()
}

fn default_linkedin_url() -> String {
    "linkedin.com/in/mytechchannel".to_string()
}

fn default_signature() -> String {
    "Influencer's Name".to_string()
}

impl Default for CreatorProfile {
    fn default() -> Self {
        Self {
            niche: default_niche(),
            youtube_subscribers: default_youtube_subscribers(),
            insta_followers: default_insta_followers(),
            linkedin_followers: default_linkedin_followers(),
            youtube_url: default_youtube_url(),
            insta_url: default_insta_url(),
            linkedin_url: default_linkedin_url(),
            signature: default_signature(),
        }
    }
}

static RE_ADDRESS_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w.-]+").ok());

static RE_VALID_EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_%+-]+(?:\.[A-Za-z0-9_%+-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .ok()
});

/// Address-shaped tokens (`something@something`) in free text, in order,
/// without duplicates. Tokens are not validated.
pub fn address_tokens(text: &str) -> Vec<String> {
    let Some(re) = RE_ADDRESS_TOKEN.as_ref() else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let token = m.as_str().trim_end_matches(['.', '-']);
        if !found.iter().any(|f| f == token) {
            found.push(token.to_string());
        }
    }
    found
}

/// Valid addresses in free text, in order, without duplicates.
pub fn extract_emails(text: &str) -> Vec<String> {
    address_tokens(text)
        .into_iter()
        .filter(|token| is_valid_email(token))
        .collect()
}

/// Syntactic check: a dot-separated local part and a dotted domain with an
/// alphabetic TLD.
pub fn is_valid_email(address: &str) -> bool {
    RE_VALID_EMAIL
        .as_ref()
        .is_some_and(|re| re.is_match(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sponsor_niche_parse() {
        assert_eq!(
            "marketing_mails".parse::<SponsorNiche>().unwrap(),
            SponsorNiche::MarketingMails
        );
        assert_eq!("Tech".parse::<SponsorNiche>().unwrap(), SponsorNiche::TechMails);
        assert!(matches!(
            "gaming_mails".parse::<SponsorNiche>(),
            Err(StudioError::InvalidSponsorNiche(_))
        ));
        assert!("".parse::<SponsorNiche>().is_err());
    }

    #[test]
    fn test_sponsor_niche_keys() {
        for niche in SponsorNiche::ALL {
            assert_eq!(niche.assets_key().parse::<SponsorNiche>().unwrap(), niche);
            assert_eq!(
                serde_json::to_string(&niche).unwrap(),
                format!("\"{}\"", niche.assets_key())
            );
        }
    }

    #[test]
    fn test_creator_profile_defaults() {
        let profile = CreatorProfile::default();
        assert_eq!(profile.niche, "tech reviews");
        assert_eq!(profile.youtube_subscribers, 55_000);
        assert_eq!(profile.insta_followers, 15_000);
        assert_eq!(profile.linkedin_followers, 8_000);
        assert_eq!(profile.linkedin_url, "linkedin.com/in/mytechchannel");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("partnerships@brand.com"));
        assert!(is_valid_email("first.last+promo@mail.brand.co"));

        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@brand.com"));
        assert!(!is_valid_email("team@localhost"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("team@brand..com"));
        assert!(!is_valid_email("team@brand.c0m"));
        assert!(!is_valid_email(".team@brand.com"));
        assert!(!is_valid_email("team@-brand.com"));
    }

    #[test]
    fn test_extract_emails() {
        let text = "- ads@acme.io\n- Contact: growth@startup.dev, ads@acme.io.\n- n/a";
        assert_eq!(
            extract_emails(text),
            vec!["ads@acme.io".to_string(), "growth@startup.dev".to_string()]
        );
        assert!(extract_emails("no addresses here").is_empty());
    }

    #[test]
    fn test_address_tokens_include_invalid() {
        let text = "ads@acme.io, team@localhost; ads@acme.io";
        assert_eq!(
            address_tokens(text),
            vec!["ads@acme.io".to_string(), "team@localhost".to_string()]
        );
        assert_eq!(extract_emails(text), vec!["ads@acme.io".to_string()]);
    }
}
