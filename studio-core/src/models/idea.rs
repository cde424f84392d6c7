use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StudioError;

/// Publishing target. Lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linkedin")]
    LinkedIn,
    #[serde(rename = "youtube")]
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::LinkedIn, Platform::YouTube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::YouTube => "youtube",
        }
    }

    /// What a draft for this platform is called.
    pub fn draft_kind(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "post",
            Platform::YouTube => "video script",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::YouTube => "YouTube",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "youtube" => Ok(Platform::YouTube),
            other => Err(StudioError::InvalidPlatform(other.to_string())),
        }
    }
}

/// A generated content idea. Immutable once created; selection refers to `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
}

impl Idea {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// Raw idea as produced by the ideation collaborator, before quality checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl IdeaCandidate {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }

    /// Trim both fields and assign an id; `None` if either is blank.
    pub fn into_idea(self) -> Option<Idea> {
        let title = self.title.trim();
        let summary = self.summary.trim();
        if title.is_empty() || summary.is_empty() {
            return None;
        }
        Some(Idea::new(title, summary))
    }
}
