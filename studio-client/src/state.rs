//! Wizard state: the step machine, per-agent status and the data collected
//! along the way.

use std::fmt;

use serde::{Deserialize, Serialize};
use studio_core::{AnalyzeResponse, Idea, Platform, PublishResponse, SponsorshipResponse};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Setup,
    Creation,
    Publishing,
    Sponsorship,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Setup,
        WizardStep::Creation,
        WizardStep::Publishing,
        WizardStep::Sponsorship,
    ];

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Setup => 1,
            WizardStep::Creation => 2,
            WizardStep::Publishing => 3,
            WizardStep::Sponsorship => 4,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.number() * 25
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Setup => "Niche & Platform",
            WizardStep::Creation => "Ideas & Draft",
            WizardStep::Publishing => "Publish & Analyze",
            WizardStep::Sponsorship => "Sponsorship Outreach",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        WizardStep::Setup
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Ideation,
    Creation,
    Publishing,
    Analysis,
    Sponsorship,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Ideation,
        AgentKind::Creation,
        AgentKind::Publishing,
        AgentKind::Analysis,
        AgentKind::Sponsorship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Ideation => "ideation",
            AgentKind::Creation => "creation",
            AgentKind::Publishing => "publishing",
            AgentKind::Analysis => "analysis",
            AgentKind::Sponsorship => "sponsorship",
        }
    }

    fn index(&self) -> usize {
        match self {
            AgentKind::Ideation => 0,
            AgentKind::Creation => 1,
            AgentKind::Publishing => 2,
            AgentKind::Analysis => 3,
            AgentKind::Sponsorship => 4,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Working,
    Success,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Working => "working",
            AgentStatus::Success => "success",
            AgentStatus::Error => "error",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persistent status of each agent, independent of the current step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentBoard {
    statuses: [AgentStatus; 5],
}

impl AgentBoard {
    pub fn status(&self, kind: AgentKind) -> AgentStatus {
        self.statuses[kind.index()]
    }

    pub fn is_working(&self, kind: AgentKind) -> bool {
        self.status(kind) == AgentStatus::Working
    }

    /// Mark `kind` as working, refusing if it already is.
    pub fn try_begin(&mut self, kind: AgentKind) -> ClientResult<()> {
        if self.is_working(kind) {
            return Err(ClientError::Busy(kind));
        }
        self.statuses[kind.index()] = AgentStatus::Working;
        Ok(())
    }

    pub fn finish(&mut self, kind: AgentKind, ok: bool) {
        self.statuses[kind.index()] = if ok {
            AgentStatus::Success
        } else {
            AgentStatus::Error
        };
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentKind, AgentStatus)> + '_ {
        AgentKind::ALL.iter().map(|kind| (*kind, self.status(*kind)))
    }
}

/// What the user entered on the first step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub niche: String,
    pub platform: Platform,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub current_step: WizardStep,
    pub setup: Option<Setup>,
    pub ideas: Vec<Idea>,
    pub selected_idea: Option<Uuid>,
    pub drafted_content: Option<String>,
    pub last_publish: Option<PublishResponse>,
    pub last_analysis: Option<AnalyzeResponse>,
    pub last_sponsorship: Option<SponsorshipResponse>,
}

impl WorkflowState {
    pub fn progress_percent(&self) -> u8 {
        self.current_step.progress_percent()
    }

    pub fn selected(&self) -> Option<&Idea> {
        let id = self.selected_idea?;
        self.ideas.iter().find(|idea| idea.id == id)
    }

    /// Replace the idea list; any earlier selection and draft no longer apply.
    pub(crate) fn replace_ideas(&mut self, setup: Setup, ideas: Vec<Idea>) {
        self.setup = Some(setup);
        self.ideas = ideas;
        self.selected_idea = None;
        self.drafted_content = None;
        self.last_publish = None;
    }
}
