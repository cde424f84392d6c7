use thiserror::Error;
use uuid::Uuid;

use crate::state::{AgentKind, WizardStep};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Gateway returned {status}: {detail}")]
    Api {
        status: u16,
        detail: String,
        error_code: Option<String>,
    },

    #[error("Could not reach the gateway: {0}")]
    Transport(String),

    #[error("Unexpected response from the gateway: {0}")]
    Decode(String),

    #[error("{0} agent is already working")]
    Busy(AgentKind),

    #[error("No idea selected")]
    NoSelection,

    #[error("Idea {index} is out of range ({len} available)")]
    IdeaOutOfRange { index: usize, len: usize },

    #[error("Unknown idea: {0}")]
    UnknownIdea(Uuid),

    #[error("'{action}' is not available at step {step}")]
    InvalidStep {
        action: &'static str,
        step: WizardStep,
    },

    /// The call finished but the state it was made for is gone.
    #[error("{agent} result discarded: {reason}")]
    Superseded {
        agent: AgentKind,
        reason: &'static str,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// True when the call never left the client.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Busy(_)
                | ClientError::NoSelection
                | ClientError::IdeaOutOfRange { .. }
                | ClientError::UnknownIdea(_)
                | ClientError::InvalidStep { .. }
        )
    }

    pub fn superseded(agent: AgentKind, reason: &'static str) -> Self {
        ClientError::Superseded { agent, reason }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
