//! Client side of Creator Studio: a typed gateway client and the four-step
//! wizard that drives it.

pub mod api;
pub mod controller;
pub mod error;
pub mod notice;
pub mod state;

pub use api::{Gateway, GatewayClient, DEFAULT_GATEWAY_URL, DEFAULT_REQUEST_TIMEOUT};
pub use controller::{WizardController, WizardView};
pub use error::{ClientError, ClientResult};
pub use notice::{Notice, NoticeLevel, NoticeQueue, NOTICE_DURATION};
pub use state::{AgentBoard, AgentKind, AgentStatus, Setup, WizardStep, WorkflowState};
