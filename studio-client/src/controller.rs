//! The wizard controller.
//!
//! All state lives behind one mutex that is never held across a gateway
//! call: an action validates and marks its agent `working` under the lock,
//! releases it for the request, and re-acquires it to apply the result.
//! Actions on different agents can therefore overlap, while a second action
//! on a busy agent is refused before anything is dispatched.

use std::sync::{Mutex, MutexGuard, PoisonError};

use studio_core::{
    AnalyzeRequest, AnalyzeResponse, DraftPostRequest, GenerateIdeasRequest, Idea, Platform,
    PublishRequest, PublishResponse, SponsorNiche, SponsorshipRequest, SponsorshipResponse,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::Gateway;
use crate::error::{ClientError, ClientResult};
use crate::notice::{Notice, NoticeQueue};
use crate::state::{AgentBoard, AgentKind, AgentStatus, Setup, WizardStep, WorkflowState};

#[derive(Debug, Default)]
struct Inner {
    state: WorkflowState,
    agents: AgentBoard,
    notices: NoticeQueue,
    /// Bumped by `reset`; results of calls started before it are dropped.
    epoch: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One in-flight call. If the caller abandons the future before the result
/// is applied, the agent ends in `error` with a notice.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    kind: AgentKind,
    epoch: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.epoch == self.epoch && inner.agents.is_working(self.kind) {
            warn!(agent = %self.kind, "Call abandoned");
            inner.agents.finish(self.kind, false);
            inner.notices.error(format!("{} call abandoned", self.kind));
        }
    }
}

/// Read-only projection of the wizard for rendering.
#[derive(Debug, Clone)]
pub struct WizardView {
    pub step: WizardStep,
    pub step_title: &'static str,
    pub progress_percent: u8,
    pub setup: Option<Setup>,
    pub ideas: Vec<Idea>,
    pub selected_idea: Option<Idea>,
    pub drafted_content: Option<String>,
    pub agents: Vec<(AgentKind, AgentStatus)>,
    pub notices: Vec<Notice>,
    pub last_publish: Option<PublishResponse>,
    pub last_analysis: Option<AnalyzeResponse>,
    pub last_sponsorship: Option<SponsorshipResponse>,
}

impl WizardView {
    pub fn agent(&self, kind: AgentKind) -> AgentStatus {
        self.agents
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, status)| *status)
            .unwrap_or_default()
    }
}

pub struct WizardController<G: Gateway> {
    gateway: G,
    inner: Mutex<Inner>,
}

impl<G: Gateway> WizardController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn step(&self) -> WizardStep {
        lock(&self.inner).state.current_step
    }

    pub fn agent_status(&self, kind: AgentKind) -> AgentStatus {
        lock(&self.inner).agents.status(kind)
    }

    /// Snapshot of the collected data.
    pub fn state(&self) -> WorkflowState {
        lock(&self.inner).state.clone()
    }

    /// Snapshot for rendering; expired notices are pruned here.
    pub fn view(&self) -> WizardView {
        let mut inner = lock(&self.inner);
        let notices = inner.notices.active();
        let state = &inner.state;

        WizardView {
            step: state.current_step,
            step_title: state.current_step.title(),
            progress_percent: state.progress_percent(),
            setup: state.setup.clone(),
            ideas: state.ideas.clone(),
            selected_idea: state.selected().cloned(),
            drafted_content: state.drafted_content.clone(),
            agents: inner.agents.iter().collect(),
            notices,
            last_publish: state.last_publish.clone(),
            last_analysis: state.last_analysis.clone(),
            last_sponsorship: state.last_sponsorship.clone(),
        }
    }

    /// Validate under the lock, then mark `kind` working.
    fn begin<R>(
        &self,
        kind: AgentKind,
        prepare: impl FnOnce(&WorkflowState) -> ClientResult<R>,
    ) -> ClientResult<(InFlight<'_>, R)> {
        let mut inner = lock(&self.inner);
        let prepared = prepare(&inner.state)?;
        inner.agents.try_begin(kind)?;

        Ok((
            InFlight {
                inner: &self.inner,
                kind,
                epoch: inner.epoch,
                settled: false,
            },
            prepared,
        ))
    }

    /// Apply a finished call: update state, the agent status and notices.
    /// `apply` may refuse a result that no longer matches the state.
    fn settle<T>(
        &self,
        mut flight: InFlight<'_>,
        result: ClientResult<T>,
        apply: impl FnOnce(&mut WorkflowState, &T) -> ClientResult<String>,
    ) -> ClientResult<T> {
        flight.settled = true;
        let kind = flight.kind;
        let mut inner = lock(&self.inner);

        // reset already returned every agent to idle
        if inner.epoch != flight.epoch {
            debug!(agent = %kind, "Discarding result from before reset");
            return Err(ClientError::superseded(kind, "the wizard was reset"));
        }

        let outcome = result.and_then(|value| {
            let message = apply(&mut inner.state, &value)?;
            Ok((value, message))
        });

        match outcome {
            Ok((value, message)) => {
                info!(agent = %kind, "{}", message);
                inner.agents.finish(kind, true);
                inner.notices.success(message);
                Ok(value)
            }
            Err(err @ ClientError::Superseded { .. }) => {
                warn!(agent = %kind, error = %err, "Discarding stale result");
                inner.agents.finish(kind, false);
                inner.notices.error(err.to_string());
                Err(err)
            }
            Err(err) => {
                warn!(agent = %kind, error = %err, "Agent call failed");
                inner.agents.finish(kind, false);
                inner.notices.error(format!("{} failed: {}", kind, err));
                Err(err)
            }
        }
    }

    /// Step 1: ask for ideas. Also allowed on step 2 to regenerate; a new
    /// list always clears the selection and draft.
    pub async fn submit_setup(
        &self,
        niche: &str,
        platform: Platform,
        media_url: Option<String>,
    ) -> ClientResult<Vec<Idea>> {
        let (flight, request) = self.begin(AgentKind::Ideation, |state| {
            if state.current_step > WizardStep::Creation {
                return Err(ClientError::InvalidStep {
                    action: "submit_setup",
                    step: state.current_step,
                });
            }
            Ok(GenerateIdeasRequest::new(niche, platform, media_url.clone()))
        })?;

        let result = self
            .gateway
            .generate_ideas(&request)
            .await
            .map(|response| {
                let setup = Setup {
                    niche: response.niche,
                    platform: response.platform,
                    media_url: media_url.filter(|url| !url.trim().is_empty()),
                };
                (setup, response.ideas)
            });

        self.settle(flight, result, |state, (setup, ideas)| {
            if state.current_step > WizardStep::Creation {
                return Err(ClientError::superseded(
                    AgentKind::Ideation,
                    "the wizard moved past idea selection",
                ));
            }
            state.replace_ideas(setup.clone(), ideas.clone());
            state.current_step = WizardStep::Creation;
            Ok(format!("Generated {} ideas", ideas.len()))
        })
        .map(|(_, ideas)| ideas)
    }

    /// Step 2: choose an idea by id.
    pub fn select_idea(&self, id: Uuid) -> ClientResult<Idea> {
        self.select_with(|ideas| {
            ideas
                .iter()
                .find(|idea| idea.id == id)
                .cloned()
                .ok_or(ClientError::UnknownIdea(id))
        })
    }

    /// Step 2: choose an idea by its position in the list.
    pub fn select_idea_at(&self, index: usize) -> ClientResult<Idea> {
        self.select_with(|ideas| {
            ideas
                .get(index)
                .cloned()
                .ok_or(ClientError::IdeaOutOfRange {
                    index,
                    len: ideas.len(),
                })
        })
    }

    fn select_with(
        &self,
        pick: impl FnOnce(&[Idea]) -> ClientResult<Idea>,
    ) -> ClientResult<Idea> {
        let mut inner = lock(&self.inner);
        if inner.state.current_step != WizardStep::Creation {
            return Err(ClientError::InvalidStep {
                action: "select_idea",
                step: inner.state.current_step,
            });
        }
        if inner.agents.is_working(AgentKind::Creation) {
            return Err(ClientError::Busy(AgentKind::Creation));
        }

        let idea = pick(&inner.state.ideas)?;
        inner.state.selected_idea = Some(idea.id);
        Ok(idea)
    }

    /// Step 2: draft the selected idea; advances to step 3.
    pub async fn draft(&self) -> ClientResult<String> {
        let (flight, (idea_id, request)) = self.begin(AgentKind::Creation, |state| {
            if state.current_step != WizardStep::Creation {
                return Err(ClientError::InvalidStep {
                    action: "draft",
                    step: state.current_step,
                });
            }
            let idea = state.selected().ok_or(ClientError::NoSelection)?;
            let setup = state.setup.as_ref().ok_or(ClientError::NoSelection)?;
            Ok((
                idea.id,
                DraftPostRequest::new(
                    idea,
                    setup.platform,
                    setup.niche.clone(),
                    setup.media_url.clone(),
                ),
            ))
        })?;

        let result = self
            .gateway
            .draft_post(&request)
            .await
            .map(|response| response.post_draft);

        self.settle(flight, result, |state, draft| {
            if state.selected_idea != Some(idea_id) {
                return Err(ClientError::superseded(
                    AgentKind::Creation,
                    "idea list changed",
                ));
            }
            state.drafted_content = Some(draft.clone());
            state.current_step = WizardStep::Publishing;
            Ok("Draft ready".to_string())
        })
    }

    /// Step 3: publish the draft. Stays on step 3.
    pub async fn publish(&self) -> ClientResult<PublishResponse> {
        let (flight, request) = self.begin(AgentKind::Publishing, |state| {
            match (state.current_step, &state.drafted_content, &state.setup) {
                (WizardStep::Publishing, Some(draft), Some(setup)) => Ok(PublishRequest::new(
                    draft.clone(),
                    setup.platform,
                    setup.media_url.clone(),
                )),
                (step, ..) => Err(ClientError::InvalidStep {
                    action: "publish",
                    step,
                }),
            }
        })?;

        let result = self.gateway.publish(&request).await;

        self.settle(flight, result, |state, response| {
            state.last_publish = Some(response.clone());
            Ok(response.message.clone())
        })
    }

    /// Available from step 3 on; only touches the analysis agent.
    pub async fn analyze_youtube(&self, video_link: &str) -> ClientResult<AnalyzeResponse> {
        let (flight, request) = self.begin(AgentKind::Analysis, |state| {
            if state.current_step < WizardStep::Publishing {
                return Err(ClientError::InvalidStep {
                    action: "analyze_youtube",
                    step: state.current_step,
                });
            }
            Ok(AnalyzeRequest::new(video_link))
        })?;

        let result = self.gateway.analyze_youtube(&request).await;

        self.settle(flight, result, |state, response| {
            state.last_analysis = Some(response.clone());
            Ok(format!(
                "Analyzed {} comments",
                response.comments_analyzed
            ))
        })
    }

    /// Step 3 to 4.
    pub fn open_sponsorship(&self) -> ClientResult<()> {
        let mut inner = lock(&self.inner);
        if inner.state.current_step != WizardStep::Publishing {
            return Err(ClientError::InvalidStep {
                action: "open_sponsorship",
                step: inner.state.current_step,
            });
        }
        inner.state.current_step = WizardStep::Sponsorship;
        Ok(())
    }

    /// Independent of the earlier steps; allowed at any step.
    pub async fn send_sponsorship(&self, niche: SponsorNiche) -> ClientResult<SponsorshipResponse> {
        let (flight, request) = self.begin(AgentKind::Sponsorship, |_| {
            Ok(SponsorshipRequest::new(niche))
        })?;

        let result = self.gateway.send_sponsorship(&request).await;

        self.settle(flight, result, |state, response| {
            state.last_sponsorship = Some(response.clone());
            Ok(format!(
                "Sent {} of {} sponsorship emails",
                response.emails_sent.len(),
                response.emails_found
            ))
        })
    }

    /// Back to step 1 with everything cleared. Calls still in flight are
    /// discarded when they return.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        let epoch = inner.epoch.wrapping_add(1);
        *inner = Inner {
            epoch,
            ..Inner::default()
        };
        info!("Wizard reset");
    }
}
