use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::llm::{extract_json_object, ChatClient};
use super::Ideation;
use crate::error::{StudioError, StudioResult};
use crate::models::{DraftInput, IdeaCandidate, IdeationInput, Platform};

const IDEA_COUNT: usize = 5;

/// Idea generation and drafting backed by a chat model.
pub struct LlmIdeation {
    chat: ChatClient,
    ideation_temperature: f32,
    drafting_temperature: f32,
}

#[derive(Debug, Deserialize)]
struct IdeasEnvelope {
    #[serde(default)]
    ideas: Vec<IdeaCandidate>,
}

impl LlmIdeation {
    pub fn new(chat: ChatClient, ideation_temperature: f32, drafting_temperature: f32) -> Self {
        Self {
            chat,
            ideation_temperature,
            drafting_temperature,
        }
    }
}

fn ideation_prompt(input: &IdeationInput) -> String {
    format!(
        "You are a content trend analyst for {platform}.\n\
         Based on the niche: {niche}, generate {count} highly engaging content ideas.\n\
         Return ONLY a JSON object that adheres strictly to the following schema. \
         Do NOT include any conversational text, code block syntax, or any other formatting.\n\n\
         {{\"ideas\": [{{\"title\": \"short catchy title\", \"summary\": \"one or two sentence summary\"}}]}}",
        platform = input.platform.display_name(),
        niche = input.niche,
        count = IDEA_COUNT,
    )
}

fn drafting_prompt(input: &DraftInput) -> String {
    let niche = if input.niche.is_empty() {
        String::new()
    } else {
        format!("The creator's niche is: {}.\n", input.niche)
    };
    let media = match &input.media_url {
        Some(url) => format!("The post will be accompanied by this media: {}.\n", url),
        None => String::new(),
    };

    match input.platform {
        Platform::LinkedIn => format!(
            "You are an expert LinkedIn ghostwriter.\n{niche}{media}\
             Write a LinkedIn post about the following idea.\n\
             Title: {title}\nSummary: {summary}\n\n\
             Open with a strong hook, keep paragraphs short, end with a question that invites \
             comments, and add three to five relevant hashtags. \
             Return only the post text.",
            title = input.idea.title,
            summary = input.idea.summary,
        ),
        Platform::YouTube => format!(
            "You are an experienced YouTube scriptwriter.\n{niche}{media}\
             Write a video script for the following idea.\n\
             Title: {title}\nSummary: {summary}\n\n\
             Structure it as HOOK, INTRO, MAIN POINTS and CALL TO ACTION sections, \
             include brief b-roll or on-screen text cues in brackets, \
             and keep it under five minutes of speaking time. \
             Return only the script.",
            title = input.idea.title,
            summary = input.idea.summary,
        ),
    }
}

/// Parse the model reply into candidates. Accepts `{"ideas": [...]}` or a bare array.
pub fn parse_ideas(reply: &str) -> StudioResult<Vec<IdeaCandidate>> {
    if let Some(object) = extract_json_object(reply) {
        if let Ok(envelope) = serde_json::from_str::<IdeasEnvelope>(object) {
            return Ok(envelope.ideas);
        }
    }

    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) {
        if end > start {
            if let Ok(ideas) = serde_json::from_str::<Vec<IdeaCandidate>>(&reply[start..=end]) {
                return Ok(ideas);
            }
        }
    }

    Err(StudioError::upstream_parse(
        "llm",
        "reply did not contain an ideas JSON object",
    ))
}

#[async_trait]
impl Ideation for LlmIdeation {
    async fn generate_ideas(&self, input: &IdeationInput) -> StudioResult<Vec<IdeaCandidate>> {
        info!(niche = %input.niche, platform = %input.platform, "Generating ideas");

        let reply = self
            .chat
            .complete(&ideation_prompt(input), self.ideation_temperature)
            .await?;

        let ideas = parse_ideas(&reply).inspect_err(|e| warn!("Unusable ideation reply: {}", e))?;

        info!("Model returned {} idea candidates", ideas.len());
        Ok(ideas)
    }

    async fn draft(&self, input: &DraftInput) -> StudioResult<String> {
        info!(
            platform = %input.platform,
            title = %input.idea.title,
            "Drafting {}",
            input.platform.draft_kind()
        );

        self.chat
            .complete(&drafting_prompt(input), self.drafting_temperature)
            .await
    }
}
