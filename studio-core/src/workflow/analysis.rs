use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::llm::ChatClient;
use super::CommentAnalyzer;
use crate::config::YouTubeConfig;
use crate::error::{StudioError, StudioResult};
use crate::models::{AnalyzeInput, AnalyzeResponse};

const SERVICE: &str = "youtube";

pub const NO_COMMENTS_REPORT: &str = "No comments found for this video.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsPage {
    #[serde(default)]
    items: Vec<CommentThread>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
}

/// Reads top-level comments from the YouTube Data API v3.
pub struct YouTubeComments {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    max_comments: usize,
    page_size: u32,
}

impl YouTubeComments {
    pub fn new(client: Client, config: &YouTubeConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_comments: config.max_comments,
            page_size: config.page_size,
        }
    }

    /// Fetch up to `max_comments` comments, following page tokens.
    pub async fn fetch(&self, video_id: &str) -> StudioResult<Vec<String>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            StudioError::MissingCredential("YOUTUBE_API_KEY (youtube.api_key)".to_string())
        })?;

        let url = format!("{}/youtube/v3/commentThreads", self.api_base);
        let page_size = self.page_size.to_string();
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", &page_size),
                ("textFormat", "plainText"),
                ("key", api_key),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self.client.get(&url).query(&query).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StudioError::from_status(SERVICE, status.as_u16(), &body));
            }

            let page: CommentThreadsPage = response
                .json()
                .await
                .map_err(|e| StudioError::upstream_parse(SERVICE, e.to_string()))?;

            debug!(video_id, items = page.items.len(), "Fetched comment page");

            for thread in page.items {
                comments.push(thread.snippet.top_level_comment.snippet.text_display);
                if comments.len() >= self.max_comments {
                    return Ok(comments);
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(comments),
            }
        }
    }
}

/// Two-pass comment analysis: a sentiment breakdown, then a client-facing report.
pub struct YouTubeCommentAnalyzer {
    comments: YouTubeComments,
    chat: ChatClient,
    temperature: f32,
}

impl YouTubeCommentAnalyzer {
    pub fn new(comments: YouTubeComments, chat: ChatClient, temperature: f32) -> Self {
        Self {
            comments,
            chat,
            temperature,
        }
    }
}

fn sentiment_prompt(comments: &[String]) -> String {
    let formatted = comments
        .iter()
        .map(|c| format!("- {}", c.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert sentiment analyst. Your task is to analyze a list of YouTube comments.\n\
         Provide a structured breakdown of the sentiment (positive, negative, neutral) and \
         identify the key themes or topics mentioned in the comments.\n\n\
         Comments to analyze:\n{}\n\n\
         Analysis:\n\
         - Overall Sentiment:\n\
         - Key Themes:\n\
         - Positive Comments: (Quote 2-3 examples)\n\
         - Negative Comments: (Quote 2-3 examples)\n\
         - Neutral/Other Comments: (Quote 2-3 examples)",
        formatted
    )
}

fn report_prompt(video_link: &str, analysis: &str) -> String {
    format!(
        "You are a social media analyst. Based on the following sentiment analysis, \
         generate a professional and concise report for a client. The report should \
         summarize the key findings and provide actionable insights.\n\n\
         Video URL: {}\n\n\
         Comment Analysis:\n{}\n\n\
         Final Report:",
        video_link, analysis
    )
}

#[async_trait]
impl CommentAnalyzer for YouTubeCommentAnalyzer {
    async fn analyze(&self, input: &AnalyzeInput) -> StudioResult<AnalyzeResponse> {
        let comments = self.comments.fetch(&input.video_id).await?;
        info!(video_id = %input.video_id, count = comments.len(), "Fetched comments");

        if comments.is_empty() {
            return Ok(AnalyzeResponse {
                video_link: input.video_link.clone(),
                video_id: input.video_id.clone(),
                comments_analyzed: 0,
                report: NO_COMMENTS_REPORT.to_string(),
            });
        }

        let analysis = self
            .chat
            .complete(&sentiment_prompt(&comments), self.temperature)
            .await?;
        let report = self
            .chat
            .complete(&report_prompt(&input.video_link, &analysis), self.temperature)
            .await?;

        Ok(AnalyzeResponse {
            video_link: input.video_link.clone(),
            video_id: input.video_id.clone(),
            comments_analyzed: comments.len(),
            report,
        })
    }
}
