use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use studio_core::error::StudioResult;
use studio_core::models::{AnalyzeInput, DraftInput, IdeationInput, PublishInput};
use studio_core::workflow::{
    ChatClient, LinkedInPublisher, LlmIdeation, LlmSponsorMailer, MailTransport,
    YouTubeCommentAnalyzer, YouTubeComments, NO_COMMENTS_REPORT, YOUTUBE_PREPARED_MESSAGE,
};
use studio_core::{
    CommentAnalyzer, IdeaCandidate, Ideation, LinkedInConfig, LlmConfig, Platform, Publisher,
    SponsorMailer, SponsorNiche, SponsorshipConfig, StudioError, YouTubeConfig,
};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

fn chat_client(server: &MockServer) -> ChatClient {
    let config = LlmConfig {
        api_base: server.uri(),
        api_key: Some("test-key".to_string()),
        ..LlmConfig::default()
    };
    ChatClient::new(reqwest::Client::new(), &config)
}

mod llm_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_ideas_parses_fenced_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(chat_reply(
                "```json\n{\"ideas\": [{\"title\": \"Funnel audit\", \"summary\": \"Find the leak\"}]}\n```",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let ideation = LlmIdeation::new(chat_client(&server), 0.5, 0.7);
        let ideas = ideation
            .generate_ideas(&IdeationInput {
                niche: "Digital Marketing".to_string(),
                platform: Platform::LinkedIn,
                media_url: None,
            })
            .await
            .unwrap();

        assert_eq!(ideas, vec![IdeaCandidate::new("Funnel audit", "Find the leak")]);
    }

    #[tokio::test]
    async fn test_draft_returns_model_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_reply("  HOOK: Stop scrolling.  "))
            .mount(&server)
            .await;

        let ideation = LlmIdeation::new(chat_client(&server), 0.5, 0.7);
        let draft = ideation
            .draft(&DraftInput {
                idea: IdeaCandidate::new("Hooks", "Openers"),
                platform: Platform::YouTube,
                niche: String::new(),
                media_url: None,
            })
            .await
            .unwrap();

        assert_eq!(draft, "HOOK: Stop scrolling.");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = chat_client(&server).complete("hi", 0.5).await.unwrap_err();
        assert!(matches!(err, StudioError::RateLimited { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = chat_client(&server).complete("hi", 0.5).await.unwrap_err();
        assert!(matches!(err, StudioError::EmptyResult { .. }));
    }
}

mod linkedin_tests {
    use super::*;

    fn publisher(server: &MockServer) -> LinkedInPublisher {
        LinkedInPublisher::new(
            reqwest::Client::new(),
            &LinkedInConfig {
                api_base: server.uri(),
                access_token: Some("li-token".to_string()),
                author_urn: Some("urn:li:person:abc".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn test_text_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(header("authorization", "Bearer li-token"))
            .and(header("x-restli-protocol-version", "2.0.0"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-restli-id", "urn:li:share:42")
                    .set_body_json(json!({})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = publisher(&server)
            .publish(&PublishInput {
                post_draft: "Hello network".to_string(),
                platform: Platform::LinkedIn,
                media_url: None,
            })
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.post_id.as_deref(), Some("urn:li:share:42"));
    }

    #[tokio::test]
    async fn test_post_with_media_uploads_first() {
        let server = MockServer::start().await;
        let upload_url = format!("{}/upload/asset-1", server.uri());

        Mock::given(method("POST"))
            .and(path("/v2/assets"))
            .and(query_param("action", "registerUpload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {
                    "asset": "urn:li:digitalmediaAsset:asset-1",
                    "uploadMechanism": {
                        "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                            "uploadUrl": upload_url
                        }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/cover.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/asset-1"))
            .and(body_string("PNGDATA"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "urn:li:share:7"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = publisher(&server)
            .publish(&PublishInput {
                post_draft: "Look at this".to_string(),
                platform: Platform::LinkedIn,
                media_url: Some(format!("{}/media/cover.png", server.uri())),
            })
            .await
            .unwrap();

        assert_eq!(response.post_id.as_deref(), Some("urn:li:share:7"));
    }

    #[tokio::test]
    async fn test_rejected_post_is_publish_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(422).set_body_string("duplicate post"))
            .mount(&server)
            .await;

        let err = publisher(&server)
            .publish(&PublishInput {
                post_draft: "Again".to_string(),
                platform: Platform::LinkedIn,
                media_url: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::PublishFailed { .. }));
        assert!(err.to_string().contains("duplicate post"));
    }

    #[tokio::test]
    async fn test_youtube_skips_linkedin() {
        let server = MockServer::start().await;
        let response = publisher(&server)
            .publish(&PublishInput {
                post_draft: "Script".to_string(),
                platform: Platform::YouTube,
                media_url: None,
            })
            .await
            .unwrap();

        assert_eq!(response.message, YOUTUBE_PREPARED_MESSAGE);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

mod youtube_tests {
    use super::*;

    fn comment(text: &str) -> serde_json::Value {
        json!({"snippet": {"topLevelComment": {"snippet": {"textDisplay": text}}}})
    }

    fn comments(server: &MockServer, max_comments: usize) -> YouTubeComments {
        YouTubeComments::new(
            reqwest::Client::new(),
            &YouTubeConfig {
                api_base: server.uri(),
                api_key: Some("yt-key".to_string()),
                max_comments,
                page_size: 2,
            },
        )
    }

    fn input() -> AnalyzeInput {
        AnalyzeInput {
            video_link: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_follows_pages_and_caps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [comment("third"), comment("fourth")],
                "nextPageToken": "p3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .and(query_param("videoId", "dQw4w9WgXcQ"))
            .and(query_param("key", "yt-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [comment("first"), comment("second")],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let fetched = comments(&server, 3).fetch("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(fetched, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_analysis_runs_two_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [comment("Loved it"), comment("Audio was rough")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_reply("Viewers are mostly positive."))
            .expect(2)
            .mount(&server)
            .await;

        let analyzer =
            YouTubeCommentAnalyzer::new(comments(&server, 25), chat_client(&server), 0.7);
        let response = analyzer.analyze(&input()).await.unwrap();

        assert_eq!(response.comments_analyzed, 2);
        assert_eq!(response.video_id, "dQw4w9WgXcQ");
        assert_eq!(response.report, "Viewers are mostly positive.");
    }

    #[tokio::test]
    async fn test_no_comments_skips_llm() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_reply("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let analyzer =
            YouTubeCommentAnalyzer::new(comments(&server, 25), chat_client(&server), 0.7);
        let response = analyzer.analyze(&input()).await.unwrap();

        assert_eq!(response.comments_analyzed, 0);
        assert_eq!(response.report, NO_COMMENTS_REPORT);
    }

    #[tokio::test]
    async fn test_comments_disabled_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/commentThreads"))
            .respond_with(ResponseTemplate::new(403).set_body_string("commentsDisabled"))
            .mount(&server)
            .await;

        let err = comments(&server, 25).fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.is_upstream_error());
    }
}

mod sponsorship_tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(Vec<String>, String, String)>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(
            &self,
            recipients: &[String],
            subject: &str,
            body: &str,
        ) -> StudioResult<()> {
            self.sent.lock().unwrap().push((
                recipients.to_vec(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    fn assets_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "marketing_mails": [
                    "ads@acme.io",
                    "not an email",
                    "Team <growth@startup.dev>",
                    "ops@localhost"
                ],
                "tech_mails": [],
                "finance_mails": ["deals@fintech.co, partners@bank.com"]
            })
        )
        .unwrap();
        file
    }

    async fn mailer_with(
        server: &MockServer,
        transport: Arc<RecordingTransport>,
        assets: &tempfile::NamedTempFile,
    ) -> LlmSponsorMailer {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_reply("I cover tech reviews.\n\nBest regards,\nInfluencer's Name"))
            .mount(server)
            .await;

        let config = SponsorshipConfig {
            assets_path: assets.path().to_path_buf(),
            ..SponsorshipConfig::default()
        };
        LlmSponsorMailer::new(chat_client(server), 0.7, transport, &config)
    }

    #[tokio::test]
    async fn test_sends_one_message_to_valid_addresses() {
        let server = MockServer::start().await;
        let transport = Arc::new(RecordingTransport::default());
        let assets = assets_file();
        let mailer = mailer_with(&server, transport.clone(), &assets).await;

        let response = mailer.send(SponsorNiche::MarketingMails).await.unwrap();

        assert_eq!(response.emails_found, 3);
        assert_eq!(response.emails_sent, vec!["ads@acme.io", "growth@startup.dev"]);
        assert!(response.emails_found >= response.emails_sent.len());
        assert!(response.email_body.contains("Best regards,"));

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.len(), 2);
        assert_eq!(sent[0].1, "Sponsorship Inquiry");
    }

    #[tokio::test]
    async fn test_entry_with_several_addresses_counts_each() {
        let server = MockServer::start().await;
        let transport = Arc::new(RecordingTransport::default());
        let assets = assets_file();
        let mailer = mailer_with(&server, transport.clone(), &assets).await;

        let response = mailer.send(SponsorNiche::FinanceMails).await.unwrap();

        assert_eq!(response.emails_found, 2);
        assert_eq!(
            response.emails_sent,
            vec!["deals@fintech.co", "partners@bank.com"]
        );
        assert!(response.emails_found >= response.emails_sent.len());
        assert_eq!(transport.sent.lock().unwrap()[0].0.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_list_sends_nothing() {
        let server = MockServer::start().await;
        let transport = Arc::new(RecordingTransport::default());
        let assets = assets_file();
        let mailer = mailer_with(&server, transport.clone(), &assets).await;

        let response = mailer.send(SponsorNiche::TechMails).await.unwrap();

        assert_eq!(response.emails_found, 0);
        assert!(response.emails_sent.is_empty());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_each_call_sends_again() {
        let server = MockServer::start().await;
        let transport = Arc::new(RecordingTransport::default());
        let assets = assets_file();
        let mailer = mailer_with(&server, transport.clone(), &assets).await;

        mailer.send(SponsorNiche::MarketingMails).await.unwrap();
        mailer.send(SponsorNiche::MarketingMails).await.unwrap();

        assert_eq!(transport.sent.lock().unwrap().len(), 2);
    }
}
