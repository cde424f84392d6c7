mod idea;
mod requests;
mod sponsorship;

pub use idea::{Idea, IdeaCandidate, Platform};
pub use requests::{
    youtube_video_id, AnalyzeInput, AnalyzeRequest, AnalyzeResponse, DraftInput,
    DraftPostRequest, DraftPostResponse, ErrorBody, GenerateIdeasRequest, GenerateIdeasResponse,
    HealthResponse, IdeationInput, PublishInput, PublishRequest, PublishResponse,
    SelectedIdeaPayload, SponsorshipRequest, SponsorshipResponse,
};
pub use sponsorship::{
    address_tokens, extract_emails, is_valid_email, CreatorProfile, SponsorNiche,
};
