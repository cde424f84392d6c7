pub mod calls;
pub mod serve;
pub mod wizard;

pub use calls::{
    cmd_analyze, cmd_draft, cmd_health, cmd_ideas, cmd_publish, cmd_sponsor, OutputFormat,
};
pub use serve::cmd_serve;
pub use wizard::cmd_wizard;
