use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use studio_client::{GatewayClient, WizardController, DEFAULT_GATEWAY_URL};
use studio_core::{init_logging, LoggingConfig, Platform, SponsorNiche};

mod commands;

use commands::{
    cmd_analyze, cmd_draft, cmd_health, cmd_ideas, cmd_publish, cmd_serve, cmd_sponsor,
    cmd_wizard, OutputFormat,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "studio")]
#[command(version = VERSION)]
#[command(about = "Creator Studio - AI-assisted content ideation, drafting and outreach")]
#[command(long_about = r#"
Creator Studio runs an HTTP gateway in front of an LLM-backed content
workflow and drives it from the terminal.

Use 'studio serve' to start the gateway, then 'studio wizard' to walk through
ideation, drafting, publishing and sponsorship outreach step by step.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(
        long,
        global = true,
        env = "STUDIO_GATEWAY_URL",
        default_value = DEFAULT_GATEWAY_URL,
        help = "Base URL of the gateway"
    )]
    gateway: String,

    #[arg(
        long,
        global = true,
        default_value_t = 120,
        help = "Request timeout in seconds"
    )]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API gateway")]
    Serve {
        #[arg(long, help = "Bind host (overrides configuration)")]
        host: Option<String>,

        #[arg(short, long, help = "Bind port (overrides configuration)")]
        port: Option<u16>,
    },

    #[command(about = "Walk through the content wizard interactively")]
    Wizard,

    #[command(about = "Check that the gateway is up")]
    Health {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Generate content ideas for a niche")]
    Ideas {
        #[arg(help = "Content niche, e.g. \"Digital Marketing\"")]
        niche: String,

        #[arg(short, long, default_value_t = Platform::LinkedIn.to_string())]
        platform: String,

        #[arg(short, long, help = "Image or video URL to build the ideas around")]
        media_url: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Draft a post or video script from an idea")]
    Draft {
        #[arg(help = "Idea title")]
        title: String,

        #[arg(short, long, default_value = "", help = "Idea summary")]
        summary: String,

        #[arg(short, long, default_value_t = Platform::LinkedIn.to_string())]
        platform: String,

        #[arg(short, long, default_value = "")]
        niche: String,

        #[arg(short, long)]
        media_url: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Publish a drafted post")]
    Publish {
        #[arg(help = "Post text")]
        text: Option<String>,

        #[arg(long, help = "Read the post text from a file")]
        file: Option<PathBuf>,

        #[arg(short, long, default_value_t = Platform::LinkedIn.to_string())]
        platform: String,

        #[arg(short, long)]
        media_url: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Analyze the comments of a YouTube video")]
    Analyze {
        #[arg(help = "YouTube video link")]
        video_link: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Send sponsorship emails to a niche's sponsor list")]
    Sponsor {
        #[arg(
            default_value_t = SponsorNiche::MarketingMails.to_string(),
            help = "marketing, tech, finance or lifestyle"
        )]
        niche: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The gateway configures its own logging from the loaded config.
    if !matches!(cli.command, Commands::Serve { .. }) {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            ..Default::default()
        };
        init_logging(&logging, cli.verbose);
    }

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = GatewayClient::with_timeout(&cli.gateway, Duration::from_secs(cli.timeout));

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port, cli.verbose).await,
        Commands::Wizard => cmd_wizard(WizardController::new(client)).await,
        Commands::Health { format } => cmd_health(&client, format).await,
        Commands::Ideas {
            niche,
            platform,
            media_url,
            format,
        } => cmd_ideas(&client, &niche, &platform, media_url, format).await,
        Commands::Draft {
            title,
            summary,
            platform,
            niche,
            media_url,
            format,
        } => cmd_draft(&client, &title, &summary, &platform, &niche, media_url, format).await,
        Commands::Publish {
            text,
            file,
            platform,
            media_url,
            format,
        } => cmd_publish(&client, text, file, &platform, media_url, format).await,
        Commands::Analyze { video_link, format } => {
            cmd_analyze(&client, &video_link, format).await
        }
        Commands::Sponsor { niche, format } => cmd_sponsor(&client, &niche, format).await,
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Creator Studio Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), env!("CARGO_PKG_NAME"));
        println!("  {:<15} {}", "License:".bold(), env!("CARGO_PKG_LICENSE"));
        println!();
        println!("  {}", "Platforms:".bold());
        for platform in Platform::ALL {
            println!("    • {} ({})", platform.display_name(), platform.draft_kind());
        }
        println!();
        println!("  {}", "Sponsor lists:".bold());
        for niche in SponsorNiche::ALL {
            println!("    • {}", niche);
        }
        println!();
        println!("  {}", "Build Information:".bold());
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("studio {}", VERSION);
    }

    Ok(())
}
