//! One-shot calls against a running gateway.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use studio_client::{Gateway, GatewayClient};
use studio_core::{
    AnalyzeRequest, DraftPostRequest, GenerateIdeasRequest, Idea, Platform, PublishRequest,
    SponsorNiche, SponsorshipRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn ideas_table(ideas: &[Idea]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(comfy_table::Color::Cyan),
            Cell::new("Title").fg(comfy_table::Color::Cyan),
            Cell::new("Summary").fg(comfy_table::Color::Cyan),
        ]);

    for (index, idea) in ideas.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&idea.title),
            Cell::new(&idea.summary),
        ]);
    }
    table
}

pub async fn cmd_health(client: &GatewayClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    if format == OutputFormat::Json {
        return print_json(&health);
    }

    println!(
        "  {} {} {} ({})",
        "✓".green().bold(),
        health.service.bold(),
        health.version,
        health.status.green()
    );
    println!("  {} {}", "Gateway:".dimmed(), client.base_url());
    println!(
        "  {} {}",
        "Timestamp:".dimmed(),
        health.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

pub async fn cmd_ideas(
    client: &GatewayClient,
    niche: &str,
    platform: &str,
    media_url: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let platform: Platform = platform.parse()?;
    let response = client
        .generate_ideas(&GenerateIdeasRequest::new(niche, platform, media_url))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    println!(
        "{} {} ({})",
        "Content Ideas".cyan().bold(),
        response.niche.yellow(),
        response.platform.display_name()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!("{}", ideas_table(&response.ideas));
    println!();
    println!("  Total: {} ideas", response.ideas.len());
    Ok(())
}

pub async fn cmd_draft(
    client: &GatewayClient,
    title: &str,
    summary: &str,
    platform: &str,
    niche: &str,
    media_url: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let platform: Platform = platform.parse()?;
    let idea = Idea::new(title, summary);
    let response = client
        .draft_post(&DraftPostRequest::new(&idea, platform, niche, media_url))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    println!(
        "{} {}",
        "Draft".cyan().bold(),
        format!("({})", response.platform.draft_kind()).dimmed()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!("{}", response.post_draft);
    Ok(())
}

pub async fn cmd_publish(
    client: &GatewayClient,
    text: Option<String>,
    file: Option<PathBuf>,
    platform: &str,
    media_url: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let platform: Platform = platform.parse()?;
    let post_draft = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?,
        (None, None) => anyhow::bail!("provide the post text or --file"),
    };

    let response = client
        .publish(&PublishRequest::new(post_draft, platform, media_url))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    let mark = if response.success {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {}", mark, response.message);
    if let Some(post_id) = &response.post_id {
        println!("  {} {}", "Post:".dimmed(), post_id);
    }
    Ok(())
}

pub async fn cmd_analyze(
    client: &GatewayClient,
    video_link: &str,
    format: OutputFormat,
) -> Result<()> {
    let response = client
        .analyze_youtube(&AnalyzeRequest::new(video_link))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    println!(
        "{} {} ({} comments)",
        "Comment Analysis".cyan().bold(),
        response.video_id.yellow(),
        response.comments_analyzed
    );
    println!("{}", "═".repeat(60).dimmed());
    println!("{}", response.report);
    Ok(())
}

pub async fn cmd_sponsor(
    client: &GatewayClient,
    niche: &str,
    format: OutputFormat,
) -> Result<()> {
    let niche: SponsorNiche = niche.parse()?;
    let response = client
        .send_sponsorship(&SponsorshipRequest::new(niche))
        .await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    println!("{} {}", "Sponsorship Outreach".cyan().bold(), niche);
    println!("{}", "═".repeat(60).dimmed());

    if response.emails_sent.is_empty() {
        println!("{}", "No valid sponsor addresses for this niche.".yellow());
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec![Cell::new("Sent to").fg(comfy_table::Color::Cyan)]);
        for address in &response.emails_sent {
            table.add_row(vec![Cell::new(address)]);
        }
        println!("{}", table);
    }

    println!();
    println!(
        "  Sent {} of {} addresses found",
        response.emails_sent.len(),
        response.emails_found
    );
    println!();
    println!("{}", "Email body".bold());
    println!("{}", response.email_body);
    Ok(())
}
