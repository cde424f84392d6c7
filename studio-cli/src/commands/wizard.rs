//! Interactive four-step wizard on stdin/stdout.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use studio_client::{
    AgentStatus, ClientError, Gateway, NoticeLevel, WizardController, WizardStep, WizardView,
};
use studio_core::{Platform, SponsorNiche};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use super::calls::ideas_table;

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Commands: reset, sponsor <niche>, help, quit";

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{} ", label.bold()).as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

fn status_label(status: AgentStatus) -> ColoredString {
    match status {
        AgentStatus::Idle => "idle".dimmed(),
        AgentStatus::Working => "working".yellow(),
        AgentStatus::Success => "success".green(),
        AgentStatus::Error => "error".red(),
    }
}

fn render(view: &WizardView) {
    let filled = (view.progress_percent / 10) as usize;
    println!();
    println!(
        "{} {}/4 {}  [{}{}] {}%",
        "Step".cyan().bold(),
        view.step.number(),
        view.step_title.bold(),
        "█".repeat(filled).green(),
        "░".repeat(10 - filled).dimmed(),
        view.progress_percent
    );

    let agents: Vec<String> = view
        .agents
        .iter()
        .map(|(kind, status)| format!("{} {}", kind, status_label(*status)))
        .collect();
    println!("  {}", agents.join("  "));

    for notice in &view.notices {
        let line = format!("{} {}", notice.level.icon(), notice.message);
        match notice.level {
            NoticeLevel::Success => println!("  {}", line.green()),
            NoticeLevel::Error => println!("  {}", line.red()),
        }
    }
    println!("{}", "─".repeat(60).dimmed());

    match view.step {
        WizardStep::Creation if !view.ideas.is_empty() => {
            println!("{}", ideas_table(&view.ideas));
        }
        WizardStep::Publishing => {
            if let Some(draft) = &view.drafted_content {
                println!("{}", draft);
                println!("{}", "─".repeat(60).dimmed());
            }
        }
        _ => {}
    }
}

/// Gateway failures already show up as notices; only local refusals are
/// printed here.
fn report(result: Result<(), ClientError>) {
    if let Err(err) = result {
        if err.is_local() {
            println!("  {} {}", "!".yellow(), err);
        }
    }
}

pub async fn cmd_wizard<G: Gateway>(controller: WizardController<G>) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Creator Studio Wizard".cyan().bold());
    println!("{}", HELP.dimmed());

    loop {
        let view = controller.view();
        render(&view);

        let label = match view.step {
            WizardStep::Setup => "Niche:",
            WizardStep::Creation => "Idea number (or 'regen'):",
            WizardStep::Publishing => "publish | analyze <link> | next:",
            WizardStep::Sponsorship => "Sponsor niche (marketing, tech, finance, lifestyle):",
        };
        let Some(line) = prompt(&mut input, label).await? else {
            break;
        };

        match line.split_once(' ').unwrap_or((line.as_str(), "")) {
            ("quit" | "exit" | "q", _) => break,
            ("help", _) => {
                println!("{}", HELP);
                continue;
            }
            ("reset", _) => {
                controller.reset();
                continue;
            }
            ("sponsor", niche) if view.step != WizardStep::Sponsorship => {
                send_sponsorship(&controller, niche).await;
                continue;
            }
            _ => {}
        }

        match view.step {
            WizardStep::Setup => {
                if line.is_empty() {
                    continue;
                }
                let Some(platform) = read_platform(&mut input).await? else {
                    break;
                };
                let media = prompt(&mut input, "Media URL (optional):")
                    .await?
                    .filter(|url| !url.is_empty());
                println!("  {}", "Generating ideas...".dimmed());
                report(
                    controller
                        .submit_setup(&line, platform, media)
                        .await
                        .map(|_| ()),
                );
            }
            WizardStep::Creation => {
                if line == "regen" {
                    if let Some(setup) = view.setup {
                        report(
                            controller
                                .submit_setup(&setup.niche, setup.platform, setup.media_url)
                                .await
                                .map(|_| ()),
                        );
                    }
                    continue;
                }
                let Ok(number) = line.parse::<usize>() else {
                    println!("  {} enter a number from the list", "!".yellow());
                    continue;
                };
                let selected = controller.select_idea_at(number.saturating_sub(1));
                if let Ok(idea) = &selected {
                    println!("  {} {}", "Drafting:".dimmed(), idea.title);
                    report(controller.draft().await.map(|_| ()));
                } else {
                    report(selected.map(|_| ()));
                }
            }
            WizardStep::Publishing => {
                match line.split_once(' ').unwrap_or((line.as_str(), "")) {
                    ("publish", _) => report(controller.publish().await.map(|_| ())),
                    ("analyze", link) => {
                        let result = controller.analyze_youtube(link.trim()).await;
                        if let Ok(analysis) = &result {
                            println!("{}", analysis.report);
                        }
                        report(result.map(|_| ()));
                    }
                    ("next", _) => report(controller.open_sponsorship()),
                    _ => println!("{}", HELP.dimmed()),
                }
            }
            WizardStep::Sponsorship => {
                let niche = line.strip_prefix("sponsor ").unwrap_or(&line);
                send_sponsorship(&controller, niche).await;
            }
        }
    }

    Ok(())
}

async fn read_platform(input: &mut Input) -> Result<Option<Platform>> {
    loop {
        let Some(line) = prompt(input, "Platform (linkedin/youtube):").await? else {
            return Ok(None);
        };
        match line.parse::<Platform>() {
            Ok(platform) => return Ok(Some(platform)),
            Err(err) => println!("  {} {}", "!".yellow(), err),
        }
    }
}

async fn send_sponsorship<G: Gateway>(controller: &WizardController<G>, niche: &str) {
    let niche = match niche.trim().parse::<SponsorNiche>() {
        Ok(niche) => niche,
        Err(err) => {
            println!("  {} {}", "!".yellow(), err);
            return;
        }
    };
    println!("  {}", "Sending sponsorship emails...".dimmed());
    let result = controller.send_sponsorship(niche).await;
    if let Ok(response) = &result {
        for address in &response.emails_sent {
            println!("  {} {}", "→".blue(), address);
        }
    }
    report(result.map(|_| ()));
}
