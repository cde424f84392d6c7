use anyhow::Result;
use colored::Colorize;
use studio_core::{app_state, init_logging, serve, StudioConfig, UpstreamPolicy, Workflow};
use tracing::info;

pub async fn cmd_serve(host: Option<String>, port: Option<u16>, verbose: bool) -> Result<()> {
    let mut config = StudioConfig::load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    init_logging(&config.logging, verbose);

    let addr = config.bind_address()?;
    let workflow = Workflow::from_config(&config)?;
    let state = app_state(workflow, UpstreamPolicy::from_config(&config.upstream));

    println!(
        "{} {} on {}",
        "▶".green().bold(),
        studio_core::SERVICE_NAME.cyan().bold(),
        format!("http://{}", addr).yellow()
    );
    info!(
        model = %config.llm.model,
        timeout_secs = config.upstream.timeout_secs,
        "Gateway configured"
    );

    serve(state, addr).await?;
    Ok(())
}
