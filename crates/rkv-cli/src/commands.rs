use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use rkv_server::{RkvServer, ServerConfig};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config(args) => cmd_config(args, cli.format),
    }
}

/// The config file if given, otherwise the defaults; then CLI overrides.
fn effective_config(path: Option<&Path>, bind: Option<std::net::SocketAddr>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    Ok(match bind {
        Some(addr) => config.with_bind_addr(addr),
        None => config,
    })
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = effective_config(args.config.as_deref(), args.bind)?;
    let handle = RkvServer::new(config).start().await?;
    println!(
        "{} Riak mock listening on {}",
        "✓".green().bold(),
        handle.local_addr().to_string().bold()
    );
    println!("  Press {} to stop.", "Ctrl-C".yellow());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    handle.stop().await?;
    println!("{} Stopped.", "✓".green());
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = effective_config(args.config.as_deref(), None)?;
    match format {
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
