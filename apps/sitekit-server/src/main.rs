#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod console;
mod logging;
mod presets;
mod registered_modules;
mod signals;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modkit::{Composer, PublishedApp};

use crate::config::{AppConfig, CliOverrides};

/// SiteKit Server - composes site modules and serves their routes
#[derive(Parser)]
#[command(name = "sitekit-server")]
#[command(about = "SiteKit Server - composes site modules and serves their routes")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset to load (community, portfolio, gaming, blog, full); replaces `modules`
    #[arg(long)]
    preset: Option<String>,

    /// Bind address override for HTTP server (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Compose the application, print the resolution report and exit
    Check,
    /// Print the composed route table and exit
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (SITEKIT__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        preset: cli.preset.clone(),
        bind_addr: cli.bind.clone(),
    });

    logging::init_logging(&config.logging, cli.verbose);
    tracing::info!("SiteKit Server starting");

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let registry = Arc::new(registered_modules::catalog()?);
    let composer = config.composer(registry)?;

    // Dispatch subcommands (default: run)
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config, &composer).await,
        Commands::Check => check(&composer),
        Commands::Routes => print_routes(&composer),
    }
}

fn check(composer: &Composer) -> Result<()> {
    tracing::info!("Checking composition...");
    let app = composer.compose()?;
    println!("{}", console::render_report(app.report()));
    println!("Composition is valid");
    Ok(())
}

fn print_routes(composer: &Composer) -> Result<()> {
    let app = composer.compose()?;
    println!("{}", console::render_routes(app.routes()));
    Ok(())
}

async fn run_server(config: &AppConfig, composer: &Composer) -> Result<()> {
    tracing::info!("Composing modules...");
    let app = composer.compose()?;
    eprintln!("{}", console::render_report(app.report()));

    let published = Arc::new(PublishedApp::new(app));
    web::serve(published, &config.server.bind_addr).await
}
