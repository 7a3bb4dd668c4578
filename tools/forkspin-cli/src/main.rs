//! Forkspin CLI - inspect sponsored placements and listing order.
//!
//! Commands:
//! - `forkspin resolve` - Show the winning campaigns for a category
//! - `forkspin impress` - Record an impression
//! - `forkspin click` - Record a click, directions or delivery-app jump
//! - `forkspin shuffle` - Show the listing order for a filter combination
//! - `forkspin fairness` - Check the shuffle for position bias
//! - `forkspin campaigns` - List campaigns with their delivery status

mod catalog;
mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CampaignsArgs, ClickArgs, FairnessArgs, ImpressArgs, ResolveArgs, ShuffleArgs};

/// Forkspin CLI - Sponsored placements and restaurant listing
#[derive(Parser)]
#[command(name = "forkspin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which campaigns win the sponsored slots
    Resolve(ResolveArgs),

    /// Record an impression for a campaign
    Impress(ImpressArgs),

    /// Record a click-class interaction for a campaign
    Click(ClickArgs),

    /// Show the listing order for a filter combination
    Shuffle(ShuffleArgs),

    /// Check the shuffle for position bias
    Fairness(FairnessArgs),

    /// List campaigns with their delivery status
    Campaigns(CampaignsArgs),
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args, &ctx).await,
        Commands::Impress(args) => commands::impress::run(args, &ctx).await,
        Commands::Click(args) => commands::click::run(args, &ctx).await,
        Commands::Shuffle(args) => commands::shuffle::run(args, &ctx).await,
        Commands::Fairness(args) => commands::fairness::run(args, &ctx).await,
        Commands::Campaigns(args) => commands::campaigns::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
