//! Zomato-Scout main entry point
//!
//! This is the command-line interface for the competitor menu and review crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zomato_scout::config::{load_config_with_hash, Config};
use zomato_scout::crawler::{crawl_menus, crawl_reviews};
use zomato_scout::output::print_summary;

/// Zomato-Scout: competitor menu and review crawler
///
/// Reads the competitor restaurant list from the registry, collects either
/// recent reviews or full menus for every restaurant, and uploads the
/// records to the storage API in one batch.
#[derive(Parser, Debug)]
#[command(name = "zomato-scout")]
#[command(version = "1.0.0")]
#[command(about = "Competitor menu and review crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show what would be crawled without making any request
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect recent reviews for every restaurant
    Reviews {
        /// Override the recency threshold in days
        #[arg(long, value_name = "DAYS")]
        threshold_days: Option<u32>,

        /// Also write the collected reviews to this JSON file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },

    /// Collect the full menu of every restaurant
    Menu {
        /// Also write the collected items to this JSON file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli.command);

    if cli.dry_run {
        handle_dry_run(&config, &cli.command);
        return Ok(());
    }

    let summary = match cli.command {
        Command::Reviews { .. } => crawl_reviews(config).await,
        Command::Menu { .. } => crawl_menus(config).await,
    }
    .context("failed to initialize crawler")?;

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("zomato_scout=info,warn"),
            1 => EnvFilter::new("zomato_scout=debug,info"),
            2 => EnvFilter::new("zomato_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the configuration file
fn apply_overrides(config: &mut Config, command: &Command) {
    let export = match command {
        Command::Reviews {
            threshold_days,
            export,
        } => {
            if let Some(days) = threshold_days {
                config.crawler.stop_threshold_days = *days;
            }
            export
        }
        Command::Menu { export } => export,
    };

    if let Some(path) = export {
        config.output.export_path = Some(path.display().to_string());
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, command: &Command) {
    println!("=== Zomato-Scout Dry Run ===\n");

    match command {
        Command::Reviews { .. } => {
            println!("Dataset: reviews");
            println!(
                "  Stop threshold: {} days",
                config.crawler.stop_threshold_days
            );
            println!(
                "  Max pages per restaurant: {}",
                config.crawler.max_pages_per_restaurant
            );
            println!("  Destination table: {}", config.sink.reviews_table);
        }
        Command::Menu { .. } => {
            println!("Dataset: menu");
            println!(
                "  Destination: {}.{}",
                config.sink.menu_database, config.sink.menu_table
            );
        }
    }

    println!("\nRequests:");
    println!("  Base URL: {}", config.endpoints.base_url);
    println!("  Short links: {}", config.endpoints.short_url_base);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  User agent: {}", config.client.user_agent);
    // Proxy URLs usually embed credentials
    println!(
        "  Proxy: {}",
        if config.client.proxy.is_some() {
            "configured"
        } else {
            "none"
        }
    );
    println!(
        "  Retry: {} attempts, {}ms backoff, statuses {:?}",
        config.retry.max_attempts, config.retry.backoff_ms, config.retry.retryable_status_codes
    );

    println!("\nRegistry: {}", config.registry.url);
    println!("  Query: {}", config.registry.query);
    println!("Storage API: {}", config.sink.url);
    if let Some(path) = &config.output.export_path {
        println!("Local export: {}", path);
    }

    println!("\n✓ Configuration is valid");
}
