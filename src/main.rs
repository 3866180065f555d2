use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fork_purger::config::parse_duration;
use fork_purger::{Config, Credentials, ForkPurger, GitHubClient, PurgeError};

#[derive(Parser)]
#[command(name = "fork-purger")]
#[command(about = "Delete forked GitHub repositories older than a threshold")]
#[command(
    long_about = "Delete forked GitHub repositories older than a threshold.\n\n\
                  Reads the access token from GH_TOKEN and the account from GH_USERNAME."
)]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Deadline for the whole run, e.g. "90s" or "10m" (overrides the config file)
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// GitHub API root, for GitHub Enterprise
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    let level = match (&config, cli.verbose) {
        (_, true) => "debug",
        (Ok(config), false) => config.logging.level.as_str(),
        (Err(_), false) => "info",
    };
    init_logging(level);

    info!("Starting fork-purger v{}", env!("CARGO_PKG_VERSION"));

    let outcome = match config {
        Ok(config) => run(&cli, &config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e
                .downcast_ref::<PurgeError>()
                .is_some_and(PurgeError::is_configuration)
            {
                error!("Configuration error: {:#}", e);
            } else {
                error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging on stderr; RUST_LOG takes precedence over `level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        Some(raw) => Config::load(&Config::expand_path(raw)?),
        None => Config::load_or_default(),
    }
}

/// Parse `--timeout`, rejecting a zero deadline
fn parse_timeout(raw: &str) -> Result<Duration, String> {
    match parse_duration(raw) {
        Ok(timeout) if timeout.is_zero() => Err("timeout must be greater than zero".to_string()),
        Ok(timeout) => Ok(timeout),
        Err(e) => Err(e.to_string()),
    }
}

/// Validate configuration, authenticate, then purge
async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let credentials = Credentials::from_env().context("Missing GitHub credentials")?;

    let mut options = config.purge_options()?;
    if let Some(timeout) = cli.timeout {
        options.timeout = timeout;
    }

    let client = match &cli.api_url {
        Some(url) => GitHubClient::with_base_uri(&credentials, url)?,
        None => GitHubClient::new(&credentials)?,
    };

    let purger = ForkPurger::new(client, options);
    purger.run(credentials.account()).await?;

    Ok(())
}
