mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calpeek_core::TruncateRule;
use calpeek_core::config::{SettingsLayer, default_config_path};
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calpeek", version)]
#[command(about = "Show yesterday's and tomorrow's events from a Google Calendar")]
struct Cli {
    /// Settings file (defaults to ~/.config/calpeek/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Calendar id, e.g. "primary" or "team@group.calendar.google.com"
    #[arg(short, long)]
    calendar: Option<String>,

    /// IANA zone used for day boundaries and displayed times
    #[arg(long)]
    timezone: Option<String>,

    /// Maximum description length in characters
    #[arg(long)]
    preview_length: Option<usize>,

    /// How long descriptions are cut: "chars" or "word-boundary"
    #[arg(long)]
    truncate: Option<TruncateRule>,

    /// Service-account key file
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD) instead of today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings_layer(&self) -> SettingsLayer {
        SettingsLayer {
            calendar_id: self.calendar.clone(),
            timezone: self.timezone.clone(),
            preview_length: self.preview_length,
            truncate: self.truncate,
            credentials_path: self.credentials.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_layer = match cli.config {
        Some(ref path) => {
            if !path.exists() {
                anyhow::bail!("Settings file not found: {}", path.display());
            }
            SettingsLayer::load(path)?
        }
        None => SettingsLayer::load(&default_config_path()?)?,
    };
    let env_layer = SettingsLayer::from_env(|key| std::env::var(key).ok())?;

    let settings = file_layer
        .merge(env_layer)
        .merge(cli.settings_layer())
        .resolve(iana_time_zone::get_timezone().ok())
        .context("Invalid calpeek settings")?;

    debug!(
        calendar = %settings.calendar_id,
        timezone = %settings.timezone,
        credentials = %settings.credentials_path.display(),
        "resolved settings"
    );

    commands::brief::run(settings, cli.date).await
}

/// Logs go to stderr. `CALPEEK_LOG` takes an `EnvFilter` directive and
/// overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("CALPEEK_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
