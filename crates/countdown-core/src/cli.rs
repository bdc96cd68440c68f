use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::calendar::MonthCursor;
use crate::error::ConfigError;
use crate::time::{Instant, parse_instant};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "countdown",
    version,
    about = "Countdown, progress and calendar between two fixed instants"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a config key, e.g. --set target=2026-01-01T00:00:00Z
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the countdown and progress once.
    Show(ShowArgs),
    /// Print the calendar grid.
    Calendar(CalendarArgs),
    /// Redraw countdown and calendar every tick until Ctrl-C.
    Watch(WatchArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Show(ShowArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Evaluate at this RFC 3339 instant instead of now.
    #[arg(long, value_parser = parse_at)]
    pub at: Option<Instant>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Span from the start month through the target month.
    #[arg(long, conflicts_with = "month")]
    pub full: bool,

    /// Month shown in the four-week window, as YYYY-MM.
    #[arg(long)]
    pub month: Option<MonthCursor>,

    /// Months to step the cursor forward (negative steps back).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i32,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub grid: GridArgs,

    /// Evaluate at this RFC 3339 instant instead of now.
    #[arg(long, value_parser = parse_at)]
    pub at: Option<Instant>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    #[command(flatten)]
    pub grid: GridArgs,
}

fn parse_at(raw: &str) -> Result<Instant, ConfigError> {
    parse_instant("at", raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
