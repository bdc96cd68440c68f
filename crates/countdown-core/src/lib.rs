pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod countdown;
pub mod error;
pub mod render;
pub mod snapshot;
pub mod ticker;
pub mod time;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting countdown CLI"
  );
  debug!(overrides = ?cli.overrides, "cli overrides");

  let cfg = config::Config::load(
    cli.config.as_deref(),
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let renderer =
    render::Renderer::new(cfg.color);

  commands::dispatch(
    &cfg,
    &renderer,
    cli.command.unwrap_or_default()
  )?;

  info!("done");
  Ok(())
}
