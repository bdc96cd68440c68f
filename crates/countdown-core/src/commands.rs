use std::io::{self, IsTerminal, Write};

use anyhow::Context;
use tracing::{info, warn};

use crate::calendar::{GridMode, MonthCursor};
use crate::cli::{CalendarArgs, Command, GridArgs, ShowArgs, WatchArgs};
use crate::config::Config;
use crate::render::Renderer;
use crate::snapshot::Snapshot;
use crate::ticker::{Clock, FixedClock, SystemClock, Ticker};
use crate::time::{Instant, Zone};

#[tracing::instrument(skip(cfg, renderer))]
pub fn dispatch(cfg: &Config, renderer: &Renderer, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show(args) => show(cfg, renderer, args),
        Command::Calendar(args) => calendar(cfg, renderer, args),
        Command::Watch(args) => watch(cfg, renderer, args),
    }
}

impl GridArgs {
    /// Grid mode for `now`. Without `--month` the cursor starts at the month
    /// containing today, then moves by `--offset`.
    pub fn mode_at(&self, now: Instant, zone: &Zone) -> GridMode {
        if self.full {
            return GridMode::FullRange;
        }
        let cursor = self
            .month
            .unwrap_or_else(|| MonthCursor::containing(zone.local_date(now)));
        GridMode::MonthWindow(cursor.shifted(self.offset))
    }
}

fn clock_for(at: Option<Instant>) -> Box<dyn Clock> {
    match at {
        Some(instant) => Box::new(FixedClock(instant)),
        None => Box::new(SystemClock),
    }
}

fn show(cfg: &Config, renderer: &Renderer, args: ShowArgs) -> anyhow::Result<()> {
    let now = clock_for(args.at).now();
    let snapshot = Snapshot::capture(&cfg.window, &cfg.zone, now, GridMode::FullRange);
    let mut out = io::stdout().lock();

    if args.json {
        serde_json::to_writer_pretty(&mut out, &snapshot).context("failed to write snapshot json")?;
        writeln!(out)?;
        return Ok(());
    }

    renderer.write_header(&mut out, cfg)?;
    renderer.write_countdown(&mut out, &snapshot)?;
    Ok(())
}

fn calendar(cfg: &Config, renderer: &Renderer, args: CalendarArgs) -> anyhow::Result<()> {
    let now = clock_for(args.at).now();
    let mode = args.grid.mode_at(now, &cfg.zone);
    info!(?mode, "rendering calendar");

    let snapshot = Snapshot::capture(&cfg.window, &cfg.zone, now, mode);
    let mut out = io::stdout().lock();

    if args.json {
        serde_json::to_writer_pretty(&mut out, &snapshot.calendar)
            .context("failed to write calendar json")?;
        writeln!(out)?;
        return Ok(());
    }

    renderer.write_calendar(&mut out, cfg, &snapshot)?;
    Ok(())
}

fn watch(cfg: &Config, renderer: &Renderer, args: WatchArgs) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tick runtime")?;

    runtime.block_on(async {
        let frame_cfg = cfg.clone();
        let frame_renderer = renderer.clone();
        let grid = args.grid.clone();

        let ticker = Ticker::spawn(cfg.tick, SystemClock, move |now| {
            let mode = grid.mode_at(now, &frame_cfg.zone);
            let snapshot = Snapshot::capture(&frame_cfg.window, &frame_cfg.zone, now, mode);
            if let Err(err) = draw_frame(&frame_cfg, &frame_renderer, &snapshot) {
                warn!(error = %err, "failed to draw frame");
            }
        });
        info!(period_ms = ticker.period().as_millis() as u64, "watching; press Ctrl-C to stop");

        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;

        drop(ticker);
        info!("watch stopped");
        anyhow::Ok(())
    })
}

fn draw_frame(cfg: &Config, renderer: &Renderer, snapshot: &Snapshot) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if io::stdout().is_terminal() {
        write!(out, "\x1b[2J\x1b[H")?;
    } else {
        writeln!(out, "---")?;
    }
    renderer.write_header(&mut out, cfg)?;
    renderer.write_countdown(&mut out, snapshot)?;
    writeln!(out)?;
    renderer.write_calendar(&mut out, cfg, snapshot)?;
    out.flush()?;
    Ok(())
}
