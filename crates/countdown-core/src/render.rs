use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use unicode_width::UnicodeWidthStr;

use crate::calendar::CalendarDay;
use crate::config::Config;
use crate::countdown::CountdownPhase;
use crate::snapshot::Snapshot;
use crate::time::{Instant, Zone};

const BAR_WIDTH: usize = 40;
const SECONDS_PER_DAY: i64 = 86_400;
const CELL_WIDTH: usize = 4;
const WEEKDAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    #[tracing::instrument(skip_all)]
    pub fn write_header<W: Write>(&self, out: &mut W, cfg: &Config) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&cfg.title, "1"))?;
        writeln!(
            out,
            "{} → {} ({})",
            format_moment(cfg.window.start(), &cfg.zone),
            format_moment(cfg.window.target(), &cfg.zone),
            cfg.zone
        )?;
        writeln!(out)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn write_countdown<W: Write>(&self, out: &mut W, snapshot: &Snapshot) -> anyhow::Result<()> {
        let countdown = &snapshot.countdown;
        let progress = &snapshot.progress;

        match snapshot.phase {
            CountdownPhase::NotStarted => writeln!(out, "{}", self.paint("Not started yet", "33"))?,
            CountdownPhase::Active => {}
            CountdownPhase::Expired => writeln!(out, "{}", self.paint("Countdown complete", "32"))?,
        }

        writeln!(
            out,
            "{} {}%",
            self.progress_bar(progress.percentage),
            self.paint(&format!("{:.4}", progress.percentage), "1")
        )?;
        writeln!(
            out,
            "Time Elapsed    {} days · {} seconds passed",
            group_thousands(progress.elapsed_seconds.div_euclid(SECONDS_PER_DAY)),
            group_thousands(progress.elapsed_seconds)
        )?;
        let remaining_percentage = 100.0 - progress.percentage;
        writeln!(
            out,
            "{} {}%",
            self.progress_bar(remaining_percentage),
            self.paint(&format!("{remaining_percentage:.4}"), "1")
        )?;
        writeln!(
            out,
            "Time Remaining  {} days · {} seconds left",
            group_thousands(progress.remaining_seconds.div_euclid(SECONDS_PER_DAY)),
            group_thousands(progress.remaining_seconds)
        )?;
        writeln!(out)?;

        let rows = vec![
            vec!["Months to go".to_string(), format!("{:.1}", countdown.decimal_months)],
            vec!["Weeks remaining".to_string(), format!("{:.1}", countdown.decimal_weeks)],
            vec!["Total Days".to_string(), group_thousands(countdown.total_days)],
            vec!["Total Hours".to_string(), group_thousands(countdown.total_hours)],
            vec!["Total Minutes".to_string(), group_thousands(countdown.total_minutes)],
            vec!["Total Seconds".to_string(), group_thousands(countdown.total_seconds)],
        ];
        write_table(&mut *out, vec!["Stat".to_string(), "Value".to_string()], rows)?;
        writeln!(out)?;

        writeln!(
            out,
            "Live  {}",
            self.paint(
                &format!(
                    "{:02}:{:02}:{:02}:{:02}",
                    countdown.total_days % 100,
                    countdown.hours,
                    countdown.minutes,
                    countdown.seconds
                ),
                "1;37"
            )
        )?;
        writeln!(out, "      DD:HH:MM:SS")?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn write_calendar<W: Write>(
        &self,
        out: &mut W,
        cfg: &Config,
        snapshot: &Snapshot,
    ) -> anyhow::Result<()> {
        let local_now = cfg.zone.naive_local(snapshot.now);
        writeln!(
            out,
            "{}  {} • {:.1}%",
            self.paint("Calendar Progress", "1"),
            local_now.format("%I:%M %p"),
            snapshot.day_progress
        )?;
        writeln!(
            out,
            "Start: {}   Target: {}",
            cfg.zone.local_date(cfg.window.start()).format("%b %-d"),
            cfg.zone.local_date(cfg.window.target()).format("%b %-d")
        )?;

        if let (Some(first), Some(last)) = (snapshot.calendar.first(), snapshot.calendar.last()) {
            writeln!(out, "{} – {}", first.date.format("%b %-d, %Y"), last.date.format("%b %-d, %Y"))?;
        }
        writeln!(out)?;

        for label in WEEKDAY_LABELS {
            write!(out, "{label:>2}  ")?;
        }
        writeln!(out)?;

        let lead = snapshot
            .calendar
            .first()
            .map(|day| day.date.weekday().num_days_from_sunday() as usize)
            .unwrap_or(0);
        write!(out, "{}", " ".repeat(lead * CELL_WIDTH))?;

        for (idx, day) in snapshot.calendar.iter().enumerate() {
            write!(out, "{} ", self.calendar_cell(day))?;
            if (lead + idx) % 7 == 6 {
                writeln!(out)?;
            }
        }
        if (lead + snapshot.calendar.len()) % 7 != 0 {
            writeln!(out)?;
        }

        writeln!(out)?;
        writeln!(out, "+ start  ! target  * today  ~ range  . past")?;
        Ok(())
    }

    fn calendar_cell(&self, day: &CalendarDay) -> String {
        let (marker, code) = if day.is_today {
            ('*', "1;34")
        } else if day.is_start_date {
            ('+', "32")
        } else if day.is_target_date {
            ('!', "31")
        } else if day.is_in_range {
            ('~', "33")
        } else if day.is_past {
            ('.', "2")
        } else {
            (' ', "")
        };
        let text = format!("{:>2}{}", day.date.day(), marker);

        if !day.is_current_month && code.is_empty() {
            return self.paint(&text, "2");
        }
        if code.is_empty() {
            return text;
        }
        self.paint(&text, code)
    }

    fn progress_bar(&self, percentage: f64) -> String {
        let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        format!(
            "[{}{}]",
            self.paint(&"█".repeat(filled), "34"),
            "░".repeat(BAR_WIDTH - filled)
        )
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn format_moment(instant: Instant, zone: &Zone) -> String {
    zone.naive_local(instant)
        .format("%b %-d, %Y • %-I:%M %p")
        .to_string()
}

/// `3283200` becomes `3,283,200`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
