use std::fmt;
use std::str::FromStr;

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Weekday
};
use serde::Serialize;

use crate::countdown::CountdownWindow;
use crate::error::ConfigError;
use crate::time::{
  Instant,
  Zone,
  millis_between
};

/// Local wall-clock hour at which a
/// custom day begins.
pub const DAY_BOUNDARY_HOUR: u32 = 16;
/// Local wall-clock minute at which a
/// custom day begins.
pub const DAY_BOUNDARY_MINUTE: u32 = 15;

const MONTH_WINDOW_DAYS: i64 = 28;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
  pub date:             NaiveDate,
  pub is_start_date:    bool,
  pub is_target_date:   bool,
  pub is_today:         bool,
  pub is_past:          bool,
  pub is_future:        bool,
  pub is_in_range:      bool,
  pub is_current_month: bool,
  pub day_progress:     f64
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum MonthStep {
  Previous,
  Next
}

/// Navigation cursor for month-window
/// mode. Months are 1-based.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct MonthCursor {
  year:  i32,
  month: u32
}

impl MonthCursor {
  pub fn new(
    year: i32,
    month: u32
  ) -> Result<Self, ConfigError> {
    let (min_year, max_year) =
      cursor_year_bounds();
    if !(1..=12).contains(&month)
      || !(min_year..=max_year)
        .contains(&year)
    {
      return Err(
        ConfigError::InvalidMonth(
          format!("{year:04}-{month:02}")
        )
      );
    }
    Ok(Self { year, month })
  }

  #[must_use]
  pub fn containing(
    date: NaiveDate
  ) -> Self {
    Self::from_index(month_index(
      date.year(),
      date.month()
    ))
  }

  #[must_use]
  pub fn year(&self) -> i32 {
    self.year
  }

  #[must_use]
  pub fn month(&self) -> u32 {
    self.month
  }

  #[must_use]
  pub fn first_day(&self) -> NaiveDate {
    first_day_of_month(
      self.year, self.month
    )
  }

  /// Moves one month, rolling the year
  /// over at December and January.
  pub fn advance(
    &mut self,
    step: MonthStep
  ) {
    let months = match step {
      | MonthStep::Next => 1,
      | MonthStep::Previous => -1
    };
    *self = self.shifted(months);
  }

  /// Shifts by `months`, clamped to the
  /// range chrono can lay a full window
  /// out in.
  #[must_use]
  pub fn shifted(
    self,
    months: i32
  ) -> Self {
    Self::from_index(
      month_index(self.year, self.month)
        + i64::from(months)
    )
  }

  fn from_index(index: i64) -> Self {
    let (min_year, max_year) =
      cursor_year_bounds();
    let index = index.clamp(
      month_index(min_year, 1),
      month_index(max_year, 12)
    );
    Self {
      year:  index.div_euclid(12) as i32,
      month: index.rem_euclid(12) as u32
        + 1
    }
  }
}

fn month_index(
  year: i32,
  month: u32
) -> i64 {
  i64::from(year) * 12
    + i64::from(month)
    - 1
}

// One year of slack on each side keeps
// the leading Sunday and the trailing
// month end representable.
fn cursor_year_bounds() -> (i32, i32) {
  (
    NaiveDate::MIN.year() + 1,
    NaiveDate::MAX.year() - 1
  )
}

impl fmt::Display for MonthCursor {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

impl FromStr for MonthCursor {
  type Err = ConfigError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let invalid = || {
      ConfigError::InvalidMonth(
        s.to_string()
      )
    };
    let (year, month) = s
      .trim()
      .split_once('-')
      .ok_or_else(invalid)?;
    let year: i32 = year
      .parse()
      .map_err(|_| invalid())?;
    let month: u32 = month
      .parse()
      .map_err(|_| invalid())?;
    Self::new(year, month)
      .map_err(|_| invalid())
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum GridMode {
  /// 1st of the start month through
  /// the last day of the target month.
  FullRange,
  /// 28 days from the Sunday on or
  /// before the 1st of the cursor
  /// month.
  MonthWindow(MonthCursor)
}

#[tracing::instrument(skip(window, zone))]
pub fn generate_grid(
  window: &CountdownWindow,
  now: Instant,
  mode: GridMode,
  zone: &Zone
) -> Vec<CalendarDay> {
  let start_day =
    zone.local_date(window.start());
  let target_day =
    zone.local_date(window.target());
  let today = zone.local_date(now);
  let today_progress =
    custom_day_progress(now, zone);

  let (first, len) = match mode {
    | GridMode::FullRange => {
      let first = first_day_of_month(
        start_day.year(),
        start_day.month()
      );
      let last = last_day_of_month(
        target_day.year(),
        target_day.month()
      );
      (
        first,
        (last - first).num_days() + 1
      )
    }
    | GridMode::MonthWindow(cursor) => {
      (
        start_of_week(
          cursor.first_day(),
          Weekday::Sun
        ),
        MONTH_WINDOW_DAYS
      )
    }
  };

  tracing::debug!(
    first = %first,
    len,
    today = %today,
    "generating calendar grid"
  );

  (0..len.max(0))
    .map(|offset| {
      let date = add_days(first, offset);
      let is_today = date == today;
      let is_past = date < today;
      let midnight = zone.midnight(date);
      let is_current_month = match mode {
        | GridMode::FullRange => {
          date.month() == start_day.month()
            || date.month()
              == target_day.month()
        }
        | GridMode::MonthWindow(cursor) => {
          date.year() == cursor.year()
            && date.month()
              == cursor.month()
        }
      };

      CalendarDay {
        date,
        is_start_date: date == start_day,
        is_target_date: date
          == target_day,
        is_today,
        is_past,
        is_future: date > today,
        is_in_range: midnight
          >= window.start()
          && midnight <= window.target(),
        is_current_month,
        day_progress: if is_today {
          today_progress
        } else if is_past {
          100.0
        } else {
          0.0
        }
      }
    })
    .collect()
}

/// Percentage of the current custom day
/// elapsed. A custom day runs from
/// 16:15 local time to 16:15 the next
/// day.
#[must_use]
pub fn custom_day_progress(
  now: Instant,
  zone: &Zone
) -> f64 {
  let today = zone.local_date(now);
  let mut day_start = zone
    .resolve_local(day_boundary(today));
  let mut start_date = today;
  if now < day_start {
    start_date = add_days(today, -1);
    day_start = zone.resolve_local(
      day_boundary(start_date)
    );
  }
  let day_end = zone.resolve_local(
    day_boundary(add_days(
      start_date, 1
    ))
  );

  let total =
    millis_between(day_start, day_end);
  if total <= 0 {
    return 0.0;
  }
  let elapsed =
    millis_between(day_start, now);
  ((elapsed as f64 / total as f64)
    * 100.0)
    .clamp(0.0, 100.0)
}

fn day_boundary(
  date: NaiveDate
) -> NaiveDateTime {
  date
    .and_hms_opt(
      DAY_BOUNDARY_HOUR,
      DAY_BOUNDARY_MINUTE,
      0
    )
    .unwrap_or_else(|| {
      date.and_time(NaiveTime::MIN)
    })
}

fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    Datelike,
    NaiveDate,
    Utc,
    Weekday
  };

  use super::*;

  fn at(raw: &str) -> Instant {
    DateTime::parse_from_rfc3339(raw)
      .expect("valid instant")
      .with_timezone(&Utc)
  }

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn karachi() -> Zone {
    Zone::parse("+05:00")
      .expect("fixed offset")
  }

  fn launch_window() -> CountdownWindow {
    CountdownWindow::new(
      at("2025-07-12T16:15:00+05:00"),
      at("2025-09-25T16:15:00+05:00")
    )
    .expect("valid window")
  }

  #[test]
  fn full_range_spans_boundary_months() {
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T16:15:00+05:00"),
      GridMode::FullRange,
      &karachi()
    );

    assert_eq!(days.len(), 31 + 31 + 30);
    assert_eq!(days[0].date, date(2025, 7, 1));
    assert_eq!(
      days[days.len() - 1].date,
      date(2025, 9, 30)
    );
    assert!(days[0].is_current_month);
    assert!(
      days[days.len() - 1].is_current_month
    );
    assert!(
      days
        .iter()
        .filter(|d| d.date.month() == 8)
        .all(|d| !d.is_current_month)
    );
  }

  #[test]
  fn full_range_flags_start_target_today() {
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T18:00:00+05:00"),
      GridMode::FullRange,
      &karachi()
    );

    let starts: Vec<_> = days
      .iter()
      .filter(|d| d.is_start_date)
      .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(
      starts[0].date,
      date(2025, 7, 12)
    );

    let targets: Vec<_> = days
      .iter()
      .filter(|d| d.is_target_date)
      .collect();
    assert_eq!(targets.len(), 1);
    assert_eq!(
      targets[0].date,
      date(2025, 9, 25)
    );

    let today: Vec<_> = days
      .iter()
      .filter(|d| d.is_today)
      .collect();
    assert_eq!(today.len(), 1);
    assert!(!today[0].is_past);
    assert!(!today[0].is_future);
    assert!(
      today[0].day_progress > 7.0
        && today[0].day_progress < 8.0
    );
  }

  #[test]
  fn past_and_future_are_day_level() {
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T00:00:01+05:00"),
      GridMode::FullRange,
      &karachi()
    );

    for day in &days {
      let expected_past =
        day.date < date(2025, 8, 18);
      let expected_future =
        day.date > date(2025, 8, 18);
      assert_eq!(day.is_past, expected_past);
      assert_eq!(
        day.is_future,
        expected_future
      );
      if day.is_past {
        assert_eq!(day.day_progress, 100.0);
      } else if day.is_future {
        assert_eq!(day.day_progress, 0.0);
      }
    }
  }

  #[test]
  fn in_range_compares_local_midnight() {
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T16:15:00+05:00"),
      GridMode::FullRange,
      &karachi()
    );
    let find = |d: NaiveDate| {
      days
        .iter()
        .find(|day| day.date == d)
        .expect("day in grid")
    };

    // Midnight of the start day precedes
    // the 16:15 start instant.
    assert!(!find(date(2025, 7, 12)).is_in_range);
    assert!(find(date(2025, 7, 13)).is_in_range);
    assert!(find(date(2025, 9, 25)).is_in_range);
    assert!(!find(date(2025, 9, 26)).is_in_range);
  }

  #[test]
  fn month_window_is_four_weeks_from_sunday() {
    let cursor = MonthCursor::new(2025, 8)
      .expect("valid cursor");
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T16:15:00+05:00"),
      GridMode::MonthWindow(cursor),
      &karachi()
    );

    assert_eq!(days.len(), 28);
    assert_eq!(
      days[0].date.weekday(),
      Weekday::Sun
    );
    assert_eq!(days[0].date, date(2025, 7, 27));
    assert!(!days[0].is_current_month);
    assert!(days[5].is_current_month);
    assert_eq!(
      days.iter().filter(|d| d.is_start_date).count(),
      0
    );
    assert_eq!(
      days.iter().filter(|d| d.is_target_date).count(),
      0
    );
    assert_eq!(
      days.iter().filter(|d| d.is_today).count(),
      1
    );
  }

  #[test]
  fn month_window_starting_on_sunday() {
    // June 2025 begins on a Sunday.
    let cursor = MonthCursor::new(2025, 6)
      .expect("valid cursor");
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T16:15:00+05:00"),
      GridMode::MonthWindow(cursor),
      &karachi()
    );

    assert_eq!(days.len(), 28);
    assert_eq!(days[0].date, date(2025, 6, 1));
    assert!(days.iter().all(|d| d.is_past));
    assert!(
      days.iter().all(|d| !d.is_in_range)
    );
  }

  #[test]
  fn month_window_contains_start() {
    let cursor = MonthCursor::new(2025, 7)
      .expect("valid cursor");
    let days = generate_grid(
      &launch_window(),
      at("2025-08-18T16:15:00+05:00"),
      GridMode::MonthWindow(cursor),
      &karachi()
    );

    assert_eq!(days.len(), 28);
    assert_eq!(days[0].date, date(2025, 6, 29));
    assert_eq!(
      days[27].date,
      date(2025, 7, 26)
    );
    let starts: Vec<_> = days
      .iter()
      .filter(|d| d.is_start_date)
      .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(
      starts[0].date,
      date(2025, 7, 12)
    );
  }

  #[test]
  fn custom_day_starts_at_boundary() {
    let zone = karachi();
    assert_eq!(
      custom_day_progress(
        at("2025-08-18T16:15:00.000+05:00"),
        &zone
      ),
      0.0
    );

    let before = custom_day_progress(
      at("2025-08-18T16:14:59.999+05:00"),
      &zone
    );
    assert!(before > 99.9997);
    assert!(before < 100.0);

    let half = custom_day_progress(
      at("2025-08-19T04:15:00+05:00"),
      &zone
    );
    assert_eq!(half, 50.0);
  }

  #[test]
  fn custom_day_ignores_window_times() {
    let window = CountdownWindow::new(
      at("2025-07-12T09:00:00+05:00"),
      at("2025-09-25T09:00:00+05:00")
    )
    .expect("valid window");
    let days = generate_grid(
      &window,
      at("2025-08-18T16:15:00+05:00"),
      GridMode::FullRange,
      &karachi()
    );
    let today = days
      .iter()
      .find(|d| d.is_today)
      .expect("today in grid");
    assert_eq!(today.day_progress, 0.0);
  }

  #[test]
  fn cursor_rolls_over_years() {
    let mut cursor =
      MonthCursor::new(2025, 12)
        .expect("valid cursor");
    cursor.advance(MonthStep::Next);
    assert_eq!(cursor.year(), 2026);
    assert_eq!(cursor.month(), 1);

    cursor.advance(MonthStep::Previous);
    assert_eq!(cursor.year(), 2025);
    assert_eq!(cursor.month(), 12);

    let back = MonthCursor::new(2025, 1)
      .expect("valid cursor")
      .shifted(-1);
    assert_eq!(back.to_string(), "2024-12");

    let ahead = MonthCursor::new(2025, 7)
      .expect("valid cursor")
      .shifted(14);
    assert_eq!(ahead.to_string(), "2026-09");
  }

  #[test]
  fn cursor_rejects_years_outside_chrono() {
    assert!(
      "300000-01"
        .parse::<MonthCursor>()
        .is_err()
    );
    assert!(
      MonthCursor::new(-300000, 6)
        .is_err()
    );
    let (min_year, max_year) =
      cursor_year_bounds();
    assert!(
      MonthCursor::new(max_year + 1, 1)
        .is_err()
    );
    assert!(
      MonthCursor::new(min_year, 1)
        .is_ok()
    );
  }

  #[test]
  fn cursor_extremes_still_start_on_sunday()
  {
    let zone = karachi();
    let window = launch_window();
    let now =
      at("2025-08-18T16:15:00+05:00");
    let (min_year, max_year) =
      cursor_year_bounds();

    for cursor in [
      MonthCursor::new(min_year, 1)
        .expect("valid cursor"),
      MonthCursor::new(max_year, 12)
        .expect("valid cursor")
    ] {
      let days = generate_grid(
        &window,
        now,
        GridMode::MonthWindow(cursor),
        &zone
      );
      assert_eq!(days.len(), 28);
      assert_eq!(
        days[0].date.weekday(),
        Weekday::Sun
      );
      assert!(
        days
          .iter()
          .any(|d| d.is_current_month)
      );
    }
  }

  #[test]
  fn large_offsets_clamp_without_looping()
  {
    let cursor = MonthCursor::new(2025, 8)
      .expect("valid cursor");
    let (min_year, max_year) =
      cursor_year_bounds();

    let ahead = cursor.shifted(i32::MAX);
    assert_eq!(ahead.year(), max_year);
    assert_eq!(ahead.month(), 12);

    let back = cursor.shifted(i32::MIN);
    assert_eq!(back.year(), min_year);
    assert_eq!(back.month(), 1);

    let mut edge = ahead;
    edge.advance(MonthStep::Next);
    assert_eq!(edge, ahead);

    assert_eq!(
      cursor.shifted(-20).to_string(),
      "2023-12"
    );
  }

  #[test]
  fn cursor_parses_year_month() {
    let cursor: MonthCursor = "2025-09"
      .parse()
      .expect("valid cursor");
    assert_eq!(cursor.year(), 2025);
    assert_eq!(cursor.month(), 9);

    assert!("2025-13".parse::<MonthCursor>().is_err());
    assert!("september".parse::<MonthCursor>().is_err());
    assert!(MonthCursor::new(2025, 0).is_err());
  }

  #[test]
  fn month_helpers_handle_december() {
    assert_eq!(
      last_day_of_month(2025, 12),
      date(2025, 12, 31)
    );
    assert_eq!(
      last_day_of_month(2024, 2),
      date(2024, 2, 29)
    );
    assert_eq!(
      start_of_week(
        date(2025, 8, 1),
        Weekday::Sun
      ),
      date(2025, 7, 27)
    );
  }
}
