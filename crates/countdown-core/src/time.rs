use std::fmt;

use chrono::{
  DateTime,
  Duration,
  FixedOffset,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// Absolute point in time. All
/// arithmetic happens on epoch
/// milliseconds.
pub type Instant = DateTime<Utc>;

/// Milliseconds from `from` to `to`,
/// negative when `to` is earlier.
#[must_use]
pub fn millis_between(
  from: Instant,
  to: Instant
) -> i64 {
  to.timestamp_millis().saturating_sub(
    from.timestamp_millis()
  )
}

#[tracing::instrument(level = "debug")]
pub fn parse_instant(
  field: &'static str,
  raw: &str
) -> Result<
  DateTime<FixedOffset>,
  ConfigError
> {
  DateTime::parse_from_rfc3339(
    raw.trim()
  )
  .map_err(|err| {
    ConfigError::invalid_instant(
      field, raw, err
    )
  })
}

/// Zone whose wall clock defines
/// calendar days.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Zone {
  Fixed(FixedOffset),
  Named(Tz)
}

impl Zone {
  pub fn parse(
    raw: &str
  ) -> Result<Self, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(
        ConfigError::InvalidTimezone(
          raw.to_string()
        )
      );
    }

    if let Some(offset) =
      parse_fixed_offset(trimmed)
    {
      tracing::debug!(
        timezone = %trimmed,
        "parsed fixed offset zone"
      );
      return Ok(Self::Fixed(offset));
    }

    match trimmed.parse::<Tz>() {
      | Ok(tz) => {
        tracing::debug!(
          timezone = %trimmed,
          "parsed named zone"
        );
        Ok(Self::Named(tz))
      }
      | Err(err) => {
        tracing::error!(
          timezone = %trimmed,
          error = %err,
          "failed to parse timezone id"
        );
        Err(
          ConfigError::InvalidTimezone(
            trimmed.to_string()
          )
        )
      }
    }
  }

  #[must_use]
  pub fn naive_local(
    &self,
    instant: Instant
  ) -> NaiveDateTime {
    match self {
      | Self::Fixed(offset) => instant
        .with_timezone(offset)
        .naive_local(),
      | Self::Named(tz) => instant
        .with_timezone(tz)
        .naive_local()
    }
  }

  #[must_use]
  pub fn local_date(
    &self,
    instant: Instant
  ) -> NaiveDate {
    self.naive_local(instant).date()
  }

  /// Maps a local wall time back to an
  /// instant. Ambiguous times pick the
  /// earliest candidate; times inside a
  /// DST gap move forward one hour.
  #[must_use]
  pub fn resolve_local(
    &self,
    local: NaiveDateTime
  ) -> Instant {
    match self {
      | Self::Fixed(offset) => {
        resolve_in(offset, local)
      }
      | Self::Named(tz) => {
        resolve_in(tz, local)
      }
    }
  }

  #[must_use]
  pub fn midnight(
    &self,
    date: NaiveDate
  ) -> Instant {
    self.resolve_local(
      date.and_time(NaiveTime::MIN)
    )
  }
}

impl fmt::Display for Zone {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Fixed(offset) => {
        write!(f, "{offset}")
      }
      | Self::Named(tz) => {
        write!(f, "{}", tz.name())
      }
    }
  }
}

fn resolve_in<Z>(
  zone: &Z,
  local: NaiveDateTime
) -> Instant
where
  Z: TimeZone,
  Z::Offset: fmt::Display
{
  match zone.from_local_datetime(&local)
  {
    | LocalResult::Single(local_dt) => {
      local_dt.with_timezone(&Utc)
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::trace!(
        first = %first,
        second = %second,
        "ambiguous local datetime; using earliest"
      );
      let chosen = if first <= second {
        first
      } else {
        second
      };
      chosen.with_timezone(&Utc)
    }
    | LocalResult::None => {
      tracing::trace!(
        local = %local,
        "local datetime falls in a gap; shifting forward"
      );
      local
        .checked_add_signed(
          Duration::hours(1)
        )
        .and_then(|shifted| {
          zone
            .from_local_datetime(
              &shifted
            )
            .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
          Utc.from_utc_datetime(&local)
        })
    }
  }
}

fn parse_fixed_offset(
  raw: &str
) -> Option<FixedOffset> {
  if raw.eq_ignore_ascii_case("z") {
    return FixedOffset::east_opt(0);
  }

  let (sign, rest) =
    if let Some(rest) =
      raw.strip_prefix('+')
    {
      (1, rest)
    } else if let Some(rest) =
      raw.strip_prefix('-')
    {
      (-1, rest)
    } else {
      return None;
    };

  let digits: String = rest
    .chars()
    .filter(|c| *c != ':')
    .collect();
  if !(digits.len() == 2
    || digits.len() == 4)
    || !digits
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    return None;
  }

  let hours: i32 =
    digits[..2].parse().ok()?;
  let minutes: i32 =
    if digits.len() == 4 {
      digits[2..].parse().ok()?
    } else {
      0
    };
  if hours > 23 || minutes > 59 {
    return None;
  }

  FixedOffset::east_opt(
    sign * (hours * 3_600 + minutes * 60)
  )
}
