use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono::Utc;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::countdown::CountdownWindow;
use crate::error::ConfigError;
use crate::time::{
  Zone,
  parse_instant
};

const CONFIG_FILE: &str =
  "countdown.toml";
const CONFIG_ENV_VAR: &str =
  "COUNTDOWN_CONFIG";
const DEFAULT_TITLE: &str =
  "Countdown to Launch";
const DEFAULT_START: &str =
  "2025-07-12T16:15:00+05:00";
const DEFAULT_TARGET: &str =
  "2025-09-25T16:15:00+05:00";
const DEFAULT_TICK_MS: u64 = 1_000;

/// Raw settings as written in
/// `countdown.toml`.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Deserialize,
  Serialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  pub title:    String,
  pub start:    String,
  pub target:   String,
  pub timezone: Option<String>,
  pub color:    bool,
  pub tick_ms:  u64
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      title:    DEFAULT_TITLE.to_string(),
      start:    DEFAULT_START.to_string(),
      target:   DEFAULT_TARGET
        .to_string(),
      timezone: None,
      color:    true,
      tick_ms:  DEFAULT_TICK_MS
    }
  }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
  pub title:       String,
  pub window:      CountdownWindow,
  pub zone:        Zone,
  pub color:       bool,
  pub tick:        Duration,
  pub loaded_file: Option<PathBuf>
}

impl Config {
  #[tracing::instrument(skip(
    config_override,
    overrides
  ))]
  pub fn load<I>(
    config_override: Option<&Path>,
    overrides: I
  ) -> anyhow::Result<Self>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    let path = resolve_config_path(
      config_override
    )?;
    let mut settings =
      if let Some(path) = &path {
        info!(config = %path.display(), "loading config");
        Settings::load_file(path)?
      } else {
        warn!(
          "no config file found; using \
           defaults"
        );
        Settings::default()
      };

    settings
      .apply_overrides(overrides)?;

    let mut config = settings
      .resolve()
      .context(
        "invalid countdown \
         configuration"
      )?;
    config.loaded_file = path;
    Ok(config)
  }
}

impl Settings {
  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    Self::from_toml(&text).with_context(
      || {
        format!(
          "failed to parse {}",
          path.display()
        )
      }
    )
  }

  pub fn from_toml(
    text: &str
  ) -> anyhow::Result<Self> {
    let settings =
      toml::from_str::<Settings>(text)?;
    debug!(?settings, "parsed settings");
    Ok(settings)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k.trim();
      let value = v.trim().to_string();
      debug!(key = %key, value = %value, "applying override");
      match key {
        | "title" => self.title = value,
        | "start" => self.start = value,
        | "target" => self.target = value,
        | "timezone" => {
          self.timezone = if value
            .is_empty()
          {
            None
          } else {
            Some(value)
          };
        }
        | "color" => {
          self.color = parse_bool(&value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color \
                 setting: {value}"
              )
            })?;
        }
        | "tick_ms" => {
          self.tick_ms = value
            .parse()
            .with_context(|| {
              format!(
                "invalid tick_ms: \
                 {value}"
              )
            })?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: \
             {other}"
          ));
        }
      }
    }
    Ok(())
  }

  /// Validates the window and zone.
  /// The zone defaults to the start
  /// instant's own offset.
  pub fn resolve(
    mut self
  ) -> Result<Config, ConfigError> {
    sanitize_settings(&mut self);

    let start =
      parse_instant("start", &self.start)?;
    let target = parse_instant(
      "target",
      &self.target
    )?;

    let zone = match &self.timezone {
      | Some(raw) => Zone::parse(raw)?,
      | None => {
        Zone::Fixed(*start.offset())
      }
    };

    let window = CountdownWindow::new(
      start.with_timezone(&Utc),
      target.with_timezone(&Utc)
    )?;

    info!(
      start = %window.start(),
      target = %window.target(),
      zone = %zone,
      "resolved countdown window"
    );

    Ok(Config {
      title: self.title,
      window,
      zone,
      color: self.color,
      tick: Duration::from_millis(
        self.tick_ms
      ),
      loaded_file: None
    })
  }
}

fn sanitize_settings(
  settings: &mut Settings
) {
  if settings.title.trim().is_empty() {
    settings.title =
      DEFAULT_TITLE.to_string();
  }

  if settings.tick_ms == 0 {
    warn!(
      "tick_ms must be positive; using \
       default"
    );
    settings.tick_ms = DEFAULT_TICK_MS;
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
      return Ok(None);
    }
    if !trimmed.is_empty() {
      return Ok(Some(PathBuf::from(
        trimmed
      )));
    }
  }

  let local = std::env::current_dir()
    .context(
      "cannot determine current \
       directory"
    )?
    .join(CONFIG_FILE);
  if local.exists() {
    return Ok(Some(local));
  }

  if let Some(dir) = dirs::config_dir()
  {
    let candidate = dir
      .join("countdown")
      .join(CONFIG_FILE);
    if candidate.exists() {
      return Ok(Some(candidate));
    }
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
