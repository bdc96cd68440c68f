//! Error types for countdown configuration.
//!
//! The computation engines never fail; everything that can go wrong happens
//! while turning user configuration into a validated window and zone.

/// Configuration error raised while building a countdown window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("start {start} must be strictly before target {target}")]
    EmptyWindow { start: String, target: String },

    #[error("invalid instant {value:?} for {field}: {reason}")]
    InvalidInstant {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid timezone {0:?}: expected a fixed offset like +05:00 or an IANA name")]
    InvalidTimezone(String),

    #[error("invalid month {0:?}: expected YYYY-MM")]
    InvalidMonth(String),
}

impl ConfigError {
    pub fn invalid_instant(
        field: &'static str,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidInstant {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
