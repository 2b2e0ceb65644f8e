use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Severity of a log record, most severe first.
///
/// Ordering follows severity: `Level::Error < Level::Silly`, so a record
/// passes a threshold when `record_level <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Silly,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Verbose,
        Level::Debug,
        Level::Silly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Silly => "silly",
        }
    }

    /// Default style class used when colorizing the level badge.
    pub fn default_class(self) -> &'static str {
        match self {
            Level::Error => "uk-text-danger",
            Level::Warn => "uk-text-warning",
            Level::Info => "uk-text-success",
            Level::Verbose => "uk-text-primary",
            Level::Debug | Level::Silly => "uk-text-muted",
        }
    }

    /// Whether a record at this level passes the `threshold`.
    pub fn passes(self, threshold: Level) -> bool {
        self <= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidLevel(s.to_string()))
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Silly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" silly ".parse::<Level>().unwrap(), Level::Silly);
        assert!(matches!(
            "fatal".parse::<Level>(),
            Err(ConfigError::InvalidLevel(name)) if name == "fatal"
        ));
    }

    #[test]
    fn threshold_orders_by_severity() {
        assert!(Level::Error.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(!Level::Debug.passes(Level::Info));
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(Level::default(), Level::Info);
    }

    #[test]
    fn maps_tracing_levels() {
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Silly);
        assert_eq!(Level::from(&tracing::Level::ERROR), Level::Error);
    }
}
