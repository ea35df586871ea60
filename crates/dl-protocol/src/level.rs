use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Log level encoded in a log file's name.
///
/// Declaration order is the order levels are reported in, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Every level, in reporting order.
    pub const ALL: [LogLevel; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Upper-case token written on each record line (e.g. `ERROR`).
    pub fn token(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Prefix of standard files, e.g. `error-`.
    pub fn standard_prefix(&self) -> String {
        format!("{}-", self.as_str())
    }

    /// Prefix of custom files, e.g. `customError-`.
    pub fn custom_prefix(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        };
        format!("custom{capitalized}-")
    }

    /// Whether `filename` belongs to this level.
    ///
    /// Standard prefixes are matched exactly. The custom prefix is matched
    /// ignoring ASCII case, since stores write both `customError-` and
    /// `customerror-`.
    pub fn matches_filename(&self, filename: &str, include_custom: bool) -> bool {
        if filename.starts_with(&self.standard_prefix()) {
            return true;
        }
        if !include_custom {
            return false;
        }
        let prefix = self.custom_prefix();
        filename
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known log level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl std::str::FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" | "fatal" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}
