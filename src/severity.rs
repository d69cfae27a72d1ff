// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Severity indicates the seriousness of a log entry.
///
/// The input vocabulary is the six-token set written by structured loggers
/// (TRACE, DEBUG, INFO, WARN, ERROR, FATAL). TRACE collapses into `Debug`,
/// so the output taxonomy is one level coarser than the token set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Debugging detail (also covers TRACE input)
    Debug,
    /// High level application details
    Info,
    /// Someone should look into this
    Warn,
    /// Something undesirable happened
    Error,
    /// Application is unusable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;

    /// Map an input token to its output severity. The vocabulary is closed:
    /// an unknown token is a parse error, never a silent default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" | "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(Error::Severity(s.to_string())),
        }
    }
}
