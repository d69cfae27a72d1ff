// SPDX-License-Identifier: Apache-2.0

//! Per-source configuration.

use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::path::PathBuf;

use crate::severity::Severity;

/// Event type used when the caller does not tag a source explicitly.
pub const DEFAULT_EVENT_TYPE: &str = "logfile.entry";

/// Configuration for one polled log file. Immutable once set.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Path of the log file to poll
    pub path: PathBuf,
    /// Whether this source should be polled at all
    pub enabled: bool,
    /// Event type tag stamped on every emitted record
    pub event_type: String,
    /// strftime format used exclusively for timestamps, replacing the
    /// format's fallback chain
    pub date_format: Option<String>,
    /// Only emit entries whose detail matches this pattern
    pub includes_pattern: Option<String>,
    /// Only emit entries at or above this severity
    pub min_severity: Option<Severity>,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("A log file path must be specified".to_string());
        }

        if let Some(pattern) = &self.includes_pattern {
            Regex::new(pattern).map_err(|e| format!("Invalid includes pattern: {}", e))?;
        }

        if let Some(format) = &self.date_format {
            if format.is_empty() {
                return Err("Date format override must not be empty".to_string());
            }
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(format!("Invalid date format override: {:?}", format));
            }
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            enabled: true,
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            date_format: None,
            includes_pattern: None,
            min_severity: None,
        }
    }
}
