// SPDX-License-Identifier: Apache-2.0

//! Pluggable recognition of "primary" log lines.
//!
//! A format knows how to spot the first line of a logical entry and split
//! it into its raw parts; the correlation engine in
//! [`processor`](crate::processor) depends only on the [`EntryFormat`]
//! capability, never on a concrete format type.

use chrono::format::{Parsed, StrftimeItems};
use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::error::{Error, Result};

/// Raw pieces of a primary line, still unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryFields<'a> {
    /// Leading date/time token
    pub timestamp: &'a str,
    /// Severity token from the closed vocabulary
    pub severity: &'a str,
    /// Remainder of the line
    pub message: &'a str,
}

/// A log line format: recognizes primary lines and supplies the default
/// date handling for its timestamp tokens.
pub trait EntryFormat {
    /// Compiled pattern recognizing the first line of a logical entry.
    fn primary_pattern(&self) -> &Regex;

    /// Split a line into its primary-line parts, or `None` when the line
    /// does not start a new entry (a continuation line).
    fn parse_primary<'a>(&self, line: &'a str) -> Option<PrimaryFields<'a>>;

    /// Timestamp formats tried in order when no explicit override is
    /// configured.
    fn fallback_date_formats(&self) -> &[&'static str];
}

/// Regex pattern for the default structured-logger line layout.
///
/// Captures:
/// - `ts`: leading date/time token (non-greedy)
/// - `sev`: severity token, optionally bracket- or paren-wrapped
/// - `msg`: the remaining message
pub const LOG4J_PRIMARY_PATTERN: &str =
    r"^(?P<ts>.*?)\s*[\[(]?(?P<sev>TRACE|DEBUG|INFO|WARN|ERROR|FATAL)[\])]?\s*(?P<msg>.*)$";

/// Timestamp formats of the stock log4j layouts, tried in order:
/// ISO8601 (`2007-12-21 15:32:49,514`), DATE (`21 Dec 2007 15:32:49,514`),
/// then ABSOLUTE (`15:32:49,514`, paired with today's date).
pub const LOG4J_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S,%3f",
    "%d %b %Y %H:%M:%S,%3f",
    "%H:%M:%S,%3f",
];

/// Format for log4j-style lines: a timestamp, a severity token, and the
/// message, with stack traces continuing on unmarked lines.
pub struct Log4jFormat {
    pattern: Regex,
}

impl Log4jFormat {
    /// Create the format with its default primary-line pattern.
    pub fn new() -> Result<Self> {
        Self::with_pattern(LOG4J_PRIMARY_PATTERN)
    }

    /// Create the format with a custom primary-line pattern. The pattern
    /// must define the `ts`, `sev` and `msg` named capture groups and is
    /// compiled exactly once.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid primary-line pattern: {}", e)))?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for required in ["ts", "sev", "msg"] {
            if !names.contains(&required) {
                return Err(Error::Config(format!(
                    "primary-line pattern must define a (?P<{}>...) capture group",
                    required
                )));
            }
        }

        Ok(Self { pattern: regex })
    }
}

impl EntryFormat for Log4jFormat {
    fn primary_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn parse_primary<'a>(&self, line: &'a str) -> Option<PrimaryFields<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(PrimaryFields {
            timestamp: caps.name("ts")?.as_str(),
            severity: caps.name("sev")?.as_str(),
            message: caps.name("msg").map_or("", |m| m.as_str()),
        })
    }

    fn fallback_date_formats(&self) -> &[&'static str] {
        LOG4J_DATE_FORMATS
    }
}

/// Parse a timestamp token with a single strftime format.
///
/// A format that supplies time-of-day only (no date fields) yields the
/// parsed time on today's local date; this leans on the poll interval
/// being well under 24 hours.
pub(crate) fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, value, StrftimeItems::new(format)).ok()?;

    if let Ok(ts) = parsed.to_naive_datetime_with_offset(0) {
        return Some(ts);
    }

    let time = parsed.to_naive_time().ok()?;
    Some(Local::now().date_naive().and_time(time))
}
