// SPDX-License-Identifier: Apache-2.0

//! Multi-line correlation state machine.
//!
//! Raw lines arrive one at a time; lines matching the format's primary
//! pattern open a new logical entry, and lines that don't are folded into
//! whichever entry is currently accumulating. A stack trace therefore
//! lands in the detail of the entry that produced it.

use chrono::NaiveDateTime;
use regex::Regex;
use std::io::{self, BufRead};
use tracing::warn;

use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::format::{EntryFormat, PrimaryFields};
use crate::severity::Severity;

/// One in-progress logical entry. Owned by a single `process` invocation;
/// destroyed on finalize or when an unparseable primary line abandons it.
struct WorkingEntry {
    timestamp: NaiveDateTime,
    severity: Severity,
    detail: String,
}

impl WorkingEntry {
    fn new(timestamp: NaiveDateTime, severity: Severity, message: &str) -> Self {
        Self {
            timestamp,
            severity,
            detail: message.to_string(),
        }
    }

    fn append_line(&mut self, line: &str) {
        self.detail.push('\n');
        self.detail.push_str(line);
    }

    fn into_event(self, event_type: &str, source: &str) -> LogEvent {
        LogEvent::new(event_type, source, self.timestamp, self.severity, self.detail)
    }
}

/// Drives line classification for one source using an [`EntryFormat`],
/// groups continuation lines into logical entries, and applies the
/// configured severity/content filters on finalization.
///
/// Formats carry their own compiled parse state, so each processor owns
/// its format instance outright; nothing is shared between concurrently
/// running pollers.
pub struct EntryProcessor<F = crate::format::Log4jFormat> {
    format: F,
    event_type: String,
    source: String,
    date_format: Option<String>,
    min_severity: Option<Severity>,
    includes: Option<Regex>,
}

impl<F: EntryFormat> EntryProcessor<F> {
    pub fn new(format: F, event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            format,
            event_type: event_type.into(),
            source: source.into(),
            date_format: None,
            min_severity: None,
            includes: None,
        }
    }

    /// Use this strftime format exclusively for timestamps, instead of the
    /// format's fallback chain.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Only emit entries at or above this severity.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Only emit entries whose detail matches this pattern.
    pub fn with_includes(mut self, pattern: Regex) -> Self {
        self.includes = Some(pattern);
        self
    }

    /// Consume lines from `input` until EOF and return the entries that
    /// survived the filters. A trailing entry with no following primary
    /// line is finalized at end of input, so it is never lost.
    ///
    /// IO errors abort the invocation; any entries assembled so far are
    /// discarded with it, and the caller treats the cycle as "no data".
    pub fn process<R: BufRead>(&self, input: R) -> io::Result<Vec<LogEvent>> {
        let mut events = Vec::new();
        let mut working: Option<WorkingEntry> = None;

        for line in input.lines() {
            let line = line?;
            match self.format.parse_primary(&line) {
                Some(fields) => {
                    if let Some(done) = working.take() {
                        self.finalize(done, &mut events);
                    }
                    working = match self.start_entry(&fields) {
                        Ok(entry) => Some(entry),
                        Err(err) => {
                            // Continuation lines are dropped until the next
                            // recognized primary line.
                            warn!(line = %line, error = %err, "dropping unparseable primary line");
                            None
                        }
                    };
                }
                None => {
                    if let Some(entry) = working.as_mut() {
                        entry.append_line(&line);
                    }
                }
            }
        }

        if let Some(done) = working.take() {
            self.finalize(done, &mut events);
        }

        Ok(events)
    }

    fn start_entry(&self, fields: &PrimaryFields<'_>) -> Result<WorkingEntry> {
        let severity: Severity = fields.severity.parse()?;
        let timestamp = self.parse_timestamp(fields.timestamp)?;
        Ok(WorkingEntry::new(timestamp, severity, fields.message))
    }

    /// An explicit override format is used exclusively; otherwise the
    /// format's fallback chain is tried in order and the first success
    /// wins.
    fn parse_timestamp(&self, value: &str) -> Result<NaiveDateTime> {
        if let Some(format) = self.date_format.as_deref() {
            return crate::format::parse_with_format(value, format)
                .ok_or_else(|| Error::Timestamp(value.to_string()));
        }
        for format in self.format.fallback_date_formats() {
            if let Some(ts) = crate::format::parse_with_format(value, format) {
                return Ok(ts);
            }
        }
        Err(Error::Timestamp(value.to_string()))
    }

    fn finalize(&self, entry: WorkingEntry, events: &mut Vec<LogEvent>) {
        // Severity first; it is cheaper than scanning the detail.
        if let Some(min) = self.min_severity {
            if entry.severity < min {
                return;
            }
        }
        if let Some(pattern) = &self.includes {
            if !pattern.is_match(&entry.detail) {
                return;
            }
        }
        events.push(entry.into_event(&self.event_type, &self.source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Log4jFormat;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn processor() -> EntryProcessor<Log4jFormat> {
        EntryProcessor::new(Log4jFormat::new().unwrap(), "logfile.entry", "server.log")
    }

    fn process(processor: &EntryProcessor<Log4jFormat>, input: &str) -> Vec<LogEvent> {
        processor.process(Cursor::new(input.to_string())).unwrap()
    }

    #[test]
    fn test_single_entry_with_stack_trace() {
        let input = "2007-12-21 15:32:49,514 DEBUG [com.example.FooBar] run: IdleRemover notifying pools, interval: 450000\n\
                     \tat com.example.FooBar.run(FooBar.java:42)\n";

        let events = process(&processor(), input);

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.severity, Severity::Debug);
        assert_eq!(
            event.timestamp,
            NaiveDate::from_ymd_opt(2007, 12, 21)
                .unwrap()
                .and_hms_milli_opt(15, 32, 49, 514)
                .unwrap()
        );
        assert_eq!(
            event.detail,
            "[com.example.FooBar] run: IdleRemover notifying pools, interval: 450000\n\tat com.example.FooBar.run(FooBar.java:42)"
        );
        assert_eq!(event.event_type, "logfile.entry");
        assert_eq!(event.source, "server.log");
    }

    #[test]
    fn test_continuations_attach_to_preceding_entry() {
        let input = "2007-12-21 15:32:49,514 ERROR first failure\n\
                     caused by: disk on fire\n\
                     \tat com.example.Disk.ignite(Disk.java:7)\n\
                     2007-12-21 15:32:50,002 INFO all better now\n";

        let events = process(&processor(), input);

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].detail,
            "first failure\ncaused by: disk on fire\n\tat com.example.Disk.ignite(Disk.java:7)"
        );
        assert_eq!(events[1].detail, "all better now");
    }

    #[test]
    fn test_trailing_entry_without_continuation_is_emitted() {
        let input = "2007-12-21 15:32:49,514 INFO done\n";
        let events = process(&processor(), input);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "done");
    }

    #[test]
    fn test_leading_continuation_lines_are_discarded() {
        let input = "\tat com.example.Orphan.lines(Orphan.java:1)\n\
                     no entry is active here\n\
                     2007-12-21 15:32:49,514 WARN real entry\n";

        let events = process(&processor(), input);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "real entry");
    }

    #[test]
    fn test_bad_date_drops_line_and_following_continuations() {
        let input = "gibberish DEBUG not a real primary line\n\
                     this continuation must be dropped\n\
                     2007-12-21 15:32:49,514 INFO survivor\n";

        let events = process(&processor(), input);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "survivor");
    }

    #[test]
    fn test_bad_primary_abandons_accumulating_entry() {
        // The malformed primary line still finalizes the entry before it.
        let input = "2007-12-21 15:32:49,514 INFO good entry\n\
                     nonsense FATAL \n\
                     orphan continuation\n";

        let events = process(&processor(), input);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "good entry");
    }

    #[test]
    fn test_min_severity_filter() {
        let input = "2007-12-21 15:32:49,514 DEBUG noise\n\
                     2007-12-21 15:32:49,515 INFO more noise\n\
                     2007-12-21 15:32:49,516 WARN keep me\n\
                     2007-12-21 15:32:49,517 FATAL keep me too\n";

        let events = process(&processor().with_min_severity(Severity::Warn), input);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].severity, Severity::Warn);
        assert_eq!(events[1].severity, Severity::Fatal);
    }

    #[test]
    fn test_includes_pattern_filter() {
        let input = "2007-12-21 15:32:49,514 ERROR timeout talking to db\n\
                     2007-12-21 15:32:49,515 ERROR unrelated failure\n";

        let events = process(
            &processor().with_includes(Regex::new("timeout").unwrap()),
            input,
        );

        assert_eq!(events.len(), 1);
        assert!(events[0].detail.contains("timeout"));
    }

    #[test]
    fn test_includes_pattern_sees_continuation_lines() {
        let input = "2007-12-21 15:32:49,514 ERROR something failed\n\
                     caused by: timeout talking to db\n";

        let events = process(
            &processor().with_includes(Regex::new("timeout").unwrap()),
            input,
        );

        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_date_format_override_is_exclusive() {
        let with_override = processor().with_date_format("%Y/%m/%d %H:%M:%S");

        // The override format parses this...
        let events = process(&with_override, "2007/12/21 15:32:49 INFO slashes\n");
        assert_eq!(events.len(), 1);

        // ...but the stock ISO8601 layout no longer does, even though the
        // fallback chain would have handled it.
        let events = process(&with_override, "2007-12-21 15:32:49,514 INFO dashes\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_fallback_chain_tries_each_format() {
        let p = processor();

        assert_eq!(process(&p, "2007-12-21 15:32:49,514 INFO iso\n").len(), 1);
        assert_eq!(process(&p, "21 Dec 2007 15:32:49,514 INFO date\n").len(), 1);
        assert_eq!(process(&p, "15:32:49,514 INFO absolute\n").len(), 1);
    }

    #[test]
    fn test_time_only_entry_dated_today() {
        let events = process(&processor(), "15:32:49,514 INFO absolute\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp.date(), chrono::Local::now().date_naive());
    }

    #[test]
    fn test_trace_entries_emitted_as_debug() {
        let events = process(&processor(), "2007-12-21 15:32:49,514 TRACE fine grained\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Debug);
    }

    #[test]
    fn test_empty_input_yields_no_events() {
        let events = process(&processor(), "");
        assert!(events.is_empty());
    }
}
