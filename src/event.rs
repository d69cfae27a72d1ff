// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// A finalized log entry, ready to hand to a downstream collector.
///
/// Events are immutable once created; the processor builds them only when
/// an accumulating entry is finalized. Timestamps are naive because log
/// lines carry no timezone information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event type tag the source was registered with
    pub event_type: String,
    /// Where the event came from, typically the log file path
    pub source: String,
    /// When the entry was written, per its primary line
    pub timestamp: NaiveDateTime,
    /// Severity level of the entry
    pub severity: Severity,
    /// Entry text: the primary-line message plus any continuation lines,
    /// newline-joined
    pub detail: String,
}

impl LogEvent {
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        timestamp: NaiveDateTime,
        severity: Severity,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            timestamp,
            severity,
            detail: detail.into(),
        }
    }
}
