// SPDX-License-Identifier: Apache-2.0

//! Polling monitor for text log files.
//!
//! This crate watches a log file for newly appended content, reassembles
//! multi-line entries (stack traces and the like) from raw lines,
//! classifies them by severity, and returns structured event records to
//! the caller, typically a scheduler that polls on a fixed interval and
//! forwards the records to a collector.
//!
//! Features:
//! - Inode-based file identity, so rotation and truncation are told apart
//!   from ordinary growth and never re-deliver old content as new
//! - Multi-line entry correlation driven by a pluggable line format
//! - Severity and content filters applied at entry finalization

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod poller;
pub mod processor;
pub mod severity;
pub mod snapshot;

pub use config::{SourceConfig, DEFAULT_EVENT_TYPE};
pub use error::{Error, Result};
pub use event::LogEvent;
pub use format::{
    EntryFormat, Log4jFormat, PrimaryFields, LOG4J_DATE_FORMATS, LOG4J_PRIMARY_PATTERN,
};
pub use poller::FilePoller;
pub use processor::EntryProcessor;
pub use severity::Severity;
pub use snapshot::{FileId, FileSnapshot, IdentityProvider, NativeIdentity, ResumeAction};
