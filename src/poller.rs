// SPDX-License-Identifier: Apache-2.0

//! Polling driver for a single log file.
//!
//! One `FilePoller` owns one path. An external scheduler invokes
//! [`FilePoller::poll`] once per tick; the poller snapshots the file,
//! decides how much of it is new, and streams only that delta through its
//! [`EntryProcessor`]. Nothing but the previous snapshot survives between
//! invocations, and a given instance must not be polled concurrently with
//! itself.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::format::{EntryFormat, Log4jFormat};
use crate::processor::EntryProcessor;
use crate::snapshot::{FileSnapshot, IdentityProvider, NativeIdentity, ResumeAction};

pub struct FilePoller<F = Log4jFormat> {
    path: PathBuf,
    processor: EntryProcessor<F>,
    /// Bound lazily on the first poll; `None` after binding means the
    /// platform offers no identity and the poller is permanently silent.
    identity: Option<Box<dyn IdentityProvider>>,
    identity_bound: bool,
    snapshot: Option<FileSnapshot>,
}

impl FilePoller<Log4jFormat> {
    /// Build a poller for a configured source, with the default line
    /// format. Filters and the date override come from the config and are
    /// compiled once here.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        if !config.enabled {
            return Err(Error::Config(format!(
                "source {} is disabled",
                config.path.display()
            )));
        }

        let mut processor = EntryProcessor::new(
            Log4jFormat::new()?,
            config.event_type.clone(),
            config.path.display().to_string(),
        );
        if let Some(format) = &config.date_format {
            processor = processor.with_date_format(format.clone());
        }
        if let Some(min) = config.min_severity {
            processor = processor.with_min_severity(min);
        }
        if let Some(pattern) = &config.includes_pattern {
            let regex = regex::Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid includes pattern: {}", e)))?;
            processor = processor.with_includes(regex);
        }

        Ok(Self::new(config.path.clone(), processor))
    }
}

impl<F: EntryFormat> FilePoller<F> {
    pub fn new(path: impl Into<PathBuf>, processor: EntryProcessor<F>) -> Self {
        Self {
            path: path.into(),
            processor,
            identity: None,
            identity_bound: false,
            snapshot: None,
        }
    }

    /// Substitute the identity provider. Mostly useful in tests, where
    /// rotation and truncation are simulated rather than performed.
    pub fn with_identity_provider(mut self, provider: Box<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self.identity_bound = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the file once and return the entries appended since the last
    /// poll, or `None` when there is nothing to report this cycle.
    ///
    /// A stat failure propagates so the scheduler can back off; read
    /// failures on the body are logged and swallowed, since the file may
    /// be mid-rotation and the next cycle starts from a fresh snapshot.
    pub fn poll(&mut self) -> Result<Option<Vec<LogEvent>>> {
        if self.bind_identity().is_none() {
            return Ok(None);
        }

        if !self.path.is_file() {
            debug!(
                path = %self.path.display(),
                "log file missing or not a regular file; nothing to poll"
            );
            return Ok(None);
        }

        let current = match self.identity.as_deref().map(|p| p.stat(&self.path)) {
            None => return Ok(None),
            Some(Ok(snapshot)) => snapshot,
            Some(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                // Lost a race with deletion or rotation; same expected
                // transient state as the missing-file check above.
                debug!(path = %self.path.display(), "log file vanished; nothing to poll");
                return Ok(None);
            }
            Some(Err(err)) => return Err(err.into()),
        };

        let action = current.resume_from(self.snapshot.as_ref());
        // Stored unconditionally, before any read is attempted, so the
        // next diff is correct even if this cycle fails below.
        self.snapshot = Some(current);

        let offset = match action {
            ResumeAction::Skip => return Ok(None),
            ResumeAction::Offset(offset) => offset,
            ResumeAction::Restart => 0,
        };

        let events = match self.read_from(offset) {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed reading appended log data; skipping this cycle"
                );
                return Ok(None);
            }
        };

        if events.is_empty() {
            Ok(None)
        } else {
            Ok(Some(events))
        }
    }

    /// Idempotent deferred setup: the identity provider is not available
    /// at construction time in all deployments, so it is bound on the
    /// first poll.
    fn bind_identity(&mut self) -> Option<&dyn IdentityProvider> {
        if !self.identity_bound {
            self.identity_bound = true;
            self.identity = match NativeIdentity::bind() {
                Some(provider) => Some(Box::new(provider)),
                None => {
                    debug!(
                        path = %self.path.display(),
                        "no stable file identity on this platform; poller disabled"
                    );
                    None
                }
            };
        }
        self.identity.as_deref()
    }

    /// The read handle lives only inside this call; it is released on
    /// every exit path, including errors.
    fn read_from(&self, offset: u64) -> std::io::Result<Vec<LogEvent>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        self.processor.process(BufReader::new(file))
    }
}
