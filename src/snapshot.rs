// SPDX-License-Identifier: Apache-2.0

//! Point-in-time file identity snapshots and the resume-offset policy.
//!
//! A [`FileId`] stays stable while a file grows in place and changes when
//! the file at the path is replaced, which is what lets the poller tell
//! ordinary growth apart from rotation.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

/// A platform-independent unique identifier for a file.
///
/// On Unix systems, this is the device ID + inode number.
/// On Windows, this is the volume serial number + file index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    /// Device ID (Unix) or volume serial number (Windows)
    dev: u64,
    /// Inode number (Unix) or file index (Windows)
    ino: u64,
}

impl FileId {
    /// Create a FileId from raw device and inode values.
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Create a FileId from an open file handle.
    #[cfg(unix)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;

        let metadata = file.metadata()?;
        Ok(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Create a FileId from an open file handle.
    #[cfg(windows)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{
            BY_HANDLE_FILE_INFORMATION, GetFileInformationByHandle,
        };

        let handle = file.as_raw_handle() as HANDLE;
        let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { std::mem::zeroed() };

        let result = unsafe { GetFileInformationByHandle(handle, &mut info) };
        if result == 0 {
            return Err(io::Error::last_os_error());
        }

        // Combine high and low parts of file index
        let file_index = ((info.nFileIndexHigh as u64) << 32) | (info.nFileIndexLow as u64);

        Ok(Self {
            dev: info.dwVolumeSerialNumber as u64,
            ino: file_index,
        })
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

/// Byte size plus identity of a file at one instant.
///
/// The poller keeps only the snapshot from its previous cycle; diffing it
/// against a fresh one yields the [`ResumeAction`] for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// File size in bytes
    pub size: u64,
    /// Platform identity token
    pub file_id: FileId,
}

/// What the poller should do with the file this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// File unchanged; do not open it at all.
    Skip,
    /// Seek to this byte offset and read to EOF.
    Offset(u64),
    /// Rotation or truncation was detected. The previous offset refers to
    /// content that is gone or unrelated; read from the start.
    Restart,
}

impl FileSnapshot {
    pub fn new(size: u64, file_id: FileId) -> Self {
        Self { size, file_id }
    }

    /// Compute the resume policy for this snapshot given the one from the
    /// previous cycle, if any.
    ///
    /// Identity is compared before size: a rotated file can coincidentally
    /// be larger than the one it replaced, and checking size first would
    /// misclassify that rotation as ordinary growth.
    pub fn resume_from(&self, previous: Option<&FileSnapshot>) -> ResumeAction {
        let previous = match previous {
            // First observation of this path. Start at the current end so
            // pre-existing content never floods the collector on startup;
            // only future appends surface.
            None => return ResumeAction::Offset(self.size),
            Some(prev) => prev,
        };

        if self.file_id != previous.file_id {
            return ResumeAction::Restart;
        }
        if self.size < previous.size {
            // Truncated in place
            return ResumeAction::Restart;
        }
        if self.size == previous.size {
            return ResumeAction::Skip;
        }
        ResumeAction::Offset(previous.size)
    }
}

/// Supplies file snapshots to the poller, once per cycle.
///
/// Modeled as a capability so tests (and platforms with exotic file
/// systems) can substitute their own notion of identity.
pub trait IdentityProvider {
    fn stat(&self, path: &Path) -> io::Result<FileSnapshot>;
}

/// Identity provider backed by the native platform metadata.
#[derive(Debug, Clone, Copy)]
pub struct NativeIdentity;

impl NativeIdentity {
    /// Bind the native provider, or `None` where the platform offers no
    /// stable file identity. Without one the poller cannot distinguish
    /// rotation from growth and stays permanently silent.
    pub fn bind() -> Option<Self> {
        #[cfg(any(unix, windows))]
        {
            Some(Self)
        }
        #[cfg(not(any(unix, windows)))]
        {
            None
        }
    }
}

impl IdentityProvider for NativeIdentity {
    fn stat(&self, path: &Path) -> io::Result<FileSnapshot> {
        #[cfg(any(unix, windows))]
        {
            let file = File::open(path)?;
            let size = file.metadata()?.len();
            let file_id = FileId::from_file(&file)?;
            Ok(FileSnapshot { size, file_id })
        }
        #[cfg(not(any(unix, windows)))]
        {
            let _ = path;
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "no stable file identity on this platform",
            ))
        }
    }
}
