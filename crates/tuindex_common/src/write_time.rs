//! Last-modified timestamps of source files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// The last-modified time of a file on disk, as observed when it was indexed.
///
/// Timestamps are compared by exact equality only. A file whose timestamp
/// moved backwards (clock rollback, restored backup) is treated as changed
/// just like one that moved forwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct WriteTime(SystemTime);

impl WriteTime {
    /// Reads the last-modified time of the file at `path`.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self(metadata.modified()?))
    }

    /// Wraps an existing [`SystemTime`].
    pub fn from_system_time(time: SystemTime) -> Self {
        Self(time)
    }

    /// Returns the wrapped [`SystemTime`].
    pub fn as_system_time(self) -> SystemTime {
        self.0
    }
}

impl fmt::Display for WriteTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.duration_since(UNIX_EPOCH) {
            Ok(d) => write!(f, "{}.{:09}", d.as_secs(), d.subsec_nanos()),
            Err(e) => write!(f, "-{}", e.duration().as_secs_f64()),
        }
    }
}
