use std::path::{Path, PathBuf};

use time::TimeContext;

/// Index of a record in its catalog. Ids increase in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u32);

impl From<usize> for RecordId {
    fn from(n: usize) -> Self {
        // a single run never discovers anywhere near 4 billion files:
        Self(n as u32)
    }
}

impl From<RecordId> for usize {
    fn from(id: RecordId) -> Self {
        id.0 as usize
    }
}

/// A file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
    context: TimeContext,
}

impl FileRecord {
    pub fn new(path: PathBuf, context: TimeContext) -> Self {
        Self { path, context }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The time context encoded in the file's name.
    pub fn context(&self) -> &TimeContext {
        &self.context
    }
}
