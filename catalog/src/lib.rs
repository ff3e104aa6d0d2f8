//!
//! Input files are found once per run by walking each category's search root
//! and matching relative paths against the reverse pattern of each template.
//! The resulting [`FileCatalog`] is read-only afterwards; every runtime asks
//! it for the subset of files whose time context matches its own.
//!

use std::path::PathBuf;

/// a discovered file and the time context recovered from its name
mod record;
pub use record::{FileRecord, RecordId};

/// walking a search root
mod discover;
pub use discover::discover;

/// accumulated records and the subsetter
mod catalog;
pub use catalog::FileCatalog;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to read search root {0}: {1}")]
    Walk(PathBuf, walkdir::Error),
    #[error("Unable to resolve search root {0}: {1}")]
    Root(PathBuf, std::io::Error),
    #[error(transparent)]
    Template(#[from] template::Error),
}
