use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Defines fns for creating common paths in the output directory
mod paths;

/// Writing list files for input categories
mod manifest;
pub use manifest::ManifestNamer;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Specified output directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Path has no parent directory: \"{0}\"")]
    NoParent(String),
}

/// All file operations in the crate should go through this struct.
///
/// All writes check that the path in question is below one of the
/// whitelisted prefixes (the output dir, and the manifest dir if it lives
/// elsewhere), otherwise they will not be performed. Nothing is ever deleted.
#[derive(Debug)]
pub struct Fs {
    /// The first entry is the output directory
    prefixes: Vec<PathBuf>,
    /// if true, prevents all writes
    dry_run: bool,
}

impl Fs {
    /// Create a new `Fs` with nothing whitelisted yet.
    pub fn new(dry_run: bool) -> Self {
        Self {
            prefixes: Vec::with_capacity(2),
            dry_run,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// The output directory (first whitelisted prefix).
    pub fn output_prefix(&self) -> &Path {
        self.prefixes.first().map(PathBuf::as_path).unwrap_or(Path::new("."))
    }

    /// Create `dir` if it doesn't exist, then allow writes below it.
    /// Returns the absolute path that was whitelisted.
    pub fn whitelist_dir(&mut self, dir: &Path, verbose: bool) -> Result<PathBuf> {
        if !dir.exists() {
            if self.dry_run {
                eprintln!("Dry run. Not creating directory {dir:?}");
            } else {
                eprintln!("Directory {dir:?} doesn't exist. Creating.");
                fs::create_dir_all(dir).with_context(|| format!("creating directory {dir:?}"))?;
            }
        } else if !dir.is_dir() {
            return Err(Error::NotDirectory(util::path_str(dir)?.to_owned()).into());
        } else if verbose {
            eprintln!("Directory {dir:?} already exists. Not creating.");
        }

        // in a dry run the dir may still not exist:
        let dir = if dir.exists() {
            dir.canonicalize()?
        } else {
            std::path::absolute(dir)?
        };
        if !self.prefixes.iter().any(|p| dir.starts_with(p)) {
            self.prefixes.push(dir.clone());
        }
        Ok(dir)
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {path:?}"))?;
        Ok(())
    }

    /// Create parent directory of a given path.
    pub fn create_parent_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| Error::NoParent(path.to_string_lossy().into_owned()))?;
        self.create_dir(parent)
    }

    /// Create (or truncate) a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {path:?}"))?;
        Ok(f)
    }

    /// Write entire str to a file, replacing its contents.
    pub fn write_file<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::write(path, text).with_context(|| format!("writing file {path:?}"))?;
        Ok(())
    }

    /// Read entire file into a String.
    pub fn read_to_buf<T: AsRef<Path>>(&self, path: T, strbuf: &mut String) -> Result<()> {
        use std::io::Read;
        let path = path.as_ref();
        strbuf.clear();
        let cap = fs::metadata(path)?.len() as usize;
        if cap > strbuf.capacity() {
            strbuf.reserve(cap);
        }
        let mut f = fs::File::open(path)?;
        f.read_to_string(strbuf)?;
        Ok(())
    }

    fn is_whitelisted(&self, path: &Path) -> bool {
        match normalize(path) {
            Some(path) => self.prefixes.iter().any(|p| path.starts_with(p)),
            None => false,
        }
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if self.dry_run || !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically,
/// so `out/../elsewhere` is not mistaken for a path below `out`.
fn normalize(path: &Path) -> Option<PathBuf> {
    let abs = std::path::absolute(path).ok()?;
    let mut out = PathBuf::with_capacity(abs.as_os_str().len());
    for c in abs.components() {
        match c {
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    Some(out)
}
