use std::path::{Path, PathBuf};

use template::{ExpandMode, Template};
use time::TimeContext;

use crate::fs::Fs;

/// Result of resolving a runtime's output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPath {
    /// Go ahead and write here
    Ready(PathBuf),
    /// Already there, and existing outputs are to be kept
    Exists(PathBuf),
}

/// Expand the output template below `output_dir`. Wildcard axes render as `ALL`.
pub fn resolve_output(
    output_dir: &Path,
    template: &Template,
    ctx: &TimeContext,
    skip_if_exists: bool,
    fs: &Fs,
) -> Result<OutputPath, template::Error> {
    let path = output_dir.join(template.expand(ctx, ExpandMode::AllowWildcards)?);
    if skip_if_exists && fs.exists(&path) {
        Ok(OutputPath::Exists(path))
    } else {
        Ok(OutputPath::Ready(path))
    }
}
