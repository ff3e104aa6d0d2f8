use std::path::{Path, PathBuf};

use super::Fs;

/// Utility fns for making common paths in the output directory.
impl Fs {
    /// $OUTPUT/file_lists
    pub fn default_manifest_dir(&self) -> PathBuf {
        self.output_prefix().join("file_lists")
    }

    /// $OUTPUT/logs
    pub fn logs_dir<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(self.output_prefix(), "logs", buf)
    }

    /// $OUTPUT/logs/tool_index.log
    pub fn log_file<'a>(&self, tool: &str, index: usize, buf: &'a mut PathBuf) -> &'a Path {
        self.logs_dir(buf);
        buf.push(format!("{tool}_{index}.log"));
        &*buf
    }

    fn parts2<'a, T, U>(&self, p1: T, p2: U, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        &*buf
    }
}
