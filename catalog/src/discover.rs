use std::path::Path;

use template::Template;
use walkdir::WalkDir;

use super::{Error, FileRecord};

/// Find every file under `root` whose relative path matches `template`.
///
/// Entries are visited in file-name order, so the result is stable for an
/// unchanged tree. Files that don't match the template's pattern are skipped,
/// as are entries that can't be read (e.g. symlink loops), with a warning.
/// A missing search root yields no records.
pub fn discover(root: &Path, template: &Template) -> Result<Vec<FileRecord>, Error> {
    let pattern = template.pattern()?;

    if !root.is_dir() {
        log::warn!("Search root {root:?} does not exist; no files found for {template}");
        return Ok(Vec::new());
    }
    let root = root
        .canonicalize()
        .map_err(|e| Error::Root(root.to_owned(), e))?;

    // start the walk below any leading directories that can only match literally:
    let prefix = template.static_dir_prefix();
    let (start, prefix_depth) = if prefix.is_empty() {
        (root.clone(), 0)
    } else {
        (root.join(prefix), prefix.split('/').count())
    };
    if !start.is_dir() {
        log::debug!("{start:?} does not exist; no files found for {template}");
        return Ok(Vec::new());
    }
    let depth = template.component_count().saturating_sub(prefix_depth);

    let walker = WalkDir::new(&start)
        .min_depth(1)
        .max_depth(depth)
        .follow_links(true)
        .sort_by_file_name();

    let mut records = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // only the starting directory itself being unreadable is fatal:
            Err(e) if e.depth() == 0 => return Err(Error::Walk(start.clone(), e)),
            Err(e) => {
                log::warn!("Skipping unreadable entry while searching {start:?}: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let Ok(rel) = util::path_str(rel) else {
            log::trace!("skipping non-utf8 path {:?}", entry.path());
            continue;
        };
        match pattern.match_path(rel) {
            Some(context) => {
                log::trace!("{rel}: {context}");
                records.push(FileRecord::new(entry.path().to_owned(), context));
            }
            None => log::trace!("{rel}: no match"),
        }
    }

    log::debug!("Found {} files for {template} under {root:?}", records.len());
    Ok(records)
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use time::{Axis, Lead};

    fn touch(root: &Path, rel: &str) -> Result<()> {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"")?;
        Ok(())
    }

    #[test]
    fn test_discover() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), "2016092900/FCST_TILE_F006.dat")?;
        touch(dir.path(), "2016092900/FCST_TILE_F000.dat")?;
        touch(dir.path(), "2016092900/ANLY_TILE_F000.dat")?;
        touch(dir.path(), "README")?;

        let t = Template::parse("{init?fmt=%Y%m%d%H}/FCST_TILE_F{lead?fmt=%3H}.dat")?;
        let records = discover(dir.path(), &t)?;

        assert_eq!(records.len(), 2);
        assert!(records[0].path().ends_with("2016092900/FCST_TILE_F000.dat"));
        assert!(records[0].path().is_absolute());
        assert_eq!(records[0].context().lead(), &Axis::At(Lead::ZERO));
        assert_eq!(records[1].context().lead(), &Axis::At(Lead::from_hours(6)));
        assert!(records[1].context().valid().value().is_some());
        Ok(())
    }

    #[test]
    fn test_discover_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["b_2016092906.nc", "a_2016092900.nc", "c_2016092912.nc"] {
            touch(dir.path(), &format!("obs/{name}"))?;
        }
        let t = Template::parse("obs/?_{valid?fmt=%Y%m%d%H}.nc")?;
        let first = discover(dir.path(), &t)?;
        let second = discover(dir.path(), &t)?;
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_static_prefix_narrows_walk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), "fcst/2016092900.nc")?;
        touch(dir.path(), "other/2016092900.nc")?;
        let t = Template::parse("fcst/{init?fmt=%Y%m%d%H}.nc")?;
        let records = discover(dir.path(), &t)?;
        assert_eq!(records.len(), 1);
        assert!(records[0].path().ends_with("fcst/2016092900.nc"));
        Ok(())
    }

    #[test]
    fn test_out_of_range_lead_is_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), "F_2016092900_21600.dat")?;
        touch(dir.path(), "F_2016092900_9300000000000000.dat")?;
        let t = Template::parse("F_{init?fmt=%Y%m%d%H}_{lead}.dat")?;
        let records = discover(dir.path(), &t)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context().lead(), &Axis::At(Lead::from_hours(6)));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), "2016092900/F_000.dat")?;
        fs::create_dir(dir.path().join("junk"))?;
        std::os::unix::fs::symlink(dir.path(), dir.path().join("junk/loop"))?;

        let t = Template::parse("{init?fmt=%Y%m%d%H}/F_{lead?fmt=%3H}.dat")?;
        let records = discover(dir.path(), &t)?;
        assert_eq!(records.len(), 1);
        assert!(records[0].path().ends_with("2016092900/F_000.dat"));
        Ok(())
    }

    #[test]
    fn test_missing_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let t = Template::parse("{init}.nc")?;
        assert!(discover(&dir.path().join("nope"), &t)?.is_empty());
        let t = Template::parse("nope/{init}.nc")?;
        assert!(discover(dir.path(), &t)?.is_empty());
        Ok(())
    }
}
