use std::path::Path;

use anyhow::Result;

use template::{ExpandMode, Template};
use time::TimeContext;

use super::Fs;

/// Wildcard axes render as `ALL`; init and valid use the default
/// `%Y%m%d%H%M%S` format and the lead is in seconds.
const MANIFEST_TIMES: &str = "_files_init_{init}_valid_{valid}_lead_{lead}";

/// Builds list-file names from an input category and a runtime's context:
/// `<category>_files_init_<INIT>_valid_<VALID>_lead_<LEAD>[_<custom>].txt`.
#[derive(Debug, Clone)]
pub struct ManifestNamer {
    times: Template,
}

impl ManifestNamer {
    pub fn new() -> Result<Self, template::Error> {
        Ok(Self {
            times: Template::parse(MANIFEST_TIMES)?,
        })
    }

    pub fn name(&self, category: &str, ctx: &TimeContext) -> Result<String, template::Error> {
        let mut name = String::with_capacity(category.len() + 64);
        name.push_str(category);
        name.push_str(&self.times.expand(ctx, ExpandMode::AllowWildcards)?);
        if !ctx.custom().is_empty() {
            name.push('_');
            // custom strings come from config and could contain path separators:
            name.push_str(&ctx.custom().replace('/', "_"));
        }
        name.push_str(".txt");
        Ok(name)
    }
}

impl Fs {
    /// Write `paths` one per line to `path`, creating its directory if needed.
    /// Any existing file is overwritten, so rewriting the same list is byte-identical.
    pub fn write_manifest(&self, path: &Path, paths: &[&Path]) -> Result<()> {
        self.create_parent_dir(path)?;
        let mut text = String::with_capacity(paths.len() * 64);
        for p in paths {
            text.push_str(util::path_str(p)?);
            text.push('\n');
        }
        self.write_file(path, &text)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use time::{Axis, Lead};

    #[test]
    fn test_manifest_name() -> Result<()> {
        let namer = ManifestNamer::new()?;
        let init = NaiveDate::from_ymd_opt(2016, 9, 29)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let ctx = TimeContext::new(Axis::At(init), Axis::Any, Axis::At(Lead::from_hours(6)), "")?;
        assert_eq!(
            namer.name("fcst", &ctx)?,
            "fcst_files_init_20160929000000_valid_20160929060000_lead_21600.txt"
        );
        let ctx = TimeContext::new(Axis::At(init), Axis::Any, Axis::Any, "TMP")?;
        assert_eq!(
            namer.name("data", &ctx)?,
            "data_files_init_20160929000000_valid_ALL_lead_ALL_TMP.txt"
        );
        Ok(())
    }

    #[test]
    fn test_write_manifest_overwrites() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut fs = Fs::new(false);
        let out = fs.whitelist_dir(dir.path(), false)?;
        let manifest = out.join("file_lists/fcst.txt");
        let paths = [Path::new("/data/a.nc"), Path::new("/data/b.nc")];

        fs.write_manifest(&manifest, &paths)?;
        let first = std::fs::read(&manifest)?;
        fs.write_manifest(&manifest, &paths)?;
        let second = std::fs::read(&manifest)?;

        assert_eq!(first, b"/data/a.nc\n/data/b.nc\n");
        assert_eq!(first, second);

        fs.write_manifest(&manifest, &paths[..1])?;
        assert_eq!(std::fs::read_to_string(&manifest)?, "/data/a.nc\n");
        Ok(())
    }
}
