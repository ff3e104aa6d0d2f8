//!
//! Run configuration: one or more INI-like files merged key by key
//! (later files win), then `--set` overrides, then interpreted into a
//! typed [`RunConfig`]. Every template is parsed here, once, so a
//! malformed template stops the run before any runtime is processed.
//!

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use template::Template;

use crate::fs::Fs;
use crate::prep::{FieldSpec, RegridSpec, ToolOptions, ToolSpec};
use crate::schedule::Schedule;
use crate::settings::Settings;

/// Merging config files and typed access to their sections
mod raw;
pub use raw::{RawConfig, SectionView};

const DEFAULT_OUTPUT_FLAG: &str = "-out";
const DEFAULT_TOOL_VERBOSITY: u8 = 2;

const TOOL_KEYS: &[&str] = &[
    "name",
    "exe",
    "args",
    "output_dir",
    "output_template",
    "output_flag",
    "config_file",
    "manifest_dir",
    "skip_if_output_exists",
    "verbosity",
];
const INPUT_KEYS: &[&str] = &["dir", "template", "flag", "required", "use_manifest"];
const OPTIONS_KEYS: &[&str] = &[
    "file_type",
    "desc",
    "fields",
    "fields_required",
    "verification_mask_template",
];
const REGRID_KEYS: &[&str] = &["to_grid", "method", "width", "vld_thresh", "shape"];
const SECTIONS: &[&str] = &["loop", "tool", "options", "regrid", "env"];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing required key '{1}' in [{0}]")]
    MissingKey(String, String),
    #[error("Invalid value '{value}' for '{key}' in [{section}]: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
    #[error("Malformed template for '{1}' in [{0}]")]
    Template(String, String, #[source] template::Error),
    #[error("No input categories configured (expected at least one [input.<name>] section)")]
    NoInputs,
}

/// `[tool]` settings.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub spec: ToolSpec,
    pub output_dir: PathBuf,
    pub output_template: Template,
    pub output_flag: String,
    pub config_file: Option<Template>,
    /// defaults to `<output_dir>/file_lists`
    pub manifest_dir: Option<PathBuf>,
    pub skip_if_output_exists: bool,
    /// passed to the tool as `-v`
    pub verbosity: u8,
}

/// One `[input.<name>]` section.
#[derive(Debug, Clone)]
pub struct InputCategory {
    pub name: String,
    pub dir: PathBuf,
    /// discovery runs once per template, in this order
    pub templates: Vec<Template>,
    pub flag: String,
    /// an empty subset skips the runtime instead of dropping the argument
    pub required: bool,
    /// pass one list file instead of every file
    pub use_manifest: bool,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub schedule: Schedule,
    pub tool: ToolConfig,
    pub inputs: Vec<InputCategory>,
    pub options: ToolOptions,
}

impl RunConfig {
    /// Read, merge and interpret the config files named in `settings`.
    pub fn load(settings: &Settings, fs: &Fs) -> Result<Self> {
        let mut raw = RawConfig::default();
        let mut strbuf = String::new();
        for path in &settings.config {
            fs.read_to_buf(path, &mut strbuf)
                .with_context(|| format!("while reading config file {path:?}"))?;
            raw.merge_text(&strbuf)
                .with_context(|| format!("while parsing config file {path:?}"))?;
        }
        for o in &settings.overrides {
            raw.set(&o.section, &o.key, &o.value);
        }
        if let Some(output) = &settings.output {
            raw.set("tool", "output_dir", &output.to_string_lossy());
        }
        Ok(Self::from_raw(&raw)?)
    }

    pub fn from_raw(raw: &RawConfig) -> Result<Self, anyhow::Error> {
        for name in raw.section_names() {
            if !SECTIONS.contains(&name) && !name.starts_with("input.") {
                log::warn!("Ignoring unknown section [{name}]");
            }
        }

        let schedule = Schedule::from_section(raw.section("loop"))?;
        let tool = tool_config(raw.section("tool"))?;

        let mut inputs = Vec::new();
        for (name, section) in raw.subsections("input") {
            inputs.push(input_category(name, section)?);
        }
        if inputs.is_empty() {
            return Err(Error::NoInputs.into());
        }

        let mut options = tool_options(raw.section("options"))?;
        options.regrid = regrid(raw.section("regrid"));
        let env = raw.section("env");
        for (key, value) in env.entries() {
            options.env.push((key.to_owned(), env.parse_template(key, value)?));
        }

        Ok(Self {
            schedule,
            tool,
            inputs,
            options,
        })
    }
}

fn tool_config(section: SectionView) -> Result<ToolConfig, Error> {
    section.warn_unknown_keys(TOOL_KEYS);

    let exe = section.require("exe")?;
    let name = match section.get("name") {
        Some(name) => name,
        // file name of the executable:
        None => exe.rsplit('/').next().unwrap_or(exe),
    };
    let verbosity = match section.get("verbosity") {
        Some(v) => v
            .parse()
            .map_err(|_| section.invalid("verbosity", "expected a number from 0 to 255"))?,
        None => DEFAULT_TOOL_VERBOSITY,
    };

    Ok(ToolConfig {
        spec: ToolSpec::new(name, exe, section.get("args").unwrap_or_default()),
        output_dir: PathBuf::from(section.require("output_dir")?),
        output_template: section.parse_template("output_template", section.require("output_template")?)?,
        output_flag: section.get("output_flag").unwrap_or(DEFAULT_OUTPUT_FLAG).to_owned(),
        config_file: section.template("config_file")?,
        manifest_dir: section.get("manifest_dir").map(PathBuf::from),
        skip_if_output_exists: section.bool_or("skip_if_output_exists", false)?,
        verbosity,
    })
}

fn input_category(name: &str, section: SectionView) -> Result<InputCategory, Error> {
    section.warn_unknown_keys(INPUT_KEYS);

    let mut templates = Vec::new();
    for text in section.list("template") {
        templates.push(section.parse_template("template", text)?);
    }
    if templates.is_empty() {
        return Err(Error::MissingKey(section.name().to_owned(), "template".to_owned()));
    }

    Ok(InputCategory {
        name: name.to_owned(),
        dir: Path::new(section.require("dir")?).to_owned(),
        templates,
        flag: match section.get("flag") {
            Some(flag) => flag.to_owned(),
            None => format!("-{name}"),
        },
        required: section.bool_or("required", true)?,
        use_manifest: section.bool_or("use_manifest", true)?,
    })
}

fn tool_options(section: SectionView) -> Result<ToolOptions, Error> {
    section.warn_unknown_keys(OPTIONS_KEYS);

    let mut fields = Vec::new();
    for text in section.list("fields") {
        fields.push(
            FieldSpec::parse(text)
                .map_err(|e| Error::Template(section.name().to_owned(), "fields".to_owned(), e))?,
        );
    }

    Ok(ToolOptions {
        file_type: section.get("file_type").map(str::to_owned),
        description: section.get("desc").map(str::to_owned),
        fields,
        fields_required: section.bool_or("fields_required", false)?,
        verification_mask: section.template("verification_mask_template")?,
        ..Default::default()
    })
}

fn regrid(section: SectionView) -> RegridSpec {
    section.warn_unknown_keys(REGRID_KEYS);
    let get = |key| section.get(key).map(str::to_owned);
    RegridSpec {
        to_grid: get("to_grid"),
        method: get("method"),
        width: get("width"),
        vld_thresh: get("vld_thresh"),
        shape: get("shape"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const BASIC: &str = "
[loop]
loop_by = init
begin = 2016092900

[tool]
exe = /usr/local/bin/grid_diag
output_dir = /tmp/out
output_template = grid_diag_{init?fmt=%Y%m%d%H}.nc
config_file = {custom}/GridDiagConfig

[input.data]
dir = /data
template = {init?fmt=%Y%m%d%H}/a_F{lead?fmt=%3H}.nc, {init?fmt=%Y%m%d%H}/b_F{lead?fmt=%3H}.nc

[input.mask]
dir = /masks
template = mask.nc
flag = -mask
required = false

[options]
fields = TMP/P500, HGT/P500

[regrid]
to_grid = FCST

[env]
MODEL = GFS_{custom}
";

    fn load(text: &str) -> Result<RunConfig> {
        let mut raw = RawConfig::default();
        raw.merge_text(text)?;
        RunConfig::from_raw(&raw)
    }

    #[test]
    fn test_from_raw() -> Result<()> {
        let config = load(BASIC)?;
        assert_eq!(config.tool.spec.name, "grid_diag");
        assert_eq!(config.tool.output_flag, "-out");
        assert_eq!(config.tool.verbosity, 2);
        assert!(!config.tool.skip_if_output_exists);

        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.inputs[0].name, "data");
        assert_eq!(config.inputs[0].flag, "-data");
        assert_eq!(config.inputs[0].templates.len(), 2);
        assert!(config.inputs[0].required);
        assert!(!config.inputs[1].required);
        assert_eq!(config.inputs[1].flag, "-mask");

        assert_eq!(config.options.fields.len(), 2);
        assert_eq!(config.options.regrid.to_grid.as_deref(), Some("FCST"));
        assert_eq!(config.options.env[0].0, "MODEL");
        Ok(())
    }

    #[test]
    fn test_malformed_template_is_fatal() {
        let text = BASIC.replace("grid_diag_{init?fmt=%Y%m%d%H}.nc", "grid_diag_{init?fmt=%Q}.nc");
        let err = load(&text).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Template(..))));
    }

    #[test]
    fn test_missing_keys() {
        let err = load(&BASIC.replace("exe = /usr/local/bin/grid_diag", "")).unwrap_err();
        assert!(err.to_string().contains("'exe'"), "{err}");

        let no_inputs: String = BASIC.split("[input.data]").next().unwrap_or_default().to_owned();
        let err = load(&no_inputs).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoInputs)));
    }
}
