use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use catalog::FileCatalog;
use template::ExpandMode;
use time::TimeContext;

use crate::config::RunConfig;
use crate::fs::{Fs, ManifestNamer};
use crate::prep::{
    build_command, build_env, data_field, resolve_output, CommandOptions, InputArg, OutputPath,
};
use crate::ui::Ui;

use super::{run_cmd, CancelToken, ExecOptions, RuntimeError};

/// Why a runtime ended without running the tool. None of these count as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required input category had no files for this runtime
    NoMatchingInputs(String),
    OutputExists(PathBuf),
    NoFields,
    DryRun,
    /// The run was interrupted before this runtime started
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingInputs(category) => write!(f, "no matching {category} files"),
            Self::OutputExists(path) => write!(f, "output {path:?} already exists"),
            Self::NoFields => f.write_str("no fields configured"),
            Self::DryRun => f.write_str("dry run"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// States a runtime moves through, in order. Each runtime ends in exactly
/// one of `Skipped`, `Succeeded` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeState {
    Pending,
    DiscoveringInputs,
    BuildingOutputPath,
    ResolvingFields,
    BuildingCommand,
    Executing,
    Skipped(SkipReason),
    Succeeded,
    Failed,
}

impl RuntimeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped(_) | Self::Succeeded | Self::Failed)
    }
}

/// What happened to one runtime.
#[derive(Debug)]
pub struct RuntimeResult {
    /// position in the schedule
    pub index: usize,
    pub context: TimeContext,
    /// input files matched across all categories
    pub files_found: usize,
    pub exit_code: Option<i32>,
    pub state: RuntimeState,
    pub errors: Vec<RuntimeError>,
}

impl RuntimeResult {
    fn new(index: usize, context: TimeContext) -> Self {
        Self {
            index,
            context,
            files_found: 0,
            exit_code: None,
            state: RuntimeState::Pending,
            errors: Vec::with_capacity(0),
        }
    }

    fn transition(&mut self, next: RuntimeState) {
        debug_assert!(!self.state.is_terminal(), "runtime {} already finished", self.index);
        log::trace!("runtime {}: {:?} -> {:?}", self.index, self.state, next);
        self.state = next;
    }
}

/// `RuntimeRunner` takes every runtime through discovery, output path,
/// field resolution, command building and execution, one at a time.
///
/// Input catalogs are built before the runner is created and only read here.
/// A runtime's failure is recorded in its `RuntimeResult`; it never stops
/// the loop. Once the cancel token is set, remaining runtimes are skipped.
pub struct RuntimeRunner {
    config: RunConfig,
    /// one per input category, same order as `config.inputs`
    catalogs: Vec<FileCatalog>,
    manifest_dir: PathBuf,
    manifest_namer: ManifestNamer,
    cancel: CancelToken,
    timeout: Option<Duration>,
    /// for whenever we need to create a path:
    pathbuf: PathBuf,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl RuntimeRunner {
    pub fn new(
        config: RunConfig,
        catalogs: Vec<FileCatalog>,
        manifest_dir: PathBuf,
        fs: Fs,
        ui: Ui,
        cancel: CancelToken,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        debug_assert_eq!(config.inputs.len(), catalogs.len());
        Ok(Self {
            config,
            catalogs,
            manifest_dir,
            manifest_namer: ManifestNamer::new()?,
            cancel,
            timeout,
            pathbuf: PathBuf::with_capacity(256),
            fs,
            ui,
        })
    }

    pub fn run(&mut self, runtimes: &[TimeContext]) -> Vec<RuntimeResult> {
        let total = runtimes.len();
        runtimes
            .iter()
            .enumerate()
            .map(|(index, ctx)| self.process(index, total, ctx))
            .collect()
    }

    fn process(&mut self, index: usize, total: usize, ctx: &TimeContext) -> RuntimeResult {
        let mut result = RuntimeResult::new(index, ctx.clone());
        if self.cancel.is_cancelled() {
            result.transition(RuntimeState::Skipped(SkipReason::Cancelled));
            return result;
        }

        self.ui.start_timer();
        self.ui.start_runtime(index, total, ctx);

        let terminal = match self.advance(&mut result) {
            Ok(state) => state,
            Err(RuntimeError::NoMatchingInputs(category)) => {
                RuntimeState::Skipped(SkipReason::NoMatchingInputs(category))
            }
            Err(e) => {
                log::debug!("runtime {index} failed: {e:?}");
                result.errors.push(e);
                RuntimeState::Failed
            }
        };
        result.transition(terminal);

        self.ui.print_elapsed("Runtime");
        self.ui.finish_runtime(&result);
        result
    }

    /// Walk the non-terminal states; returns the terminal state to move to.
    fn advance(&mut self, result: &mut RuntimeResult) -> Result<RuntimeState, RuntimeError> {
        let ctx = result.context.clone();
        let dry_run = self.fs.dry_run();

        result.transition(RuntimeState::DiscoveringInputs);
        let inputs = self.collect_inputs(&ctx, result)?;

        result.transition(RuntimeState::BuildingOutputPath);
        let tool = &self.config.tool;
        let output = match resolve_output(
            self.fs.output_prefix(),
            &tool.output_template,
            &ctx,
            tool.skip_if_output_exists,
            &self.fs,
        )? {
            OutputPath::Exists(path) => {
                return Ok(RuntimeState::Skipped(SkipReason::OutputExists(path)))
            }
            OutputPath::Ready(path) => path,
        };
        if !dry_run {
            self.fs
                .create_parent_dir(&output)
                .map_err(|source| RuntimeError::WriteError {
                    path: output.clone(),
                    source,
                })?;
        }

        result.transition(RuntimeState::ResolvingFields);
        let options = &self.config.options;
        if options.fields.is_empty() && options.fields_required {
            return Ok(RuntimeState::Skipped(SkipReason::NoFields));
        }
        let data_field = data_field(&options.fields, &ctx)?;
        let mask = self.verification_mask(&ctx)?;

        result.transition(RuntimeState::BuildingCommand);
        let env = build_env(options, &ctx, &data_field, mask.as_deref())?;
        let config_file = tool
            .config_file
            .as_ref()
            .map(|t| t.expand(&ctx, ExpandMode::Strict))
            .transpose()?;
        let input_args: Vec<InputArg> = inputs
            .iter()
            .map(|(flag, path)| InputArg { flag, path })
            .collect();
        let command_options = CommandOptions {
            config_file: config_file.as_deref(),
            output_flag: &tool.output_flag,
            verbosity: tool.verbosity,
        };
        let invocation = build_command(&tool.spec, &input_args, &output, &command_options, env)
            .map_err(|e| RuntimeError::ToolInvocationError {
                tool: tool.spec.name.clone(),
                exit_code: None,
                reason: format!("could not be given its arguments: {e}"),
                output: String::new(),
            })?;
        log::debug!("environment overlay:\n{}", invocation.display_env());

        if dry_run {
            eprintln!("{}", invocation.display());
            return Ok(RuntimeState::Skipped(SkipReason::DryRun));
        }
        self.ui.verbose_msg(&invocation.display());

        result.transition(RuntimeState::Executing);
        let log_path = self
            .fs
            .log_file(&tool.spec.name, result.index + 1, &mut self.pathbuf)
            .to_owned();
        let log = self
            .fs
            .create_parent_dir(&log_path)
            .and_then(|_| self.fs.create_file(&log_path))
            .map_err(|source| RuntimeError::WriteError {
                path: log_path.clone(),
                source,
            })?;

        let opts = ExecOptions {
            verbose: self.ui.verbose,
            timeout: self.timeout,
            cancel: &self.cancel,
        };
        match run_cmd(&invocation, &tool.spec.name, log, opts) {
            Ok(_) => {
                result.exit_code = Some(0);
                Ok(RuntimeState::Succeeded)
            }
            Err(e) => {
                if let RuntimeError::ToolInvocationError { exit_code, .. } = &e {
                    result.exit_code = *exit_code;
                }
                Err(e)
            }
        }
    }

    /// Subset every category's catalog for `ctx`. Returns `<flag> <path>` pairs
    /// in category order; categories using a manifest contribute one pair.
    fn collect_inputs(
        &self,
        ctx: &TimeContext,
        result: &mut RuntimeResult,
    ) -> Result<Vec<(String, PathBuf)>, RuntimeError> {
        let mut args = Vec::new();
        for (category, catalog) in self.config.inputs.iter().zip(&self.catalogs) {
            let files = catalog.subset(ctx);
            log::debug!("{}: {} matching files", category.name, files.len());
            result.files_found += files.len();

            if files.is_empty() {
                if category.required {
                    return Err(RuntimeError::NoMatchingInputs(category.name.clone()));
                }
                continue;
            }

            if category.use_manifest {
                let name = self.manifest_namer.name(&category.name, ctx)?;
                let path = self.manifest_dir.join(name);
                if !self.fs.dry_run() {
                    self.fs
                        .write_manifest(&path, &files)
                        .map_err(|source| RuntimeError::WriteError {
                            path: path.clone(),
                            source,
                        })?;
                }
                args.push((category.flag.clone(), path));
            } else {
                args.extend(files.into_iter().map(|f| (category.flag.clone(), f.to_owned())));
            }
        }
        Ok(args)
    }

    /// The expanded mask path, if one is configured and exists.
    fn verification_mask(&self, ctx: &TimeContext) -> Result<Option<String>, RuntimeError> {
        let Some(template) = &self.config.options.verification_mask else {
            return Ok(None);
        };
        let path = template.expand(ctx, ExpandMode::Strict)?;
        if self.fs.exists(&path) {
            Ok(Some(path))
        } else {
            log::warn!("Verification mask {path} does not exist; not masking");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::RawConfig;
    use crate::settings::Settings;
    use std::path::Path;

    fn make_runner(
        dir: &Path,
        tool_extra: &str,
        extra: &str,
        dry_run: bool,
    ) -> Result<(RuntimeRunner, Vec<TimeContext>)> {
        let root = dir.display();
        let text = format!(
            "
[loop]
loop_by = init
begin = 2016092900

[tool]
exe = /bin/sh
args = -c true
output_dir = {root}/out
output_template = out_{{init?fmt=%Y%m%d%H}}.nc
{tool_extra}

[input.fcst]
dir = {root}/fcst
template = F_{{init?fmt=%Y%m%d%H}}_{{lead?fmt=%3H}}.dat

{extra}
"
        );
        let mut raw = RawConfig::default();
        raw.merge_text(&text)?;
        let config = RunConfig::from_raw(&raw)?;
        let runtimes = config.schedule.runtimes()?;

        let mut fs = Fs::new(dry_run);
        fs.whitelist_dir(&config.tool.output_dir, false)?;
        let manifest_dir = fs.default_manifest_dir();
        let mut catalogs = Vec::new();
        for category in &config.inputs {
            catalogs.push(FileCatalog::build(&category.dir, &category.templates)?);
        }

        let settings = Settings {
            config: Vec::new(),
            overrides: Vec::new(),
            output: None,
            yes: true,
            verbose: 0,
            dry_run,
            timeout: None,
        };
        let runner = RuntimeRunner::new(
            config,
            catalogs,
            manifest_dir,
            fs,
            Ui::new(&settings),
            CancelToken::default(),
            None,
        )?;
        Ok((runner, runtimes))
    }

    fn add_input(dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir.join("fcst"))?;
        std::fs::write(dir.join("fcst/F_2016092900_000.dat"), "x")?;
        Ok(())
    }

    #[test]
    fn test_success() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let (mut runner, runtimes) = make_runner(dir.path(), "", "", false)?;

        let results = runner.run(&runtimes);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state, RuntimeState::Succeeded);
        assert_eq!(results[0].exit_code, Some(0));
        assert_eq!(results[0].files_found, 1);
        assert!(results[0].errors.is_empty());

        let manifest = dir
            .path()
            .join("out/file_lists/fcst_files_init_20160929000000_valid_20160929000000_lead_0.txt");
        assert!(manifest.exists(), "{manifest:?}");
        Ok(())
    }

    #[test]
    fn test_missing_required_input_skips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (mut runner, runtimes) = make_runner(dir.path(), "", "", false)?;

        let results = runner.run(&runtimes);
        assert_eq!(
            results[0].state,
            RuntimeState::Skipped(SkipReason::NoMatchingInputs("fcst".to_owned()))
        );
        assert!(results[0].errors.is_empty());
        Ok(())
    }

    #[test]
    fn test_optional_input_omitted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let root = dir.path().display();
        let extra = format!(
            "[input.mask]\ndir = {root}/masks\ntemplate = mask.nc\nrequired = false\n"
        );
        let (mut runner, runtimes) = make_runner(dir.path(), "", &extra, false)?;

        let results = runner.run(&runtimes);
        assert_eq!(results[0].state, RuntimeState::Succeeded);
        assert!(!dir.path().join("out/file_lists").read_dir()?.any(|e| e
            .map(|e| e.file_name().to_string_lossy().starts_with("mask"))
            .unwrap_or(false)));
        Ok(())
    }

    #[test]
    fn test_existing_output_skips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let (mut runner, runtimes) =
            make_runner(dir.path(), "skip_if_output_exists = true", "", false)?;
        let output = dir.path().join("out/out_2016092900.nc");
        std::fs::write(&output, "old")?;

        let results = runner.run(&runtimes);
        assert!(matches!(
            &results[0].state,
            RuntimeState::Skipped(SkipReason::OutputExists(p)) if p.ends_with("out_2016092900.nc")
        ));
        assert_eq!(std::fs::read_to_string(output)?, "old");
        Ok(())
    }

    #[test]
    fn test_required_fields_missing_skips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let (mut runner, runtimes) =
            make_runner(dir.path(), "", "[options]\nfields_required = true\n", false)?;

        let results = runner.run(&runtimes);
        assert_eq!(results[0].state, RuntimeState::Skipped(SkipReason::NoFields));
        Ok(())
    }

    #[test]
    fn test_tool_failure_is_recorded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let (mut runner, runtimes) = make_runner(dir.path(), "args = -c false", "", false)?;

        let results = runner.run(&runtimes);
        assert_eq!(results[0].state, RuntimeState::Failed);
        assert_eq!(results[0].exit_code, Some(1));
        assert!(matches!(
            results[0].errors.as_slice(),
            [RuntimeError::ToolInvocationError { .. }]
        ));
        Ok(())
    }

    #[test]
    fn test_dry_run_and_cancel() -> Result<()> {
        let dir = tempfile::tempdir()?;
        add_input(dir.path())?;
        let (mut runner, runtimes) = make_runner(dir.path(), "", "", true)?;
        let results = runner.run(&runtimes);
        assert_eq!(results[0].state, RuntimeState::Skipped(SkipReason::DryRun));
        assert!(!dir.path().join("out").exists());

        let (mut runner, runtimes) = make_runner(dir.path(), "", "", false)?;
        runner.cancel.cancel();
        let results = runner.run(&runtimes);
        assert_eq!(results[0].state, RuntimeState::Skipped(SkipReason::Cancelled));
        assert!(!dir.path().join("out/file_lists").exists());
        Ok(())
    }
}
