use anyhow::{Context, Result};
use colored::Colorize;

use catalog::FileCatalog;
use time::TimeContext;

use crate::config::RunConfig;
use crate::exec::{CancelToken, Errors, RuntimeResult, RuntimeRunner};
use crate::fs::Fs;
use crate::settings::Settings;
use crate::ui::Ui;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
    /// Set from the interrupt handler
    cancel: CancelToken,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self {
            settings,
            ui,
            cancel: CancelToken::default(),
        }
    }

    /// Token that stops the run after the current runtime when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Load the config, build input catalogs, then process every runtime.
    /// Fails if any runtime failed.
    pub fn run(mut self) -> Result<()> {
        let mut fs = Fs::new(self.settings.dry_run);

        self.ui.verbose_progress_debug("Reading config", &self.settings.config);
        let config = RunConfig::load(&self.settings, &fs)?;
        self.ui.done();

        let verbose = self.ui.verbose;
        let output_dir = fs
            .whitelist_dir(&config.tool.output_dir, verbose)
            .context("while preparing output directory")?;
        if verbose {
            eprintln!("Using output directory {output_dir:?}");
        }
        let manifest_dir = match &config.tool.manifest_dir {
            Some(dir) => fs
                .whitelist_dir(dir, verbose)
                .context("while preparing manifest directory")?,
            None => fs.default_manifest_dir(),
        };

        self.ui.verbose_progress("Computing runtimes");
        let runtimes = config
            .schedule
            .runtimes()
            .context("while computing runtimes")?;
        self.ui.done();
        log::info!(
            "{} runtimes ({:?} frequency)",
            runtimes.len(),
            config.schedule.freq()
        );
        if runtimes.is_empty() {
            eprintln!("{}", "No runtimes to process; exiting.".green());
            return Ok(());
        }

        let catalogs = self.build_catalogs(&config)?;

        if !self.settings.dry_run
            && !self.ui.confirm(&format!("Process {} runtimes?", runtimes.len()))?
        {
            return Ok(());
        }

        let mut runner = RuntimeRunner::new(
            config,
            catalogs,
            manifest_dir,
            fs,
            Ui::new(&self.settings),
            self.cancel.clone(),
            self.settings.timeout,
        )?;
        let results = runner.run(&runtimes);

        self.ui.print_summary(&results);
        recap(results).print_recap("Run")?;
        Ok(())
    }

    /// One catalog per input category, built once for the whole run.
    fn build_catalogs(&mut self, config: &RunConfig) -> Result<Vec<FileCatalog>> {
        let mut catalogs = Vec::with_capacity(config.inputs.len());
        for category in &config.inputs {
            self.ui
                .verbose_progress_debug(&format!("Discovering {} files in", category.name), &category.dir);
            self.ui.start_timer();
            let catalog = FileCatalog::build(&category.dir, &category.templates)
                .with_context(|| format!("while discovering {} files", category.name))?;
            self.ui.done();
            self.ui.print_elapsed("Discovery");
            log::info!(
                "{}: {} files over {} distinct times",
                category.name,
                catalog.len(),
                catalog.context_count()
            );
            catalogs.push(catalog);
        }
        Ok(catalogs)
    }
}

fn recap(results: Vec<RuntimeResult>) -> Errors {
    let mut errors = Errors::default();
    for result in results {
        let label = runtime_label(result.index, &result.context);
        for e in result.errors {
            errors.add_context(e.into(), label.clone());
        }
    }
    errors
}

fn runtime_label(index: usize, ctx: &TimeContext) -> String {
    format!("runtime {} ({ctx})", index + 1)
}
