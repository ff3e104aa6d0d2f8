use std::cell::RefCell;
use std::io::IsTerminal;

use anyhow::Result;
use colored::Colorize;

use util::Timer;

use crate::exec::{RuntimeResult, RuntimeState};
use crate::settings::Settings;

/// All interactions with the text UI should go through this struct.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// -y setting, ignores all points where the user is prompted to enter 'y'
    override_confirmation: bool,
    /// keeps track of time for each runtime
    timer: Timer,
    /// buffer to hold strings internally when getting input
    strbuf: RefCell<String>,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            override_confirmation: settings.yes,
            timer: Timer::now(),
            // Refcell so we can call confirm() w/o needing a unique reference:
            strbuf: RefCell::new(String::with_capacity(16)),
        }
    }

    /// Ask the user to confirm. Non-interactive runs (no terminal on stdin) proceed.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.override_confirmation || !std::io::stdin().is_terminal() {
            return Ok(true);
        }
        eprintln!("{} (y/N)", prompt);

        let mut strbuf = self.strbuf.borrow_mut();

        strbuf.clear();
        std::io::stdin().read_line(&mut strbuf)?;
        match strbuf.chars().next() {
            Some('y') => Ok(true),
            _ => Ok(false),
        }
    }

    pub fn start_timer(&mut self) {
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&self, label: &str) {
        if self.verbose {
            self.timer.print_elapsed(label);
        }
    }

    pub fn verbose_msg(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }

    pub fn verbose_progress(&self, msg: &str) {
        if self.verbose {
            eprint!("{}... ", msg.magenta());
        }
    }

    pub fn verbose_progress_debug<T: std::fmt::Debug>(&self, msg: &str, arg: T) {
        if self.verbose {
            eprint!("{} {:?}... ", msg.magenta(), arg);
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    /// `RUN [i/n] init=... valid=... lead=...`
    pub fn start_runtime(&self, index: usize, total: usize, ctx: &time::TimeContext) {
        eprintln!("{} [{}/{total}] {ctx}", "RUN".green(), index + 1);
    }

    /// Print the terminal state of a runtime.
    pub fn finish_runtime(&self, result: &RuntimeResult) {
        match &result.state {
            RuntimeState::Succeeded => eprintln!("{}\n", "SUCCEEDED".green()),
            RuntimeState::Skipped(reason) => eprintln!("{} ({reason})\n", "SKIPPED".yellow()),
            RuntimeState::Failed => {
                for e in &result.errors {
                    eprintln!("{}: {e}", "Error".red());
                }
                eprintln!("{}\n", "FAILED".red());
            }
            other => log::debug!("runtime {} ended in non-terminal state {other:?}", result.index),
        }
    }

    /// Counts of each terminal state, then one line per failed runtime.
    pub fn print_summary(&self, results: &[RuntimeResult]) {
        let count = |f: fn(&RuntimeState) -> bool| results.iter().filter(|r| f(&r.state)).count();
        let succeeded = count(|s| matches!(s, RuntimeState::Succeeded));
        let skipped = count(|s| matches!(s, RuntimeState::Skipped(_)));
        let failed = count(|s| matches!(s, RuntimeState::Failed));

        eprintln!(
            "\nProcessed {} runtimes: {} succeeded, {} skipped, {} failed.",
            results.len(),
            succeeded.to_string().green(),
            skipped.to_string().yellow(),
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().normal()
            },
        );
        for r in results.iter().filter(|r| r.state == RuntimeState::Failed) {
            eprintln!(" - {} runtime {}: {}", "FAILED".red(), r.index + 1, r.context);
        }
    }
}
