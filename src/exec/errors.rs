use colored::Colorize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} failed due to {1} errors")]
    AggregatedErrors(String, usize),
}

/// Errors from every failed runtime, printed together at the end of the run.
pub struct Errors {
    errors: Vec<anyhow::Error>,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            // ideally we won't have any:
            errors: Vec::with_capacity(0),
        }
    }
}

impl Errors {
    pub fn add_context(&mut self, e: anyhow::Error, msg: String) {
        log::trace!("{msg}: {e:?}");
        self.errors.push(e.context(msg));
    }

    /// Print full list of errors to stderr, fail w/ an aggregated error
    /// if there were one or more errors.
    pub fn print_recap(&self, label: &str) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            eprintln!("\n{label} encountered {} errors:\n", self.errors.len());
            for e in &self.errors {
                eprintln!("{}: {e:?}\n", "ERROR".red());
            }
            Err(Error::AggregatedErrors(label.to_owned(), self.errors.len()))
        }
    }
}
