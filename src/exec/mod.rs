use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runs every runtime through the state machine
mod runtime_runner;
pub use runtime_runner::{RuntimeResult, RuntimeRunner, RuntimeState, SkipReason};

/// Run a subprocess
mod run_cmd;
pub use run_cmd::{run_cmd, ExecOptions};

/// Collects errors for the end-of-run recap
mod errors;
pub use errors::Errors;

/// How much captured output to keep in a `ToolInvocationError`
const OUTPUT_TAIL_LINES: usize = 20;

/// Errors that end a single runtime. Apart from `NoMatchingInputs`
/// (which skips the runtime) they all mark it `FAILED`.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Malformed template \"{0}\": {1}")]
    MalformedTemplate(String, String),
    #[error("Template \"{template}\" needs a concrete {axis} time, but the runtime has a wildcard")]
    UnresolvedWildcard {
        template: String,
        axis: &'static str,
    },
    #[error("No matching input files for '{0}'")]
    NoMatchingInputs(String),
    #[error("Unable to write {path:?}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("{tool} {reason}{}", tail(.output))]
    ToolInvocationError {
        tool: String,
        exit_code: Option<i32>,
        reason: String,
        output: String,
    },
    #[error("{tool} timed out after {after:?}{}", tail(.output))]
    Timeout {
        tool: String,
        after: Duration,
        output: String,
    },
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },
}

impl From<template::Error> for RuntimeError {
    fn from(e: template::Error) -> Self {
        match e {
            template::Error::Malformed(t, reason) => Self::MalformedTemplate(t, reason),
            template::Error::UnresolvedWildcard { template, axis } => {
                Self::UnresolvedWildcard { template, axis }
            }
        }
    }
}

/// Last few lines of captured output, formatted to follow an error message.
fn tail(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    format!("\n--- last output ---\n{}", lines[start..].join("\n"))
}

/// Shared flag set from the interrupt handler; checked between runtimes
/// and while a tool is running.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tool_error_shows_tail() {
        let output: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let e = RuntimeError::ToolInvocationError {
            tool: "grid_diag".into(),
            exit_code: Some(3),
            reason: "exited with code 3".into(),
            output,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("grid_diag exited with code 3\n--- last output ---\nline 11\n"));
        assert!(msg.ends_with("line 30"));
        assert!(!msg.contains("line 10\n"));
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::default();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
