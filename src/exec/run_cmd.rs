use std::fs::File;
use std::io::{stderr, stdout, Read, Write};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::prep::Invocation;

use super::{CancelToken, RuntimeError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
pub struct ExecOptions<'a> {
    /// echo the tool's output to the terminal
    pub verbose: bool,
    pub timeout: Option<Duration>,
    pub cancel: &'a CancelToken,
}

/// Shared between the two drain threads.
struct Sink {
    combined: Vec<u8>,
    log: File,
}

/// Run `invocation` as a subprocess, writing its combined stdout and stderr
/// to `log` (and to the terminal when verbose).
/// Returns the captured output on exit code 0.
///
/// The env overlay only applies to the child. While the child runs, the
/// cancel token and the timeout are checked every 50ms; either one kills
/// the child.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(
    invocation: &Invocation,
    tool: &str,
    log: File,
    opts: ExecOptions,
) -> Result<String, RuntimeError> {
    let launch_error = |reason: String| RuntimeError::ToolInvocationError {
        tool: tool.to_owned(),
        exit_code: None,
        reason,
        output: String::new(),
    };

    let mut child = invocation
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(format!("failed to launch {:?}: {e}", invocation.program())))?;

    let sink = Arc::new(Mutex::new(Sink {
        combined: Vec::with_capacity(4096),
        log,
    }));
    let mut threads = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        threads.push(drain(out, Arc::clone(&sink), opts.verbose.then(|| Box::new(stdout()) as _)));
    }
    if let Some(err) = child.stderr.take() {
        threads.push(drain(err, Arc::clone(&sink), opts.verbose.then(|| Box::new(stderr()) as _)));
    }

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                kill(&mut child);
                return Err(launch_error(format!("could not be waited on: {e}")));
            }
        }
        if opts.cancel.is_cancelled() {
            kill(&mut child);
            log::debug!("{tool} killed after cancellation");
            return Err(RuntimeError::Cancelled {
                tool: tool.to_owned(),
            });
        }
        if let Some(timeout) = opts.timeout {
            if started.elapsed() >= timeout {
                kill(&mut child);
                // a grandchild may still hold the pipes open, so don't join the threads:
                return Err(RuntimeError::Timeout {
                    tool: tool.to_owned(),
                    after: timeout,
                    output: captured(&sink),
                });
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    for t in threads {
        if t.join().is_err() {
            log::warn!("output thread for {tool} panicked");
        }
    }
    let output = captured(&sink);

    if opts.verbose {
        eprintln!("\n{} with {status}.", "Process finished".green());
    }

    if status.success() {
        Ok(output)
    } else {
        Err(RuntimeError::ToolInvocationError {
            tool: tool.to_owned(),
            exit_code: status.code(),
            reason: describe(status),
            output,
        })
    }
}

fn drain<R>(
    mut stream: R,
    sink: Arc<Mutex<Sink>>,
    mut echo: Option<Box<dyn Write + Send>>,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        loop {
            let num_read = match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    log::warn!("error reading child output: {e}");
                    break;
                }
            };
            let buf = &buf[..num_read];
            {
                let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
                sink.combined.extend_from_slice(buf);
                if let Err(e) = sink.log.write_all(buf) {
                    log::warn!("error writing tool log: {e}");
                }
            }
            if let Some(echo) = echo.as_mut() {
                let _ = echo.write_all(buf);
            }
        }
    })
}

fn captured(sink: &Mutex<Sink>) -> String {
    let sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&sink.combined).into_owned()
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("kill failed (child probably already exited): {e}");
    }
    let _ = child.wait();
}

fn describe(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => format!("was terminated ({status})"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    fn sh(script: &str, env: &[(&str, &str)]) -> Invocation {
        Invocation {
            argv: vec!["/bin/sh".into(), "-c".into(), script.into()],
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn run(inv: &Invocation, timeout: Option<Duration>, cancel: &CancelToken) -> Result<String, RuntimeError> {
        let dir = tempfile::tempdir().unwrap();
        let log = File::create(dir.path().join("tool.log")).unwrap();
        let opts = ExecOptions {
            verbose: false,
            timeout,
            cancel,
        };
        run_cmd(inv, "tool", log, opts)
    }

    #[test]
    fn test_success_captures_output_and_env() {
        let inv = sh("echo out; echo err >&2; echo \"$METWRAP_TEST_VAR\"", &[("METWRAP_TEST_VAR", "hello")]);
        let output = run(&inv, None, &CancelToken::default()).unwrap();
        assert!(output.contains("out\n"));
        assert!(output.contains("err\n"));
        assert!(output.contains("hello\n"));
        assert!(std::env::var("METWRAP_TEST_VAR").is_err());
    }

    #[test]
    fn test_log_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tool.log");
        let opts = ExecOptions {
            verbose: false,
            timeout: None,
            cancel: &CancelToken::default(),
        };
        run_cmd(&sh("echo logged", &[]), "tool", File::create(&path)?, opts)?;
        assert_eq!(std::fs::read_to_string(&path)?, "logged\n");
        Ok(())
    }

    #[test]
    fn test_nonzero_exit() {
        let err = run(&sh("echo failing; exit 3", &[]), None, &CancelToken::default()).unwrap_err();
        match err {
            RuntimeError::ToolInvocationError {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(output, "failing\n");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_launch_failure() {
        let inv = Invocation {
            argv: vec!["/nonexistent/metwrap-tool".into()],
            env: BTreeMap::new(),
        };
        let err = run(&inv, None, &CancelToken::default()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ToolInvocationError { exit_code: None, .. }
        ));
    }

    #[test]
    fn test_timeout() {
        let started = Instant::now();
        let err = run(&sh("exec sleep 5", &[]), Some(Duration::from_millis(200)), &CancelToken::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancelToken::default();
        cancel.cancel();
        let err = run(&sh("exec sleep 5", &[]), None, &cancel).unwrap_err();
        assert!(matches!(err, RuntimeError::Cancelled { .. }));
    }
}
