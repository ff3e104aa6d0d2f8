use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use util::PathEncodingError;

use super::ToolSpec;

/// One `<flag> <path>` pair on the command line.
#[derive(Debug, Clone, Copy)]
pub struct InputArg<'a> {
    pub flag: &'a str,
    pub path: &'a Path,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandOptions<'a> {
    /// Already expanded for the runtime
    pub config_file: Option<&'a str>,
    pub output_flag: &'a str,
    pub verbosity: u8,
}

/// Everything needed to launch the tool once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Never empty; `argv[0]` is the executable
    pub argv: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// Compose the argument vector:
/// `exe fixed_args.. (<flag> <input>).. [-config <file>] <output_flag> <output> -v <verbosity>`.
pub fn build_command(
    tool: &ToolSpec,
    inputs: &[InputArg],
    output: &Path,
    options: &CommandOptions,
    env: BTreeMap<String, String>,
) -> Result<Invocation, PathEncodingError> {
    let mut argv = Vec::with_capacity(tool.fixed_args.len() + inputs.len() * 2 + 7);
    argv.push(tool.exe.clone());
    argv.extend(tool.fixed_args.iter().cloned());

    for input in inputs {
        argv.push(input.flag.to_owned());
        argv.push(util::path_str(input.path)?.to_owned());
    }

    if let Some(config_file) = options.config_file {
        argv.push("-config".to_owned());
        argv.push(config_file.to_owned());
    }

    argv.push(options.output_flag.to_owned());
    argv.push(util::path_str(output)?.to_owned());

    argv.push("-v".to_owned());
    argv.push(options.verbosity.to_string());

    Ok(Invocation { argv, env })
}

impl Invocation {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// A `Command` with the env overlay applied to the child only.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args(&self.argv[1..]).envs(&self.env);
        cmd
    }

    /// Shell-quoted command line, for logs and dry runs.
    pub fn display(&self) -> String {
        self.argv
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `KEY=value` lines, for logs.
    pub fn display_env(&self) -> String {
        let mut s = String::with_capacity(self.env.len() * 32);
        for (k, v) in &self.env {
            s.push_str(k);
            s.push('=');
            s.push_str(&shell_quote(v));
            s.push('\n');
        }
        s
    }
}

fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn tool() -> ToolSpec {
        ToolSpec::new("series_analysis", "/usr/bin/series_analysis", "-paired")
    }

    #[test]
    fn test_build_command() -> Result<()> {
        let inputs = [
            InputArg {
                flag: "-fcst",
                path: Path::new("/out/file_lists/fcst.txt"),
            },
            InputArg {
                flag: "-obs",
                path: Path::new("/out/file_lists/obs.txt"),
            },
        ];
        let options = CommandOptions {
            config_file: Some("/cfg/SeriesConfig"),
            output_flag: "-out",
            verbosity: 2,
        };
        let inv = build_command(&tool(), &inputs, Path::new("/out/s.nc"), &options, BTreeMap::new())?;
        assert_eq!(
            inv.argv,
            [
                "/usr/bin/series_analysis",
                "-paired",
                "-fcst",
                "/out/file_lists/fcst.txt",
                "-obs",
                "/out/file_lists/obs.txt",
                "-config",
                "/cfg/SeriesConfig",
                "-out",
                "/out/s.nc",
                "-v",
                "2"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_without_config() -> Result<()> {
        let options = CommandOptions {
            config_file: None,
            output_flag: "-outdir",
            verbosity: 4,
        };
        let inv = build_command(&tool(), &[], Path::new("/out"), &options, BTreeMap::new())?;
        assert_eq!(inv.argv[2..], ["-outdir", "/out", "-v", "4"]);
        Ok(())
    }

    #[test]
    fn test_display() {
        let mut env = BTreeMap::new();
        env.insert("DESC".to_owned(), "desc = \"x\";".to_owned());
        let inv = Invocation {
            argv: vec!["tool".into(), "a b".into(), "it's".into(), "".into(), "-v".into()],
            env,
        };
        assert_eq!(inv.display(), r#"tool 'a b' 'it'\''s' '' -v"#);
        assert_eq!(inv.display_env(), "DESC='desc = \"x\";'\n");
    }
}
