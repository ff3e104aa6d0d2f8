use std::path::PathBuf;
use std::time::Duration;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),
    #[error("invalid --set flag '{0}' (should be formatted 'section.key=value')")]
    InvalidSetFlag(String),
    #[error("--timeout must be greater than zero")]
    ZeroTimeout,
}

/// A single `--set section.key=value` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub section: String,
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for Override {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSetFlag(s.to_owned());
        let (path, value) = s.split_once('=').ok_or_else(invalid)?;
        // section names may themselves contain dots ("input.fcst"):
        let (section, key) = path.trim().rsplit_once('.').ok_or_else(invalid)?;
        if section.is_empty() || key.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            section: section.to_owned(),
            key: key.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub config: Vec<PathBuf>,
    pub overrides: Vec<Override>,
    pub output: Option<PathBuf>,
    pub yes: bool,
    pub verbose: u8,
    pub dry_run: bool,
    pub timeout: Option<Duration>,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut config = Vec::with_capacity(args.config.len());
        for path in &args.config {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.display().to_string()).into());
            }
            config.push(path.canonicalize()?);
        }

        let overrides = args
            .set
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Override>, _>>()?;

        let timeout = match args.timeout {
            Some(0) => return Err(Error::ZeroTimeout.into()),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self {
            config,
            overrides,
            output: args.output.map(PathBuf::from),
            yes: args.yes,
            verbose: args.verbose,
            dry_run: args.dry_run,
            timeout,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_override() {
        let o: Override = "input.fcst.dir = /data/fcst".parse().unwrap();
        assert_eq!(o.section, "input.fcst");
        assert_eq!(o.key, "dir");
        assert_eq!(o.value, "/data/fcst");

        let o: Override = "loop.lead_seq=0,6H".parse().unwrap();
        assert_eq!((o.section.as_str(), o.value.as_str()), ("loop", "0,6H"));

        assert!("loop_by=init".parse::<Override>().is_err());
        assert!("loop.begin".parse::<Override>().is_err());
        assert!(".begin=1".parse::<Override>().is_err());
    }
}
