use std::str::FromStr;

use time::{parse_duration, Axis, DateFormat, DurationUnit, Lead, TimeContext, Timestamp};

use crate::config::SectionView;

const DEFAULT_TIME_FMT: &str = "%Y%m%d%H";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] crate::config::Error),
    #[error("[loop] end ({end}) is before begin ({begin})")]
    EndBeforeBegin { begin: Timestamp, end: Timestamp },
    #[error("[loop] increment must be positive, got {0}")]
    NonPositiveIncrement(Lead),
}

/// Which time the loop steps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopBy {
    Init,
    Valid,
}

/// How many runtimes to produce, and which axes they leave as wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeFreq {
    /// A single runtime with every axis a wildcard.
    Once,
    /// One runtime per loop time; the other axes are wildcards.
    OncePerInitOrValid,
    /// One runtime per lead; init and valid are wildcards.
    OncePerLead,
    /// One runtime per loop time and lead.
    #[default]
    OnceForEach,
}

impl FromStr for RuntimeFreq {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "once_per_init_or_valid" => Ok(Self::OncePerInitOrValid),
            "once_per_lead" => Ok(Self::OncePerLead),
            "once_for_each" => Ok(Self::OnceForEach),
            _ => Err(()),
        }
    }
}

/// Produces the ordered list of runtimes from the `[loop]` section.
#[derive(Debug, Clone)]
pub struct Schedule {
    loop_by: LoopBy,
    begin: Timestamp,
    end: Timestamp,
    increment: Lead,
    leads: Vec<Lead>,
    freq: RuntimeFreq,
    customs: Vec<String>,
}

pub const LOOP_KEYS: &[&str] = &[
    "loop_by",
    "time_fmt",
    "begin",
    "end",
    "increment",
    "lead_seq",
    "runtime_freq",
    "custom_loop_list",
];

impl Schedule {
    pub fn from_section(section: SectionView) -> Result<Self, Error> {
        section.warn_unknown_keys(LOOP_KEYS);

        let loop_by = match section.require("loop_by")?.to_ascii_lowercase().as_str() {
            "init" | "init_time" => LoopBy::Init,
            "valid" | "valid_time" => LoopBy::Valid,
            _ => return Err(section.invalid("loop_by", "expected init or valid").into()),
        };

        let time_fmt = section.get("time_fmt").unwrap_or(DEFAULT_TIME_FMT);
        let time_fmt =
            DateFormat::parse(time_fmt).map_err(|e| section.invalid("time_fmt", e.to_string()))?;
        let timestamp = |key: &str| -> Result<Timestamp, Error> {
            let text = section.require(key)?;
            time_fmt
                .parse_value(text)
                .map_err(|e| section.invalid(key, e.to_string()).into())
        };
        let begin = timestamp("begin")?;
        let end = match section.get("end") {
            Some(_) => timestamp("end")?,
            None => begin,
        };

        // bare increments are seconds, bare leads are hours:
        let increment = match section.get("increment") {
            Some(text) => parse_duration(text, DurationUnit::Seconds)
                .map_err(|e| section.invalid("increment", e.to_string()))?,
            None => Lead::from_hours(24),
        };
        let mut leads = Vec::new();
        for text in section.list("lead_seq") {
            leads.push(
                parse_duration(text, DurationUnit::Hours)
                    .map_err(|e| section.invalid("lead_seq", e.to_string()))?,
            );
        }
        if leads.is_empty() {
            leads.push(Lead::ZERO);
        }

        let freq = match section.get("runtime_freq") {
            Some(text) => text.parse().map_err(|_| {
                section.invalid(
                    "runtime_freq",
                    "expected once, once_per_init_or_valid, once_per_lead or once_for_each",
                )
            })?,
            None => RuntimeFreq::default(),
        };

        let mut customs: Vec<String> = section
            .list("custom_loop_list")
            .into_iter()
            .map(str::to_owned)
            .collect();
        if customs.is_empty() {
            customs.push(String::new());
        }

        Self::new(loop_by, begin, end, increment, leads, freq, customs)
    }

    pub fn new(
        loop_by: LoopBy,
        begin: Timestamp,
        end: Timestamp,
        increment: Lead,
        leads: Vec<Lead>,
        freq: RuntimeFreq,
        customs: Vec<String>,
    ) -> Result<Self, Error> {
        if increment.seconds() <= 0 {
            return Err(Error::NonPositiveIncrement(increment));
        }
        if end < begin {
            return Err(Error::EndBeforeBegin { begin, end });
        }
        Ok(Self {
            loop_by,
            begin,
            end,
            increment,
            leads,
            freq,
            customs,
        })
    }

    pub fn freq(&self) -> RuntimeFreq {
        self.freq
    }

    /// Loop times from `begin` to `end` inclusive.
    fn loop_times(&self) -> Vec<Timestamp> {
        let mut times = Vec::new();
        let mut t = self.begin;
        while t <= self.end {
            times.push(t);
            let next = self
                .increment
                .to_duration()
                .ok()
                .and_then(|step| t.checked_add_signed(step));
            match next {
                Some(next) => t = next,
                None => break,
            }
        }
        times
    }

    fn at_loop_time(&self, t: Timestamp, lead: Axis<Lead>) -> Result<TimeContext, time::Error> {
        match self.loop_by {
            LoopBy::Init => TimeContext::new(Axis::At(t), Axis::Any, lead, ""),
            LoopBy::Valid => TimeContext::new(Axis::Any, Axis::At(t), lead, ""),
        }
    }

    /// Every runtime in processing order. Each base runtime is repeated
    /// once per custom loop string.
    pub fn runtimes(&self) -> Result<Vec<TimeContext>, time::Error> {
        let mut base = Vec::new();
        match self.freq {
            RuntimeFreq::Once => base.push(TimeContext::wildcard()),
            RuntimeFreq::OncePerInitOrValid => {
                for t in self.loop_times() {
                    base.push(self.at_loop_time(t, Axis::Any)?);
                }
            }
            RuntimeFreq::OncePerLead => {
                for lead in &self.leads {
                    base.push(TimeContext::new(Axis::Any, Axis::Any, Axis::At(*lead), "")?);
                }
            }
            RuntimeFreq::OnceForEach => {
                for t in self.loop_times() {
                    for lead in &self.leads {
                        base.push(self.at_loop_time(t, Axis::At(*lead))?);
                    }
                }
            }
        }

        let mut runtimes = Vec::with_capacity(base.len() * self.customs.len());
        for ctx in &base {
            for custom in &self.customs {
                runtimes.push(ctx.with_custom(custom.as_str()));
            }
        }
        Ok(runtimes)
    }
}
