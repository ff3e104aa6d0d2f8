use std::fmt;

use super::{Axis, Error, Lead, Timestamp};

/// Identifies one runtime (or the runtime a discovered file belongs to)
/// on the three time axes, plus a free-form custom string.
///
/// Once constructed the axes are consistent: whenever two of init, valid
/// and lead are concrete, the third is concrete too and `valid = init + lead`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TimeContext {
    init: Axis<Timestamp>,
    valid: Axis<Timestamp>,
    lead: Axis<Lead>,
    custom: String,
}

impl TimeContext {
    /// Create a context, deriving the third axis when two are concrete.
    pub fn new(
        init: Axis<Timestamp>,
        valid: Axis<Timestamp>,
        lead: Axis<Lead>,
        custom: impl Into<String>,
    ) -> Result<Self, Error> {
        use Axis::{Any, At};

        let (init, valid, lead) = match (init, valid, lead) {
            (At(i), Any, At(l)) => (At(i), At(add(i, l)?), At(l)),
            (Any, At(v), At(l)) => (At(sub(v, l)?), At(v), At(l)),
            (At(i), At(v), Any) => (At(i), At(v), At(Lead::from_seconds((v - i).num_seconds()))),
            (At(i), At(v), At(l)) => {
                if add(i, l)? != v {
                    return Err(Error::InconsistentTimes {
                        init: i,
                        valid: v,
                        lead: l,
                    });
                }
                (At(i), At(v), At(l))
            }
            other => other,
        };

        Ok(Self {
            init,
            valid,
            lead,
            custom: custom.into(),
        })
    }

    /// A context where every axis is a wildcard; matches every file.
    pub fn wildcard() -> Self {
        Self::default()
    }

    /// Same axes, different custom string.
    pub fn with_custom(&self, custom: impl Into<String>) -> Self {
        Self {
            custom: custom.into(),
            ..self.clone()
        }
    }

    #[inline]
    pub fn init(&self) -> &Axis<Timestamp> {
        &self.init
    }

    #[inline]
    pub fn valid(&self) -> &Axis<Timestamp> {
        &self.valid
    }

    #[inline]
    pub fn lead(&self) -> &Axis<Lead> {
        &self.lead
    }

    #[inline]
    pub fn custom(&self) -> &str {
        &self.custom
    }

    /// True if no axis is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !(self.init.is_any() || self.valid.is_any() || self.lead.is_any())
    }

    /// True if all three axes match independently. The custom string is not compared.
    pub fn matches(&self, other: &TimeContext) -> bool {
        self.init.matches(&other.init)
            && self.valid.matches(&other.valid)
            && self.lead.matches(&other.lead)
    }
}

fn add(t: Timestamp, lead: Lead) -> Result<Timestamp, Error> {
    t.checked_add_signed(lead.to_duration()?)
        .ok_or(Error::OutOfRange)
}

fn sub(t: Timestamp, lead: Lead) -> Result<Timestamp, Error> {
    t.checked_sub_signed(lead.to_duration()?)
        .ok_or(Error::OutOfRange)
}

impl fmt::Display for TimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_ts = |t: &Timestamp| t.format("%Y-%m-%d %H:%M:%S").to_string();
        write!(
            f,
            "init={} valid={} lead={}",
            self.init.map(fmt_ts),
            self.valid.map(fmt_ts),
            self.lead
        )?;
        if !self.custom.is_empty() {
            write!(f, " custom={}", self.custom)?;
        }
        Ok(())
    }
}
