use std::fmt;

use super::Error;

/// Offset of valid time from init time, in whole seconds. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Lead(i64);

impl Lead {
    pub const ZERO: Lead = Lead(0);

    pub fn from_seconds(secs: i64) -> Self {
        Self(secs)
    }

    /// Saturates at the bounds of `i64` seconds; `to_duration` rejects those.
    pub fn from_hours(hours: i64) -> Self {
        Self(hours.saturating_mul(3600))
    }

    #[inline]
    pub fn seconds(&self) -> i64 {
        self.0
    }

    /// Fails for leads beyond the range chrono can represent.
    pub fn to_duration(self) -> Result<chrono::Duration, Error> {
        chrono::Duration::try_seconds(self.0).ok_or(Error::OutOfRange)
    }
}

impl fmt::Display for Lead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0;
        if secs == 0 {
            f.write_str("0")
        } else if secs % 3600 == 0 {
            write!(f, "{}H", secs / 3600)
        } else if secs % 60 == 0 {
            write!(f, "{}M", secs / 60)
        } else {
            write!(f, "{}S", secs)
        }
    }
}

/// Unit applied to a duration written without a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    fn seconds(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
            Self::Days => 86400,
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(Self::Seconds),
            'M' => Some(Self::Minutes),
            'H' => Some(Self::Hours),
            'D' => Some(Self::Days),
            _ => None,
        }
    }
}

/// Parse a duration like `3600`, `6H`, `-30M` or `1d`.
/// Bare numbers are read in `default_unit`.
pub fn parse_duration(text: &str, default_unit: DurationUnit) -> Result<Lead, Error> {
    let text = text.trim();
    let invalid = || Error::InvalidDuration(text.to_owned());

    let (digits, unit) = match text.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let unit = DurationUnit::from_suffix(c).ok_or_else(invalid)?;
            (&text[..text.len() - 1], unit)
        }
        Some(_) => (text, default_unit),
        None => return Err(invalid()),
    };

    let n: i64 = digits.parse().map_err(|_| invalid())?;
    n.checked_mul(unit.seconds())
        .map(Lead::from_seconds)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_duration() -> Result<(), Error> {
        assert_eq!(parse_duration("6", DurationUnit::Hours)?, Lead::from_hours(6));
        assert_eq!(parse_duration("21600", DurationUnit::Seconds)?, Lead::from_hours(6));
        assert_eq!(parse_duration("6H", DurationUnit::Seconds)?, Lead::from_hours(6));
        assert_eq!(parse_duration("30m", DurationUnit::Hours)?.seconds(), 1800);
        assert_eq!(parse_duration("-1D", DurationUnit::Hours)?.seconds(), -86400);
        assert!(parse_duration("", DurationUnit::Hours).is_err());
        assert!(parse_duration("6X", DurationUnit::Hours).is_err());
        assert!(parse_duration("H", DurationUnit::Hours).is_err());
        Ok(())
    }

    #[test]
    fn test_display() {
        assert_eq!(Lead::from_hours(6).to_string(), "6H");
        assert_eq!(Lead::from_seconds(90).to_string(), "90S");
        assert_eq!(Lead::from_seconds(1800).to_string(), "30M");
        assert_eq!(Lead::ZERO.to_string(), "0");
    }

    #[test]
    fn test_out_of_range() {
        assert!(Lead::from_hours(6).to_duration().is_ok());
        assert!(matches!(
            Lead::from_seconds(9_300_000_000_000_000).to_duration(),
            Err(Error::OutOfRange)
        ));
        assert_eq!(Lead::from_hours(i64::MAX).seconds(), i64::MAX);
        assert!(Lead::from_hours(i64::MIN).to_duration().is_err());
    }
}
