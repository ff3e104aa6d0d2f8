/// Possibly-wildcarded value on one time axis
mod axis;
pub use axis::Axis;

/// Forecast lead (offset from init) in seconds
mod lead;
pub use lead::{parse_duration, DurationUnit, Lead};

/// The init/valid/lead triple identifying a runtime
mod context;
pub use context::TimeContext;

/// `%Y%m%d`-style formats for init and valid times
mod date_format;
pub use date_format::{DateFields, DateFormat};

/// `%3H`-style formats for leads
mod lead_format;
pub use lead_format::LeadFormat;

pub type Timestamp = chrono::NaiveDateTime;

/// Rendered in place of a wildcard axis wherever wildcards are allowed.
pub const ALL_TOKEN: &str = "ALL";

/// Format used for init and valid times when a template gives none.
pub const DEFAULT_DATE_FMT: &str = "%Y%m%d%H%M%S";

/// Format used for leads when a template gives none (total seconds).
pub const DEFAULT_LEAD_FMT: &str = "%s";

/// Widest zero padding a lead directive may ask for; an i64 has 19 digits.
pub const MAX_WIDTH: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inconsistent times: init {init} + lead {lead} != valid {valid}")]
    InconsistentTimes {
        init: Timestamp,
        valid: Timestamp,
        lead: Lead,
    },
    #[error("Time arithmetic out of range")]
    OutOfRange,
    #[error("Invalid directive '%{1}' in format \"{0}\"")]
    InvalidDirective(String, char),
    #[error("Format \"{0}\" ends with a dangling '%'")]
    DanglingPercent(String),
    #[error("Format \"{0}\" does not contain enough fields to recover a value")]
    Incomplete(String),
    #[error("\"{0}\" does not match format \"{1}\"")]
    NoMatch(String, String),
    #[error("\"{0}\" is not a valid date/time")]
    InvalidTimestamp(String),
    #[error("Invalid duration \"{0}\" (expected e.g. 3600, 6H, 30M)")]
    InvalidDuration(String),
    #[error("Field width in format \"{0}\" is larger than {}", MAX_WIDTH)]
    WidthTooLarge(String),
    #[error("Format \"{0}\" can't be matched")]
    Pattern(String, #[source] regex::Error),
}
