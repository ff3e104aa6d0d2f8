/// Parsed templates and forward expansion
mod template;
pub use template::{ExpandMode, Template};

/// Reverse matching: recover a `TimeContext` from a filename
mod pattern;
pub use pattern::Pattern;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed template \"{0}\": {1}")]
    Malformed(String, String),
    #[error("Template \"{template}\" needs a concrete {axis} time, but the runtime has a wildcard")]
    UnresolvedWildcard {
        template: String,
        axis: &'static str,
    },
}
