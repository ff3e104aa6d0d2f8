/// Shared parser plumbing and error type
mod parse;
pub use parse::Error;

/// Grammar for filename templates like `{init?fmt=%Y%m%d}/file_{lead?fmt=%3H}.nc`
mod template;
pub use template::parse_template;

/// Grammar for run-config files (`[section]` headers and `key = value` lines)
mod conf;
pub use conf::parse_conf;

pub mod ast;
