//!
//! Everything that turns a runtime's resolved inputs into an [`Invocation`]:
//! the output path, the field list, the environment overlay read by the
//! tool's own config file, and the argument vector. Nothing here runs
//! a subprocess or touches the environment of the current process.
//!

/// The fixed part of a tool invocation
mod tool_spec;
pub use tool_spec::ToolSpec;

/// `regrid = {...}` dictionary for the tool config
mod regrid;
pub use regrid::RegridSpec;

/// Field list -> `DATA_FIELD`
mod fields;
pub use fields::{data_field, FieldSpec};

/// Environment overlay
mod env_vars;
pub use env_vars::{build_env, ToolOptions};

/// argv assembly
mod command_builder;
pub use command_builder::{build_command, CommandOptions, InputArg, Invocation};

/// Where a runtime writes its output
mod output_path;
pub use output_path::{resolve_output, OutputPath};
