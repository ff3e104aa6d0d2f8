use clap::Parser;

const CMD_NAME: &str = "metwrap";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Run configuration file(s); later files override earlier ones
    #[arg(short, long, value_name = "FILE", required = true, value_delimiter = ',')]
    #[arg(env = "METWRAP_CONFIG")]
    pub config: Vec<String>,

    /// Output directory (overrides `[tool] output_dir`)
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "METWRAP_OUTPUT")]
    pub output: Option<String>,

    /// Override a single config value
    #[arg(short, long = "set", value_name = "SECTION.KEY=VALUE")]
    pub set: Vec<String>,

    /// Bypass user confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print additional info (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dry run; print commands but don't write files or run anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Kill a tool invocation after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
