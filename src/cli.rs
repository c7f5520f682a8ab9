use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level command line for the `priolog` binary.
#[derive(Parser, Debug)]
#[command(name = "priolog", version, about = "Priority-threshold logging with fan-out")]
pub struct Cli {
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(flatten)]
    pub overrides: LoggerArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override the configured primary logger.
#[derive(Args, Debug, Default)]
pub struct LoggerArgs {
    /// Log file name; an empty string discards output.
    #[arg(long = "file", global = true)]
    pub file: Option<String>,
    /// Directory the log file name is resolved against.
    #[arg(long = "dir", global = true)]
    pub dir: Option<String>,
    /// Highest priority that still gets written.
    #[arg(long = "threshold", global = true, allow_negative_numbers = true)]
    pub threshold: Option<i64>,
    /// Fixed prefix used instead of the wall-clock timestamp.
    #[arg(long = "sim-time", global = true)]
    pub sim_time: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log one message. Priority 0 stops the program after logging.
    Log(LogArgs),
    /// Log every `<priority> <message>` line of a file, skipping comments.
    Replay {
        path: PathBuf,
        #[arg(long = "tee")]
        tee: Vec<String>,
    },
    /// Resolve a file name (against `--dir`) the way the logger does,
    /// creating it if missing.
    Path { name: String },
    /// Calendar conversions.
    Date {
        #[command(subcommand)]
        command: DateCommand,
    },
    /// Configuration display and editing.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Args, Debug)]
pub struct LogArgs {
    pub priority: u32,
    /// Message words; put `--` first when one starts with a hyphen.
    #[arg(required = true)]
    pub message: Vec<String>,
    /// Also forward to this file (repeatable).
    #[arg(long = "tee")]
    pub tee: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum DateCommand {
    /// Print the `YYYY-MM-DD` date for a day ordinal (0001-01-01 is day 1).
    FromOrdinal {
        #[arg(allow_negative_numbers = true)]
        ordinal: i32,
    },
    /// Print the day ordinal for a `YYYY-MM-DD` date.
    ToOrdinal { date: String },
    /// Print today's ordinal and date.
    Today,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Path,
    Init {
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
    SetThreshold {
        #[arg(id = "set_threshold_value", value_name = "THRESHOLD")]
        threshold: u32,
    },
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
