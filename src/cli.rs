//! Command-line arguments for the `leaderboard` binary
//!
//! ```text
//! leaderboard [--window 24h|7d] [--export] [--export-dir DIR] [--rows N] [--interactive]
//! ```

use crate::pipeline::window::WindowSize;
use std::path::PathBuf;

/// Rows printed to the terminal when `--rows` is not given
pub const DEFAULT_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// `None` means "use the configured default"
    pub window: Option<WindowSize>,
    pub export: bool,
    pub export_dir: Option<PathBuf>,
    pub rows: usize,
    pub interactive: bool,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            window: None,
            export: false,
            export_dir: None,
            rows: DEFAULT_ROWS,
            interactive: false,
            help: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    MissingValue(String),
    InvalidValue { flag: String, value: String },
    UnknownArgument(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::MissingValue(flag) => write!(f, "{} requires a value", flag),
            CliError::InvalidValue { flag, value } => {
                write!(f, "Invalid value '{}' for {}", value, flag)
            }
            CliError::UnknownArgument(arg) => write!(f, "Unknown argument: {}", arg),
        }
    }
}

impl std::error::Error for CliError {}

pub const USAGE: &str = "\
Usage: leaderboard [OPTIONS]

Options:
  --window <24h|7d>   Time window (default: CASTRANK_DEFAULT_WINDOW or 24h)
  --export            Write the leaderboard to a CSV file
  --export-dir <DIR>  Directory for the CSV file (default: CASTRANK_EXPORT_DIR or .)
  --rows <N>          Rows to print (default: 20, 0 = all)
  --interactive       Read commands (24h, 7d, export, quit) from stdin
  -h, --help          Show this message";

impl CliArgs {
    /// Parse arguments, excluding the program name
    pub fn parse_from<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--window" | "-w" => {
                    let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    parsed.window = Some(WindowSize::from_str(&value).ok_or(CliError::InvalidValue {
                        flag: arg.clone(),
                        value,
                    })?);
                }
                "--export" => parsed.export = true,
                "--export-dir" => {
                    let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    parsed.export_dir = Some(PathBuf::from(value));
                    parsed.export = true;
                }
                "--rows" | "-n" => {
                    let value = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    parsed.rows = value.parse().map_err(|_| CliError::InvalidValue {
                        flag: arg.clone(),
                        value: value.clone(),
                    })?;
                }
                "--interactive" | "-i" => parsed.interactive = true,
                "--help" | "-h" => parsed.help = true,
                _ => return Err(CliError::UnknownArgument(arg)),
            }
        }

        Ok(parsed)
    }

    pub fn from_env() -> Result<Self, CliError> {
        Self::parse_from(std::env::args().skip(1))
    }
}

/// A line typed in interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Window(WindowSize),
    Export,
    Refresh,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(window) = WindowSize::from_str(line) {
            return Some(Command::Window(window));
        }
        match line.to_lowercase().as_str() {
            "export" | "e" => Some(Command::Export),
            "refresh" | "r" => Some(Command::Refresh),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}
