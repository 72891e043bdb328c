//! Print a single line of a (possibly huge) text file. The first call indexes the file, later
//! calls seek straight to the requested line.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use indexed_lines::LineExtractor;
use tracing::Level;

#[derive(Parser)]
#[command(name = "indexed-lines", version, about)]
struct Cli {
    /// Text file to read from
    path: PathBuf,

    /// 0-based number of the line to print
    #[arg(allow_negative_numbers = true, required_unless_present = "count")]
    line: Option<i64>,

    /// Location of the index. Defaults to `<PATH>.idx`
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Build a fresh index even if one exists already
    #[arg(long)]
    rebuild: bool,

    /// Print the amount of lines instead of a line
    #[arg(short, long)]
    count: bool,

    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Exit status if the file has no such line
const EXIT_NO_SUCH_LINE: u8 = 1;
/// Exit status for io, decoding and index errors
const EXIT_ERROR: u8 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Line(String),
    Count(u64),
    NoSuchLine,
}

impl Outcome {
    fn exit_status(&self) -> u8 {
        match self {
            Outcome::Line(_) | Outcome::Count(_) => 0,
            Outcome::NoSuchLine => EXIT_NO_SUCH_LINE,
        }
    }
}

/// Maps the line number given on the command line to a line of the file. Negative numbers never
/// match a line.
fn requested_line(line: i64) -> Option<usize> {
    usize::try_from(line).ok()
}

fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let mut extractor = LineExtractor::new(&cli.path);
    if let Some(index) = &cli.index {
        extractor = extractor.with_index_path(index);
    }

    if cli.rebuild {
        extractor
            .rebuild_index()
            .with_context(|| format!("failed to index {}", cli.path.display()))?;
    }

    if cli.count {
        let lines = extractor
            .total_lines()
            .with_context(|| format!("failed to count lines of {}", cli.path.display()))?;
        return Ok(Outcome::Count(lines));
    }

    let line = match cli.line.and_then(requested_line) {
        Some(line) => line,
        None => return Ok(Outcome::NoSuchLine),
    };

    let text = extractor
        .read_line(line)
        .with_context(|| format!("failed to read line {} of {}", line, cli.path.display()))?;

    Ok(text.map_or(Outcome::NoSuchLine, Outcome::Line))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr, stdout only carries the line
    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(outcome) => {
            match &outcome {
                Outcome::Line(text) => println!("{}", text),
                Outcome::Count(lines) => println!("{}", lines),
                Outcome::NoSuchLine => eprintln!("ERROR: No such line"),
            }
            ExitCode::from(outcome.exit_status())
        }
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("indexed-lines").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_requested_line() {
        assert_eq!(requested_line(-1), None);
        assert_eq!(requested_line(i64::MIN), None);
        assert_eq!(requested_line(0), Some(0));
        assert_eq!(requested_line(42), Some(42));
    }

    #[test]
    fn test_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.txt");
        fs::write(&path, "abc\ndef\r\nghi").unwrap();
        let path = path.to_str().unwrap();

        assert_eq!(run(&cli(&[path, "2"])).unwrap(), Outcome::Line("ghi".to_string()));
        assert_eq!(run(&cli(&[path, "0"])).unwrap(), Outcome::Line("abc".to_string()));
        assert_eq!(run(&cli(&[path, "3"])).unwrap(), Outcome::NoSuchLine);
        assert_eq!(run(&cli(&[path, "-1"])).unwrap(), Outcome::NoSuchLine);
        assert_eq!(
            run(&cli(&[path, &i64::MAX.to_string()])).unwrap(),
            Outcome::NoSuchLine
        );
        assert_eq!(run(&cli(&[path, "--count"])).unwrap(), Outcome::Count(3));
    }

    #[test]
    fn test_run_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let path = path.to_str().unwrap();

        assert!(run(&cli(&[path, "0"])).is_err());
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(Outcome::Line(String::new()).exit_status(), 0);
        assert_eq!(Outcome::Count(0).exit_status(), 0);
        assert_eq!(Outcome::NoSuchLine.exit_status(), EXIT_NO_SUCH_LINE);
        assert_ne!(EXIT_NO_SUCH_LINE, EXIT_ERROR);
    }
}
