#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics on bad input.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ordtree::config::{ConfigError, HarnessConfig};
use ordtree::dispatch::{self, ScriptError};
use ordtree::harness::HarnessFailure;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: ordtree clinic [FILE] | ordtree harness";

/// Subcommand selected on the command line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Run a dispatcher script from a file, or stdin when absent.
    Clinic(Option<PathBuf>),
    /// Run the generated B-tree test configured from the environment.
    Harness,
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Read { source: String, error: io::Error },
    Script(ScriptError),
    Config(ConfigError),
    Harness(HarnessFailure),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}\n{USAGE}"),
            Self::Read { source, error } => write!(f, "failed to read {source}: {error}"),
            Self::Script(e) => write!(f, "invalid script: {e}"),
            Self::Config(e) => write!(f, "failed to load configuration: {e}"),
            Self::Harness(failure) => write!(f, "{failure}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ScriptError> for CliError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HarnessFailure> for CliError {
    fn from(failure: HarnessFailure) -> Self {
        Self::Harness(failure)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ordtree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = parse_args(&args).and_then(|command| run(&command));

    match result {
        Ok(lines) => {
            let mut stdout = io::stdout().lock();
            for line in lines {
                if writeln!(stdout, "{line}").is_err() {
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(CliError::Harness(failure)) => {
            // The failure line is the harness's result, so it goes to stdout.
            println!("{failure}");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, CliError> {
    match args {
        [command, rest @ ..] if command == "clinic" => match rest {
            [] => Ok(Command::Clinic(None)),
            [path] => Ok(Command::Clinic(Some(PathBuf::from(path)))),
            _ => Err(CliError::Usage("clinic takes at most one file".to_string())),
        },
        [command] if command == "harness" => Ok(Command::Harness),
        [] => Err(CliError::Usage("missing command".to_string())),
        [command, ..] => Err(CliError::Usage(format!("unknown command '{command}'"))),
    }
}

/// Execute `command`, returning the lines to print.
fn run(command: &Command) -> Result<Vec<String>, CliError> {
    match command {
        Command::Clinic(path) => {
            let script = read_script(path.as_deref())?;
            Ok(dispatch::run_script(&script)?)
        }
        Command::Harness => {
            let config = HarnessConfig::from_env()?;
            tracing::info!(
                "Loaded configuration: t={}, n={}, seed={}",
                config.min_degree,
                config.key_count,
                config.seed
            );
            let report = config.generated_test().run()?;
            Ok(vec![report.to_string()])
        }
    }
}

fn read_script(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|error| CliError::Read {
            source: path.display().to_string(),
            error,
        }),
        None => {
            let mut script = String::new();
            io::stdin()
                .read_to_string(&mut script)
                .map_err(|error| CliError::Read {
                    source: "stdin".to_string(),
                    error,
                })?;
            Ok(script)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_clinic_with_and_without_file() {
        assert_eq!(
            parse_args(&args(&["clinic"])).expect("parses"),
            Command::Clinic(None)
        );
        assert_eq!(
            parse_args(&args(&["clinic", "in.txt"])).expect("parses"),
            Command::Clinic(Some(PathBuf::from("in.txt")))
        );
    }

    #[test]
    fn test_parse_harness() {
        assert_eq!(
            parse_args(&args(&["harness"])).expect("parses"),
            Command::Harness
        );
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert!(matches!(parse_args(&[]), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(&args(&["plant"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&args(&["clinic", "a", "b"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&args(&["harness", "extra"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_clinic_reads_script_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"7\n0 A 5\n0 B 5\n0 C 9\n3\n1 A 10\n3\n2 C\n3\n")
            .expect("Failed to write script");

        let lines = run(&Command::Clinic(Some(file.path().to_path_buf()))).expect("script runs");
        assert_eq!(lines, vec!["C", "A", "A"]);
    }

    #[test]
    fn test_clinic_missing_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("missing.txt");

        let error = run(&Command::Clinic(Some(missing))).expect_err("missing file");
        assert!(matches!(error, CliError::Read { .. }));
        assert!(error.to_string().starts_with("failed to read "));
    }

    #[test]
    fn test_clinic_bad_script() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"1\n9\n").expect("Failed to write script");

        let error = run(&Command::Clinic(Some(file.path().to_path_buf()))).expect_err("bad script");
        assert_eq!(
            error.to_string(),
            "invalid script: operation 1: unknown command '9'"
        );
    }
}
