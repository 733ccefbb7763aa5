//! Binary entry point for the statelift CLI.
//!
//! ```bash
//! # Transform a program in place
//! statelift --entry root/cmd/tool --root root --dir ./src
//!
//! # Write the transformed tree elsewhere, tests included
//! statelift --entry root/cmd/tool --root root --dir ./src --out ./lifted --include-tests
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use statelift::{Config, FsEmitter, GoLoader};

/// Lift package-level state out of Go command-line programs.
#[derive(Parser, Debug)]
#[command(name = "statelift", version, about = "Lift package-level state out of Go programs")]
struct Cli {
    /// Effective import path of the entry package to transform.
    #[arg(long)]
    entry: String,

    /// Effective-path prefix; only packages underneath are transformed.
    #[arg(long = "root")]
    root_path: String,

    /// Directory on disk corresponding to the root path.
    #[arg(long = "dir")]
    root_dir: PathBuf,

    /// Load and transform test files as well.
    #[arg(long)]
    include_tests: bool,

    /// Write transformed packages under this directory instead of in place.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let config = Config {
        entry_path: cli.entry,
        root_path: cli.root_path,
        root_dir: cli.root_dir.clone(),
        include_tests: cli.include_tests,
    };
    let mut emitter = match cli.out {
        Some(out) => FsEmitter::with_remap(&cli.root_dir, out),
        None => FsEmitter::new(),
    };

    let cancel = CancellationToken::new();
    let mut stdout = io::stdout();
    match statelift::run(&config, &GoLoader::new(), &mut emitter, &cancel, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("statelift: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_minimal_invocation() {
            let args = [
                "statelift",
                "--entry",
                "root/cmd/tool",
                "--root",
                "root",
                "--dir",
                "/tmp/src",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.entry, "root/cmd/tool");
            assert_eq!(cli.root_path, "root");
            assert_eq!(cli.root_dir, PathBuf::from("/tmp/src"));
            assert!(!cli.include_tests);
            assert!(cli.out.is_none());
            assert!(matches!(cli.log_level, LogLevel::Warn));
        }

        #[test]
        fn parse_include_tests_and_out() {
            let args = [
                "statelift",
                "--entry",
                "root/cmd/tool",
                "--root",
                "root",
                "--dir",
                "/tmp/src",
                "--include-tests",
                "--out",
                "/tmp/lifted",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(cli.include_tests);
            assert_eq!(cli.out, Some(PathBuf::from("/tmp/lifted")));
        }

        #[test]
        fn parse_log_level() {
            let args = [
                "statelift",
                "--entry",
                "root/a",
                "--root",
                "root",
                "--dir",
                "/tmp/src",
                "--log-level",
                "debug",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(matches!(cli.log_level, LogLevel::Debug));
        }

        #[test]
        fn entry_is_required() {
            let args = ["statelift", "--root", "root", "--dir", "/tmp/src"];
            assert!(Cli::try_parse_from(args).is_err());
        }
    }
}
