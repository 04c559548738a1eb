//! tsgate CLI - Trusted Types conformance checks from the command line

mod commands;
mod logging;
mod output;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use commands::Commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tsgate",
    author,
    version,
    about = "Trusted Types conformance checker for TypeScript",
    long_about = "tsgate finds uses of DOM and JavaScript APIs that turn strings into\n\
                  HTML, script or script URLs, and asks for Trusted Types values instead.\n\n\
                  Configure it with tsgate.toml and an exemption list referenced from tsconfig.json."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum, default_value = "error", global = true)]
    pub log_level: LogLevel,

    /// Write logs to the specified file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli);

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Explain(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_check_command() {
        let cli = Cli::try_parse_from(["tsgate", "check", "./src"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.path.unwrap().to_str().unwrap(), "./src");
                assert!(!args.audit);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_parses_check_without_path() {
        let cli = Cli::try_parse_from(["tsgate", "check"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert!(args.path.is_none()),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_parses_check_with_project_and_audit() {
        let cli = Cli::try_parse_from([
            "tsgate",
            "check",
            "--project",
            "web/tsconfig.json",
            "--audit",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.project.unwrap().to_str().unwrap(), "web/tsconfig.json");
                assert!(args.audit);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_parses_check_with_format() {
        let cli = Cli::try_parse_from(["tsgate", "check", "./src", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.format, "json");
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_parses_explain_command() {
        let cli = Cli::try_parse_from(["tsgate", "explain", "ban-eval-calls"]).unwrap();
        match cli.command {
            Commands::Explain(args) => {
                assert_eq!(args.rule_id, "ban-eval-calls");
            }
            _ => panic!("Expected Explain command"),
        }
    }

    #[test]
    fn logging_flags_are_global() {
        let cli = Cli::try_parse_from([
            "tsgate",
            "check",
            "--log-level",
            "debug",
            "--log-json",
            "--log-file",
            "tsgate.log",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.log_json);
        assert_eq!(cli.log_file.unwrap().to_str().unwrap(), "tsgate.log");
    }

    #[test]
    fn default_log_level_is_error() {
        let cli = Cli::try_parse_from(["tsgate", "explain", "TT001"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Error);
        assert!(cli.log_file.is_none());
        assert!(!cli.log_json);
    }

    #[test]
    fn log_levels_order_like_tracing() {
        assert!(LogLevel::Error.as_tracing_level() < LogLevel::Warn.as_tracing_level());
        assert!(LogLevel::Info.as_tracing_level() < LogLevel::Trace.as_tracing_level());
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some("0.1.0"));
    }

    #[test]
    fn check_help_shows_options() {
        let mut cmd = Cli::command();
        let check_cmd = cmd
            .get_subcommands_mut()
            .find(|c| c.get_name() == "check")
            .unwrap();
        let help = check_cmd.render_help().to_string();
        assert!(help.contains("PATH"));
        assert!(help.contains("--project"));
        assert!(help.contains("--audit"));
        assert!(help.contains("--min-confidence"));
    }
}
