#![forbid(unsafe_code)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod generate;

#[derive(Parser, Debug)]
#[command(
    name = "apigen",
    version,
    about = "Generate a Dart client, a Go server scaffold and a TypeScript client from one OpenAPI document"
)]
struct Cli {
    /// Log level ("info", "debug", ...) or a full filter such as "apigen_core=debug"
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate code for one or all targets
    Generate(generate::GenerateArgs),
}

fn main() {
    std::process::exit(run_cli(std::env::args().collect()));
}

fn run_cli(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => {
            init_tracing(cli.log_level.as_deref());
            match cli.command {
                Some(Commands::Generate(args)) => generate::run(&args),
                None => {
                    let mut cmd = Cli::command();
                    let _ = cmd.print_help();
                    println!();
                    0
                }
            }
        }
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Filter precedence: `--log-level`, then `RUST_LOG`, then info for both
/// crates.
fn filter_spec(flag: Option<&str>) -> String {
    let scoped = |level: &str| format!("apigen={level},apigen_core={level}");
    match flag {
        Some(level) if is_plain_level(level) => scoped(level),
        Some(spec) => spec.to_string(),
        None => match std::env::var("RUST_LOG") {
            Ok(spec) if !spec.is_empty() => spec,
            _ => scoped("info"),
        },
    }
}

fn init_tracing(flag: Option<&str>) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter_spec(flag)));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_level_is_scoped_to_both_crates() {
        assert_eq!(filter_spec(Some("debug")), "apigen=debug,apigen_core=debug");
        assert_eq!(filter_spec(Some("apigen_core=trace")), "apigen_core=trace");
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "apigen", "generate", "--input", "api.yaml", "--target", "server", "--out", "gen",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Generate(_))));
        assert!(Cli::try_parse_from(["apigen", "generate", "--input", "a", "--target", "desktop", "--out", "o"]).is_err());
    }
}
