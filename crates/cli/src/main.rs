//! photosync - Deduplicating photo import into S3-compatible storage
//!
//! Storage settings come from `config.toml` and the `PHOTO_*` / `S3_*`
//! environment variables.

mod commands;
mod exit_code;
mod library;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use crate::commands::import::ImportArgs;
use crate::commands::keys::KeysArgs;
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Sync photo libraries into S3-compatible object storage
#[derive(Parser, Debug)]
#[command(name = "photosync", version, about)]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload new photos from a local library directory
    Import(ImportArgs),

    /// List keys already present under the destination prefix
    Keys(KeysArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Commands::Import(args) => commands::import::execute(args, output_config).await,
        Commands::Keys(args) => commands::keys::execute(args, output_config).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "photosync",
                &mut std::io::stdout(),
            );
            ExitCode::Success
        }
    };

    std::process::exit(code.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::parse_from(["photosync", "--json", "import", "/exports", "--limit", "5"]);
        assert!(cli.json);
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.library, std::path::PathBuf::from("/exports"));
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
