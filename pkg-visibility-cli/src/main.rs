//! Command-line front end for package visibility checking
//!
//! Exit codes: 0 when every reference is legal, 2 when at least one is denied, 1 on bad input.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pkg_visibility_core::Provenance;

mod commands;

#[derive(Parser)]
#[command(name = "pkg-visibility")]
#[command(version)]
#[command(about = "Check references against package visibility and test-scoping rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "text",
        env = "PKG_VISIBILITY_FORMAT"
    )]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every reference listed in a manifest
    Check {
        /// Manifest file ('-' reads stdin)
        manifest: PathBuf,
    },

    /// Decide a single reference
    Query {
        /// Manifest file ('-' reads stdin)
        manifest: PathBuf,

        /// Package the reference is made from
        #[arg(long)]
        from: String,

        /// Compilation context of the reference: production, internal or external
        #[arg(long, default_value = "production")]
        provenance: Provenance,

        /// Target, e.g. 'foo:Bad.PublicMethod'
        selector: String,
    },

    /// List unexported types reachable through exported declarations
    Leaks {
        /// Manifest file ('-' reads stdin)
        manifest: PathBuf,
    },

    /// Run the built-in demonstration matrix
    Demo,
}

/// Outcome of a command that ran to completion
pub(crate) enum Outcome {
    Clean,
    Denied,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { manifest } => commands::check(&manifest, cli.format),
        Commands::Query {
            manifest,
            from,
            provenance,
            selector,
        } => commands::query(&manifest, &from, provenance, &selector, cli.format),
        Commands::Leaks { manifest } => commands::leaks(&manifest, cli.format),
        Commands::Demo => commands::demo(cli.format),
    };

    match result {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Denied) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
