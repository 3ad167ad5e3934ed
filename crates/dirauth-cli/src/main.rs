//! dirauth - directory authentication from the command line
//!
//! Loads the provider configuration, runs one authentication and prints the
//! resulting group flags.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use commands::{authenticate::AuthenticateArgs, CommandContext};
use dirauth_core::DirAuthConfig;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(author = "Dirauth Team")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Authenticate against LDAP and Active Directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRAUTH_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIRAUTH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Suppress diagnostics on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a username/password pair or a token id
    Authenticate(AuthenticateArgs),

    /// Validate the configuration without contacting the directory
    CheckConfig,

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::from(1)),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            Ok(ExitCode::from(2))
        }
    }
}

/// Returns whether the command succeeded; `false` only for a rejected credential
async fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = load_config(cli)?;

    init_logging(&config);

    let ctx = CommandContext {
        config,
        output_format: cli.output,
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Authenticate(args) => commands::authenticate::execute(&ctx, args).await,
        Commands::CheckConfig => commands::check_config::execute(&ctx).map(|_| true),
        Commands::Version => {
            println!("dirauth {}", dirauth_core::VERSION);
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DirAuthConfig> {
    let mut config = match &cli.config {
        Some(config_path) => {
            let mut config = DirAuthConfig::from_file(config_path)
                .with_context(|| format!("Failed to load {}", config_path))?;
            config.apply_env(std::env::vars());
            config
        }
        None => DirAuthConfig::from_env(),
    };

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}

/// Logs go to stderr so stdout carries only the result. A subscriber that is
/// already installed is kept.
fn init_logging(config: &DirAuthConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
