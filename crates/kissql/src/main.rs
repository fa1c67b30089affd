//! kissql - SQL client for the Kissmetrics query API
//!
//! # Usage
//!
//! ```bash
//! # Products the credentials may query
//! kissql databases
//!
//! # Run a query against the default product
//! kissql query "SELECT * FROM records LIMIT 10"
//! kissql query "SELECT * FROM records" --product 1234 --format csv
//!
//! # Browse the catalogs
//! kissql events
//! kissql properties --format json
//! ```

mod cmd;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kissql_adapter::connect;
use tracing::{debug, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cmd::catalog::CatalogKind;
use crate::config::{CliConfig, LogConfig, LogFormat};

/// kissql - SQL client for the Kissmetrics query API
#[derive(Parser, Debug)]
#[command(name = "kissql")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(flatten)]
    credentials: CredentialArgs,
}

/// Credentials overriding the config file
#[derive(Args, Debug)]
struct CredentialArgs {
    /// API key
    #[arg(long, env = "KISSQL_USER", global = true)]
    user: Option<String>,

    /// API secret
    #[arg(long, env = "KISSQL_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a SQL query against a product
    Query(cmd::query::QueryArgs),

    /// List products the credentials may query
    Databases(cmd::databases::DatabasesArgs),

    /// List a product's events
    Events(cmd::catalog::CatalogArgs),

    /// List a product's properties
    Properties(cmd::catalog::CatalogArgs),

    /// List tables
    Tables(cmd::metadata::ListArgs),

    /// List the columns of a table
    Columns(cmd::metadata::ColumnsArgs),

    /// List built-in functions
    Routines(cmd::metadata::ListArgs),

    /// Print the statement for browsing a table
    SelectTop(cmd::metadata::SelectTopArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?
        .with_credentials(cli.credentials.user, cli.credentials.password);
    init_logging(cli.log_level.as_deref(), &config.log)?;

    let adapter = connect(&config.server, &config.database).context("failed to connect")?;
    debug!(auth = ?adapter.context().auth(), "connected");
    if !adapter.context().is_authenticated() {
        warn!("no credentials configured, remote listings and queries will be empty");
    }

    let result = match cli.command {
        Command::Query(args) => cmd::query::run(&adapter, args).await,
        Command::Databases(args) => cmd::databases::run(&adapter, args).await,
        Command::Events(args) => cmd::catalog::run(&adapter, CatalogKind::Events, args).await,
        Command::Properties(args) => {
            cmd::catalog::run(&adapter, CatalogKind::Properties, args).await
        }
        Command::Tables(args) => cmd::metadata::tables(&adapter, args),
        Command::Columns(args) => cmd::metadata::columns(&adapter, args),
        Command::Routines(args) => cmd::metadata::routines(&adapter, args),
        Command::SelectTop(args) => cmd::metadata::select_top(&adapter, args),
    };

    adapter.disconnect();
    result
}

/// Initialize the tracing subscriber, writing to stderr
///
/// Level: CLI flag > config file. `RUST_LOG` directives are added on top.
fn init_logging(cli_level: Option<&str>, log: &LogConfig) -> Result<()> {
    let level = cli_level.unwrap_or(log.level.as_str());
    let mut filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;
    if let Ok(directives) = std::env::var(EnvFilter::DEFAULT_ENV) {
        for directive in directives.split(',').filter_map(|d| d.parse::<Directive>().ok()) {
            filter = filter.add_directive(directive);
        }
    }

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
