//! Databases command - List the products the credentials may query

use anyhow::{Context, Result};
use clap::Args;
use kissql_adapter::Adapter;

use super::output::{OutputFormat, print_rows, to_rows};

/// Databases command arguments
#[derive(Args, Debug)]
pub struct DatabasesArgs {
    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    format: String,
}

/// Run the databases command
pub async fn run(adapter: &Adapter, args: DatabasesArgs) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid format: {}", e))?;

    let products = adapter
        .list_databases()
        .await
        .context("failed to list products")?;

    print_rows(&["id", "name"], &to_rows(&products)?, format)?;
    eprintln!("\n{} product(s)", products.len());
    Ok(())
}
