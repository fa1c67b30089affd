//! Query command - Execute SQL against a product's event records
//!
//! # Usage
//!
//! ```bash
//! kissql query "SELECT * FROM records LIMIT 10"
//! kissql query "SELECT person, event FROM records WHERE is_event('Signed Up')" --format json
//! kissql query "SELECT * FROM records" --product 1234 --format csv
//! ```
//!
//! The product's event and property catalogs are loaded first so event
//! indices and custom properties show up under their names.

use anyhow::{Context, Result};
use clap::Args;
use kissql_adapter::{Adapter, TabularResult};

use super::output::{OutputFormat, print_rows};

/// Query command arguments
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL query to execute
    #[arg(value_name = "SQL")]
    sql: String,

    /// Product to query (defaults to [database] in the config)
    #[arg(short, long)]
    product: Option<String>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    format: String,
}

/// Run the query command
pub async fn run(adapter: &Adapter, args: QueryArgs) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid format: {}", e))?;
    let product = args.product.as_deref();

    let events = adapter
        .list_events(product)
        .await
        .context("failed to load event catalog")?;
    let properties = adapter
        .list_properties(product)
        .await
        .context("failed to load property catalog")?;

    let results = adapter
        .execute_query(&args.sql, product, &events, &properties)
        .await
        .context("query execution failed")?;

    if results.is_empty() {
        eprintln!("no results (not authenticated)");
        return Ok(());
    }

    for result in &results {
        print_rows(&result.field_names(), &result.rows, format)?;
        eprintln!("\n{}", summary(result));
    }

    Ok(())
}

/// `N row(s) [COMMAND]`
fn summary(result: &TabularResult) -> String {
    let count = result.row_count.or(result.affected_rows).unwrap_or(result.rows.len());
    format!(
        "{} row(s) [{}]",
        count,
        result.command.as_deref().unwrap_or("UNKNOWN")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_for_select() {
        let result = TabularResult {
            command: Some("SELECT".to_string()),
            row_count: Some(12),
            ..Default::default()
        };
        assert_eq!(summary(&result), "12 row(s) [SELECT]");
    }

    #[test]
    fn test_summary_for_write_and_unknown() {
        let write = TabularResult {
            command: Some("DELETE".to_string()),
            affected_rows: Some(3),
            ..Default::default()
        };
        assert_eq!(summary(&write), "3 row(s) [DELETE]");
        assert_eq!(summary(&TabularResult::empty()), "0 row(s) [UNKNOWN]");
    }
}
