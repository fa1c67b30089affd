//! Events and properties commands - List a product's catalogs
//!
//! ```bash
//! kissql events
//! kissql properties --product 1234 --format csv
//! ```

use anyhow::{Context, Result};
use clap::Args;
use kissql_adapter::{Adapter, Catalog};

use super::output::{OutputFormat, print_rows, to_rows};

const COLUMNS: [&str; 3] = ["index", "name", "ogName"];

/// Catalog listing arguments
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Product to list (defaults to [database] in the config)
    #[arg(short, long)]
    product: Option<String>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    format: String,
}

/// Which catalog to list
#[derive(Debug, Clone, Copy)]
pub enum CatalogKind {
    Events,
    Properties,
}

impl CatalogKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Properties => "properties",
        }
    }
}

/// Run the events or properties command
pub async fn run(adapter: &Adapter, kind: CatalogKind, args: CatalogArgs) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid format: {}", e))?;
    let product = args.product.as_deref();

    let catalog: Catalog = match kind {
        CatalogKind::Events => adapter.list_events(product).await,
        CatalogKind::Properties => adapter.list_properties(product).await,
    }
    .with_context(|| format!("failed to list {}", kind.as_str()))?;

    print_rows(&COLUMNS, &to_rows(catalog.entries())?, format)?;
    eprintln!("\n{} entries", catalog.len());
    Ok(())
}
