//! Static metadata commands
//!
//! These answer from the adapter's fixed description of the query API and
//! never touch the network.

use anyhow::Result;
use clap::Args;
use kissql_adapter::{Adapter, RECORDS_TABLE};

use super::output::{OutputFormat, print_rows, to_rows};

/// Output format argument shared by the listing commands
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    format: String,
}

impl ListArgs {
    fn format(&self) -> Result<OutputFormat> {
        self.format
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid format: {}", e))
    }
}

/// Columns command arguments
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// Table name
    #[arg(default_value = RECORDS_TABLE)]
    table: String,

    #[command(flatten)]
    list: ListArgs,
}

/// Select-top command arguments
#[derive(Args, Debug)]
pub struct SelectTopArgs {
    /// Table name
    #[arg(value_name = "TABLE")]
    table: String,

    /// Row limit
    #[arg(short, long, default_value_t = 100)]
    limit: u64,
}

pub fn tables(adapter: &Adapter, args: ListArgs) -> Result<()> {
    print_rows(&["name"], &to_rows(&adapter.list_tables())?, args.format()?)
}

pub fn columns(adapter: &Adapter, args: ColumnsArgs) -> Result<()> {
    print_rows(
        &["columnName", "dataType"],
        &to_rows(&adapter.list_table_columns(&args.table))?,
        args.list.format()?,
    )
}

pub fn routines(adapter: &Adapter, args: ListArgs) -> Result<()> {
    print_rows(
        &["routineName", "routineType"],
        &to_rows(&adapter.list_routines())?,
        args.format()?,
    )
}

/// Print the statement used to browse a table
pub fn select_top(adapter: &Adapter, args: SelectTopArgs) -> Result<()> {
    println!("{}", adapter.get_query_select_top(&args.table, args.limit));
    Ok(())
}
