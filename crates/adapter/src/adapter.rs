//! Adapter surface exposed to the SQL client host
//!
//! [`Adapter`] maps each host operation onto the query API. Relational
//! concepts the service has no equivalent for (views, triggers, indexes,
//! schemas, DDL scripts) get fixed answers; the service's event stream is
//! exposed as a single table, `records`.
//!
//! # Example
//!
//! ```ignore
//! use kissql_adapter::{DatabaseConfig, ServerConfig, connect};
//!
//! let server = ServerConfig::with_credentials("api-key", "api-secret");
//! let adapter = connect(&server, &DatabaseConfig::product("1234"))?;
//!
//! let events = adapter.list_events(None).await?;
//! let properties = adapter.list_properties(None).await?;
//! let results = adapter
//!     .execute_query("SELECT * FROM records LIMIT 10", None, &events, &properties)
//!     .await?;
//! ```

use futures::future::join_all;
use serde::Serialize;
use tracing::{Instrument, Span, debug, info, info_span};

use crate::catalog::Catalog;
use crate::classify::identify_commands;
use crate::client::RemoteClient;
use crate::config::{DatabaseConfig, PollConfig, ServerConfig};
use crate::context::ConnectionContext;
use crate::error::{AdapterError, Result};
use crate::executor::QueryExecutor;
use crate::normalize::normalize;
use crate::result::{ColumnInfo, ColumnType, ProductInfo, RoutineInfo, TableInfo, TabularResult};

/// The one table the adapter exposes
pub const RECORDS_TABLE: &str = "records";

/// Static description of this client for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    /// Generic host features this client cannot support
    pub disabled_features: &'static [&'static str],
}

/// Descriptor registered with the host
pub const CLIENT: ClientDescriptor = ClientDescriptor {
    key: "kissmetrics",
    name: "Kissmetrics",
    disabled_features: &[
        "server:ssl",
        "server:socketPath",
        "server:schema",
        "server:host",
        "server:port",
        "server:domain",
        "scriptCreateTable",
        "cancelQuery",
        "server:ssh",
    ],
};

const ROUTINES: [&str; 6] = [
    "is_alias()",
    "is_set()",
    "is_event(nameOrID)",
    "property_value(nameOrID)",
    "numeric_property_value(nameOrID)",
    "has_property(nameOrID)",
];

const RECORDS_COLUMNS: [(&str, ColumnType); 16] = [
    ("timestamp_ms", ColumnType::Long),
    ("person", ColumnType::Int),
    ("year", ColumnType::Int),
    ("month", ColumnType::Int),
    ("orig_person", ColumnType::Int),
    ("dest_person", ColumnType::Int),
    ("event", ColumnType::Int),
    ("person_id", ColumnType::String),
    ("email", ColumnType::String),
    ("remote_ip", ColumnType::String),
    ("channel", ColumnType::String),
    ("channel_source", ColumnType::String),
    ("channel_with_source", ColumnType::String),
    ("previous_page", ColumnType::String),
    ("referrer", ColumnType::String),
    ("new_vs_returning", ColumnType::String),
];

/// Open an adapter for the given host configuration
///
/// Missing credentials are not an error: the adapter starts in anonymous
/// mode and every remote operation returns an empty result.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the HTTP client cannot
/// be built.
pub fn connect(server: &ServerConfig, database: &DatabaseConfig) -> Result<Adapter> {
    server.validate()?;
    let context = ConnectionContext::new(server, database);
    let client = RemoteClient::from_config(server)?;
    Ok(Adapter::new(context, client, server.poll.clone()))
}

/// One connection to the query API
#[derive(Debug, Clone)]
pub struct Adapter {
    context: ConnectionContext,
    client: RemoteClient,
    executor: QueryExecutor,
    span: Span,
}

impl Adapter {
    /// Assemble an adapter from its parts
    pub fn new(context: ConnectionContext, client: RemoteClient, poll: PollConfig) -> Self {
        let span = info_span!(
            "kissql",
            client = CLIENT.key,
            product = context.product().unwrap_or_default()
        );
        Self {
            executor: QueryExecutor::new(client.clone(), poll),
            context,
            client,
            span,
        }
    }

    /// Log under the given span instead of the adapter's own
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn descriptor(&self) -> &'static ClientDescriptor {
        &CLIENT
    }

    /// Quote an identifier for use in a statement
    pub fn wrap_identifier(&self, name: &str) -> String {
        wrap_identifier(name)
    }

    /// Close the connection. Nothing is held open, so this only logs.
    pub fn disconnect(self) {
        let _guard = self.span.enter();
        debug!("disconnected");
    }

    pub fn list_tables(&self) -> Vec<TableInfo> {
        vec![TableInfo {
            name: RECORDS_TABLE.to_string(),
        }]
    }

    pub fn list_views(&self) -> Vec<TableInfo> {
        Vec::new()
    }

    /// Built-in functions usable in queries
    pub fn list_routines(&self) -> Vec<RoutineInfo> {
        ROUTINES
            .iter()
            .map(|name| RoutineInfo {
                routine_name: name.to_string(),
                routine_type: "FUNCTION".to_string(),
            })
            .collect()
    }

    /// Columns of the records table. Every table name gets the same layout.
    pub fn list_table_columns(&self, _table: &str) -> Vec<ColumnInfo> {
        RECORDS_COLUMNS
            .iter()
            .map(|(name, data_type)| ColumnInfo::new(*name, *data_type))
            .collect()
    }

    pub fn list_table_triggers(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn list_table_indexes(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn list_schemas(&self) -> Vec<String> {
        Vec::new()
    }

    pub fn get_table_references(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn get_table_keys(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn get_table_create_script(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn get_view_create_script(&self, _view: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn get_routine_create_script(&self, _routine: &str) -> Vec<String> {
        Vec::new()
    }

    /// `SELECT *` statement for browsing a table
    pub fn get_query_select_top(&self, table: &str, limit: u64) -> String {
        format!("SELECT * FROM {} LIMIT {}", wrap_identifier(table), limit)
    }

    /// Tables cannot be truncated through the query API
    pub fn truncate_all_tables(&self) -> Result<()> {
        Err(AdapterError::Unsupported("truncate_all_tables"))
    }

    /// Run a statement without the job protocol
    ///
    /// The query API only executes statements as jobs; use
    /// [`execute_query`](Self::execute_query).
    pub fn query_sync(&self, _sql: &str) -> Result<TabularResult> {
        Err(AdapterError::Unsupported("query"))
    }

    /// Same as [`execute_query`](Self::execute_query)
    pub async fn query(
        &self,
        sql: &str,
        product_id: Option<&str>,
        events: &Catalog,
        properties: &Catalog,
    ) -> Result<Vec<TabularResult>> {
        self.execute_query(sql, product_id, events, properties).await
    }

    /// Execute `sql` as a job and return its normalized result
    ///
    /// `product_id` overrides the connection's default product. Event and
    /// property names are resolved against the given catalogs. Returns an
    /// empty list without sending anything when the connection has no
    /// credentials.
    pub async fn execute_query(
        &self,
        sql: &str,
        product_id: Option<&str>,
        events: &Catalog,
        properties: &Catalog,
    ) -> Result<Vec<TabularResult>> {
        let command = identify_commands(sql).into_iter().next();
        let Some(token) = self.context.token() else {
            return Ok(Vec::new());
        };
        let product = self.resolve_product(product_id)?;

        async move {
            let payload = self.executor.execute(Some(token), product, sql).await?;
            let result = normalize(payload, command, events, properties);
            info!(
                product = %product,
                command = result.command.as_deref().unwrap_or("-"),
                rows = result.rows.len(),
                "query finished"
            );
            Ok(vec![result])
        }
        .instrument(self.span.clone())
        .await
    }

    /// Products the caller may query
    ///
    /// Every listed product is probed concurrently with an empty statement;
    /// products answering 403 are not entitled and are left out.
    pub async fn list_databases(&self) -> Result<Vec<ProductInfo>> {
        let Some(token) = self.context.token() else {
            return Ok(Vec::new());
        };

        async move {
            let listing = self.client.get_list("/products", token).await?;
            let products = listing
                .into_iter()
                .map(|entry| {
                    serde_json::from_value::<ProductInfo>(entry).map_err(|e| {
                        AdapterError::MalformedResponse {
                            endpoint: "/products".to_string(),
                            detail: e.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let probes = join_all(
                products
                    .iter()
                    .map(|product| async move { self.client.probe(&product.id_string(), token).await }),
            )
            .await;

            let mut entitled = Vec::with_capacity(products.len());
            for (product, status) in products.into_iter().zip(probes) {
                if status? == 403 {
                    debug!(product = %product.id_string(), "product not entitled to queries");
                } else {
                    entitled.push(product);
                }
            }
            debug!(count = entitled.len(), "listed products");
            Ok(entitled)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Visible events of a product, with display names
    pub async fn list_events(&self, product_id: Option<&str>) -> Result<Catalog> {
        self.load_catalog("events", product_id).await
    }

    /// Visible properties of a product, with display names
    pub async fn list_properties(&self, product_id: Option<&str>) -> Result<Catalog> {
        self.load_catalog("properties", product_id).await
    }

    async fn load_catalog(&self, kind: &str, product_id: Option<&str>) -> Result<Catalog> {
        let Some(token) = self.context.token() else {
            return Ok(Catalog::default());
        };
        let product = self.resolve_product(product_id)?;

        async move {
            let path = format!(
                "/products/{}/{}?limit={}",
                product,
                kind,
                self.client.page_size()
            );
            let catalog = Catalog::from_listing(self.client.get_list(&path, token).await?);
            debug!(product = %product, kind, entries = catalog.len(), "loaded catalog");
            Ok(catalog)
        }
        .instrument(self.span.clone())
        .await
    }

    fn resolve_product<'a>(&'a self, product_id: Option<&'a str>) -> Result<&'a str> {
        product_id
            .filter(|p| !p.is_empty())
            .or(self.context.product())
            .ok_or_else(|| AdapterError::Config("no product selected".to_string()))
    }
}

/// Quote an identifier
///
/// Wraps `name` in double quotes, doubling embedded quotes. A single-digit
/// array index such as `[0]` stays outside the quotes, along with anything
/// after it. `*` is returned unchanged.
pub fn wrap_identifier(name: &str) -> String {
    if name == "*" {
        return name.to_string();
    }
    match find_array_index(name) {
        Some(at) => format!("{}{}", wrap_identifier(&name[..at]), &name[at..]),
        None => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Byte offset of the first `[<digit>]` in `name`
fn find_array_index(name: &str) -> Option<usize> {
    name.as_bytes()
        .windows(3)
        .position(|w| w[0] == b'[' && w[1].is_ascii_digit() && w[2] == b']')
}
