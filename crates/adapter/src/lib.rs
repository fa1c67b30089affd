//! Kissql Adapter - SQL client adapter for the Kissmetrics query API
//!
//! Lets a generic SQL client host browse and query Kissmetrics products as
//! if they were relational databases:
//! - **Products** are listed as databases (only those the caller may query)
//! - **Events** form a single table, `records`, with a fixed column layout
//! - **Queries** run as remote jobs that are polled to completion
//!
//! Raw job rows have no fixed schema. Custom properties and event indices
//! are resolved against per-product catalogs and the rows are reshaped into
//! a [`TabularResult`].
//!
//! # Usage
//!
//! ```ignore
//! use kissql_adapter::{DatabaseConfig, ServerConfig, connect};
//!
//! let server: ServerConfig = r#"
//!     user = "api-key"
//!     password = "api-secret"
//! "#.parse()?;
//! let adapter = connect(&server, &DatabaseConfig::product("1234"))?;
//!
//! let events = adapter.list_events(None).await?;
//! let properties = adapter.list_properties(None).await?;
//! let results = adapter
//!     .execute_query("SELECT * FROM records LIMIT 10", None, &events, &properties)
//!     .await?;
//! println!("Rows: {:?}", results[0].row_count);
//! ```

pub mod adapter;
pub mod catalog;
pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod resilience;
pub mod result;
pub mod test_utils;

// Re-exports
pub use adapter::{Adapter, CLIENT, ClientDescriptor, RECORDS_TABLE, connect, wrap_identifier};
pub use catalog::{Catalog, CatalogEntry, EventCatalogEntry, PropertyCatalogEntry};
pub use classify::{StatementKind, identify_commands};
pub use client::{HttpTransport, RemoteClient, Transport};
pub use config::{DatabaseConfig, PollConfig, ServerConfig};
pub use context::{AuthState, ConnectionContext};
pub use credentials::{ApiToken, encode_token};
pub use error::{AdapterError, Result};
pub use executor::{JobOutcome, JobState, QueryExecutor};
pub use result::{ColumnInfo, ColumnType, Field, ProductInfo, RoutineInfo, Row, TableInfo, TabularResult};
