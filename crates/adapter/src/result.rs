//! Result types returned to the host
//!
//! Field names serialize in camelCase, the shape SQL client hosts expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: column name to value, in column order
pub type Row = Map<String, Value>;

/// Result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Tabular result of one query
///
/// `row_count` is set for read statements only, `affected_rows` for
/// everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabularResult {
    /// Union of all row keys, in first-seen order
    pub fields: Vec<Field>,

    /// Statement label (e.g., "SELECT")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Normalized rows; a payload row that is not an object sits under `value`
    pub rows: Vec<Row>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<usize>,
}

impl TabularResult {
    /// Result with no fields and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get field names
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Table listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
}

/// Column listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: ColumnType,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            column_name: column_name.into(),
            data_type,
        }
    }
}

/// Column types of the records table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Long,
    Int,
    String,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Long => write!(f, "LONG"),
            ColumnType::Int => write!(f, "INT"),
            ColumnType::String => write!(f, "STRING"),
        }
    }
}

/// Built-in function listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineInfo {
    pub routine_name: String,
    pub routine_type: String,
}

/// A product the caller may query, exposed as a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Product id (string or number, as the service reports it)
    pub id: Value,

    /// Product name
    #[serde(default)]
    pub name: Option<String>,

    /// Any other fields the service returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductInfo {
    /// Product id as used in request bodies and paths
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
