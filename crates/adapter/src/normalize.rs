//! Result normalization
//!
//! Turns the raw job payload into a [`TabularResult`]. Raw rows have no
//! fixed schema: custom properties arrive as `prop_mod*` keys holding a
//! JSON-encoded `{"<property index>": value}` object, and `event` holds a
//! numeric event index. Both are resolved against the product's catalogs,
//! then the field list is inferred from whatever keys the rows ended up
//! with. Nothing here does IO.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::catalog::Catalog;
use crate::classify::StatementKind;
use crate::result::{Field, Row, TabularResult};

/// Substring marking a property-modification key
pub const PROP_MOD_MARKER: &str = "prop_mod";

/// Key holding the event index
pub const EVENT_FIELD: &str = "event";

/// Column holding a payload row that is not an object
pub const VALUE_FIELD: &str = "value";

/// Build the tabular result for a raw payload
///
/// `command` is the classified kind of the query's first statement, if any.
/// Without it, a list payload is labelled `SELECT`.
pub fn normalize(
    payload: Value,
    command: Option<StatementKind>,
    events: &Catalog,
    properties: &Catalog,
) -> TabularResult {
    let is_list = payload.is_array();
    let is_read = command.map_or(is_list, |kind| kind.is_read());

    let rows: Vec<Row> = match payload {
        Value::Array(items) => items
            .into_iter()
            .map(into_row)
            .map(|row| resolve_properties(row, properties))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            debug!(payload_type = json_type(&other), "payload is not a row list");
            Vec::new()
        }
    };

    let fields = infer_fields(&rows);
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|row| resolve_event(row, events))
        .collect();
    let count = rows.len();

    TabularResult {
        fields,
        command: match command {
            Some(kind) => Some(kind.as_str().to_string()),
            None if is_read => Some(StatementKind::Select.as_str().to_string()),
            None => None,
        },
        rows,
        row_count: is_read.then_some(count),
        affected_rows: (!is_read && is_list).then_some(count),
    }
}

/// Union of all row keys, in first-seen order, without duplicates
pub fn infer_fields(rows: &[Row]) -> Vec<Field> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if seen.insert(key.as_str()) {
            fields.push(Field::new(key.as_str()));
        }
    }
    fields
}

/// Replace every `prop_mod*` key with the resolved property name
///
/// Keys whose value cannot be decoded stay as they are. An index missing
/// from the catalog keeps the raw key as its name, with the decoded value.
/// A resolved name that collides with a plain key overwrites it, wherever
/// that key sits in the row.
pub fn resolve_properties(row: Row, properties: &Catalog) -> Row {
    let mut resolved = Row::new();
    let mut decoded_properties = Vec::new();
    for (key, value) in row {
        if !key.contains(PROP_MOD_MARKER) {
            resolved.insert(key, value);
            continue;
        }

        match decode_property_modification(&value) {
            Some((index, decoded)) => {
                let name = properties.resolve(index, &key).name;
                decoded_properties.push((key, name, decoded));
            }
            None => {
                debug!(key = %key, "undecodable property modification left as-is");
                resolved.insert(key, value);
            }
        }
    }

    for (key, name, decoded) in decoded_properties {
        if resolved.contains_key(&name) {
            debug!(property = %name, key = %key, "property overwrites existing field");
        }
        resolved.insert(name, decoded);
    }
    resolved
}

/// Replace the row's event index with the event's display name
///
/// Indices missing from the catalog (or non-numeric values) become the
/// empty string. A null or absent `event` is left alone.
pub fn resolve_event(mut row: Row, events: &Catalog) -> Row {
    if let Some(value) = row.get_mut(EVENT_FIELD)
        && !value.is_null()
    {
        let name = value
            .as_i64()
            .map(|index| events.resolve(index, "").name)
            .unwrap_or_default();
        *value = Value::String(name);
    }
    row
}

/// Decode a `{"<index>": value}` property modification
///
/// Accepts the JSON-encoded string the service sends, or an already-decoded
/// object. The first key must be an integer index.
pub fn decode_property_modification(value: &Value) -> Option<(i64, Value)> {
    let object = match value {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded).ok()? {
            Value::Object(object) => object,
            _ => return None,
        },
        Value::Object(object) => object.clone(),
        _ => return None,
    };

    let (key, decoded) = object.into_iter().next()?;
    let index = key.trim().parse::<i64>().ok()?;
    Some((index, decoded))
}

fn into_row(item: Value) -> Row {
    match item {
        Value::Object(row) => row,
        other => {
            debug!(row_type = json_type(&other), "non-object row kept under value column");
            let mut row = Row::new();
            row.insert(VALUE_FIELD.to_string(), other);
            row
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;
