//! Rendering of listings and query results

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use kissql_adapter::Row;
use serde::Serialize;
use serde_json::Value;

/// Widest column shown in table output
const MAX_COLUMN_WIDTH: usize = 50;

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format '{}' (expected table, json, or csv)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Serialize items into rows, one per item
pub fn to_rows<T: Serialize>(items: &[T]) -> Result<Vec<Row>> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(row) => Ok(row),
            other => anyhow::bail!("expected an object, got {}", other),
        })
        .collect()
}

/// Print rows under the given columns
pub fn print_rows(columns: &[&str], rows: &[Row], format: OutputFormat) -> Result<()> {
    print!("{}", render(columns, rows, format)?);
    Ok(())
}

/// Render rows under the given columns
///
/// Rows may lack some columns; those cells render empty.
pub fn render(columns: &[&str], rows: &[Row], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(columns, rows)),
        OutputFormat::Json => render_json(columns, rows),
        OutputFormat::Csv => Ok(render_csv(columns, rows)),
    }
}

fn render_table(columns: &[&str], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(empty result)\n".to_string();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(row, c)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for row in &cells {
        let values: Vec<String> = row.iter().zip(&widths).map(|(v, w)| pad(v, *w)).collect();
        out.push_str(values.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

fn render_json(columns: &[&str], rows: &[Row]) -> Result<String> {
    let objects: Vec<Row> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|c| row.get(*c).map(|v| (c.to_string(), v.clone())))
                .collect()
        })
        .collect();
    Ok(format!("{}\n", serde_json::to_string_pretty(&objects)?))
}

fn render_csv(columns: &[&str], rows: &[Row]) -> String {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|c| match row.get(*c) {
                None | Some(Value::Null) => String::new(),
                Some(value) => csv_escape(&format_value(value)),
            })
            .collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).map(format_value).unwrap_or_default()
}

/// Pad or truncate to exactly `width` characters
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:width$}", s, width = width)
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(obj) => Value::Object(obj.clone()).to_string(),
    }
}

/// Quote if contains comma, newline, or quote
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('\n') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            json!({"person": 1, "event": "Signed Up (2)"}).as_object().cloned().unwrap(),
            json!({"person": 2, "email": "a,b@example.com"}).as_object().cloned().unwrap(),
        ]
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_render_table() {
        let out = render(&["person", "event"], &rows(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "person | event");
        assert_eq!(lines[1], "-------+--------------");
        assert_eq!(lines[2], "1      | Signed Up (2)");
        assert_eq!(lines[3], "2");
    }

    #[test]
    fn test_render_empty_table() {
        let out = render(&["a"], &[], OutputFormat::Table).unwrap();
        assert_eq!(out, "(empty result)\n");
    }

    #[test]
    fn test_render_csv_escapes_and_fills_missing() {
        let out = render(&["person", "event", "email"], &rows(), OutputFormat::Csv).unwrap();
        assert_eq!(
            out,
            "person,event,email\n1,Signed Up (2),\n2,,\"a,b@example.com\"\n"
        );
    }

    #[test]
    fn test_render_json_keeps_column_order() {
        let out = render(&["event", "person"], &rows()[..1], OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"event": "Signed Up (2)", "person": 1}]));
        assert!(out.find("event").unwrap() < out.find("person").unwrap());
    }

    #[test]
    fn test_pad_truncates_long_values() {
        assert_eq!(pad("abcdefgh", 6), "abc...");
        assert_eq!(pad("ab", 4), "ab  ");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "NULL");
        assert_eq!(format_value(&json!([1, "a"])), "[1, a]");
        assert_eq!(format_value(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn test_to_rows() {
        let rows = to_rows(&[json!({"name": "records"})]).unwrap();
        assert_eq!(rows[0]["name"], json!("records"));
        assert!(to_rows(&[json!(1)]).is_err());
    }
}
