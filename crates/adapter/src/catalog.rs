//! Event and property catalogs
//!
//! Per-product reference tables that map the numeric indices found in raw
//! rows to human-readable names. Display names (`"<name> (<index>)"`) are
//! formatted once, when a catalog is loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One named event or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Index used in raw rows
    pub index: i64,

    /// Display name, `"<name> (<index>)"` once loaded
    pub name: String,

    /// Name as reported by the service
    #[serde(rename = "ogName", default)]
    pub og_name: String,

    /// Whether the service lists this entry
    #[serde(default)]
    pub visible: bool,

    /// Any other fields the service returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    /// Create an entry with the given index and display name
    pub fn new(index: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            index,
            og_name: name.clone(),
            name,
            visible: true,
            extra: Map::new(),
        }
    }

    /// Stand-in for an index that is not in the catalog
    pub fn synthesized(index: i64, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            og_name: String::new(),
            visible: false,
            extra: Map::new(),
        }
    }
}

/// Event catalog entry
pub type EventCatalogEntry = CatalogEntry;

/// Property catalog entry
pub type PropertyCatalogEntry = CatalogEntry;

/// Display name for a catalog entry
pub fn display_name(name: &str, index: i64) -> String {
    format!("{} ({})", name, index)
}

/// Read-only catalog of entries looked up by index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from already-resolved entries
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Build a catalog from a raw `data` listing
    ///
    /// Keeps visible entries only; each keeps its original name in
    /// `og_name` and gets a display name with the index appended. Entries
    /// without an integer `index` or a string `name` are skipped.
    pub fn from_listing(data: Vec<Value>) -> Self {
        data
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<RawEntry>(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "skipping malformed catalog entry");
                    None
                }
            })
            .filter(|raw| raw.visible)
            .map(|raw| CatalogEntry {
                index: raw.index,
                name: display_name(&raw.name, raw.index),
                og_name: raw.name,
                visible: true,
                extra: raw.extra,
            })
            .collect()
    }

    /// Look up an entry by index
    pub fn get(&self, index: i64) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    /// Look up an entry, synthesizing one named `fallback` when missing
    pub fn resolve(&self, index: i64, fallback: &str) -> CatalogEntry {
        self.get(index)
            .cloned()
            .unwrap_or_else(|| CatalogEntry::synthesized(index, fallback))
    }

    /// All entries in listing order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    index: i64,
    name: String,
    #[serde(default)]
    visible: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Signed Up", 3), "Signed Up (3)");
    }

    #[test]
    fn test_from_listing_filters_and_renames() {
        let catalog = Catalog::from_listing(vec![
            json!({"index": 1, "name": "Visited Site", "visible": true}),
            json!({"index": 2, "name": "Hidden", "visible": false}),
            json!({"index": 3, "name": "No Flag"}),
            json!({"index": 4, "name": "Signed Up", "visible": true, "kind": "event"}),
        ]);

        assert_eq!(catalog.len(), 2);
        let first = &catalog.entries()[0];
        assert_eq!(first.name, "Visited Site (1)");
        assert_eq!(first.og_name, "Visited Site");
        assert!(first.visible);

        let second = catalog.get(4).unwrap();
        assert_eq!(second.name, "Signed Up (4)");
        assert_eq!(second.extra.get("kind"), Some(&json!("event")));
    }

    #[test]
    fn test_from_listing_skips_malformed() {
        let catalog = Catalog::from_listing(vec![
            json!({"name": "no index", "visible": true}),
            json!({"index": "7", "name": "string index", "visible": true}),
            json!({"index": 8, "name": "ok", "visible": true}),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(8).is_some());
    }

    #[test]
    fn test_resolve_match() {
        let catalog = Catalog::new(vec![CatalogEntry::new(5, "Plan (5)")]);
        assert_eq!(catalog.resolve(5, "prop_mod_x").name, "Plan (5)");
    }

    #[test]
    fn test_resolve_fallback() {
        let catalog = Catalog::default();
        let entry = catalog.resolve(9, "prop_mod_x");
        assert_eq!(entry.index, 9);
        assert_eq!(entry.name, "prop_mod_x");
        assert!(!entry.visible);
    }

    #[test]
    fn test_entry_serializes_og_name() {
        let entry = CatalogEntry::new(1, "A (1)");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["ogName"], json!("A (1)"));
        assert_eq!(value["index"], json!(1));
    }
}
