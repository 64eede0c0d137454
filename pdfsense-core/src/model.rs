use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

/// Keywords found in a document, in vocabulary order, each at most once.
pub type KeywordSet = Vec<String>;

/// Entity texts grouped by label.
pub type EntityMap = OrderedMap<Vec<String>>;

/// Section bodies keyed by section title.
pub type SectionMap = OrderedMap<String>;

/// A string-keyed map that remembers insertion order.
///
/// Keys are unique; re-inserting an existing key replaces the value in place
/// and keeps the key's original position. Serializes as a JSON object in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Insert or replace, returning the index of the entry.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> usize {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => {
                self.entries[idx].1 = value;
                idx
            }
            None => {
                self.entries.push((key, value));
                self.entries.len() - 1
            }
        }
    }

    /// Value for `key`, inserted with `default` first if absent.
    pub fn entry_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> V) -> &mut V {
        let idx = match self.position(key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn value_at_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.entries.get_mut(idx).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A span of text tagged by an entity tagger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSpan {
    pub text: String,
    pub label: String,
}

impl TaggedSpan {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// A detected table, cells kept as raw strings exactly as detected.
///
/// Stored row-major; serialized column-major as `{ col: { row: value } }`
/// with zero-based indices as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Column-major view, ragged rows padded with empty cells.
    pub fn columns(&self) -> BTreeMap<usize, BTreeMap<usize, &str>> {
        (0..self.column_count())
            .map(|col| {
                let column = (0..self.row_count())
                    .map(|row| (row, self.cell(row, col).unwrap_or("")))
                    .collect();
                (col, column)
            })
            .collect()
    }
}

impl Serialize for TableGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = self.columns();
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for (col, rows) in &columns {
            map.serialize_entry(&col.to_string(), rows)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_map_reinsert_keeps_position() {
        let mut map = OrderedMap::new();
        map.insert("General", "a".to_string());
        map.insert("Scope", "b".to_string());
        let idx = map.insert("General", String::new());

        assert_eq!(idx, 0);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["General", "Scope"]);
        assert_eq!(map.get("General").map(String::as_str), Some(""));
    }

    #[test]
    fn test_ordered_map_serializes_in_insertion_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut map: EntityMap = OrderedMap::new();
        map.entry_or_insert_with("QUANTITY", Vec::new).push("5m".to_string());
        map.entry_or_insert_with("MONEY", Vec::new).push("$20".to_string());
        map.entry_or_insert_with("QUANTITY", Vec::new).push("220V".to_string());

        let json = serde_json::to_string(&map)?;
        assert_eq!(json, r#"{"QUANTITY":["5m","220V"],"MONEY":["$20"]}"#);
        Ok(())
    }

    #[test]
    fn test_table_grid_serializes_column_major() -> Result<(), Box<dyn std::error::Error>> {
        let grid = TableGrid::new(vec![
            vec!["Item".to_string(), "Qty".to_string()],
            vec!["Cable".to_string(), "10".to_string()],
            vec!["Wire".to_string()],
        ]);

        assert_eq!(grid.column_count(), 2);
        let value = serde_json::to_value(&grid)?;
        assert_eq!(
            value,
            serde_json::json!({
                "0": { "0": "Item", "1": "Cable", "2": "Wire" },
                "1": { "0": "Qty", "1": "10", "2": "" }
            })
        );
        Ok(())
    }
}
