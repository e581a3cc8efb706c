// ── Normalized entity store ──
//
// Flat per-kind tables of JSON records plus the schema-driven
// normalize/denormalize pair that moves data in and out of them.

mod denormalize;
mod normalize;
mod schema;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

pub use denormalize::denormalize;
pub(crate) use normalize::{check_roots, dedup_keys, validate_normalized};
pub use normalize::{NormalizeError, Normalized, merge_record, normalize};
pub use schema::{
    Cardinality, EntitySchema, Relation, SchemaError, SchemaRegistry, SchemaRegistryBuilder,
};

/// One stored entity: a flat JSON object whose relation fields hold keys.
pub type Record = serde_json::Map<String, Value>;

/// kind → key → record.
pub type EntityTables = BTreeMap<String, HashMap<String, Record>>;

/// Every stored entity, by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedState {
    tables: EntityTables,
}

impl NormalizedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: &str, key: &str) -> Option<&Record> {
        self.tables.get(kind)?.get(key)
    }

    pub fn contains(&self, kind: &str, key: &str) -> bool {
        self.get(kind, key).is_some()
    }

    pub fn table(&self, kind: &str) -> Option<&HashMap<String, Record>> {
        self.tables.get(kind)
    }

    pub fn tables(&self) -> &EntityTables {
        &self.tables
    }

    /// Number of entities stored for `kind`.
    pub fn len(&self, kind: &str) -> usize {
        self.tables.get(kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }

    /// Merge every record of `payload` into the tables, last write wins
    /// per field.
    pub fn merge(&mut self, payload: EntityTables) {
        for (kind, incoming) in payload {
            let table = self.tables.entry(kind).or_default();
            for (key, record) in incoming {
                match table.get_mut(&key) {
                    Some(existing) => merge_record(existing, record),
                    None => {
                        table.insert(key, record);
                    }
                }
            }
        }
    }

    /// Update one field of a stored record. Returns `false` when the
    /// record does not exist.
    pub fn patch(&mut self, kind: &str, key: &str, field: &str, value: Value) -> bool {
        match self.tables.get_mut(kind).and_then(|t| t.get_mut(key)) {
            Some(record) => {
                record.insert(field.to_owned(), value);
                true
            }
            None => false,
        }
    }

    /// Drop one entity.
    pub fn remove(&mut self, kind: &str, key: &str) -> Option<Record> {
        self.tables.get_mut(kind)?.remove(key)
    }

    /// Drop every entity of `kind`, leaving other kinds untouched.
    pub fn remove_kind(&mut self, kind: &str) -> bool {
        self.tables
            .get_mut(kind)
            .is_some_and(|t| {
                let had = !t.is_empty();
                t.clear();
                had
            })
    }
}
