// ── Normalization ──
//
// Flatten nested JSON objects into per-kind keyed tables. Relation fields
// are replaced by the key (or keys) of the extracted child entities.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use thiserror::Error;

use super::schema::{Cardinality, EntitySchema, SchemaRegistry};
use super::{EntityTables, NormalizedState, Record};

/// Data that does not fit the registered schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unknown entity kind `{0}`")]
    UnknownKind(String),

    #[error("`{kind}` entity is not a JSON object")]
    NotAnObject { kind: String },

    #[error("`{kind}` entity has no usable `{key_field}` key")]
    MissingKey { kind: String, key_field: String },

    #[error("`{kind}` has no field named `{field}`")]
    UnknownField { kind: String, field: String },

    #[error("relation `{kind}.{field}` holds a value that is neither an entity nor a key")]
    InvalidRelation { kind: String, field: String },

    #[error("root key `{key}` has no `{kind}` entity")]
    DanglingRoot { kind: String, key: String },

    #[error("`{kind}` payload is schema version {found}, registry has {expected}")]
    VersionMismatch {
        kind: String,
        expected: u32,
        found: u32,
    },
}

/// Result of normalizing a list of nested objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Root keys, in input order, each appearing once.
    pub result: Vec<String>,
    /// Flat tables per kind.
    pub entities: EntityTables,
    /// Schema version of each kind present in `entities`.
    pub versions: BTreeMap<String, u32>,
}

impl Normalized {
    /// Build a pre-normalized payload stamped with the registry's current
    /// versions for every kind it contains.
    pub fn from_tables(
        registry: &SchemaRegistry,
        result: Vec<String>,
        entities: EntityTables,
    ) -> Self {
        let versions = entities
            .keys()
            .filter_map(|kind| registry.version(kind).map(|v| (kind.clone(), v)))
            .collect();
        Self {
            result,
            entities,
            versions,
        }
    }
}

/// Normalize `raw` items of `kind` against `registry`.
pub fn normalize(
    registry: &SchemaRegistry,
    kind: &str,
    raw: &[Value],
) -> Result<Normalized, NormalizeError> {
    let schema = registry
        .get(kind)
        .ok_or_else(|| NormalizeError::UnknownKind(kind.to_owned()))?;

    let mut out = Normalized::default();
    for item in raw {
        let key = normalize_entity(registry, schema, item, &mut out)?;
        if !out.result.contains(&key) {
            out.result.push(key);
        }
    }
    Ok(out)
}

fn normalize_entity(
    registry: &SchemaRegistry,
    schema: &EntitySchema,
    value: &Value,
    out: &mut Normalized,
) -> Result<String, NormalizeError> {
    let Value::Object(object) = value else {
        return Err(NormalizeError::NotAnObject {
            kind: schema.kind.clone(),
        });
    };

    let key = object
        .get(&schema.key_field)
        .and_then(key_of)
        .ok_or_else(|| NormalizeError::MissingKey {
            kind: schema.kind.clone(),
            key_field: schema.key_field.clone(),
        })?;

    let mut record = Record::new();
    for (field, value) in object {
        if let Some(relation) = schema.relation_for(field) {
            let target = registry
                .get(&relation.target_kind)
                .ok_or_else(|| NormalizeError::UnknownKind(relation.target_kind.clone()))?;
            let normalized = match (relation.cardinality, value) {
                (_, Value::Null) => Value::Null,
                (Cardinality::One, item) => {
                    Value::String(normalize_reference(registry, target, item, out, schema, field)?)
                }
                (Cardinality::Many, Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .map(|item| {
                            normalize_reference(registry, target, item, out, schema, field)
                                .map(Value::String)
                        })
                        .collect::<Result<_, _>>()?,
                ),
                (Cardinality::Many, _) => {
                    return Err(NormalizeError::InvalidRelation {
                        kind: schema.kind.clone(),
                        field: field.clone(),
                    });
                }
            };
            record.insert(field.clone(), normalized);
        } else if schema.fields.contains(field) {
            record.insert(field.clone(), value.clone());
        } else {
            return Err(NormalizeError::UnknownField {
                kind: schema.kind.clone(),
                field: field.clone(),
            });
        }
    }

    out.versions.insert(schema.kind.clone(), schema.version);
    let table = out.entities.entry(schema.kind.clone()).or_default();
    match table.get_mut(&key) {
        Some(existing) => merge_record(existing, record),
        None => {
            table.insert(key.clone(), record);
        }
    }
    Ok(key)
}

/// A relation member is either a nested entity (extracted recursively) or
/// an already-normalized key.
fn normalize_reference(
    registry: &SchemaRegistry,
    target: &EntitySchema,
    item: &Value,
    out: &mut Normalized,
    owner: &EntitySchema,
    field: &str,
) -> Result<String, NormalizeError> {
    match item {
        Value::Object(_) => normalize_entity(registry, target, item, out),
        other => key_of(other).ok_or_else(|| NormalizeError::InvalidRelation {
            kind: owner.kind.clone(),
            field: field.to_owned(),
        }),
    }
}

/// Keys are non-empty strings; numeric keys are stringified.
pub(crate) fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Field-by-field last-write-wins: incoming fields overwrite, fields the
/// incoming record lacks keep their stored values.
pub fn merge_record(existing: &mut Record, incoming: Record) {
    for (field, value) in incoming {
        existing.insert(field, value);
    }
}

/// Check a pre-normalized payload against the registry.
pub(crate) fn validate_normalized(
    registry: &SchemaRegistry,
    payload: &Normalized,
) -> Result<(), NormalizeError> {
    for (kind, table) in &payload.entities {
        let schema = registry
            .get(kind)
            .ok_or_else(|| NormalizeError::UnknownKind(kind.clone()))?;

        let found = payload.versions.get(kind).copied().unwrap_or(0);
        if found != schema.version {
            return Err(NormalizeError::VersionMismatch {
                kind: kind.clone(),
                expected: schema.version,
                found,
            });
        }

        for record in table.values() {
            if let Some(field) = record.keys().find(|f| !schema.accepts_field(f)) {
                return Err(NormalizeError::UnknownField {
                    kind: kind.clone(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Every root key of `payload` must name a `kind` entity, either carried
/// by the payload or already in `stored`.
pub(crate) fn check_roots(
    payload: &Normalized,
    kind: &str,
    stored: &NormalizedState,
) -> Result<(), NormalizeError> {
    let carried = payload.entities.get(kind);
    match payload
        .result
        .iter()
        .find(|key| !carried.is_some_and(|t| t.contains_key(*key)) && !stored.contains(kind, key))
    {
        Some(key) => Err(NormalizeError::DanglingRoot {
            kind: kind.to_owned(),
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

/// Collapse duplicate keys, keeping first occurrence order.
pub(crate) fn dedup_keys(keys: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(keys.len());
    keys.iter()
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect()
}
