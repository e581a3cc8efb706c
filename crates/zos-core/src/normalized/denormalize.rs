// ── Denormalization ──
//
// Rebuild a nested object from a root key. Missing references never fail:
// an absent one-relation becomes `null`, absent many-members are skipped,
// and a reference back into the current resolution path is left as its key.

use serde_json::Value;

use super::NormalizedState;
use super::normalize::key_of;
use super::schema::{Cardinality, SchemaRegistry};

/// Reconstruct `kind`/`key` with its relations resolved. `None` when the
/// root entity is not stored.
pub fn denormalize(
    registry: &SchemaRegistry,
    state: &NormalizedState,
    kind: &str,
    key: &str,
) -> Option<Value> {
    let mut path = Vec::new();
    resolve(registry, state, kind, key, &mut path)
}

fn resolve(
    registry: &SchemaRegistry,
    state: &NormalizedState,
    kind: &str,
    key: &str,
    path: &mut Vec<(String, String)>,
) -> Option<Value> {
    let record = state.get(kind, key)?;
    let Some(schema) = registry.get(kind) else {
        return Some(Value::Object(record.clone()));
    };

    path.push((kind.to_owned(), key.to_owned()));
    let mut out = record.clone();

    for relation in &schema.relations {
        let Some(stored) = record.get(&relation.field) else {
            continue;
        };
        let target = relation.target_kind.as_str();

        let resolved = match (relation.cardinality, stored) {
            (_, Value::Null) => Value::Null,
            (Cardinality::One, reference) => key_of(reference).map_or(Value::Null, |child| {
                resolve_member(registry, state, target, &child, path).unwrap_or(Value::Null)
            }),
            (Cardinality::Many, Value::Array(refs)) => Value::Array(
                refs.iter()
                    .filter_map(key_of)
                    .filter_map(|child| resolve_member(registry, state, target, &child, path))
                    .collect(),
            ),
            (Cardinality::Many, _) => Value::Array(Vec::new()),
        };
        out.insert(relation.field.clone(), resolved);
    }

    path.pop();
    Some(Value::Object(out))
}

fn resolve_member(
    registry: &SchemaRegistry,
    state: &NormalizedState,
    kind: &str,
    key: &str,
    path: &mut Vec<(String, String)>,
) -> Option<Value> {
    if path.iter().any(|(k, id)| k == kind && id == key) {
        return Some(Value::String(key.to_owned()));
    }
    resolve(registry, state, kind, key, path)
}
