// ── Entity schemas ──
//
// Each entity kind declares its key field, a version, the scalar fields it
// accepts, and the relation fields that hold keys of other kinds. The
// registry is validated once at construction; normalize/denormalize never
// re-check schema consistency.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Invalid schema configuration, detected when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("kind `{kind}` does not declare its key field `{key_field}`")]
    MissingKeyField { kind: String, key_field: String },

    #[error("kind `{0}` is registered twice")]
    DuplicateKind(String),

    #[error("relation `{kind}.{field}` targets unregistered kind `{target}`")]
    UnknownRelationTarget {
        kind: String,
        field: String,
        target: String,
    },

    #[error("`{kind}.{field}` is declared both as a field and as a relation")]
    FieldCollision { kind: String, field: String },
}

/// How many entities a relation field refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A single key (or `null`).
    One,
    /// An array of keys.
    Many,
}

/// A field whose value is a reference into another kind's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub field: String,
    pub target_kind: String,
    pub cardinality: Cardinality,
}

/// Shape of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub kind: String,
    pub key_field: String,
    pub version: u32,
    pub fields: BTreeSet<String>,
    pub relations: Vec<Relation>,
}

impl EntitySchema {
    /// Start a schema for `kind` keyed by `key_field`. The key field is
    /// not implicitly declared; list it in [`fields`](Self::fields).
    pub fn new(kind: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key_field: key_field.into(),
            version: 1,
            fields: BTreeSet::new(),
            relations: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Declare scalar fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Declare a relation field.
    pub fn relation(
        mut self,
        field: impl Into<String>,
        target_kind: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        self.relations.push(Relation {
            field: field.into(),
            target_kind: target_kind.into(),
            cardinality,
        });
        self
    }

    pub fn relation_for(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field == field)
    }

    pub fn accepts_field(&self, field: &str) -> bool {
        self.fields.contains(field) || self.relation_for(field).is_some()
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Validated set of entity schemas, keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, EntitySchema>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    pub fn get(&self, kind: &str) -> Option<&EntitySchema> {
        self.schemas.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn version(&self, kind: &str) -> Option<u32> {
        self.schemas.get(kind).map(|s| s.version)
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    entities: Vec<EntitySchema>,
}

impl SchemaRegistryBuilder {
    pub fn entity(mut self, schema: EntitySchema) -> Self {
        self.entities.push(schema);
        self
    }

    /// Validate and freeze the registry.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut schemas = BTreeMap::new();

        for schema in self.entities {
            if !schema.fields.contains(&schema.key_field) {
                return Err(SchemaError::MissingKeyField {
                    kind: schema.kind,
                    key_field: schema.key_field,
                });
            }
            if let Some(rel) = schema
                .relations
                .iter()
                .find(|r| schema.fields.contains(&r.field))
            {
                return Err(SchemaError::FieldCollision {
                    kind: schema.kind.clone(),
                    field: rel.field.clone(),
                });
            }
            if schemas.contains_key(&schema.kind) {
                return Err(SchemaError::DuplicateKind(schema.kind));
            }
            schemas.insert(schema.kind.clone(), schema);
        }

        for schema in schemas.values() {
            for rel in &schema.relations {
                if !schemas.contains_key(&rel.target_kind) {
                    return Err(SchemaError::UnknownRelationTarget {
                        kind: schema.kind.clone(),
                        field: rel.field.clone(),
                        target: rel.target_kind.clone(),
                    });
                }
            }
        }

        Ok(SchemaRegistry { schemas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> EntitySchema {
        EntitySchema::new("users", "userId").fields(["userId", "firstName"])
    }

    #[test]
    fn builds_valid_registry() {
        let registry = SchemaRegistry::builder()
            .entity(users())
            .entity(
                EntitySchema::new("channels", "id")
                    .fields(["id", "name"])
                    .relation("otherMembers", "users", Cardinality::Many),
            )
            .build()
            .unwrap_or_else(|e| panic!("registry should build: {e}"));

        assert_eq!(registry.kinds().collect::<Vec<_>>(), ["channels", "users"]);
        assert!(registry.get("channels").is_some_and(|s| s.accepts_field("otherMembers")));
    }

    #[test]
    fn rejects_undeclared_key_field() {
        let err = SchemaRegistry::builder()
            .entity(EntitySchema::new("users", "userId").fields(["firstName"]))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingKeyField {
                kind: "users".into(),
                key_field: "userId".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_relation_target() {
        let err = SchemaRegistry::builder()
            .entity(
                EntitySchema::new("channels", "id")
                    .fields(["id"])
                    .relation("otherMembers", "users", Cardinality::Many),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownRelationTarget { target, .. } if target == "users"));
    }

    #[test]
    fn rejects_duplicate_kind() {
        let err = SchemaRegistry::builder()
            .entity(users())
            .entity(users())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKind("users".into()));
    }

    #[test]
    fn rejects_relation_shadowing_field() {
        let err = SchemaRegistry::builder()
            .entity(users())
            .entity(
                EntitySchema::new("channels", "id")
                    .fields(["id", "otherMembers"])
                    .relation("otherMembers", "users", Cardinality::Many),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::FieldCollision { .. }));
    }
}
