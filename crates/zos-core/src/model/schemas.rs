// Default entity schemas for channels, users, and messages.

use super::{channel, message, user};
use crate::normalized::{Cardinality, EntitySchema, SchemaError, SchemaRegistry};

pub const CHANNELS: &str = "channels";
pub const USERS: &str = "users";
pub const MESSAGES: &str = "messages";

pub fn users() -> EntitySchema {
    EntitySchema::new(USERS, "userId").fields(user::FIELDS.iter().copied())
}

pub fn messages() -> EntitySchema {
    EntitySchema::new(MESSAGES, "id").fields(message::FIELDS.iter().copied())
}

pub fn channels() -> EntitySchema {
    EntitySchema::new(CHANNELS, "id")
        .fields(channel::FIELDS.iter().copied())
        .relation("otherMembers", USERS, Cardinality::Many)
        .relation("messages", MESSAGES, Cardinality::Many)
}

/// Build the default registry.
pub fn registry() -> Result<SchemaRegistry, SchemaError> {
    SchemaRegistry::builder()
        .entity(users())
        .entity(messages())
        .entity(channels())
        .build()
}
