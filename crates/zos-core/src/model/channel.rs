// ── Channel domain types ──

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::user::User;

/// Fields accepted by the `channels` schema (relations excluded).
pub(crate) const FIELDS: &[&str] = &[
    "id",
    "name",
    "icon",
    "category",
    "unreadCount",
    "hasJoined",
    "groupChannelType",
    "isChannel",
    "createdAt",
    "hasMore",
    "hasLoadedMessages",
];

/// A channel with its relations resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub unread_count: u32,
    pub has_joined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_channel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_channel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub has_more: bool,
    pub has_loaded_messages: bool,
    pub other_members: Vec<User>,
    pub messages: Vec<Message>,
}

impl Channel {
    pub fn is_one_on_one(&self) -> bool {
        self.other_members.len() == 1
    }
}
