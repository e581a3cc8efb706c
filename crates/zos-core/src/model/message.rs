// ── Message domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fields accepted by the `messages` schema.
pub(crate) const FIELDS: &[&str] = &[
    "id",
    "message",
    "createdAt",
    "updatedAt",
    "sender",
    "parentMessageId",
    "parentMessageText",
    "media",
    "mentionedUsers",
    "optimisticId",
    "isAdmin",
    "hidePreview",
    "sendStatus",
];

/// Delivery state of a message sent from this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SendStatus {
    InProgress,
    Success,
    Failed,
}

/// Who wrote a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sender {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: String,
    pub profile_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MentionedUser {
    pub id: String,
    pub name: String,
}

/// An attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A chat message as stored in the `messages` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub id: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub sender: Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    pub mentioned_users: Vec<MentionedUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimistic_id: Option<String>,
    pub is_admin: bool,
    pub hide_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_status: Option<SendStatus>,
}

impl Message {
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.created_at)
    }
}
