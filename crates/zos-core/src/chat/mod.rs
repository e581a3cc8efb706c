// ── Chat SDK boundary ──
//
// The real-time chat SDK is external. `ChatSdk` is the surface this crate
// consumes; `ChatFacade` turns its raw events into `RealtimeEvent`s in the
// application's own shapes.

mod facade;
mod message;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use zos_api::UploadFile;

use crate::error::CoreError;
use crate::model::Message;

pub use facade::{ChatFacade, calculate_backoff};
pub use message::map_matrix_message;

/// A Matrix-shaped room event as delivered by the SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixEvent {
    pub event_id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    /// Matrix user id of the author.
    pub sender: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Raw events emitted by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    ReconnectStarted,
    ReconnectSucceeded,
    ReconnectFailed,
    MessageReceived {
        channel_url: String,
        is_group_channel: bool,
        event: MatrixEvent,
    },
    MessageDeleted {
        channel_url: String,
        /// The SDK documents a number but sends a string.
        message_id: String,
    },
}

/// Events in application shapes, with de-prefixed channel ids.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    ReconnectStart,
    ReconnectStop,
    /// The reconnect budget is spent; no further attempts until the SDK
    /// reports a successful reconnect on its own.
    ReconnectGaveUp,
    MessageReceived {
        channel_id: String,
        message: Message,
    },
    MessageDeleted {
        channel_id: String,
        message_id: String,
    },
}

#[async_trait]
pub trait ChatSdk: Send + Sync {
    async fn connect(&self, user_id: &str, access_token: &SecretString) -> Result<(), CoreError>;

    /// Ask the SDK to re-establish its connection.
    async fn reconnect(&self) -> Result<(), CoreError>;

    fn subscribe(&self) -> broadcast::Receiver<SdkEvent>;

    async fn fetch_room_event(
        &self,
        room_id: &str,
        event_id: &str,
    ) -> Result<Option<MatrixEvent>, CoreError>;

    /// Display name the homeserver knows for `user_id`.
    async fn display_name(&self, user_id: &str) -> Option<String>;

    /// Upload to the homeserver's media repository, returning its URL.
    async fn upload_file(&self, file: UploadFile) -> Result<String, CoreError>;

    /// Resolve an authenticated media URL into one the caller can load.
    async fn download_file(&self, url: &str) -> Result<String, CoreError>;

    async fn set_avatar_url(&self, url: &str) -> Result<(), CoreError>;
}
