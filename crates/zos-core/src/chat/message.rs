// Matrix room event → application message.

use serde_json::Value;
use tracing::debug;

use super::{ChatSdk, MatrixEvent};
use crate::model::{Message, Sender};

/// Map a Matrix message event. The parent text is fetched through the SDK.
/// It is empty, never absent, when there is no reply or the parent cannot
/// be loaded.
pub async fn map_matrix_message(sdk: &dyn ChatSdk, room_id: &str, event: &MatrixEvent) -> Message {
    let display_name = sdk.display_name(&event.sender).await.unwrap_or_default();

    let parent_message_id = event
        .content
        .pointer("/m.relates_to/m.in_reply_to/event_id")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let parent_message_text = match parent_message_id.as_deref() {
        Some(parent_id) => {
            let room = event.room_id.as_deref().unwrap_or(room_id);
            match sdk.fetch_room_event(room, parent_id).await {
                Ok(Some(parent)) => Some(body_of(&parent.content)),
                Ok(None) => Some(String::new()),
                Err(e) => {
                    debug!(parent_id, error = %e, "parent message unavailable");
                    Some(String::new())
                }
            }
        }
        None => Some(String::new()),
    };

    Message {
        id: event.event_id.clone(),
        message: body_of(&event.content),
        created_at: event.origin_server_ts,
        updated_at: None,
        sender: Sender {
            user_id: event.sender.clone(),
            first_name: display_name,
            ..Sender::default()
        },
        parent_message_id,
        parent_message_text,
        media: None,
        mentioned_users: Vec::new(),
        optimistic_id: event
            .content
            .get("optimisticId")
            .and_then(Value::as_str)
            .map(str::to_owned),
        is_admin: false,
        hide_preview: false,
        send_status: None,
    }
}

fn body_of(content: &Value) -> String {
    content
        .get("body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
