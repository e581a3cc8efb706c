// ── Messages ──
//
// Message bodies go to the `messages` table; each channel's `messages`
// relation holds the ordered keys, oldest first.

use chrono::Utc;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;
use zos_api::UploadFile;

use crate::convert;
use crate::error::CoreError;
use crate::features::MessagesAction;
use crate::model::schemas::{CHANNELS, MESSAGES};
use crate::model::{Media, Message, SendStatus, Sender};
use crate::runtime::Runtime;
use crate::store::{ChannelMessagesAction, EntityAction};

/// Load a channel's messages.
///
/// Without `last_created_at` the page replaces what the channel holds;
/// with it, the older page is put in front of the loaded messages.
pub async fn fetch_messages(
    rt: &Runtime,
    channel_id: &str,
    last_created_at: Option<i64>,
) -> Result<(), CoreError> {
    fetch_messages_unless_cancelled(rt, channel_id, last_created_at, &CancellationToken::new())
        .await
}

/// [`fetch_messages`] for a superseded caller: a page that arrives after
/// `cancel` fired is dropped without touching the store.
pub async fn fetch_messages_unless_cancelled(
    rt: &Runtime,
    channel_id: &str,
    last_created_at: Option<i64>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let fetched = rt.api().fetch_messages(channel_id, last_created_at).await;
    if cancel.is_cancelled() {
        debug!(channel_id, "superseded message fetch dropped");
        return Ok(());
    }
    let page = match fetched {
        Ok(page) => page,
        Err(e) => {
            warn!(channel_id, error = %e, "message fetch failed");
            rt.dispatch(MessagesAction::SetError(Some(e.to_string())))?;
            return Err(e);
        }
    };

    let mut messages: Vec<Message> = page.messages.into_iter().map(convert::message).collect();
    messages.sort_by_key(|m| m.created_at);
    let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
    debug!(channel_id, count = ids.len(), has_more = page.has_more, "messages fetched");

    receive_messages(rt, &messages)?;
    rt.dispatch(EntityAction::Receive {
        kind: CHANNELS.into(),
        items: vec![json!({
            "id": channel_id,
            "hasMore": page.has_more,
            "hasLoadedMessages": true,
        })],
    })?;
    let channel_id = channel_id.to_owned();
    rt.dispatch(match last_created_at {
        None => ChannelMessagesAction::Replace { channel_id, ids },
        Some(_) => ChannelMessagesAction::Prepend { channel_id, ids },
    })?;
    rt.dispatch(MessagesAction::SetError(None))
}

/// Send a message, showing it immediately under a fresh optimistic id and
/// swapping in the server's copy once it is accepted.
///
/// On failure the optimistic copy stays, marked failed.
pub async fn send_message(
    rt: &Runtime,
    channel_id: &str,
    text: &str,
    mentioned_user_ids: &[String],
) -> Result<Message, CoreError> {
    let optimistic_id = Uuid::new_v4().to_string();
    let sender = rt
        .store()
        .current_user()
        .map(|user| {
            let summary = user.profile_summary.unwrap_or_default();
            Sender {
                user_id: user.id,
                first_name: summary.first_name,
                last_name: summary.last_name,
                profile_image: summary.profile_image.unwrap_or_default(),
                profile_id: user.profile_id.unwrap_or_default(),
            }
        })
        .unwrap_or_default();

    let optimistic = Message {
        id: optimistic_id.clone(),
        message: text.to_owned(),
        created_at: Utc::now().timestamp_millis(),
        sender,
        optimistic_id: Some(optimistic_id.clone()),
        send_status: Some(SendStatus::InProgress),
        ..Message::default()
    };
    receive_messages(rt, std::slice::from_ref(&optimistic))?;
    rt.dispatch(ChannelMessagesAction::Append {
        channel_id: channel_id.to_owned(),
        id: optimistic_id.clone(),
    })?;
    rt.dispatch(MessagesAction::SendStarted(optimistic_id.clone()))?;

    let result = rt
        .api()
        .send_message(channel_id, text, mentioned_user_ids)
        .await;
    rt.dispatch(MessagesAction::SendFinished(optimistic_id.clone()))?;

    match result {
        Ok(response) => {
            let mut message = convert::message(response);
            message.optimistic_id = Some(optimistic_id.clone());
            message.send_status = Some(SendStatus::Success);
            receive_messages(rt, std::slice::from_ref(&message))?;

            if message.id != optimistic_id {
                rt.dispatch(ChannelMessagesAction::Swap {
                    channel_id: channel_id.to_owned(),
                    from: optimistic_id.clone(),
                    to: message.id.clone(),
                })?;
                rt.dispatch(EntityAction::Remove {
                    kind: MESSAGES.into(),
                    key: optimistic_id,
                })?;
            }
            Ok(message)
        }
        Err(e) => {
            warn!(channel_id, error = %e, "message not sent");
            rt.dispatch(EntityAction::Receive {
                kind: MESSAGES.into(),
                items: vec![json!({ "id": optimistic_id, "sendStatus": SendStatus::Failed })],
            })?;
            rt.dispatch(MessagesAction::SetError(Some(e.to_string())))?;
            Err(e)
        }
    }
}

pub async fn edit_message(
    rt: &Runtime,
    channel_id: &str,
    message_id: &str,
    text: &str,
    mentioned_user_ids: &[String],
) -> Result<(), CoreError> {
    rt.api()
        .edit_message(channel_id, message_id, text, mentioned_user_ids)
        .await?;
    rt.dispatch(EntityAction::Receive {
        kind: MESSAGES.into(),
        items: vec![json!({
            "id": message_id,
            "message": text,
            "updatedAt": Utc::now().timestamp_millis(),
        })],
    })
}

pub async fn delete_message(
    rt: &Runtime,
    channel_id: &str,
    message_id: &str,
) -> Result<(), CoreError> {
    rt.api().delete_message(channel_id, message_id).await?;
    receive_delete_message(rt, channel_id, message_id)
}

/// Upload a file as a message. Returns the stored media; the message
/// itself arrives through the real-time feed.
pub async fn upload_file(
    rt: &Runtime,
    channel_id: &str,
    file: UploadFile,
) -> Result<Media, CoreError> {
    let media = rt.api().upload_file_message(channel_id, file).await?;
    Ok(convert::media(media))
}

/// A message pushed by the real-time feed.
///
/// Echoes of this client's own optimistic sends replace the optimistic
/// copy. Messages for channels not in the store are dropped.
pub fn receive_new_message(
    rt: &Runtime,
    channel_id: &str,
    message: &Message,
) -> Result<(), CoreError> {
    if rt.store().snapshot().entities.get(CHANNELS, channel_id).is_none() {
        debug!(channel_id, "message for unknown channel dropped");
        return Ok(());
    }

    receive_messages(rt, std::slice::from_ref(message))?;

    if let Some(optimistic) = message
        .optimistic_id
        .as_deref()
        .filter(|opt| *opt != message.id)
    {
        rt.dispatch(ChannelMessagesAction::Swap {
            channel_id: channel_id.to_owned(),
            from: optimistic.to_owned(),
            to: message.id.clone(),
        })?;
        rt.dispatch(EntityAction::Remove {
            kind: MESSAGES.into(),
            key: optimistic.to_owned(),
        })?;
    }
    rt.dispatch(ChannelMessagesAction::Append {
        channel_id: channel_id.to_owned(),
        id: message.id.clone(),
    })
}

/// A deletion pushed by the real-time feed, or confirmed by the API.
pub fn receive_delete_message(
    rt: &Runtime,
    channel_id: &str,
    message_id: &str,
) -> Result<(), CoreError> {
    rt.dispatch(ChannelMessagesAction::Remove {
        channel_id: channel_id.to_owned(),
        id: message_id.to_owned(),
    })?;
    rt.dispatch(EntityAction::Remove {
        kind: MESSAGES.into(),
        key: message_id.to_owned(),
    })
}

fn receive_messages(rt: &Runtime, messages: &[Message]) -> Result<(), CoreError> {
    if messages.is_empty() {
        return Ok(());
    }
    let items = messages
        .iter()
        .map(convert::to_record)
        .collect::<Result<Vec<Value>, _>>()?;
    rt.dispatch(EntityAction::Receive {
        kind: MESSAGES.into(),
        items,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::remote::RemoteApi;
    use crate::store::ListAction;
    use crate::testing::FakeApi;

    fn runtime_with_channel() -> (Arc<FakeApi>, Runtime) {
        let api = Arc::new(FakeApi::default());
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.dispatch(ListAction::Receive(vec![json!({ "id": "c1", "name": "general" })]))
            .unwrap();
        (api, rt)
    }

    fn page(has_more: bool, messages: Value) -> zos_api::models::MessagesResponse {
        serde_json::from_value(json!({ "hasMore": has_more, "messages": messages })).unwrap()
    }

    #[tokio::test]
    async fn first_page_replaces_and_older_page_prepends() {
        let (api, rt) = runtime_with_channel();
        *api.messages.lock().unwrap() = page(
            true,
            json!([
                { "id": "m3", "message": "three", "createdAt": 30 },
                { "id": "m2", "message": "two", "createdAt": 20 }
            ]),
        );
        fetch_messages(&rt, "c1", None).await.unwrap();
        assert_eq!(rt.store().channel_message_ids("c1"), vec!["m2", "m3"]);
        assert!(rt.store().channel("c1").unwrap().has_more);

        *api.messages.lock().unwrap() = page(
            false,
            json!([{ "id": "m1", "message": "one", "createdAt": 10 }]),
        );
        fetch_messages(&rt, "c1", Some(20)).await.unwrap();

        let channel = rt.store().channel("c1").unwrap();
        let texts: Vec<_> = channel.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert!(!channel.has_more);
        assert!(channel.has_loaded_messages);
    }

    #[tokio::test]
    async fn send_swaps_optimistic_copy_for_server_message() {
        let (_api, rt) = runtime_with_channel();

        let sent = send_message(&rt, "c1", "hello", &[]).await.unwrap();

        assert_eq!(sent.id, "srv-1");
        assert_eq!(rt.store().channel_message_ids("c1"), vec!["srv-1"]);
        let stored = rt.store().message("srv-1").unwrap();
        assert_eq!(stored.send_status, Some(SendStatus::Success));
        assert!(stored.optimistic_id.is_some());
        assert!(rt.store().message(stored.optimistic_id.as_deref().unwrap()).is_none());
        assert!(rt.store().snapshot().messages.sending.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sends_and_pushes_keep_every_message() {
        let (_api, rt) = runtime_with_channel();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let send_rt = rt.clone();
            tasks.push(tokio::spawn(async move {
                send_message(&send_rt, "c1", &format!("sent {i}"), &[]).await.unwrap();
            }));
            let push_rt = rt.clone();
            tasks.push(tokio::spawn(async move {
                let pushed = Message {
                    id: format!("$push-{i}"),
                    ..Message::default()
                };
                receive_new_message(&push_rt, "c1", &pushed).unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let ids = rt.store().channel_message_ids("c1");
        assert_eq!(ids.len(), 32);
        assert_eq!(ids.iter().filter(|id| id.starts_with("srv-")).count(), 16);
        assert_eq!(ids.iter().filter(|id| id.starts_with("$push-")).count(), 16);
    }

    #[tokio::test]
    async fn superseded_fetch_leaves_the_store_alone() {
        let (api, rt) = runtime_with_channel();
        *api.messages.lock().unwrap() =
            page(false, json!([{ "id": "stale", "message": "old", "createdAt": 1 }]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        fetch_messages_unless_cancelled(&rt, "c1", None, &cancel).await.unwrap();

        assert!(rt.store().channel_message_ids("c1").is_empty());
        assert!(rt.store().message("stale").is_none());
    }

    #[tokio::test]
    async fn failed_send_keeps_a_failed_copy() {
        let (api, rt) = runtime_with_channel();
        api.fail_send.store(true, Ordering::SeqCst);

        assert!(send_message(&rt, "c1", "hello", &[]).await.is_err());

        let ids = rt.store().channel_message_ids("c1");
        assert_eq!(ids.len(), 1);
        let copy = rt.store().message(&ids[0]).unwrap();
        assert_eq!(copy.send_status, Some(SendStatus::Failed));
        assert_eq!(copy.message, "hello");
        assert!(rt.store().snapshot().messages.error.is_some());
    }

    #[tokio::test]
    async fn realtime_echo_replaces_optimistic_copy() {
        let (_api, rt) = runtime_with_channel();
        receive_new_message(
            &rt,
            "c1",
            &Message {
                id: "opt-1".into(),
                optimistic_id: Some("opt-1".into()),
                send_status: Some(SendStatus::InProgress),
                ..Message::default()
            },
        )
        .unwrap();

        let echo = Message {
            id: "$evt".into(),
            message: "hi".into(),
            optimistic_id: Some("opt-1".into()),
            ..Message::default()
        };
        receive_new_message(&rt, "c1", &echo).unwrap();
        receive_new_message(&rt, "c1", &echo).unwrap();

        assert_eq!(rt.store().channel_message_ids("c1"), vec!["$evt"]);
        assert!(rt.store().message("opt-1").is_none());
    }

    #[tokio::test]
    async fn unknown_channel_messages_are_dropped() {
        let (_api, rt) = runtime_with_channel();
        receive_new_message(&rt, "elsewhere", &Message { id: "m".into(), ..Message::default() })
            .unwrap();
        assert!(rt.store().message("m").is_none());
        assert!(rt.store().channel("elsewhere").is_none());
    }

    #[tokio::test]
    async fn edit_and_delete_update_the_store() {
        let (api, rt) = runtime_with_channel();
        *api.messages.lock().unwrap() = page(
            false,
            json!([
                { "id": "m1", "message": "one", "createdAt": 10 },
                { "id": "m2", "message": "two", "createdAt": 20 }
            ]),
        );
        fetch_messages(&rt, "c1", None).await.unwrap();

        edit_message(&rt, "c1", "m1", "uno", &[]).await.unwrap();
        let m1 = rt.store().message("m1").unwrap();
        assert_eq!(m1.message, "uno");
        assert!(m1.updated_at.is_some());

        delete_message(&rt, "c1", "m2").await.unwrap();
        assert_eq!(rt.store().channel_message_ids("c1"), vec!["m1"]);
        assert!(rt.store().message("m2").is_none());
        assert_eq!(api.deleted.lock().unwrap().as_slice(), ["m2".to_owned()]);
    }

    #[tokio::test]
    async fn upload_returns_media() {
        let (_api, rt) = runtime_with_channel();
        let media = upload_file(
            &rt,
            "c1",
            UploadFile {
                file_name: "cat.png".into(),
                mime_type: Some("image/png".into()),
                bytes: bytes::Bytes::from_static(b"png"),
            },
        )
        .await
        .unwrap();
        assert_eq!(media.url, "https://cdn.example.com/cat.png");
        assert_eq!(media.name.as_deref(), Some("cat.png"));
    }
}
