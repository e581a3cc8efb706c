// In-process fakes for the REST and chat seams.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::broadcast;
use zos_api::UploadFile;
use zos_api::models::{
    ChannelResponse, CurrentUserResponse, EditProfileRequest, LinkPreview, MediaResponse,
    MentionableUser, MessageResponse, MessagesResponse, NonceOrAuthorizeResponse,
    UserSearchResult,
};

use crate::chat::{ChatSdk, MatrixEvent, SdkEvent};
use crate::error::CoreError;
use crate::remote::RemoteApi;

fn unavailable() -> CoreError {
    CoreError::Api {
        message: "service unavailable".into(),
        status: Some(503),
    }
}

// ── REST ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeApi {
    pub channels: Mutex<Vec<ChannelResponse>>,
    /// Replies served before `channels`, each after its delay.
    pub delayed_channels: Mutex<VecDeque<(Duration, Vec<ChannelResponse>)>>,
    pub fail_channels: AtomicBool,
    pub channel_fetches: AtomicU32,
    pub nonce: Mutex<Option<String>>,
    /// `None` answers 401.
    pub current_user: Mutex<Option<CurrentUserResponse>>,
    pub cleared_sessions: AtomicU32,
    pub messages: Mutex<MessagesResponse>,
    pub fail_send: AtomicBool,
    pub sent: Mutex<Vec<String>>,
    pub edited: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<String>>,
    pub zero_users: Mutex<Vec<UserSearchResult>>,
    pub edited_profiles: Mutex<Vec<EditProfileRequest>>,
}

impl FakeApi {
    pub fn set_channels(&self, channels: serde_json::Value) {
        *self.channels.lock().unwrap() = serde_json::from_value(channels).unwrap();
    }

    pub fn push_delayed_channels(&self, delay: Duration, channels: serde_json::Value) {
        self.delayed_channels
            .lock()
            .unwrap()
            .push_back((delay, serde_json::from_value(channels).unwrap()));
    }

    pub fn fetches(&self) -> u32 {
        self.channel_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn fetch_channels(&self, _: &str) -> Result<Vec<ChannelResponse>, CoreError> {
        self.channel_fetches.fetch_add(1, Ordering::SeqCst);
        let delayed = self.delayed_channels.lock().unwrap().pop_front();
        if let Some((delay, channels)) = delayed {
            tokio::time::sleep(delay).await;
            return Ok(channels);
        }
        if self.fail_channels.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn join_channel(&self, _: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn mark_all_messages_as_read(&self, _: &str, _: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn search_mentionable_users(&self, _: &str, _: &str) -> Vec<MentionableUser> {
        Vec::new()
    }

    async fn get_zero_users(&self, ids: &[String]) -> Result<Vec<UserSearchResult>, CoreError> {
        Ok(self
            .zero_users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.matrix_id.as_ref().is_some_and(|m| ids.contains(m)))
            .cloned()
            .collect())
    }

    async fn fetch_messages(&self, _: &str, _: Option<i64>) -> Result<MessagesResponse, CoreError> {
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn send_message(
        &self,
        _: &str,
        message: &str,
        _: &[String],
    ) -> Result<MessageResponse, CoreError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.to_owned());
        Ok(serde_json::from_value(json!({
            "id": format!("srv-{}", sent.len()),
            "message": message,
            "createdAt": 1_700_000_000_000_i64,
            "sender": { "userId": "me" }
        }))
        .unwrap())
    }

    async fn edit_message(
        &self,
        _: &str,
        message_id: &str,
        message: &str,
        _: &[String],
    ) -> Result<(), CoreError> {
        self.edited
            .lock()
            .unwrap()
            .push((message_id.to_owned(), message.to_owned()));
        Ok(())
    }

    async fn delete_message(&self, _: &str, message_id: &str) -> Result<(), CoreError> {
        self.deleted.lock().unwrap().push(message_id.to_owned());
        Ok(())
    }

    async fn upload_file_message(
        &self,
        _: &str,
        file: UploadFile,
    ) -> Result<MediaResponse, CoreError> {
        Ok(MediaResponse {
            url: format!("https://cdn.example.com/{}", file.file_name),
            media_type: "file".into(),
            name: Some(file.file_name),
            ..MediaResponse::default()
        })
    }

    async fn get_link_preview(&self, url: &str) -> Result<LinkPreview, CoreError> {
        Ok(LinkPreview {
            url: url.to_owned(),
            ..LinkPreview::default()
        })
    }

    async fn nonce_or_authorize(
        &self,
        token: &SecretString,
    ) -> Result<NonceOrAuthorizeResponse, CoreError> {
        if token.expose_secret().is_empty() {
            return Err(CoreError::AuthenticationFailed {
                message: "empty token".into(),
            });
        }
        Ok(NonceOrAuthorizeResponse {
            nonce_token: self.nonce.lock().unwrap().clone(),
        })
    }

    async fn fetch_current_user(&self) -> Result<CurrentUserResponse, CoreError> {
        self.current_user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::AuthenticationFailed {
                message: "session expired".into(),
            })
    }

    async fn clear_session(&self) -> Result<(), CoreError> {
        self.cleared_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_user_profile(&self, request: &EditProfileRequest) -> Result<(), CoreError> {
        self.edited_profiles.lock().unwrap().push(request.clone());
        Ok(())
    }
}

// ── Chat SDK ─────────────────────────────────────────────────────────

pub(crate) struct FakeSdk {
    pub events: broadcast::Sender<SdkEvent>,
    pub reconnects: AtomicU32,
    pub uploads: Mutex<Vec<String>>,
    pub avatar: Mutex<Option<String>>,
    pub connected: Mutex<Option<String>>,
}

impl FakeSdk {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            reconnects: AtomicU32::new(0),
            uploads: Mutex::new(Vec::new()),
            avatar: Mutex::new(None),
            connected: Mutex::new(None),
        }
    }

    pub fn emit(&self, event: SdkEvent) {
        self.events.send(event).unwrap();
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatSdk for FakeSdk {
    async fn connect(&self, user_id: &str, _: &SecretString) -> Result<(), CoreError> {
        *self.connected.lock().unwrap() = Some(user_id.to_owned());
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), CoreError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }

    async fn fetch_room_event(
        &self,
        room_id: &str,
        event_id: &str,
    ) -> Result<Option<MatrixEvent>, CoreError> {
        Ok(Some(MatrixEvent {
            event_id: event_id.to_owned(),
            room_id: Some(room_id.to_owned()),
            sender: "@bob:zos".into(),
            origin_server_ts: 1,
            content: json!({ "body": "the parent" }),
        }))
    }

    async fn display_name(&self, _: &str) -> Option<String> {
        Some("Ada".into())
    }

    async fn upload_file(&self, file: UploadFile) -> Result<String, CoreError> {
        self.uploads.lock().unwrap().push(file.file_name);
        Ok("mxc://zos/avatar".into())
    }

    async fn download_file(&self, url: &str) -> Result<String, CoreError> {
        Ok(format!("blob:{url}"))
    }

    async fn set_avatar_url(&self, url: &str) -> Result<(), CoreError> {
        *self.avatar.lock().unwrap() = Some(url.to_owned());
        Ok(())
    }
}
