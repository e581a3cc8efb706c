// ── Runtime ──
//
// Owns the store, the REST and chat seams, and every background task.
// `start()` spawns the action watcher that turns `Request`s into saga
// runs, plus the chat facade and its bridge into the store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zos_api::transport::{TlsMode, TransportConfig};
use zos_api::RestClient;

use crate::chat::{ChatFacade, ChatSdk, RealtimeEvent};
use crate::config::{RuntimeConfig, TlsVerification};
use crate::error::CoreError;
use crate::features::ChatAction;
use crate::model::CurrentUser;
use crate::remote::RemoteApi;
use crate::saga::{self, report};
use crate::storage::{DirKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use crate::store::{Action, AppEvent, Request, Store};

/// Cheaply cloneable handle to a running client.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    config: RuntimeConfig,
    store: Arc<Store>,
    api: Arc<dyn RemoteApi>,
    chat: Option<ChatFacade>,
    kv: Arc<dyn KeyValueStore>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Token of the live instance of each latest-wins routine.
    latest: Mutex<HashMap<String, CancellationToken>>,
    started: std::sync::atomic::AtomicBool,
}

impl Runtime {
    /// Build a runtime talking to the configured API over HTTP. Nothing
    /// runs until [`start()`](Self::start).
    pub fn new(config: RuntimeConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api = RestClient::new(config.api_url.clone(), &transport)?;
        let kv: Arc<dyn KeyValueStore> = match config.cache_dir {
            Some(ref dir) => Arc::new(DirKeyValueStore::new(dir.clone())),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        Self::with_parts(config, Arc::new(api), None, kv)
    }

    /// Build a runtime from explicit collaborators.
    pub fn with_parts(
        config: RuntimeConfig,
        api: Arc<dyn RemoteApi>,
        chat: Option<Arc<dyn ChatSdk>>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        let store = Arc::new(Store::with_default_schemas()?);
        let chat = chat.map(|sdk| {
            ChatFacade::new(sdk, config.channel_prefix.clone(), config.reconnect.clone())
        });
        Ok(Self {
            inner: Arc::new(RuntimeInner {
                config,
                store,
                api,
                chat,
                kv,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                latest: Mutex::new(HashMap::new()),
                started: std::sync::atomic::AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    pub fn api(&self) -> &Arc<dyn RemoteApi> {
        &self.inner.api
    }

    pub fn chat(&self) -> Option<&ChatFacade> {
        self.inner.chat.as_ref()
    }

    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.kv
    }

    /// Shorthand for `store().dispatch(..)`.
    pub fn dispatch(&self, action: impl Into<Action>) -> Result<(), CoreError> {
        self.inner.store.dispatch(action)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the action watcher and, when a chat SDK is attached, the
    /// real-time bridge. Calling it again is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        use std::sync::atomic::Ordering;

        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Shutdown);
        }
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut handles = self.inner.task_handles.lock().await;

        let Some(triggers) = self.inner.store.take_triggers() else {
            return Err(CoreError::Internal("saga triggers already taken".into()));
        };
        handles.push(tokio::spawn(action_watcher_task(
            self.clone(),
            triggers,
            self.inner.cancel.child_token(),
        )));

        if let Some(ref chat) = self.inner.chat {
            let events = chat.subscribe();
            handles.push(chat.spawn(self.inner.cancel.child_token()));
            handles.push(tokio::spawn(realtime_task(
                self.clone(),
                events,
                self.inner.cancel.child_token(),
            )));
        }

        info!("runtime started");
        Ok(())
    }

    /// Cancel every background task and wait for them to finish.
    ///
    /// In-flight requests complete first; loops exit at their next
    /// pause.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.latest.lock().await.clear();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        debug!("runtime shut down");
    }

    /// Run `f` against a fresh runtime without background tasks, then
    /// shut it down.
    pub async fn oneshot<F, Fut, T>(config: RuntimeConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Runtime) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let runtime = Runtime::new(config)?;
        let result = f(runtime.clone()).await;
        runtime.shutdown().await;
        result
    }

    /// Connect the chat SDK as `user`, when both an SDK and Matrix
    /// credentials are available.
    pub async fn connect_chat(&self, user: &CurrentUser) -> Result<(), CoreError> {
        let Some(ref chat) = self.inner.chat else {
            return Ok(());
        };
        let (Some(matrix_id), Some(token)) = (&user.matrix_id, &user.matrix_access_token) else {
            debug!(user_id = %user.id, "no matrix credentials, chat not connected");
            return Ok(());
        };
        chat.sdk()
            .connect(matrix_id, &SecretString::from(token.clone()))
            .await
    }

    // ── Task spawning ────────────────────────────────────────────────

    /// Run `f` as the only live instance of `routine`: the previous
    /// instance's token is cancelled first.
    async fn take_latest<F, Fut>(&self, routine: impl Into<String>, f: F)
    where
        F: FnOnce(Runtime, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.inner.cancel.child_token();
        let routine = routine.into();
        if let Some(previous) = self
            .inner
            .latest
            .lock()
            .await
            .insert(routine.clone(), token.clone())
        {
            debug!(routine, "superseding running instance");
            previous.cancel();
        }
        self.track(tokio::spawn(f(self.clone(), token))).await;
    }

    /// Run `f` alongside any other instances.
    async fn take_every<F, Fut>(&self, f: F)
    where
        F: FnOnce(Runtime, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.inner.cancel.child_token();
        self.track(tokio::spawn(f(self.clone(), token))).await;
    }

    async fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    async fn route(&self, action: Action) {
        match action {
            Action::Request(request) => self.route_request(request).await,
            Action::Event(AppEvent::UserLogin { .. }) => {
                self.take_latest("users.profile_image", |rt, _| async move {
                    report(
                        "fetch current user profile image",
                        saga::users::fetch_current_user_profile_image(&rt).await,
                    );
                })
                .await;
            }
            _ => {}
        }
    }

    async fn route_request(&self, request: Request) {
        match request {
            Request::FetchChannels { network_id } => {
                self.take_latest("channels.fetch", |rt, cancel| async move {
                    report(
                        "fetch channels",
                        saga::channels_list::fetch_channels_unless_cancelled(
                            &rt,
                            &network_id,
                            &cancel,
                        )
                        .await,
                    );
                })
                .await;
            }
            Request::StartSyncChannels { network_id } => {
                self.take_latest("channels.sync", |rt, cancel| async move {
                    saga::channels_list::start_sync_channels(&rt, &network_id, &cancel).await;
                })
                .await;
            }
            Request::StopSyncChannels => {
                self.take_latest("channels.stop", |rt, _| async move {
                    report("stop sync channels", saga::channels_list::stop_sync_channels(&rt));
                })
                .await;
            }
            Request::NonceOrAuthorize { signed_web3_token } => {
                self.take_latest("auth.nonce_or_authorize", |rt, _| async move {
                    report(
                        "nonce or authorize",
                        saga::authentication::nonce_or_authorize(&rt, &signed_web3_token).await,
                    );
                })
                .await;
            }
            Request::FetchCurrentUser => {
                self.take_latest("auth.current_user", |rt, _| async move {
                    report(
                        "get current user",
                        saga::authentication::get_current_user(&rt).await,
                    );
                })
                .await;
            }
            Request::ClearSession => {
                self.take_latest("auth.clear_session", |rt, _| async move {
                    report("clear session", saga::authentication::clear_session(&rt).await);
                })
                .await;
            }
            Request::FetchMessages {
                channel_id,
                last_created_at,
            } => {
                let routine = format!("messages.fetch.{channel_id}");
                self.take_latest(routine, |rt, cancel| async move {
                    report(
                        "fetch messages",
                        saga::messages::fetch_messages_unless_cancelled(
                            &rt,
                            &channel_id,
                            last_created_at,
                            &cancel,
                        )
                        .await,
                    );
                })
                .await;
            }
            Request::SendMessage {
                channel_id,
                message,
                mentioned_user_ids,
            } => {
                self.take_every(|rt, _| async move {
                    report(
                        "send message",
                        saga::messages::send_message(&rt, &channel_id, &message, &mentioned_user_ids)
                            .await,
                    );
                })
                .await;
            }
            Request::EditMessage {
                channel_id,
                message_id,
                message,
                mentioned_user_ids,
            } => {
                self.take_every(|rt, _| async move {
                    report(
                        "edit message",
                        saga::messages::edit_message(
                            &rt,
                            &channel_id,
                            &message_id,
                            &message,
                            &mentioned_user_ids,
                        )
                        .await,
                    );
                })
                .await;
            }
            Request::DeleteMessage {
                channel_id,
                message_id,
            } => {
                self.take_every(|rt, _| async move {
                    report(
                        "delete message",
                        saga::messages::delete_message(&rt, &channel_id, &message_id).await,
                    );
                })
                .await;
            }
            Request::ReceiveSearchResults(results) => {
                self.take_every(|rt, _| async move {
                    report(
                        "receive search results",
                        saga::users::receive_search_results(&rt, &results).await,
                    );
                })
                .await;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        api: Arc<dyn RemoteApi>,
        chat: Option<Arc<crate::testing::FakeSdk>>,
    ) -> Self {
        let config = RuntimeConfig::new(
            url::Url::parse("http://zos.test").unwrap_or_else(|e| panic!("{e}")),
        );
        let chat = chat.map(|sdk| sdk as Arc<dyn ChatSdk>);
        Self::with_parts(config, api, chat, Arc::new(MemoryKeyValueStore::new()))
            .unwrap_or_else(|e| panic!("{e}"))
    }
}

/// Translate runtime TLS settings into the transport's.
fn build_transport(config: &RuntimeConfig) -> TransportConfig {
    let tls = match config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(ref path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    TransportConfig {
        tls,
        timeout: config.timeout,
        cookie_jar: None,
        access_token: config.access_token.clone(),
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Route dispatched requests and events to sagas until cancelled.
async fn action_watcher_task(
    runtime: Runtime,
    mut triggers: mpsc::UnboundedReceiver<Action>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = triggers.recv() => match received {
                Some(action) => runtime.route(action).await,
                None => break,
            },
        }
    }
}

/// Apply real-time chat events to the store.
async fn realtime_task(
    runtime: Runtime,
    mut events: broadcast::Receiver<RealtimeEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime bridge lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        let result = match event {
            RealtimeEvent::ReconnectStart => runtime.dispatch(ChatAction::ReconnectStarted),
            RealtimeEvent::ReconnectStop => runtime.dispatch(ChatAction::ReconnectStopped),
            RealtimeEvent::ReconnectGaveUp => runtime.dispatch(ChatAction::ReconnectGaveUp),
            RealtimeEvent::MessageReceived {
                channel_id,
                message,
            } => saga::messages::receive_new_message(&runtime, &channel_id, &message),
            RealtimeEvent::MessageDeleted {
                channel_id,
                message_id,
            } => saga::messages::receive_delete_message(&runtime, &channel_id, &message_id),
        };
        report("realtime event", result);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::chat::{MatrixEvent, SdkEvent};
    use crate::store::AsyncListStatus;
    use crate::testing::{FakeApi, FakeSdk};

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn requests_run_their_sagas() {
        let api = Arc::new(FakeApi::default());
        api.set_channels(json!([{ "id": "c1", "name": "general" }]));
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.start().await.unwrap();

        rt.dispatch(Request::FetchChannels {
            network_id: "n1".into(),
        })
        .unwrap();
        settle().await;

        assert_eq!(rt.store().channels_list().len(), 1);
        rt.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_superseded_fetch_does_not_overwrite_the_newer_list() {
        let api = Arc::new(FakeApi::default());
        api.push_delayed_channels(
            Duration::from_millis(500),
            json!([{ "id": "old1" }, { "id": "old2" }]),
        );
        api.push_delayed_channels(Duration::from_millis(10), json!([{ "id": "new1" }]));
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.start().await.unwrap();

        let fetch = || Request::FetchChannels {
            network_id: "n1".into(),
        };
        rt.dispatch(fetch()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        rt.dispatch(fetch()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(api.fetches(), 2);
        assert_eq!(rt.store().snapshot().channels_list.keys, vec!["new1".to_owned()]);
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Idle);
        rt.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_not_lost_behind_busy_state_traffic() {
        let api = Arc::new(FakeApi::default());
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.start().await.unwrap();

        rt.dispatch(Request::FetchChannels {
            network_id: "n1".into(),
        })
        .unwrap();
        for i in 0..300 {
            rt.dispatch(crate::features::AuthAction::SetLoading(i % 2 == 0)).unwrap();
        }
        settle().await;

        assert_eq!(api.fetches(), 1);
        rt.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sync_stops_on_request_and_on_shutdown() {
        let api = Arc::new(FakeApi::default());
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.start().await.unwrap();

        rt.dispatch(Request::StartSyncChannels {
            network_id: "n1".into(),
        })
        .unwrap();
        settle().await;
        assert_eq!(api.fetches(), 1);

        rt.dispatch(Request::StopSyncChannels).unwrap();
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert_eq!(api.fetches(), 1);
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Stopped);

        rt.shutdown().await;
        assert!(rt.start().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_sync_supersedes_the_previous_loop() {
        let api = Arc::new(FakeApi::default());
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, None);
        rt.start().await.unwrap();

        for _ in 0..2 {
            rt.dispatch(Request::StartSyncChannels {
                network_id: "n1".into(),
            })
            .unwrap();
            settle().await;
        }
        assert_eq!(api.fetches(), 2);

        // Only one loop is left polling.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.fetches(), 3);
        rt.shutdown().await;
    }

    #[tokio::test]
    async fn realtime_events_reach_the_store() {
        let api = Arc::new(FakeApi::default());
        let sdk = Arc::new(FakeSdk::new());
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn RemoteApi>, Some(Arc::clone(&sdk)));
        rt.dispatch(crate::store::ListAction::Receive(vec![json!({ "id": "c1", "name": "general" })]))
            .unwrap();
        rt.start().await.unwrap();
        let mut states = rt.store().subscribe();

        sdk.emit(SdkEvent::ReconnectStarted);
        let state = states.changed().await.unwrap();
        assert!(state.chat.is_reconnecting);

        sdk.emit(SdkEvent::MessageReceived {
            channel_url: "sendbird_group_channel_c1".into(),
            is_group_channel: true,
            event: MatrixEvent {
                event_id: "$e1".into(),
                sender: "@ada:zos".into(),
                origin_server_ts: 5,
                content: json!({ "body": "hello" }),
                ..MatrixEvent::default()
            },
        });
        loop {
            let state = states.changed().await.unwrap();
            if state.entities.contains("messages", "$e1") {
                break;
            }
        }
        assert_eq!(rt.store().channel_message_ids("c1"), vec!["$e1"]);

        rt.shutdown().await;
    }
}
