// ── Application store ──
//
// The single shared mutable resource. Every mutation runs a reducer inside
// `watch::Sender::send_if_modified`, so each action is applied atomically
// and in order; subscribers see whole snapshots, never a partial update.
// After a successful reduce, `Request`s and `Event`s are queued for the
// saga watcher on an unbounded channel, and every action is broadcast to
// observers.

pub mod action;
pub mod list;
mod state;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::trace;

use crate::error::CoreError;
use crate::model::schemas::{self, CHANNELS, MESSAGES, USERS};
use crate::model::{Channel, CurrentUser, Message, User};
use crate::normalized::{SchemaRegistry, denormalize};
use crate::stream::StateStream;

pub use action::{Action, AppEvent, ChannelMessagesAction, EntityAction, Request};
pub use list::{AsyncListStatus, ListAction, ListOrdering, ListState};
pub use state::RootState;

const ACTION_CHANNEL_SIZE: usize = 256;

pub struct Store {
    registry: SchemaRegistry,
    state: watch::Sender<Arc<RootState>>,
    actions: broadcast::Sender<Action>,
    triggers: mpsc::UnboundedSender<Action>,
    trigger_rx: Mutex<Option<mpsc::UnboundedReceiver<Action>>>,
}

impl Store {
    /// Create a store over `registry`. Schema problems surface when the
    /// registry is built, before any store exists.
    pub fn new(registry: SchemaRegistry) -> Self {
        let (state, _) = watch::channel(Arc::new(RootState::default()));
        let (actions, _) = broadcast::channel(ACTION_CHANNEL_SIZE);
        let (triggers, trigger_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            state,
            actions,
            triggers,
            trigger_rx: Mutex::new(Some(trigger_rx)),
        }
    }

    /// A store over the built-in channel/user/message schemas.
    pub fn with_default_schemas() -> Result<Self, CoreError> {
        Ok(Self::new(schemas::registry()?))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Reduce `action` into the state, then publish it to watchers.
    ///
    /// A rejected action (unknown field, version mismatch) is neither
    /// applied nor published.
    pub fn dispatch(&self, action: impl Into<Action>) -> Result<(), CoreError> {
        let action = action.into();
        let mut outcome = Ok(());

        let modified = self.state.send_if_modified(|current| {
            match state::reduce(Arc::make_mut(current), &self.registry, &action) {
                Ok(changed) => changed,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome?;

        if !modified {
            trace!(?action, "action left state unchanged");
        }
        if matches!(action, Action::Request(_) | Action::Event(_)) {
            // Queued until a watcher takes the receiver.
            let _ = self.triggers.send(action.clone());
        }
        // No observers is fine; oneshot callers never subscribe.
        let _ = self.actions.send(action);
        Ok(())
    }

    // ── Observation ──────────────────────────────────────────────────

    /// The current state.
    pub fn snapshot(&self) -> Arc<RootState> {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// Follow dispatched actions. Lossy: a slow observer skips actions.
    pub fn actions(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }

    /// Every `Request` and `Event` dispatched so far and from now on.
    /// Only the first caller gets the receiver.
    pub fn take_triggers(&self) -> Option<mpsc::UnboundedReceiver<Action>> {
        self.trigger_rx.lock().ok()?.take()
    }

    // ── Selectors ────────────────────────────────────────────────────

    /// Denormalize `kind`/`key` into `T`. `None` if the entity is absent
    /// or does not fit `T`.
    pub fn denormalize_as<T: DeserializeOwned>(&self, kind: &str, key: &str) -> Option<T> {
        let snapshot = self.snapshot();
        let value = denormalize(&self.registry, &snapshot.entities, kind, key)?;
        serde_json::from_value(value).ok()
    }

    /// The ordered channel list.
    pub fn channels_list(&self) -> Vec<Channel> {
        let snapshot = self.snapshot();
        snapshot
            .channels_list
            .keys
            .iter()
            .filter_map(|id| self.denormalize_as(CHANNELS, id))
            .collect()
    }

    pub fn channels_list_status(&self) -> AsyncListStatus {
        self.state.borrow().channels_list.status
    }

    pub fn channel(&self, id: &str) -> Option<Channel> {
        self.denormalize_as(CHANNELS, id)
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.denormalize_as(USERS, user_id)
    }

    pub fn message(&self, id: &str) -> Option<Message> {
        self.denormalize_as(MESSAGES, id)
    }

    pub fn user_by_matrix_id(&self, matrix_id: &str) -> Option<User> {
        let snapshot = self.snapshot();
        let table = snapshot.entities.table(USERS)?;
        let key = table.iter().find_map(|(key, record)| {
            (record.get("matrixId").and_then(|v| v.as_str()) == Some(matrix_id)).then_some(key)
        })?;
        self.user(key)
    }

    /// Ids of every stored user.
    pub fn user_ids(&self) -> Vec<String> {
        self.snapshot()
            .entities
            .table(USERS)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Message keys of a channel, oldest first.
    pub fn channel_message_ids(&self, channel_id: &str) -> Vec<String> {
        self.snapshot()
            .entities
            .get(CHANNELS, channel_id)
            .and_then(|c| c.get("messages"))
            .and_then(|v| v.as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state.borrow().authentication.user.clone()
    }
}
