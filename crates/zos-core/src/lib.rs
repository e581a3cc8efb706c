//! Client core for zOS: a normalized entity store, the sagas that keep it
//! in sync with the zOS API, and a facade over the real-time chat SDK.
//!
//! - **[`Runtime`]**: Owns the [`Store`], the REST seam ([`RemoteApi`]),
//!   the optional chat facade, and every background task.
//!   [`start()`](Runtime::start) spawns the action watcher that runs sagas
//!   for dispatched [`Request`]s; [`Runtime::oneshot()`] runs a single
//!   routine without background tasks for CLI invocations.
//!
//! - **[`Store`]**: One `watch` channel of `Arc<RootState>`. Every action
//!   is reduced atomically; subscribers get whole snapshots through
//!   [`StateStream`].
//!
//! - **Normalization** ([`normalized`]): versioned entity schemas,
//!   `normalize` / `denormalize`, and field-by-field merging.
//!
//! - **Sagas** ([`saga`]): channel list sync, authentication, users and
//!   messages, as plain async functions.
//!
//! - **Chat** ([`chat`]): the [`ChatSdk`] trait and [`ChatFacade`], which
//!   maps SDK events into application shapes and bounds reconnects.

pub mod chat;
pub mod config;
pub mod convert;
pub mod error;
pub mod features;
pub mod model;
pub mod normalized;
pub mod remote;
pub mod runtime;
pub mod saga;
pub mod storage;
pub mod store;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use chat::{ChatFacade, ChatSdk, MatrixEvent, RealtimeEvent, SdkEvent};
pub use config::{ReconnectConfig, RuntimeConfig, TlsVerification};
pub use error::CoreError;
pub use remote::RemoteApi;
pub use runtime::Runtime;
pub use storage::{DirKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{
    Action, AppEvent, AsyncListStatus, ChannelMessagesAction, EntityAction, ListAction, Request,
    RootState, Store,
};
pub use stream::StateStream;

pub use model::{Channel, CurrentUser, Media, Message, SendStatus, Sender, User};
