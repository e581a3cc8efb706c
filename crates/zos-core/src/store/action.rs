// ── Actions ──
//
// Everything that flows through `Store::dispatch`. State-changing actions
// are routed to slice reducers; `Request` and `Event` leave state alone and
// exist for the saga watchers that observe the action stream.

use secrecy::SecretString;

use crate::features::{AuthAction, ChatAction, MessagesAction, UserProfileAction};
use crate::normalized::Normalized;
use crate::store::list::ListAction;

#[derive(Debug, Clone)]
pub enum Action {
    Entities(EntityAction),
    ChannelsList(ListAction),
    ChannelMessages(ChannelMessagesAction),
    Authentication(AuthAction),
    Messages(MessagesAction),
    UserProfile(UserProfileAction),
    Chat(ChatAction),
    Request(Request),
    Event(AppEvent),
}

/// Direct writes to the entity tables, bypassing any list.
#[derive(Debug, Clone)]
pub enum EntityAction {
    /// Normalize and merge raw items of `kind`.
    Receive {
        kind: String,
        items: Vec<serde_json::Value>,
    },
    /// Merge a pre-normalized payload whose `result` keys are `kind`s.
    ReceiveNormalized { kind: String, payload: Normalized },
    /// Drop one entity and its key from every list of that kind.
    Remove { kind: String, key: String },
    /// Drop every entity of `kind` and clear every list of that kind.
    RemoveAll { kind: String },
}

/// Edits to one channel's ordered message keys. A channel that is not
/// stored is left alone.
#[derive(Debug, Clone)]
pub enum ChannelMessagesAction {
    /// Replace the whole order.
    Replace { channel_id: String, ids: Vec<String> },
    /// Put an older page in front.
    Prepend { channel_id: String, ids: Vec<String> },
    /// Add one key at the end unless already present.
    Append { channel_id: String, id: String },
    /// Put `to` where `from` was.
    Swap {
        channel_id: String,
        from: String,
        to: String,
    },
    Remove { channel_id: String, id: String },
}

impl ChannelMessagesAction {
    pub fn channel_id(&self) -> &str {
        match self {
            Self::Replace { channel_id, .. }
            | Self::Prepend { channel_id, .. }
            | Self::Append { channel_id, .. }
            | Self::Swap { channel_id, .. }
            | Self::Remove { channel_id, .. } => channel_id,
        }
    }
}

/// Saga triggers.
#[derive(Debug, Clone)]
pub enum Request {
    FetchChannels {
        network_id: String,
    },
    StartSyncChannels {
        network_id: String,
    },
    StopSyncChannels,
    NonceOrAuthorize {
        signed_web3_token: SecretString,
    },
    FetchCurrentUser,
    ClearSession,
    FetchMessages {
        channel_id: String,
        last_created_at: Option<i64>,
    },
    SendMessage {
        channel_id: String,
        message: String,
        mentioned_user_ids: Vec<String>,
    },
    EditMessage {
        channel_id: String,
        message_id: String,
        message: String,
        mentioned_user_ids: Vec<String>,
    },
    DeleteMessage {
        channel_id: String,
        message_id: String,
    },
    ReceiveSearchResults(Vec<zos_api::models::UserSearchResult>),
}

/// Facts published for other sagas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    UserLogin { user_id: String },
}

// ── Convenience constructors ─────────────────────────────────────────

impl From<ListAction> for Action {
    fn from(action: ListAction) -> Self {
        Self::ChannelsList(action)
    }
}

impl From<ChannelMessagesAction> for Action {
    fn from(action: ChannelMessagesAction) -> Self {
        Self::ChannelMessages(action)
    }
}

impl From<EntityAction> for Action {
    fn from(action: EntityAction) -> Self {
        Self::Entities(action)
    }
}

impl From<AuthAction> for Action {
    fn from(action: AuthAction) -> Self {
        Self::Authentication(action)
    }
}

impl From<MessagesAction> for Action {
    fn from(action: MessagesAction) -> Self {
        Self::Messages(action)
    }
}

impl From<UserProfileAction> for Action {
    fn from(action: UserProfileAction) -> Self {
        Self::UserProfile(action)
    }
}

impl From<ChatAction> for Action {
    fn from(action: ChatAction) -> Self {
        Self::Chat(action)
    }
}

impl From<Request> for Action {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}
