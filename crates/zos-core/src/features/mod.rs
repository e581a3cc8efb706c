// ── Feature slices ──
//
// Each slice owns a narrow piece of `RootState` and a pure reducer that
// reports whether the action changed anything.

pub mod authentication;
pub mod chat;
pub mod messages;
pub mod user_profile;

pub use authentication::{AuthAction, AuthenticationState};
pub use chat::{ChatAction, ChatState};
pub use messages::{MessagesAction, MessagesState};
pub use user_profile::{Stage, UserProfileAction, UserProfileState};
