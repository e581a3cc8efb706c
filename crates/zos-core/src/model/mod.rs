// ── Domain model ──
//
// Typed views over normalized records. Records are plain JSON in the
// store; these structs are what selectors hand back to consumers.

pub mod channel;
pub mod message;
pub mod schemas;
pub mod user;

pub use channel::Channel;
pub use message::{Media, MentionedUser, Message, SendStatus, Sender};
pub use user::{CurrentUser, ProfileSummary, User};
