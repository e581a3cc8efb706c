// ── Messages slice ──
//
// Message bodies live in the `messages` table and are ordered per channel
// through the channel's `messages` relation. This slice only tracks what
// is in flight and the last failure.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagesState {
    pub error: Option<String>,
    /// Optimistic ids of messages awaiting the server's copy.
    pub sending: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub enum MessagesAction {
    SetError(Option<String>),
    SendStarted(String),
    SendFinished(String),
}

pub(crate) fn reduce(state: &mut MessagesState, action: &MessagesAction) -> bool {
    match action {
        MessagesAction::SetError(error) => {
            if state.error == *error {
                return false;
            }
            state.error.clone_from(error);
            true
        }
        MessagesAction::SendStarted(id) => state.sending.insert(id.clone()),
        MessagesAction::SendFinished(id) => state.sending.remove(id),
    }
}
