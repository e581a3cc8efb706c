// ── Chat connection slice ──

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    pub is_reconnecting: bool,
    /// Set once the reconnect budget is exhausted; cleared by a success.
    pub gave_up: bool,
}

#[derive(Debug, Clone)]
pub enum ChatAction {
    ReconnectStarted,
    ReconnectStopped,
    ReconnectGaveUp,
}

pub(crate) fn reduce(state: &mut ChatState, action: &ChatAction) -> bool {
    let next = match action {
        ChatAction::ReconnectStarted => ChatState {
            is_reconnecting: true,
            gave_up: state.gave_up,
        },
        ChatAction::ReconnectStopped => ChatState {
            is_reconnecting: false,
            gave_up: false,
        },
        ChatAction::ReconnectGaveUp => ChatState {
            is_reconnecting: false,
            gave_up: true,
        },
    };
    if *state == next {
        return false;
    }
    *state = next;
    true
}
