// ── Authentication slice ──

use crate::model::CurrentUser;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationState {
    pub user: Option<CurrentUser>,
    /// Registration nonce returned for a wallet with no account yet.
    pub nonce: Option<String>,
    pub is_loading: bool,
    pub is_first_time_login: bool,
    pub error: Option<String>,
}

impl AuthenticationState {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    SetUser(Option<CurrentUser>),
    SetNonce(Option<String>),
    SetLoading(bool),
    SetFirstTimeLogin(bool),
    SetError(Option<String>),
    /// Logged-out state.
    Clear,
}

pub(crate) fn reduce(state: &mut AuthenticationState, action: &AuthAction) -> bool {
    match action {
        AuthAction::SetUser(user) => replace(&mut state.user, user.clone()),
        AuthAction::SetNonce(nonce) => replace(&mut state.nonce, nonce.clone()),
        AuthAction::SetLoading(loading) => replace(&mut state.is_loading, *loading),
        AuthAction::SetFirstTimeLogin(first) => replace(&mut state.is_first_time_login, *first),
        AuthAction::SetError(error) => replace(&mut state.error, error.clone()),
        AuthAction::Clear => {
            let cleared = AuthenticationState {
                error: state.error.clone(),
                ..AuthenticationState::default()
            };
            replace(state, cleared)
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
