// ── Authentication ──

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::CoreError;
use crate::features::AuthAction;
use crate::model::CurrentUser;
use crate::model::schemas::{CHANNELS, MESSAGES, USERS};
use crate::runtime::Runtime;
use crate::saga::channels_list;
use crate::store::{Action, AppEvent, EntityAction};

/// What a signed wallet token led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No account yet; registration continues with this nonce.
    Nonce(String),
    LoggedIn(Box<CurrentUser>),
}

/// Exchange a signed Web3 token for either a registration nonce or a
/// session, loading the current user in the latter case.
pub async fn nonce_or_authorize(
    rt: &Runtime,
    signed_web3_token: &SecretString,
) -> Result<AuthOutcome, CoreError> {
    let response = rt.api().nonce_or_authorize(signed_web3_token).await?;

    match response.nonce_token.filter(|n| !n.is_empty()) {
        Some(nonce) => {
            debug!("wallet has no account yet, storing registration nonce");
            rt.dispatch(AuthAction::SetNonce(Some(nonce.clone())))?;
            Ok(AuthOutcome::Nonce(nonce))
        }
        None => get_current_user(rt)
            .await
            .map(|user| AuthOutcome::LoggedIn(Box::new(user))),
    }
}

/// Load the session's user.
///
/// While loading the slice holds no user. A failure leaves the logged-out
/// state with the error recorded.
pub async fn get_current_user(rt: &Runtime) -> Result<CurrentUser, CoreError> {
    rt.dispatch(AuthAction::SetUser(None))?;
    rt.dispatch(AuthAction::SetLoading(true))?;

    let user = match rt.api().fetch_current_user().await {
        Ok(response) => convert::current_user(response),
        Err(e) => {
            warn!(error = %e, "could not load current user");
            rt.dispatch(AuthAction::Clear)?;
            rt.dispatch(AuthAction::SetError(Some(e.to_string())))?;
            return Err(e);
        }
    };

    rt.dispatch(AuthAction::SetUser(Some(user.clone())))?;
    rt.dispatch(AuthAction::SetLoading(false))?;
    rt.dispatch(AuthAction::SetError(None))?;
    info!(user_id = %user.id, "logged in");

    if let Err(e) = rt.connect_chat(&user).await {
        warn!(error = %e, "chat connection failed");
    }
    rt.dispatch(Action::Event(AppEvent::UserLogin {
        user_id: user.id.clone(),
    }))?;
    Ok(user)
}

/// End the session: server first, then every trace of the user locally.
///
/// Local state is cleared even when the server call fails; that failure
/// is still returned.
pub async fn clear_session(rt: &Runtime) -> Result<(), CoreError> {
    let remote = rt.api().clear_session().await;
    if let Err(ref e) = remote {
        warn!(error = %e, "server session not cleared");
    }

    rt.dispatch(AuthAction::Clear)?;
    rt.dispatch(AuthAction::SetError(None))?;
    channels_list::stop_sync_channels(rt)?;
    for kind in [CHANNELS, MESSAGES, USERS] {
        rt.dispatch(EntityAction::RemoveAll { kind: kind.into() })?;
    }
    info!("session cleared");
    remote
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use serde_json::json;
    use zos_api::models::CurrentUserResponse;

    use super::*;
    use crate::store::{AsyncListStatus, ListAction};
    use crate::testing::FakeApi;

    fn token() -> SecretString {
        SecretString::from("signed".to_owned())
    }

    fn ada() -> CurrentUserResponse {
        serde_json::from_value(json!({
            "id": "u1",
            "matrixId": "@ada:zos",
            "profileSummary": { "firstName": "Ada", "lastName": "Lovelace" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn nonce_is_stored_for_new_wallets() {
        let api = Arc::new(FakeApi::default());
        *api.nonce.lock().unwrap() = Some("n-123".into());
        let rt = Runtime::for_tests(api, None);

        let outcome = nonce_or_authorize(&rt, &token()).await.unwrap();

        assert_eq!(outcome, AuthOutcome::Nonce("n-123".into()));
        let auth = rt.store().snapshot().authentication.clone();
        assert_eq!(auth.nonce.as_deref(), Some("n-123"));
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn existing_account_loads_user_and_publishes_login() {
        let api = Arc::new(FakeApi::default());
        *api.current_user.lock().unwrap() = Some(ada());
        let rt = Runtime::for_tests(api, None);
        let mut actions = rt.store().actions();

        let outcome = nonce_or_authorize(&rt, &token()).await.unwrap();

        assert!(matches!(outcome, AuthOutcome::LoggedIn(ref u) if u.id == "u1"));
        let auth = rt.store().snapshot().authentication.clone();
        assert!(auth.is_logged_in());
        assert!(!auth.is_loading);

        let mut saw_login = false;
        while let Ok(action) = actions.try_recv() {
            if let Action::Event(AppEvent::UserLogin { user_id }) = action {
                assert_eq!(user_id, "u1");
                saw_login = true;
            }
        }
        assert!(saw_login);
    }

    #[tokio::test]
    async fn failed_user_fetch_is_logged_out_with_error() {
        let api = Arc::new(FakeApi::default());
        let rt = Runtime::for_tests(api, None);

        let err = get_current_user(&rt).await.unwrap_err();

        assert!(err.is_auth_failure());
        let auth = rt.store().snapshot().authentication.clone();
        assert!(!auth.is_logged_in());
        assert!(!auth.is_loading);
        assert!(auth.error.is_some());
    }

    #[tokio::test]
    async fn clear_session_wipes_user_data() {
        let api = Arc::new(FakeApi::default());
        *api.current_user.lock().unwrap() = Some(ada());
        api.set_channels(json!([{ "id": "c1", "name": "general", "otherMembers": [{ "userId": "u2" }] }]));
        let rt = Runtime::for_tests(Arc::clone(&api) as Arc<dyn crate::remote::RemoteApi>, None);
        get_current_user(&rt).await.unwrap();
        channels_list::fetch_channels(&rt, "n1").await.unwrap();

        clear_session(&rt).await.unwrap();

        let state = rt.store().snapshot();
        assert!(!state.authentication.is_logged_in());
        assert_eq!(state.channels_list.status, AsyncListStatus::Stopped);
        assert!(state.channels_list.keys.is_empty());
        assert_eq!(state.entities.len(CHANNELS), 0);
        assert_eq!(state.entities.len(USERS), 0);
        assert_eq!(api.cleared_sessions.load(Ordering::SeqCst), 1);

        // A fresh login can sync again.
        rt.dispatch(ListAction::Reset).unwrap();
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Idle);
    }
}
