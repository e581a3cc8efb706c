// ── Users ──

use std::collections::HashSet;

use tracing::{debug, info, warn};
use zos_api::UploadFile;
use zos_api::models::{EditProfileRequest, UserSearchResult};

use crate::convert;
use crate::error::CoreError;
use crate::features::AuthAction;
use crate::model::schemas::USERS;
use crate::model::{CurrentUser, User};
use crate::runtime::Runtime;
use crate::storage::PROFILE_IMAGE_KEY;
use crate::store::EntityAction;

/// Store search hits for users not seen before. Profile images are
/// resolved through the chat SDK when one is attached.
pub async fn receive_search_results(
    rt: &Runtime,
    results: &[UserSearchResult],
) -> Result<Vec<User>, CoreError> {
    let existing: HashSet<String> = rt.store().user_ids().into_iter().collect();

    let mut users: Vec<User> = results
        .iter()
        .filter(|r| !existing.contains(&r.id))
        .map(convert::user_from_search_result)
        .collect();

    for user in &mut users {
        if let Some(image) = user.profile_image.take() {
            user.profile_image = Some(resolve_image(rt, image).await);
        }
    }

    if !users.is_empty() {
        let items = users
            .iter()
            .map(convert::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        rt.dispatch(EntityAction::Receive {
            kind: USERS.into(),
            items,
        })?;
    }
    debug!(received = users.len(), skipped = results.len() - users.len(), "search results stored");
    Ok(users)
}

/// Look a user up by Matrix id: the store first, then the API. API hits
/// are returned but not stored.
pub async fn user_by_matrix_id(rt: &Runtime, matrix_id: &str) -> Result<Option<User>, CoreError> {
    if let Some(user) = rt.store().user_by_matrix_id(matrix_id) {
        return Ok(Some(user));
    }
    let found = rt.api().get_zero_users(&[matrix_id.to_owned()]).await?;
    Ok(found.first().map(convert::user_from_search_result))
}

/// After login, make the current user's profile image loadable.
///
/// On a first-time login the image picked during registration is pushed
/// from the local cache first.
pub async fn fetch_current_user_profile_image(rt: &Runtime) -> Result<(), CoreError> {
    let Some(mut user) = rt.store().current_user() else {
        return Ok(());
    };

    let image_url = if rt.store().snapshot().authentication.is_first_time_login {
        update_user_profile_image_from_cache(rt, &user).await?
    } else {
        user.profile_summary
            .as_ref()
            .and_then(|s| s.profile_image.clone())
    };

    let Some(image_url) = image_url.filter(|u| !u.is_empty()) else {
        return Ok(());
    };

    let resolved = resolve_image(rt, image_url).await;
    user.profile_summary.get_or_insert_with(Default::default).profile_image = Some(resolved);
    rt.dispatch(AuthAction::SetUser(Some(user)))
}

/// Upload the cached registration image and attach it to the profile.
///
/// Returns the uploaded URL once the profile edit succeeded, `None` when
/// there is nothing cached or no chat SDK to upload through.
pub async fn update_user_profile_image_from_cache(
    rt: &Runtime,
    user: &CurrentUser,
) -> Result<Option<String>, CoreError> {
    let Some(bytes) = rt.kv().get(PROFILE_IMAGE_KEY).await? else {
        return Ok(None);
    };
    let Some(chat) = rt.chat() else {
        debug!("no chat sdk attached, cached profile image left in place");
        return Ok(None);
    };

    let url = chat
        .sdk()
        .upload_file(UploadFile {
            file_name: PROFILE_IMAGE_KEY.to_owned(),
            mime_type: None,
            bytes,
        })
        .await?;

    let request = EditProfileRequest {
        name: user
            .profile_summary
            .as_ref()
            .map(|s| s.first_name.clone())
            .unwrap_or_default(),
        primary_zid: user.primary_zid.clone(),
        profile_image: Some(url.clone()).filter(|u| !u.is_empty()),
    };
    if let Err(e) = rt.api().edit_user_profile(&request).await {
        warn!(error = %e, "profile image not saved after registration");
        return Ok(None);
    }

    chat.sdk().set_avatar_url(&url).await?;
    info!("registration profile image uploaded");
    Ok(Some(url))
}

async fn resolve_image(rt: &Runtime, url: String) -> String {
    let Some(chat) = rt.chat() else {
        return url;
    };
    match chat.sdk().download_file(&url).await {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!(url, error = %e, "image left unresolved");
            url
        }
    }
}
