// ── User domain types ──

use serde::{Deserialize, Serialize};

/// Fields accepted by the `users` schema.
pub(crate) const FIELDS: &[&str] = &[
    "userId",
    "matrixId",
    "firstName",
    "lastName",
    "profileImage",
    "profileId",
    "isOnline",
    "lastSeenAt",
    "primaryZID",
    "primaryWalletAddress",
    "displaySubHandle",
];

/// A user as stored in the `users` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(rename = "primaryZID", skip_serializing_if = "Option::is_none")]
    pub primary_zid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_sub_handle: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Secondary handle shown under a user's name: the ZERO ID when present,
/// otherwise an abbreviated wallet address.
pub fn sub_handle(primary_zid: Option<&str>, wallet_address: Option<&str>) -> String {
    if let Some(zid) = primary_zid.filter(|z| !z.is_empty()) {
        return zid.to_owned();
    }
    match wallet_address {
        Some(addr) if addr.len() > 10 && addr.is_char_boundary(6) => {
            let tail_start = addr.len() - 4;
            if addr.is_char_boundary(tail_start) {
                format!("{}...{}", &addr[..6], &addr[tail_start..])
            } else {
                addr.to_owned()
            }
        }
        Some(addr) => addr.to_owned(),
        None => String::new(),
    }
}

/// Name and avatar attached to the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSummary {
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
}

/// The logged-in user, held by the authentication slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentUser {
    pub id: String,
    pub profile_id: Option<String>,
    pub matrix_id: Option<String>,
    #[serde(skip_serializing)]
    pub matrix_access_token: Option<String>,
    #[serde(rename = "primaryZID")]
    pub primary_zid: Option<String>,
    pub primary_wallet_address: Option<String>,
    pub profile_summary: Option<ProfileSummary>,
}
