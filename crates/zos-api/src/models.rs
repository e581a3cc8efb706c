// Wire types for the zOS REST API.
//
// These mirror the JSON the server sends, field for field. Everything is
// optional-with-default because the server omits fields freely; the core
// crate converts these into canonical domain types.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept an identifier sent as either a JSON string or number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    }))
}

// ── Channels ────────────────────────────────────────────────────────

/// A chat channel as returned by `/networks/{id}/chatChannels`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unread_count: Option<u32>,
    #[serde(default)]
    pub has_joined: bool,
    #[serde(default)]
    pub group_channel_type: Option<String>,
    #[serde(default)]
    pub is_channel: Option<bool>,
    #[serde(default)]
    pub other_members: Vec<MemberResponse>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A channel member embedded in a channel payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: String,
    #[serde(default)]
    pub matrix_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub last_seen_at: Option<String>,
}

/// A user that may be @-mentioned in a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionableUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: String,
}

// ── Users ───────────────────────────────────────────────────────────

/// A user record from search or matrix-id lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub matrix_id: Option<String>,
    #[serde(default, rename = "primaryZID")]
    pub primary_zid: Option<String>,
    #[serde(default)]
    pub primary_wallet_address: Option<String>,
}

/// The authenticated user, from `/users/current`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub matrix_id: Option<String>,
    #[serde(default)]
    pub matrix_access_token: Option<String>,
    #[serde(default, rename = "primaryZID")]
    pub primary_zid: Option<String>,
    #[serde(default)]
    pub primary_wallet_address: Option<String>,
    #[serde(default)]
    pub profile_summary: Option<ProfileSummaryResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummaryResponse {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Body for `/users/edit-profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    pub name: String,
    #[serde(rename = "primaryZID", skip_serializing_if = "Option::is_none")]
    pub primary_zid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

// ── Authentication ──────────────────────────────────────────────────

/// `/authentication/nonceOrAuthorize` answers with a nonce when the
/// wallet is not yet registered, or with nothing when a session was set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceOrAuthorizeResponse {
    #[serde(default)]
    pub nonce_token: Option<String>,
}

// ── Messages ────────────────────────────────────────────────────────

/// One page of channel history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub sender: Option<SenderResponse>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub parent_message_id: Option<String>,
    #[serde(default)]
    pub parent_message_text: Option<String>,
    #[serde(default)]
    pub media: Option<MediaResponse>,
    #[serde(default)]
    pub mentioned_users: Vec<MentionedUserResponse>,
    #[serde(default)]
    pub optimistic_id: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub hide_preview: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderResponse {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub profile_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionedUserResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Uploaded media descriptor, returned by the upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub media_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Body for `POST /chatChannels/{id}/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    pub mentioned_user_ids: Vec<String>,
}

/// Metadata for a URL unfurl.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub preview_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_tolerates_missing_fields() {
        let ch: ChannelResponse = serde_json::from_value(json!({ "id": "c1" })).unwrap();
        assert_eq!(ch.id, "c1");
        assert_eq!(ch.name, "");
        assert_eq!(ch.unread_count, None);
        assert!(ch.other_members.is_empty());
    }

    #[test]
    fn numeric_message_ids_become_strings() {
        let msg: MessageResponse = serde_json::from_value(json!({
            "id": 8_675_309,
            "message": "hi",
            "createdAt": 1_700_000_000_000_i64,
            "parentMessageId": 42
        }))
        .unwrap();
        assert_eq!(msg.id, "8675309");
        assert_eq!(msg.parent_message_id.as_deref(), Some("42"));
    }

    #[test]
    fn edit_profile_omits_absent_image() {
        let body = serde_json::to_value(EditProfileRequest {
            name: "Ada".into(),
            primary_zid: Some("0://ada".into()),
            profile_image: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "name": "Ada", "primaryZID": "0://ada" }));
    }
}
