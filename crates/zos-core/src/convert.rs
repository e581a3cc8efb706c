// ── Wire → domain conversion ──
//
// REST responses become either typed domain values or flat JSON records
// ready for `receive`. Records carry only fields the schemas declare.

use serde::Serialize;
use serde_json::{Map, Value, json};
use zos_api::models::{
    ChannelResponse, CurrentUserResponse, MediaResponse, MemberResponse, MessageResponse,
    ProfileSummaryResponse, UserSearchResult,
};

use crate::error::CoreError;
use crate::model::user::sub_handle;
use crate::model::{CurrentUser, Media, MentionedUser, Message, ProfileSummary, Sender, User};

// ── Channels ─────────────────────────────────────────────────────────

/// Channel record for a full list fetch. `groupChannelType` is only set
/// when the server sent one.
pub fn channel_record(channel: &ChannelResponse) -> Value {
    let mut record = channel_base(channel);
    if let Some(count) = channel.unread_count {
        record.insert("unreadCount".into(), json!(count));
    }
    if let Some(kind) = channel.group_channel_type.as_deref().filter(|k| !k.is_empty()) {
        record.insert("groupChannelType".into(), json!(kind));
    }
    if let Some(is_channel) = channel.is_channel {
        record.insert("isChannel".into(), json!(is_channel));
    }
    if let Some(created_at) = channel.created_at {
        record.insert("createdAt".into(), json!(created_at));
    }
    if !channel.other_members.is_empty() {
        let members = channel.other_members.iter().map(member_record).collect();
        record.insert("otherMembers".into(), Value::Array(members));
    }
    Value::Object(record)
}

/// Channel record for an unread-count refresh. A missing count means zero.
pub fn unread_count_record(channel: &ChannelResponse) -> Value {
    let mut record = channel_base(channel);
    record.insert("unreadCount".into(), json!(channel.unread_count.unwrap_or(0)));
    Value::Object(record)
}

fn channel_base(channel: &ChannelResponse) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("id".into(), json!(channel.id));
    record.insert("name".into(), json!(channel.name));
    insert_opt(&mut record, "icon", channel.icon.as_deref());
    insert_opt(&mut record, "category", channel.category.as_deref());
    record.insert("hasJoined".into(), json!(channel.has_joined));
    record
}

// ── Users ────────────────────────────────────────────────────────────

pub fn member_record(member: &MemberResponse) -> Value {
    let mut record = Map::new();
    record.insert("userId".into(), json!(member.user_id));
    insert_opt(&mut record, "matrixId", member.matrix_id.as_deref());
    insert_opt(&mut record, "firstName", member.first_name.as_deref());
    insert_opt(&mut record, "lastName", member.last_name.as_deref());
    insert_opt(&mut record, "profileImage", member.profile_image.as_deref());
    insert_opt(&mut record, "profileId", member.profile_id.as_deref());
    if let Some(online) = member.is_online {
        record.insert("isOnline".into(), json!(online));
    }
    insert_opt(&mut record, "lastSeenAt", member.last_seen_at.as_deref());
    Value::Object(record)
}

/// A search hit as a stored user.
pub fn user_from_search_result(result: &UserSearchResult) -> User {
    User {
        user_id: result.id.clone(),
        matrix_id: result.matrix_id.clone(),
        first_name: result.name.clone(),
        profile_image: result.profile_image.clone(),
        primary_zid: result.primary_zid.clone(),
        primary_wallet_address: result.primary_wallet_address.clone(),
        display_sub_handle: Some(sub_handle(
            result.primary_zid.as_deref(),
            result.primary_wallet_address.as_deref(),
        )),
        ..User::default()
    }
}

pub fn current_user(response: CurrentUserResponse) -> CurrentUser {
    CurrentUser {
        id: response.id,
        profile_id: response.profile_id,
        matrix_id: response.matrix_id,
        matrix_access_token: response.matrix_access_token,
        primary_zid: response.primary_zid,
        primary_wallet_address: response.primary_wallet_address,
        profile_summary: response.profile_summary.map(profile_summary),
    }
}

fn profile_summary(summary: ProfileSummaryResponse) -> ProfileSummary {
    ProfileSummary {
        first_name: summary.first_name,
        last_name: summary.last_name,
        profile_image: summary.profile_image,
    }
}

// ── Messages ─────────────────────────────────────────────────────────

pub fn message(response: MessageResponse) -> Message {
    let sender = response.sender.unwrap_or_default();
    Message {
        id: response.id,
        message: response.message.unwrap_or_default(),
        created_at: response.created_at,
        updated_at: response.updated_at,
        sender: Sender {
            user_id: sender.user_id,
            first_name: sender.first_name,
            last_name: sender.last_name,
            profile_image: sender.profile_image,
            profile_id: sender.profile_id,
        },
        parent_message_id: response.parent_message_id,
        parent_message_text: response.parent_message_text,
        media: response.media.map(media),
        mentioned_users: response
            .mentioned_users
            .into_iter()
            .map(|u| MentionedUser { id: u.id, name: u.name })
            .collect(),
        optimistic_id: response.optimistic_id,
        is_admin: response.is_admin,
        hide_preview: response.hide_preview,
        send_status: None,
    }
}

pub fn media(response: MediaResponse) -> Media {
    Media {
        url: response.url,
        media_type: response.media_type,
        name: response.name,
        width: response.width,
        height: response.height,
    }
}

/// Serialize a typed value into a record for `receive`.
pub fn to_record<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    Ok(serde_json::to_value(value)?)
}

fn insert_opt(record: &mut Map<String, Value>, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        record.insert(field.to_owned(), json!(value));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::schemas;
    use crate::normalized::normalize;
    use pretty_assertions::assert_eq;

    fn channel(json: Value) -> ChannelResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn group_channel_type_only_when_present() {
        let with = channel_record(&channel(json!({
            "id": "c1", "name": "general", "groupChannelType": "private", "unreadCount": 3
        })));
        let without = channel_record(&channel(json!({ "id": "c2", "name": "random" })));

        assert_eq!(with["groupChannelType"], json!("private"));
        assert_eq!(with["unreadCount"], json!(3));
        assert!(without.get("groupChannelType").is_none());
        assert!(without.get("unreadCount").is_none());
        assert!(without.get("icon").is_none());
    }

    #[test]
    fn unread_count_defaults_to_zero() {
        let record = unread_count_record(&channel(json!({ "id": "c1", "name": "general" })));
        assert_eq!(record["unreadCount"], json!(0));
        assert!(record.get("groupChannelType").is_none());
    }

    #[test]
    fn records_fit_the_default_schemas() {
        let registry = schemas::registry().unwrap();
        let record = channel_record(&channel(json!({
            "id": "c1",
            "name": "general",
            "isChannel": true,
            "createdAt": 5,
            "otherMembers": [{ "userId": "u1", "firstName": "Ada", "isOnline": true }]
        })));
        let normalized = normalize(&registry, schemas::CHANNELS, &[record]).unwrap();
        assert_eq!(normalized.result, vec!["c1".to_owned()]);
        assert!(normalized.entities["users"].contains_key("u1"));

        let msg = message(
            serde_json::from_value(json!({
                "id": 7,
                "message": "hi",
                "createdAt": 1,
                "sender": { "userId": "u1", "firstName": "Ada" },
                "media": { "url": "https://cdn/x.png", "type": "image" }
            }))
            .unwrap(),
        );
        let normalized = normalize(&registry, schemas::MESSAGES, &[to_record(&msg).unwrap()]).unwrap();
        assert_eq!(normalized.result, vec!["7".to_owned()]);
    }

    #[test]
    fn search_results_get_a_sub_handle() {
        let user = user_from_search_result(&UserSearchResult {
            id: "u1".into(),
            name: "Ada".into(),
            primary_wallet_address: Some("0x1234567890abcdef".into()),
            ..UserSearchResult::default()
        });
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.display_sub_handle.as_deref(), Some("0x1234...cdef"));
    }
}
