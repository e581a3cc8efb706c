// ── Root state and reducer ──

use serde_json::Value;

use crate::error::CoreError;
use crate::features::{
    AuthenticationState, ChatState, MessagesState, UserProfileState, authentication, chat,
    messages, user_profile,
};
use crate::model::schemas;
use crate::normalized::{
    NormalizedState, SchemaRegistry, check_roots, dedup_keys, normalize, validate_normalized,
};
use crate::store::action::{Action, ChannelMessagesAction, EntityAction};
use crate::store::list::{ListAction, ListOrdering, ListState};

/// The whole application state. Snapshots are shared as `Arc<RootState>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RootState {
    pub entities: NormalizedState,
    pub channels_list: ListState,
    pub authentication: AuthenticationState,
    pub messages: MessagesState,
    pub user_profile: UserProfileState,
    pub chat: ChatState,
}

impl Default for RootState {
    fn default() -> Self {
        Self {
            entities: NormalizedState::new(),
            channels_list: ListState::new(schemas::CHANNELS, ListOrdering::ReplaceOnReceive),
            authentication: AuthenticationState::default(),
            messages: MessagesState::default(),
            user_profile: UserProfileState::default(),
            chat: ChatState::default(),
        }
    }
}

impl RootState {
    fn lists_mut(&mut self) -> impl Iterator<Item = &mut ListState> {
        std::iter::once(&mut self.channels_list)
    }
}

/// Apply one action. Returns whether anything changed.
///
/// Validation (normalization, schema versions) runs before the first
/// write, so a rejected action leaves `state` untouched.
pub(crate) fn reduce(
    state: &mut RootState,
    registry: &SchemaRegistry,
    action: &Action,
) -> Result<bool, CoreError> {
    match action {
        Action::Entities(action) => reduce_entities(state, registry, action),
        Action::ChannelsList(action) => {
            reduce_list(&mut state.entities, &mut state.channels_list, registry, action)
        }
        Action::ChannelMessages(action) => Ok(reduce_channel_messages(&mut state.entities, action)),
        Action::Authentication(action) => {
            Ok(authentication::reduce(&mut state.authentication, action))
        }
        Action::Messages(action) => Ok(messages::reduce(&mut state.messages, action)),
        Action::UserProfile(action) => Ok(user_profile::reduce(&mut state.user_profile, action)),
        Action::Chat(action) => Ok(chat::reduce(&mut state.chat, action)),
        Action::Request(_) | Action::Event(_) => Ok(false),
    }
}

fn reduce_entities(
    state: &mut RootState,
    registry: &SchemaRegistry,
    action: &EntityAction,
) -> Result<bool, CoreError> {
    match action {
        EntityAction::Receive { kind, items } => {
            let payload = normalize(registry, kind, items)?;
            let changed = !payload.entities.is_empty();
            state.entities.merge(payload.entities);
            Ok(changed)
        }
        EntityAction::ReceiveNormalized { kind, payload } => {
            validate_normalized(registry, payload)?;
            check_roots(payload, kind, &state.entities)?;
            state.entities.merge(payload.entities.clone());
            Ok(!payload.entities.is_empty())
        }
        EntityAction::Remove { kind, key } => {
            let mut changed = state.entities.remove(kind, key).is_some();
            for list in state.lists_mut().filter(|l| l.kind == *kind) {
                changed |= list.remove_key(key);
            }
            Ok(changed)
        }
        EntityAction::RemoveAll { kind } => {
            let mut changed = state.entities.remove_kind(kind);
            for list in state.lists_mut().filter(|l| l.kind == *kind) {
                changed |= list.clear();
            }
            Ok(changed)
        }
    }
}

fn reduce_list(
    entities: &mut NormalizedState,
    list: &mut ListState,
    registry: &SchemaRegistry,
    action: &ListAction,
) -> Result<bool, CoreError> {
    match action {
        ListAction::Receive(items) => {
            let payload = normalize(registry, &list.kind, items)?;
            entities.merge(payload.entities);
            list.apply_keys(&payload.result);
            Ok(true)
        }
        ListAction::ReceiveNormalized(payload) => {
            validate_normalized(registry, payload)?;
            check_roots(payload, &list.kind, entities)?;
            entities.merge(payload.entities.clone());
            list.apply_keys(&payload.result);
            Ok(true)
        }
        ListAction::SetStatus(status) => Ok(list.set_status(*status)),
        ListAction::SetError(error) => Ok(list.set_error(error.clone())),
        ListAction::Reset => Ok(list.reset()),
    }
}

fn reduce_channel_messages(entities: &mut NormalizedState, action: &ChannelMessagesAction) -> bool {
    let channel_id = action.channel_id();
    let Some(channel) = entities.get(schemas::CHANNELS, channel_id) else {
        return false;
    };
    let current: Vec<String> = channel
        .get("messages")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default();

    let next = match action {
        ChannelMessagesAction::Replace { ids, .. } => dedup_keys(ids),
        ChannelMessagesAction::Prepend { ids, .. } => {
            let mut merged = ids.clone();
            merged.extend(current.iter().cloned());
            dedup_keys(&merged)
        }
        ChannelMessagesAction::Append { id, .. } => {
            let mut next = current.clone();
            if !next.contains(id) {
                next.push(id.clone());
            }
            next
        }
        ChannelMessagesAction::Swap { from, to, .. } => {
            let swapped: Vec<String> = current
                .iter()
                .map(|id| if id == from { to.clone() } else { id.clone() })
                .collect();
            dedup_keys(&swapped)
        }
        ChannelMessagesAction::Remove { id, .. } => {
            current.iter().filter(|k| *k != id).cloned().collect()
        }
    };

    next != current && entities.patch(schemas::CHANNELS, channel_id, "messages", Value::from(next))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::normalized::{EntityTables, NormalizeError, Normalized};
    use crate::store::list::AsyncListStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn apply(state: &mut RootState, action: impl Into<Action>) -> bool {
        let registry = schemas::registry().unwrap();
        reduce(state, &registry, &action.into()).unwrap()
    }

    #[test]
    fn receive_is_last_write_wins_per_key() {
        let mut state = RootState::default();
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c1", "unreadCount": 2 })]));
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c1", "unreadCount": 0 })]));

        let c1 = state.entities.get("channels", "c1").unwrap();
        assert_eq!(c1["unreadCount"], json!(0));
        assert_eq!(state.channels_list.keys, vec!["c1".to_owned()]);
    }

    #[test]
    fn overlapping_receives_keep_each_key_once() {
        let mut state = RootState::default();
        apply(
            &mut state,
            ListAction::Receive(vec![json!({ "id": "a" }), json!({ "id": "b" })]),
        );
        apply(
            &mut state,
            ListAction::Receive(vec![json!({ "id": "b", "name": "B" }), json!({ "id": "a" })]),
        );

        assert_eq!(state.channels_list.keys, vec!["b".to_owned(), "a".to_owned()]);
        assert_eq!(state.entities.get("channels", "b").unwrap()["name"], json!("B"));
        for key in &state.channels_list.keys {
            assert!(state.entities.contains("channels", key));
        }
    }

    #[test]
    fn remove_all_only_touches_its_kind() {
        let mut state = RootState::default();
        apply(
            &mut state,
            ListAction::Receive(vec![json!({
                "id": "c1",
                "otherMembers": [{ "userId": "u1" }]
            })]),
        );

        apply(
            &mut state,
            EntityAction::RemoveAll {
                kind: "channels".into(),
            },
        );

        assert_eq!(state.entities.len("channels"), 0);
        assert!(state.channels_list.keys.is_empty());
        assert!(state.entities.contains("users", "u1"));
    }

    #[test]
    fn rejected_receive_leaves_state_untouched() {
        let mut state = RootState::default();
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c1" })]));
        let before = state.clone();

        let registry = schemas::registry().unwrap();
        let result = reduce(
            &mut state,
            &registry,
            &ListAction::Receive(vec![json!({ "id": "c2" }), json!({ "id": "c3", "nope": 1 })])
                .into(),
        );

        assert!(matches!(result, Err(CoreError::Normalize(_))));
        assert_eq!(state, before);
    }

    fn channel_tables(ids: &[&str]) -> crate::normalized::EntityTables {
        let table: std::collections::HashMap<String, crate::normalized::Record> = ids
            .iter()
            .map(|id| {
                let record = json!({ "id": id }).as_object().cloned().unwrap();
                ((*id).to_owned(), record)
            })
            .collect();
        [("channels".to_owned(), table)].into_iter().collect()
    }

    #[test]
    fn receive_normalized_merges_and_orders() {
        let registry = schemas::registry().unwrap();
        let mut state = RootState::default();
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c0", "name": "kept" })]));

        let payload = Normalized::from_tables(
            &registry,
            vec!["c1".into(), "c0".into()],
            channel_tables(&["c1"]),
        );
        apply(&mut state, ListAction::ReceiveNormalized(payload));

        assert_eq!(state.channels_list.keys, vec!["c1".to_owned(), "c0".to_owned()]);
        assert_eq!(state.entities.get("channels", "c0").unwrap()["name"], json!("kept"));
    }

    #[test]
    fn receive_normalized_rejects_roots_without_entities() {
        let registry = schemas::registry().unwrap();
        let mut state = RootState::default();
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c1" })]));
        let before = state.clone();

        let ghost = Normalized::from_tables(&registry, vec!["ghost".into()], EntityTables::new());
        let result = reduce(&mut state, &registry, &ListAction::ReceiveNormalized(ghost).into());
        assert!(matches!(
            result,
            Err(CoreError::Normalize(NormalizeError::DanglingRoot { ref key, .. })) if key == "ghost"
        ));

        let partial = Normalized::from_tables(
            &registry,
            vec!["c2".into(), "c3".into()],
            channel_tables(&["c2"]),
        );
        let result = reduce(
            &mut state,
            &registry,
            &EntityAction::ReceiveNormalized {
                kind: "channels".into(),
                payload: partial,
            }
            .into(),
        );
        assert!(result.is_err());
        assert_eq!(state, before);
    }

    fn message_ids(state: &RootState) -> Value {
        state.entities.get("channels", "c1").unwrap()["messages"].clone()
    }

    #[test]
    fn channel_message_edits_apply_in_order() {
        let mut state = RootState::default();
        apply(&mut state, ListAction::Receive(vec![json!({ "id": "c1", "messages": ["m2"] })]));

        apply(
            &mut state,
            ChannelMessagesAction::Prepend {
                channel_id: "c1".into(),
                ids: vec!["m1".into(), "m2".into()],
            },
        );
        assert_eq!(message_ids(&state), json!(["m1", "m2"]));

        apply(
            &mut state,
            ChannelMessagesAction::Append {
                channel_id: "c1".into(),
                id: "opt".into(),
            },
        );
        apply(
            &mut state,
            ChannelMessagesAction::Swap {
                channel_id: "c1".into(),
                from: "opt".into(),
                to: "m3".into(),
            },
        );
        assert_eq!(message_ids(&state), json!(["m1", "m2", "m3"]));

        apply(
            &mut state,
            ChannelMessagesAction::Remove {
                channel_id: "c1".into(),
                id: "m2".into(),
            },
        );
        assert_eq!(message_ids(&state), json!(["m1", "m3"]));

        apply(
            &mut state,
            ChannelMessagesAction::Replace {
                channel_id: "c1".into(),
                ids: vec!["m9".into()],
            },
        );
        assert_eq!(message_ids(&state), json!(["m9"]));
    }

    #[test]
    fn channel_message_edits_skip_unknown_channels() {
        let mut state = RootState::default();
        let changed = apply(
            &mut state,
            ChannelMessagesAction::Append {
                channel_id: "elsewhere".into(),
                id: "m1".into(),
            },
        );
        assert!(!changed);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn remove_drops_key_from_list() {
        let mut state = RootState::default();
        apply(
            &mut state,
            ListAction::Receive(vec![json!({ "id": "a" }), json!({ "id": "b" })]),
        );
        apply(
            &mut state,
            EntityAction::Remove {
                kind: "channels".into(),
                key: "a".into(),
            },
        );
        assert_eq!(state.channels_list.keys, vec!["b".to_owned()]);
        assert!(!state.entities.contains("channels", "a"));
    }

    #[test]
    fn stopped_list_survives_late_idle() {
        let mut state = RootState::default();
        apply(&mut state, ListAction::SetStatus(AsyncListStatus::Stopped));
        assert!(!apply(&mut state, ListAction::SetStatus(AsyncListStatus::Idle)));
        assert_eq!(state.channels_list.status, AsyncListStatus::Stopped);
    }
}
