// ── Ordered list state ──
//
// A list-consuming feature owns an ordered sequence of keys into one
// entity kind, plus the status of its synchronization.

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::trace;

use crate::normalized::dedup_keys;

/// Lifecycle of a synchronized list.
///
/// `Stopped` is terminal: only [`ListAction::Reset`] leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AsyncListStatus {
    #[default]
    Idle,
    Fetching,
    Stopped,
}

/// How a `receive` updates the key order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrdering {
    /// Keys not yet present are appended; existing positions are kept.
    #[default]
    AppendUnique,
    /// The latest received order replaces the previous one.
    ReplaceOnReceive,
}

/// Actions addressed to a list slice.
#[derive(Debug, Clone)]
pub enum ListAction {
    /// Normalize raw items of the list's kind, merge them, update order.
    Receive(Vec<serde_json::Value>),
    /// Merge an already normalized payload; `result` drives the order.
    ReceiveNormalized(crate::normalized::Normalized),
    SetStatus(AsyncListStatus),
    SetError(Option<String>),
    /// Back to `Idle` with no error, from any status.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub kind: String,
    pub keys: Vec<String>,
    pub status: AsyncListStatus,
    pub error: Option<String>,
    pub ordering: ListOrdering,
    /// Number of `Fetching` to `Idle` transitions so far.
    pub completed_fetches: u64,
}

impl ListState {
    pub fn new(kind: impl Into<String>, ordering: ListOrdering) -> Self {
        Self {
            kind: kind.into(),
            keys: Vec::new(),
            status: AsyncListStatus::Idle,
            error: None,
            ordering,
            completed_fetches: 0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.status == AsyncListStatus::Stopped
    }

    pub(crate) fn set_status(&mut self, status: AsyncListStatus) -> bool {
        if self.status == status {
            return false;
        }
        if self.is_stopped() {
            trace!(kind = %self.kind, %status, "list is stopped, ignoring status change");
            return false;
        }
        if self.status == AsyncListStatus::Fetching && status == AsyncListStatus::Idle {
            self.completed_fetches += 1;
        }
        self.status = status;
        true
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) -> bool {
        if self.error == error {
            return false;
        }
        self.error = error;
        true
    }

    pub(crate) fn reset(&mut self) -> bool {
        let changed = self.status != AsyncListStatus::Idle || self.error.is_some();
        self.status = AsyncListStatus::Idle;
        self.error = None;
        changed
    }

    /// Fold freshly received root keys into the order.
    pub(crate) fn apply_keys(&mut self, received: &[String]) {
        match self.ordering {
            ListOrdering::ReplaceOnReceive => self.keys = dedup_keys(received),
            ListOrdering::AppendUnique => {
                for key in received {
                    if !self.keys.contains(key) {
                        self.keys.push(key.clone());
                    }
                }
            }
        }
    }

    pub(crate) fn remove_key(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    pub(crate) fn clear(&mut self) -> bool {
        let changed = !self.keys.is_empty();
        self.keys.clear();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ks: &[&str]) -> Vec<String> {
        ks.iter().map(|k| (*k).to_owned()).collect()
    }

    #[test]
    fn stopped_ignores_other_statuses_until_reset() {
        let mut list = ListState::new("channels", ListOrdering::ReplaceOnReceive);
        assert!(list.set_status(AsyncListStatus::Stopped));
        assert!(!list.set_status(AsyncListStatus::Fetching));
        assert!(!list.set_status(AsyncListStatus::Idle));
        assert_eq!(list.status, AsyncListStatus::Stopped);

        assert!(list.reset());
        assert_eq!(list.status, AsyncListStatus::Idle);
        assert!(list.set_status(AsyncListStatus::Fetching));
    }

    #[test]
    fn only_finished_fetches_are_counted() {
        let mut list = ListState::new("channels", ListOrdering::ReplaceOnReceive);
        list.set_status(AsyncListStatus::Fetching);
        list.set_status(AsyncListStatus::Idle);
        assert_eq!(list.completed_fetches, 1);

        list.set_status(AsyncListStatus::Fetching);
        list.set_status(AsyncListStatus::Stopped);
        list.reset();
        assert_eq!(list.completed_fetches, 1);

        list.set_status(AsyncListStatus::Fetching);
        list.set_status(AsyncListStatus::Idle);
        assert_eq!(list.completed_fetches, 2);
    }

    #[test]
    fn append_unique_keeps_positions() {
        let mut list = ListState::new("users", ListOrdering::AppendUnique);
        list.apply_keys(&keys(&["a", "b"]));
        list.apply_keys(&keys(&["c", "a"]));
        assert_eq!(list.keys, keys(&["a", "b", "c"]));
    }

    #[test]
    fn replace_on_receive_takes_latest_order() {
        let mut list = ListState::new("channels", ListOrdering::ReplaceOnReceive);
        list.apply_keys(&keys(&["a", "b"]));
        list.apply_keys(&keys(&["c", "a", "c"]));
        assert_eq!(list.keys, keys(&["c", "a"]));
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(AsyncListStatus::Fetching.to_string(), "fetching");
        assert_eq!("stopped".parse::<AsyncListStatus>().ok(), Some(AsyncListStatus::Stopped));
    }
}
