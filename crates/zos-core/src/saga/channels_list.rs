// ── Channels list synchronization ──

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zos_api::models::ChannelResponse;

use crate::convert;
use crate::error::CoreError;
use crate::runtime::Runtime;
use crate::store::{AsyncListStatus, ListAction};

/// One-shot fetch of a network's channels.
///
/// The list restarts from `Idle` (leaving a previous `Stopped`), goes
/// `Fetching`, and is back to `Idle` afterwards whether or not the fetch
/// succeeded. A failure is recorded on the list and returned.
pub async fn fetch_channels(rt: &Runtime, network_id: &str) -> Result<(), CoreError> {
    fetch_channels_unless_cancelled(rt, network_id, &CancellationToken::new()).await
}

/// [`fetch_channels`] for a latest-wins caller: a response that arrives
/// after `cancel` fired is dropped, leaving the list to the newer fetch.
pub async fn fetch_channels_unless_cancelled(
    rt: &Runtime,
    network_id: &str,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    rt.dispatch(ListAction::Reset)?;
    fetch_and_receive(rt, network_id, convert::channel_record, cancel).await
}

/// One unread-count cycle: fetch and merge, with missing counts as zero.
pub async fn unread_count_updated(rt: &Runtime, network_id: &str) -> Result<(), CoreError> {
    fetch_and_receive(rt, network_id, convert::unread_count_record, &CancellationToken::new()).await
}

/// Reset the list, then poll unread counts until the list is stopped or
/// `cancel` fires.
pub async fn start_sync_channels(rt: &Runtime, network_id: &str, cancel: &CancellationToken) {
    if let Err(e) = rt.dispatch(ListAction::Reset) {
        warn!(error = %e, "could not reset channels list");
        return;
    }
    sync_unread_count(rt, network_id, cancel).await;
}

/// Poll unread counts every `sync_interval`.
///
/// Stop and cancellation are checked at the top of each cycle and during
/// the pause between cycles, never in the middle of a fetch. A failed
/// cycle is logged and the loop carries on.
pub async fn sync_unread_count(rt: &Runtime, network_id: &str, cancel: &CancellationToken) {
    let interval = rt.config().sync_interval;
    info!(network_id, interval_secs = interval.as_secs(), "channel sync started");

    loop {
        if cancel.is_cancelled() || rt.store().channels_list_status() == AsyncListStatus::Stopped {
            break;
        }

        if let Err(e) =
            fetch_and_receive(rt, network_id, convert::unread_count_record, cancel).await
        {
            warn!(network_id, error = %e, "unread count sync failed");
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    info!(network_id, "channel sync stopped");
}

/// Ask a running sync loop to stop. It exits at its next boundary.
pub fn stop_sync_channels(rt: &Runtime) -> Result<(), CoreError> {
    rt.dispatch(ListAction::SetStatus(AsyncListStatus::Stopped))
}

async fn fetch_and_receive(
    rt: &Runtime,
    network_id: &str,
    to_record: fn(&ChannelResponse) -> Value,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    rt.dispatch(ListAction::SetStatus(AsyncListStatus::Fetching))?;

    let fetched = rt.api().fetch_channels(network_id).await;
    if cancel.is_cancelled() {
        debug!(network_id, "superseded channel fetch dropped");
        return Ok(());
    }
    let channels = match fetched {
        Ok(channels) => channels,
        Err(e) => {
            warn!(network_id, error = %e, "channel fetch failed");
            rt.dispatch(ListAction::SetError(Some(e.to_string())))?;
            rt.dispatch(ListAction::SetStatus(AsyncListStatus::Idle))?;
            return Err(e);
        }
    };
    debug!(network_id, count = channels.len(), "channels fetched");

    let records = channels.iter().map(to_record).collect();
    let received = rt.dispatch(ListAction::Receive(records));
    rt.dispatch(ListAction::SetError(received.as_ref().err().map(ToString::to_string)))?;
    rt.dispatch(ListAction::SetStatus(AsyncListStatus::Idle))?;
    received
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::remote::RemoteApi;
    use crate::testing::FakeApi;

    fn runtime(api: &Arc<FakeApi>) -> Runtime {
        Runtime::for_tests(Arc::clone(api) as Arc<dyn RemoteApi>, None)
    }

    #[tokio::test]
    async fn fetch_receives_and_returns_to_idle() {
        let api = Arc::new(FakeApi::default());
        api.set_channels(json!([
            { "id": "c1", "name": "general", "unreadCount": 2, "groupChannelType": "private" },
            { "id": "c2", "name": "random" }
        ]));
        let rt = runtime(&api);

        fetch_channels(&rt, "n1").await.unwrap();

        let state = rt.store().snapshot();
        assert_eq!(state.channels_list.keys, vec!["c1".to_owned(), "c2".to_owned()]);
        assert_eq!(state.channels_list.status, AsyncListStatus::Idle);
        let c1 = rt.store().channel("c1").unwrap();
        assert_eq!(c1.unread_count, 2);
        assert_eq!(c1.group_channel_type.as_deref(), Some("private"));
        assert_eq!(rt.store().channel("c2").unwrap().group_channel_type, None);
    }

    #[tokio::test]
    async fn fetch_failure_records_error_and_resets_status() {
        let api = Arc::new(FakeApi::default());
        api.fail_channels.store(true, Ordering::SeqCst);
        let rt = runtime(&api);

        assert!(fetch_channels(&rt, "n1").await.is_err());

        let state = rt.store().snapshot();
        assert_eq!(state.channels_list.status, AsyncListStatus::Idle);
        assert!(state.channels_list.error.is_some());
        assert!(state.channels_list.keys.is_empty());
    }

    #[tokio::test]
    async fn cancelled_fetch_keeps_the_newer_list() {
        let api = Arc::new(FakeApi::default());
        api.set_channels(json!([{ "id": "new1" }]));
        let rt = runtime(&api);
        fetch_channels(&rt, "n1").await.unwrap();

        api.set_channels(json!([{ "id": "old1" }, { "id": "old2" }]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        fetch_channels_unless_cancelled(&rt, "n1", &cancel).await.unwrap();

        assert_eq!(rt.store().snapshot().channels_list.keys, vec!["new1".to_owned()]);
        assert!(rt.store().channel("old1").is_none());
    }

    #[tokio::test]
    async fn unread_cycle_defaults_missing_counts() {
        let api = Arc::new(FakeApi::default());
        api.set_channels(json!([{ "id": "c1", "name": "general", "unreadCount": 4 }]));
        let rt = runtime(&api);
        unread_count_updated(&rt, "n1").await.unwrap();
        assert_eq!(rt.store().channel("c1").unwrap().unread_count, 4);

        api.set_channels(json!([{ "id": "c1", "name": "general" }]));
        unread_count_updated(&rt, "n1").await.unwrap();
        assert_eq!(rt.store().channel("c1").unwrap().unread_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_runs_each_interval_until_stopped() {
        let api = Arc::new(FakeApi::default());
        api.set_channels(json!([{ "id": "c1", "name": "general" }]));
        let rt = runtime(&api);
        let cancel = CancellationToken::new();

        let task = {
            let rt = rt.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { start_sync_channels(&rt, "n1", &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.fetches(), 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.fetches(), 2);

        stop_sync_channels(&rt).unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(task.is_finished());
        assert_eq!(api.fetches(), 2);
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_survives_failed_cycles() {
        let api = Arc::new(FakeApi::default());
        api.fail_channels.store(true, Ordering::SeqCst);
        let rt = runtime(&api);
        let cancel = CancellationToken::new();

        let task = {
            let rt = rt.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { sync_unread_count(&rt, "n1", &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(api.fetches(), 3);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stop_before_start_is_undone_by_fetch() {
        let api = Arc::new(FakeApi::default());
        let rt = runtime(&api);
        stop_sync_channels(&rt).unwrap();
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Stopped);

        fetch_channels(&rt, "n1").await.unwrap();
        assert_eq!(rt.store().channels_list_status(), AsyncListStatus::Idle);
    }
}
