// ── Chat facade ──
//
// Owns the translation from SDK events to `RealtimeEvent`s and drives
// reconnects with bounded exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{ChatSdk, RealtimeEvent, SdkEvent, map_matrix_message};
use crate::config::ReconnectConfig;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct ChatFacade {
    sdk: Arc<dyn ChatSdk>,
    prefix: String,
    reconnect: ReconnectConfig,
    events: broadcast::Sender<RealtimeEvent>,
}

impl ChatFacade {
    pub fn new(sdk: Arc<dyn ChatSdk>, prefix: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sdk,
            prefix: prefix.into(),
            reconnect,
            events,
        }
    }

    pub fn sdk(&self) -> &Arc<dyn ChatSdk> {
        &self.sdk
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.events.subscribe()
    }

    /// Application channel id for an SDK channel URL. Only a leading
    /// prefix is stripped.
    pub fn channel_id<'a>(&self, channel_url: &'a str) -> &'a str {
        channel_url
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(channel_url)
    }

    /// SDK channel URL for an application channel id.
    pub fn channel_url(&self, channel_id: &str) -> String {
        format!("{}{channel_id}", self.prefix)
    }

    /// Start translating SDK events until `cancel` fires.
    ///
    /// The SDK subscription is taken before this returns, so nothing the
    /// SDK emits afterwards is missed.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let rx = self.sdk.subscribe();
        let worker = Worker {
            sdk: Arc::clone(&self.sdk),
            prefix: self.prefix.clone(),
            reconnect: self.reconnect.clone(),
            events: self.events.clone(),
        };
        tokio::spawn(worker.run(rx, cancel))
    }
}

struct Worker {
    sdk: Arc<dyn ChatSdk>,
    prefix: String,
    reconnect: ReconnectConfig,
    events: broadcast::Sender<RealtimeEvent>,
}

impl Worker {
    async fn run(self, mut rx: broadcast::Receiver<SdkEvent>, cancel: CancellationToken) {
        let mut failures: u32 = 0;
        let mut gave_up = false;
        let mut retry_at: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    retry_at = None;
                    debug!(attempt = failures, "requesting chat reconnect");
                    if let Err(e) = self.sdk.reconnect().await {
                        warn!(error = %e, "chat reconnect request failed");
                    }
                }
                received = rx.recv() => match received {
                    Ok(SdkEvent::ReconnectStarted) => self.emit(RealtimeEvent::ReconnectStart),
                    Ok(SdkEvent::ReconnectSucceeded) => {
                        failures = 0;
                        gave_up = false;
                        retry_at = None;
                        self.emit(RealtimeEvent::ReconnectStop);
                    }
                    Ok(SdkEvent::ReconnectFailed) => {
                        if gave_up || retry_at.is_some() {
                            continue;
                        }
                        if failures >= self.reconnect.max_retries {
                            warn!(failures, "chat reconnect budget exhausted");
                            gave_up = true;
                            self.emit(RealtimeEvent::ReconnectGaveUp);
                            continue;
                        }
                        let delay = calculate_backoff(failures, &self.reconnect);
                        info!(attempt = failures + 1, delay_ms = delay.as_millis(), "chat reconnect scheduled");
                        failures += 1;
                        retry_at = Some(Instant::now() + delay);
                    }
                    Ok(SdkEvent::MessageReceived { channel_url, is_group_channel, event }) => {
                        if !is_group_channel {
                            trace!(channel_url, "ignoring message outside group channels");
                            continue;
                        }
                        let message = map_matrix_message(self.sdk.as_ref(), &channel_url, &event).await;
                        self.emit(RealtimeEvent::MessageReceived {
                            channel_id: self.strip(&channel_url),
                            message,
                        });
                    }
                    Ok(SdkEvent::MessageDeleted { channel_url, message_id }) => {
                        self.emit(RealtimeEvent::MessageDeleted {
                            channel_id: self.strip(&channel_url),
                            message_id: message_id.trim().to_owned(),
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "chat event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("chat sdk event stream closed");
                        break;
                    }
                },
            }
        }
    }

    fn strip(&self, channel_url: &str) -> String {
        channel_url
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(channel_url)
            .to_owned()
    }

    fn emit(&self, event: RealtimeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Exponential backoff with deterministic jitter:
/// `min(initial * 2^attempt, max) * (1 + 0.25 * sin(attempt * 7.3))`.
#[allow(clippy::cast_possible_wrap, clippy::as_conversions)]
pub fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = attempt.min(30) as i32;
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
