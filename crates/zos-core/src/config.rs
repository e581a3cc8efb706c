// ── Runtime configuration ──
//
// These types describe how to reach the zOS API and how the background
// routines pace themselves. They carry credentials but never touch disk;
// the CLI builds a `RuntimeConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Interval between unread-count sync cycles.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Channel-id prefix the chat SDK uses for group channels.
pub const DEFAULT_CHANNEL_PREFIX: &str = "sendbird_group_channel_";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development servers).
    DangerAcceptInvalid,
}

/// Exponential backoff for chat reconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect request. Default: 1s.
    pub initial_delay: Duration,
    /// Upper bound on any single delay. Default: 30s.
    pub max_delay: Duration,
    /// Consecutive failures tolerated before giving up. Default: 10.
    pub max_retries: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: 10,
        }
    }
}

/// Everything a [`Runtime`](crate::Runtime) needs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// API root, e.g. `https://zosapi.zero.tech`.
    pub api_url: Url,
    /// Bearer token attached to every request, if any.
    pub access_token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Network whose channels are listed and synced.
    pub network_id: Option<String>,
    /// Pause between unread-count sync cycles.
    pub sync_interval: Duration,
    pub reconnect: ReconnectConfig,
    /// Prefix stripped from chat-SDK channel ids.
    pub channel_prefix: String,
    /// Directory backing the local key-value cache.
    pub cache_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            access_token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            network_id: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            reconnect: ReconnectConfig::default(),
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_owned(),
            cache_dir: None,
        }
    }
}
