//! CLI-side configuration: global flag overrides on top of `zos_config`.

use std::time::Duration;

use secrecy::SecretString;

use zos_config::Config;
use zos_core::{RuntimeConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use zos_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `RuntimeConfig` for a command from the config file, the
/// active profile, and the global flags (flags win).
pub fn build_runtime_config(global: &GlobalOpts) -> Result<RuntimeConfig, CliError> {
    let cfg = load_config_or_default();
    resolve(&cfg, global)
}

pub(crate) fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<RuntimeConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut config = match (cfg.profiles.get(&profile_name), global.api_url.as_deref()) {
        (Some(profile), _) => {
            zos_config::profile_to_runtime_config(profile, &profile_name, &cfg.defaults)?
        }
        (None, Some(url)) => {
            let mut config = RuntimeConfig::new(parse_url(url)?);
            config.timeout = Duration::from_secs(cfg.defaults.timeout);
            config.sync_interval = Duration::from_secs(cfg.defaults.sync_interval.max(1));
            config
        }
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available(cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref url) = global.api_url {
        config.api_url = parse_url(url)?;
    }
    if let Some(ref network) = global.network {
        config.network_id = Some(network.clone());
    }
    if let Some(ref token) = global.access_token {
        config.access_token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

/// The network a channel command runs against.
pub fn require_network(config: &RuntimeConfig) -> Result<String, CliError> {
    config.network_id.clone().ok_or(CliError::NoNetwork)
}

fn parse_url(value: &str) -> Result<url::Url, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {value}"),
    })
}

fn available(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profile_names()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;
    use zos_config::Profile;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["zos"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["channels", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(name: &str) -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            name.into(),
            Profile {
                api_url: "https://zosapi.example.com".into(),
                network_id: Some("net-1".into()),
                timeout: Some(12),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with("default");
        let opts = global(&[
            "--api-url",
            "https://other.example.com",
            "--network",
            "net-2",
            "--timeout",
            "3",
            "--insecure",
        ]);

        let config = resolve(&cfg, &opts).unwrap();

        assert_eq!(config.api_url.as_str(), "https://other.example.com/");
        assert_eq!(config.network_id.as_deref(), Some("net-2"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let cfg = config_with("default");
        let config = resolve(&cfg, &global(&[])).unwrap();
        assert_eq!(config.network_id.as_deref(), Some("net-1"));
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(require_network(&config).unwrap(), "net-1");
    }

    #[test]
    fn url_flag_alone_is_enough() {
        let config = resolve(
            &Config::default(),
            &global(&["--api-url", "https://flag.example.com"]),
        )
        .unwrap();
        assert_eq!(config.api_url.as_str(), "https://flag.example.com/");
        assert!(matches!(require_network(&config), Err(CliError::NoNetwork)));
    }

    #[test]
    fn missing_profile_and_url_are_reported() {
        assert!(matches!(
            resolve(&Config::default(), &global(&[])),
            Err(CliError::NoConfig { .. })
        ));
        assert!(matches!(
            resolve(&config_with("work"), &global(&["--profile", "home"])),
            Err(CliError::ProfileNotFound { ref available, .. }) if available == "work"
        ));
    }
}
