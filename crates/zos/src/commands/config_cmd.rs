//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};

use zos_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

const VALID_KEYS: &str = "api_url, network_id, access_token, access_token_env, ca_cert, \
                          insecure, timeout, sync_interval, channel_prefix, cache_dir";

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable: {e}>")),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            set_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            util::status(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: zos config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: if cfg.profiles.is_empty() {
                        "(none)".into()
                    } else {
                        cfg.profile_names()
                    },
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            util::status(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let token = Password::new()
                .with_prompt("Access token")
                .interact()
                .map_err(prompt_err)?;
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "access_token".into(),
                    reason: "token cannot be empty".into(),
                });
            }

            zos_config::store_access_token(&profile_name, &token)?;
            util::status(
                &format!("✓ Access token stored in system keyring for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("zOS CLI configuration");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_url: String = Input::new()
        .with_prompt("API URL")
        .default("https://zosapi.zero.tech".into())
        .interact_text()
        .map_err(prompt_err)?;
    api_url
        .parse::<url::Url>()
        .map_err(|_| CliError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {api_url}"),
        })?;

    let network_id: String = Input::new()
        .with_prompt("Network id (empty to skip)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let token = Password::new()
        .with_prompt("Access token (empty to skip)")
        .allow_empty_password(true)
        .interact()
        .map_err(prompt_err)?;

    let access_token = if token.is_empty() {
        None
    } else {
        let choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let selection = Select::new()
            .with_prompt("Where to store the access token?")
            .items(choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        if selection == 0 {
            zos_config::store_access_token(&profile_name, &token)?;
            eprintln!("   ✓ Access token stored in system keyring");
            None
        } else {
            Some(token)
        }
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            api_url,
            network_id: Some(network_id).filter(|n| !n.is_empty()),
            access_token,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: zos auth whoami");
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "api_url" => {
            value.parse::<url::Url>().map_err(|_| CliError::Validation {
                field: "api_url".into(),
                reason: format!("invalid URL: {value}"),
            })?;
            profile.api_url = value;
        }
        "network_id" => profile.network_id = Some(value),
        "access_token" => profile.access_token = Some(value),
        "access_token_env" => profile.access_token_env = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => profile.timeout = Some(parse_seconds("timeout", &value)?),
        "sync_interval" => profile.sync_interval = Some(parse_seconds("sync_interval", &value)?),
        "channel_prefix" => profile.channel_prefix = Some(value),
        "cache_dir" => profile.cache_dir = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

fn parse_seconds(field: &str, value: &str) -> Result<u64, CliError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliError::Validation {
            field: field.into(),
            reason: "must be a positive number of seconds".into(),
        }),
    }
}

/// Hide plaintext tokens before showing the config.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.access_token.is_some() {
            profile.access_token = Some("********".into());
        }
    }
    cfg
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_accepts_dashed_names() {
        let mut profile = Profile::default();
        set_key(&mut profile, "network-id", "net-1".into()).unwrap();
        set_key(&mut profile, "sync_interval", "15".into()).unwrap();
        set_key(&mut profile, "api_url", "https://zos.example.com".into()).unwrap();
        assert_eq!(profile.network_id.as_deref(), Some("net-1"));
        assert_eq!(profile.sync_interval, Some(15));
        assert_eq!(profile.api_url, "https://zos.example.com");
    }

    #[test]
    fn set_key_rejects_bad_values() {
        let mut profile = Profile::default();
        assert!(set_key(&mut profile, "timeout", "0".into()).is_err());
        assert!(set_key(&mut profile, "insecure", "maybe".into()).is_err());
        assert!(set_key(&mut profile, "api_url", "nope".into()).is_err());
        assert!(matches!(
            set_key(&mut profile, "colour", "red".into()),
            Err(CliError::Validation { ref field, .. }) if field == "colour"
        ));
    }

    #[test]
    fn tokens_are_hidden_when_shown() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                access_token: Some("secret".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(cfg);
        assert_eq!(
            shown.profiles["default"].access_token.as_deref(),
            Some("********")
        );
    }
}
