//! Session command handlers.

use dialoguer::Password;
use secrecy::SecretString;
use zos_core::saga::authentication::{self, AuthOutcome};
use zos_core::{CurrentUser, Runtime, RuntimeConfig};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(u: &CurrentUser) -> String {
    let summary = u.profile_summary.clone().unwrap_or_default();
    let name = format!("{} {}", summary.first_name, summary.last_name)
        .trim()
        .to_owned();
    let mut lines = vec![
        format!("ID:        {}", u.id),
        format!("Name:      {}", if name.is_empty() { "-" } else { &name }),
    ];
    if let Some(ref zid) = u.primary_zid {
        lines.push(format!("ZERO ID:   {zid}"));
    }
    if let Some(ref wallet) = u.primary_wallet_address {
        lines.push(format!("Wallet:    {wallet}"));
    }
    if let Some(ref matrix_id) = u.matrix_id {
        lines.push(format!("Matrix:    {matrix_id}"));
    }
    lines.join("\n")
}

pub async fn handle(
    config: RuntimeConfig,
    args: AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login { token } => {
            let token = match token {
                Some(t) if !t.is_empty() => t,
                _ => Password::new()
                    .with_prompt("Signed Web3 token")
                    .interact()
                    .map_err(util::prompt_err)?,
            };
            let signed = SecretString::from(token);

            let outcome = Runtime::oneshot(config, |rt| async move {
                authentication::nonce_or_authorize(&rt, &signed).await
            })
            .await?;

            match outcome {
                AuthOutcome::Nonce(nonce) => {
                    util::status(
                        "No account is registered for this wallet yet.",
                        global.quiet,
                    );
                    output::print_output(&nonce, global.quiet);
                }
                AuthOutcome::LoggedIn(user) => {
                    let out = output::render_single(&global.output, &*user, detail, |u| {
                        u.id.clone()
                    })?;
                    output::print_output(&out, global.quiet);
                }
            }
            Ok(())
        }

        AuthCommand::Whoami => {
            let user = Runtime::oneshot(config, |rt| async move {
                authentication::get_current_user(&rt).await
            })
            .await?;

            let out = output::render_single(&global.output, &user, detail, |u| u.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Logout => {
            Runtime::oneshot(config, |rt| async move {
                authentication::clear_session(&rt).await
            })
            .await?;

            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if let Err(e) = zos_config::delete_access_token(&profile_name) {
                tracing::warn!(error = %e, profile = %profile_name, "stored token not removed");
            }
            util::status("Logged out", global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use zos_core::model::ProfileSummary;

    use super::*;

    #[test]
    fn detail_without_profile_uses_placeholder() {
        let user = CurrentUser {
            id: "u1".into(),
            ..CurrentUser::default()
        };
        assert!(detail(&user).contains("Name:      -"));
    }

    #[test]
    fn detail_shows_name_and_handles() {
        let user = CurrentUser {
            id: "u1".into(),
            primary_zid: Some("0://ada".into()),
            profile_summary: Some(ProfileSummary {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                ..ProfileSummary::default()
            }),
            ..CurrentUser::default()
        };
        let text = detail(&user);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("0://ada"));
    }
}
