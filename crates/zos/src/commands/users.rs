//! User command handlers.

use tabled::Tabled;
use zos_api::models::MentionableUser;
use zos_core::saga::users;
use zos_core::{Runtime, RuntimeConfig, User};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MentionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

fn detail(u: &User) -> String {
    let mut lines = vec![
        format!("ID:        {}", u.user_id),
        format!("Name:      {}", u.display_name()),
    ];
    if let Some(handle) = u.display_sub_handle.as_ref().filter(|h| !h.is_empty()) {
        lines.push(format!("Handle:    {handle}"));
    }
    if let Some(ref matrix_id) = u.matrix_id {
        lines.push(format!("Matrix:    {matrix_id}"));
    }
    if let Some(ref image) = u.profile_image {
        lines.push(format!("Image:     {image}"));
    }
    lines.join("\n")
}

pub async fn handle(
    config: RuntimeConfig,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UsersCommand::Mentionable { channel, search } => {
            let found: Vec<MentionableUser> = Runtime::oneshot(config, |rt| async move {
                Ok(rt.api().search_mentionable_users(&channel, &search).await)
            })
            .await?;

            let out = output::render_list(
                &global.output,
                &found,
                |u| MentionRow {
                    id: u.id.clone(),
                    name: u.name.clone(),
                },
                |u| u.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Lookup { matrix_id } => {
            let lookup = matrix_id.clone();
            let user = Runtime::oneshot(config, |rt| async move {
                users::user_by_matrix_id(&rt, &lookup).await
            })
            .await?
            .ok_or_else(|| CliError::NotFound {
                resource_type: "user".into(),
                identifier: matrix_id,
                list_command: "users mentionable <channel>".into(),
            })?;

            let out = output::render_single(&global.output, &user, detail, |u| u.user_id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_lists_known_fields() {
        let user = User {
            user_id: "u1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            matrix_id: Some("@ada:zos".into()),
            display_sub_handle: Some(String::new()),
            ..User::default()
        };
        let text = detail(&user);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("@ada:zos"));
        assert!(!text.contains("Handle"));
    }
}
