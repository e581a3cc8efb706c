//! Message command handlers.

use tabled::Tabled;
use zos_api::UploadFile;
use zos_core::saga::messages as saga;
use zos_core::{CoreError, Message, Runtime, RuntimeConfig};

use crate::cli::{GlobalOpts, MessagesArgs, MessagesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Sent")]
    sent: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Message")]
    text: String,
}

impl From<&Message> for MessageRow {
    fn from(m: &Message) -> Self {
        let from = format!("{} {}", m.sender.first_name, m.sender.last_name)
            .trim()
            .to_owned();
        Self {
            id: m.id.clone(),
            sent: output::timestamp(Some(m.created_at)),
            from: if from.is_empty() {
                m.sender.user_id.clone()
            } else {
                from
            },
            text: summary(m),
        }
    }
}

/// One-line message text: media name for uploads, quoted parent for replies.
fn summary(m: &Message) -> String {
    let mut text = m.message.replace('\n', " ");
    if let Some(ref media) = m.media {
        let name = media.name.as_deref().unwrap_or(&media.url);
        text = if text.is_empty() {
            format!("[{name}]")
        } else {
            format!("[{name}] {text}")
        };
    }
    if let Some(parent) = m.parent_message_text.as_deref().filter(|p| !p.is_empty()) {
        text = format!("> {parent} | {text}");
    }
    if m.updated_at.is_some() {
        text.push_str(" (edited)");
    }
    text
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: RuntimeConfig,
    args: MessagesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MessagesCommand::List { channel, before } => {
            let messages = Runtime::oneshot(config, |rt| async move {
                saga::fetch_messages(&rt, &channel, before).await?;
                Ok(rt
                    .store()
                    .channel_message_ids(&channel)
                    .iter()
                    .filter_map(|id| rt.store().message(id))
                    .collect::<Vec<_>>())
            })
            .await?;

            let out = output::render_list(
                &global.output,
                &messages,
                |m| MessageRow::from(m),
                |m| m.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MessagesCommand::Send {
            channel,
            text,
            mentions,
        } => {
            let sent = Runtime::oneshot(config, |rt| async move {
                saga::send_message(&rt, &channel, &text, &mentions).await
            })
            .await?;

            let out = output::render_single(
                &global.output,
                &sent,
                |m| format!("Sent message {}", m.id),
                |m| m.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MessagesCommand::Edit {
            channel,
            id,
            text,
            mentions,
        } => {
            let target = id.clone();
            Runtime::oneshot(config, |rt| async move {
                saga::edit_message(&rt, &channel, &target, &text, &mentions).await
            })
            .await?;
            util::status(&format!("Edited message {id}"), global.quiet);
            Ok(())
        }

        MessagesCommand::Delete { channel, id } => {
            if !util::confirm(&format!("Delete message {id}?"), global.yes)? {
                return Ok(());
            }
            let target = id.clone();
            Runtime::oneshot(config, |rt| async move {
                saga::delete_message(&rt, &channel, &target).await
            })
            .await?;
            util::status(&format!("Deleted message {id}"), global.quiet);
            Ok(())
        }

        MessagesCommand::Upload { channel, path } => {
            let file = UploadFile::from_path(&path).map_err(CoreError::from)?;
            let media = Runtime::oneshot(config, |rt| async move {
                saga::upload_file(&rt, &channel, file).await
            })
            .await?;

            let out = output::render_single(
                &global.output,
                &media,
                |m| format!("Uploaded {} ({})", m.name.as_deref().unwrap_or("file"), m.url),
                |m| m.url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
