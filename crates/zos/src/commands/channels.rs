//! Channel command handlers.

use tabled::Tabled;
use zos_core::saga::{authentication, channels_list};
use zos_core::{Channel, Request, Runtime, RuntimeConfig};

use crate::cli::{ChannelsArgs, ChannelsCommand, GlobalOpts};
use crate::config::require_network;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Unread")]
    unread: String,
    #[tabled(rename = "Members")]
    members: String,
    #[tabled(rename = "Joined")]
    joined: String,
}

fn row(c: &Channel, color: bool) -> ChannelRow {
    ChannelRow {
        id: c.id.clone(),
        name: channel_name(c),
        unread: output::count(c.unread_count, color),
        members: c.other_members.len().to_string(),
        joined: if c.has_joined { "yes" } else { "no" }.into(),
    }
}

/// A channel's name, or its members' names for unnamed direct messages.
fn channel_name(c: &Channel) -> String {
    if !c.name.is_empty() {
        return c.name.clone();
    }
    let names: Vec<String> = c.other_members.iter().map(|u| u.display_name()).collect();
    if names.is_empty() {
        "-".into()
    } else {
        names.join(", ")
    }
}

fn detail(c: &Channel) -> String {
    let mut lines = vec![
        format!("ID:        {}", c.id),
        format!("Name:      {}", channel_name(c)),
        format!("Unread:    {}", c.unread_count),
        format!("Joined:    {}", c.has_joined),
        format!("Created:   {}", output::timestamp(c.created_at)),
    ];
    if let Some(ref category) = c.category {
        lines.push(format!("Category:  {category}"));
    }
    if let Some(ref kind) = c.group_channel_type {
        lines.push(format!("Type:      {kind}"));
    }
    if c.is_one_on_one() {
        lines.push("Direct:    true".into());
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: RuntimeConfig,
    args: ChannelsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        ChannelsCommand::List => {
            let network = require_network(&config)?;
            let channels = Runtime::oneshot(config, |rt| async move {
                channels_list::fetch_channels(&rt, &network).await?;
                Ok(rt.store().channels_list())
            })
            .await?;

            let out = output::render_list(
                &global.output,
                &channels,
                |c| row(c, color),
                |c| c.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChannelsCommand::Get { id } => {
            let network = require_network(&config)?;
            let lookup = id.clone();
            let channel = Runtime::oneshot(config, |rt| async move {
                channels_list::fetch_channels(&rt, &network).await?;
                Ok(rt.store().channel(&lookup))
            })
            .await?
            .ok_or_else(|| CliError::NotFound {
                resource_type: "channel".into(),
                identifier: id,
                list_command: "channels list".into(),
            })?;

            let out = output::render_single(&global.output, &channel, detail, |c| c.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChannelsCommand::Sync { cycles } => sync(config, cycles, global, color).await,

        ChannelsCommand::Join { id } => {
            Runtime::oneshot(config, |rt| {
                let id = id.clone();
                async move { rt.api().join_channel(&id).await }
            })
            .await?;
            util::status(&format!("Joined channel {id}"), global.quiet);
            Ok(())
        }

        ChannelsCommand::MarkRead { id } => {
            Runtime::oneshot(config, |rt| {
                let id = id.clone();
                async move {
                    let user = authentication::get_current_user(&rt).await?;
                    rt.api().mark_all_messages_as_read(&id, &user.id).await
                }
            })
            .await?;
            util::status(&format!("Marked channel {id} as read"), global.quiet);
            Ok(())
        }
    }
}

// ── Sync ────────────────────────────────────────────────────────────

/// Run the unread-count sync in the background and print the channel
/// list after every completed refresh, until Ctrl-C or `cycles` runs out.
async fn sync(
    config: RuntimeConfig,
    cycles: Option<u32>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let network = require_network(&config)?;
    let interval = config.sync_interval;
    let rt = Runtime::new(config)?;
    rt.start().await?;

    let mut states = rt.store().subscribe();
    // Snapshots can be skipped, so count refreshes by the list's own tally.
    let baseline = rt.store().snapshot().channels_list.completed_fetches;
    rt.dispatch(Request::StartSyncChannels {
        network_id: network.clone(),
    })?;
    util::status(
        &output::muted(
            &format!(
                "Syncing channels of {network} every {}s (Ctrl-C to stop)",
                interval.as_secs()
            ),
            color,
        ),
        global.quiet,
    );

    let mut seen = baseline;
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            snapshot = states.changed() => {
                let Some(state) = snapshot else { break Ok(()) };
                let finished = state.channels_list.completed_fetches;
                if finished == seen {
                    continue;
                }
                seen = finished;
                let completed = finished - baseline;

                if let Some(ref error) = state.channels_list.error {
                    tracing::warn!(error, "channel refresh failed");
                } else {
                    let channels = rt.store().channels_list();
                    match output::render_list(
                        &global.output,
                        &channels,
                        |c| row(c, color),
                        |c| format!("{}\t{}", c.id, c.unread_count),
                    ) {
                        Ok(out) => output::print_output(&out, global.quiet),
                        Err(e) => break Err(e),
                    }
                }

                if cycles.is_some_and(|max| completed >= u64::from(max)) {
                    break Ok(());
                }
            }
        }
    };

    rt.dispatch(Request::StopSyncChannels)?;
    rt.shutdown().await;
    result
}
