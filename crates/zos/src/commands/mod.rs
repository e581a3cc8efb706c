//! Command dispatch: bridges CLI args -> runtime sagas -> output formatting.

pub mod auth;
pub mod channels;
pub mod config_cmd;
pub mod link_preview;
pub mod messages;
pub mod users;
pub mod util;

use zos_core::RuntimeConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: RuntimeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Channels(args) => channels::handle(config, args, global).await,
        Command::Messages(args) => messages::handle(config, args, global).await,
        Command::Users(args) => users::handle(config, args, global).await,
        Command::LinkPreview { url } => link_preview::handle(config, &url, global).await,
        Command::Auth(args) => auth::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command handled before dispatch".into(),
        )),
    }
}
