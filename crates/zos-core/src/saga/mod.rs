// ── Sagas ──
//
// Coordination routines. Each one awaits REST or chat-SDK calls and writes
// to the store only through `Runtime::dispatch`. The runtime's action
// watcher decides which routines run latest-wins and which run for every
// trigger; the routines themselves are plain async functions and can be
// called directly.

pub mod authentication;
pub mod channels_list;
pub mod messages;
pub mod users;

use tracing::warn;

use crate::error::CoreError;

/// Log a routine's failure; watcher-spawned routines have no caller to
/// return it to.
pub(crate) fn report<T>(routine: &str, result: Result<T, CoreError>) {
    if let Err(e) = result {
        warn!(routine, error = %e, "saga failed");
    }
}
