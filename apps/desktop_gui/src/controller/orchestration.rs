//! Command orchestration helpers from UI actions to the backend command queue.

use client_core::ApiCommand;
use crossbeam_channel::{Sender, TrySendError};

/// Queues a command for the backend worker. Returns `false` when it could not be queued,
/// in which case `status` says why.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<ApiCommand>,
    cmd: ApiCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            false
        }
    }
}
