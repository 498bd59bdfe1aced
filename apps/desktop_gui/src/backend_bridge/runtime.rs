//! Runtime bridge between the UI command queue and backend event intake.

use std::thread;

use client_core::{execute, ApiCommand, ClientSettings, EventEngineClient};
use crossbeam_channel::{Receiver, Sender};

use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Spawns the backend worker. Commands run one at a time in arrival order and each
/// outcome is posted back to the UI.
pub fn launch(settings: ClientSettings, cmd_rx: Receiver<ApiCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let client = match EventEngineClient::new(&settings) {
            Ok(client) => client,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err}"),
                )));
                tracing::error!("failed to build api client: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
            while let Ok(cmd) = cmd_rx.recv() {
                let name = cmd.name();
                let outcome = execute(&client, cmd).await;
                if ui_tx.send(UiEvent::Outcome(outcome)).is_err() {
                    tracing::debug!(command = name, "ui closed before outcome was delivered");
                    break;
                }
            }
            tracing::info!("backend worker stopped");
        });
    });
}
