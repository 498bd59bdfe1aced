mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, routes::Route, ApiCommand, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::{
    controller::events::UiEvent,
    ui::{EventEngineApp, PersistedDesktopSettings, StartupConfig, SETTINGS_STORAGE_KEY},
};

#[derive(Parser, Debug)]
#[command(name = "eventengine-desktop", about = "Event Engine desktop client")]
struct Args {
    /// Screen to open first: /login, /sessions or /event/{name}.
    #[arg(long, default_value = "/sessions")]
    route: String,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    app_url: Option<String>,
}

fn resolve_settings(args: &Args) -> Result<ClientSettings, String> {
    let mut settings = load_settings().map_err(|err| err.to_string())?;
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }
    if let Some(url) = &args.app_url {
        settings.app_url = url.clone();
    }
    settings.validated().map_err(|err| err.to_string())
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let (settings, startup_error) = match resolve_settings(&args) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("invalid settings, using defaults: {err}");
            (ClientSettings::default(), Some(err))
        }
    };
    let startup = StartupConfig {
        settings: settings.clone(),
        route: Route::parse(&args.route),
        startup_error,
    };

    let (cmd_tx, cmd_rx) = bounded::<ApiCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Event Engine")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([980.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Event Engine",
        options,
        Box::new(|cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            Ok(Box::new(EventEngineApp::new(startup, cmd_tx, ui_rx, persisted)))
        }),
    )
}
