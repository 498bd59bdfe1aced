//! App shell: owns the views, drains backend events and draws the frame around each screen.

use std::time::Duration;

use chrono::Utc;
use client_core::{
    registration_view::RegistrationView, routes::Route, sessions_view::SessionsView, ApiCommand,
    ApiOutcome, AuthContext, ClientError, ClientSettings,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::controller::{
    events::{UiError, UiErrorCategory, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

pub const SETTINGS_STORAGE_KEY: &str = "eventengine_desktop_settings";

/// Preferences kept in eframe storage between launches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    pub page_size: Option<usize>,
}

pub struct StartupConfig {
    pub settings: ClientSettings,
    pub route: Route,
    pub startup_error: Option<String>,
}

pub struct EventEngineApp {
    pub(super) cmd_tx: Sender<ApiCommand>,
    ui_rx: Receiver<UiEvent>,
    pub(super) settings: ClientSettings,
    pub(super) route: Route,
    pub(super) auth: AuthContext,
    pub(super) sessions: SessionsView,
    pub(super) registration: Option<RegistrationView>,
    pub(super) status: String,
    pub(super) status_banner: Option<UiError>,
    /// Text of the expiry date input while the add/edit dialog is open.
    pub(super) expiry_input: String,
    pub(super) field_error: Option<String>,
}

impl EventEngineApp {
    pub fn new(
        startup: StartupConfig,
        cmd_tx: Sender<ApiCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedDesktopSettings>,
    ) -> Self {
        let mut sessions = SessionsView::blank(Utc::now());
        let page_size = persisted
            .and_then(|p| p.page_size)
            .unwrap_or(startup.settings.page_size);
        if let Err(err) = sessions.set_page_size(page_size) {
            tracing::warn!("ignoring stored page size: {err}");
        }

        let mut app = Self {
            cmd_tx,
            ui_rx,
            settings: startup.settings,
            route: Route::Login,
            auth: AuthContext::new(),
            sessions,
            registration: None,
            status: String::new(),
            status_banner: startup
                .startup_error
                .map(|err| UiError::from_message(UiErrorContext::General, err)),
            expiry_input: String::new(),
            field_error: None,
        };
        let refresh = app.auth.refresh_command();
        app.dispatch(refresh);
        app.navigate(startup.route);
        app
    }

    /// Sends a command the views already marked as pending; if it never reaches the
    /// worker the views are released again.
    pub(super) fn dispatch(&mut self, cmd: ApiCommand) {
        let user_lookup = cmd == ApiCommand::FetchCurrentUser;
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            return;
        }
        if user_lookup {
            self.auth.apply(Err(ClientError::Config(self.status.clone())));
        }
        self.sessions.abandon_request();
        if let Some(view) = self.registration.as_mut() {
            view.abandon_request();
        }
    }

    pub(super) fn navigate(&mut self, route: Route) {
        tracing::info!(%route, "navigating");
        match &route {
            Route::Sessions if !self.sessions.is_busy() => {
                let load = self.sessions.load();
                self.dispatch(load);
            }
            Route::Event(name) => {
                self.registration = Some(RegistrationView::new(name.clone()));
            }
            _ => {}
        }
        self.route = route;
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    self.status = err.message().to_string();
                    self.status_banner = Some(err);
                }
                UiEvent::Outcome(outcome) => self.apply_outcome(outcome),
            }
        }
    }

    fn apply_outcome(&mut self, outcome: ApiOutcome) {
        match outcome {
            ApiOutcome::User(result) => {
                self.auth.apply(result);
                if self.route == Route::Login && self.auth.is_authenticated() {
                    self.navigate(Route::Sessions);
                }
            }
            registered @ ApiOutcome::Registered { .. } => {
                if let Some(view) = self.registration.as_mut() {
                    view.apply(registered);
                }
            }
            other => {
                let listing = matches!(
                    other,
                    ApiOutcome::Sessions(_) | ApiOutcome::Refreshed { .. }
                );
                self.sessions.apply(other);
                if let Some(status) = self.sessions.status() {
                    self.status = status.to_string();
                    if listing {
                        self.status_banner =
                            Some(UiError::from_message(UiErrorContext::Sessions, status));
                    }
                }
            }
        }
    }

    pub(super) fn sign_out(&mut self, ctx: &egui::Context) {
        match self.settings.sign_out_url() {
            Ok(url) => ctx.open_url(egui::OpenUrl::same_tab(url.as_str())),
            Err(err) => tracing::warn!("cannot build sign-out url: {err}"),
        }
        self.auth.sign_out();
        self.navigate(Route::Login);
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("app_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Lacework FortiCNAPP Event Engine");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.auth.is_authenticated() {
                        if ui.button("Sign out").on_hover_text("Logout").clicked() {
                            self.sign_out(ui.ctx());
                        }
                        ui.label(self.auth.display_name());
                    }
                });
            });
            ui.weak("Attendee self-provisioning for your Lacework FortiCNAPP events");
            self.show_status_banner(ui);
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let mut dismissed = false;
        let prefix = match banner.context() {
            UiErrorContext::BackendStartup => "Startup",
            UiErrorContext::Sessions => "Sessions",
            UiErrorContext::General => "Error",
        };
        ui.horizontal(|ui| {
            let color = match banner.category() {
                UiErrorCategory::Validation => ui.visuals().warn_fg_color,
                _ => ui.visuals().error_fg_color,
            };
            ui.colored_label(color, format!("{prefix}: {}", banner.message()));
            if banner.requires_reauth() {
                ui.weak("Sign in again to continue.");
            }
            dismissed = ui.small_button("Dismiss").clicked();
        });
        if dismissed {
            self.status_banner = None;
        }
    }

    fn show_footer(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("app_footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.hyperlink_to("Download wizexercise.txt", self.settings.static_asset_url());
                if !self.status.is_empty() {
                    ui.separator();
                    ui.weak(&self.status);
                }
            });
        });
    }
}

impl eframe::App for EventEngineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_footer(ctx);

        let needs_login = self.route.requires_auth()
            && self.auth.is_initialized()
            && !self.auth.is_authenticated();
        match self.route.clone() {
            Route::Login => self.show_login_screen(ctx),
            Route::Sessions if needs_login => self.show_login_screen(ctx),
            Route::Sessions => self.show_sessions_screen(ctx),
            Route::Event(_) => self.show_event_screen(ctx),
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedDesktopSettings {
            page_size: Some(self.sessions.table().pagination().page_size()),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
