//! UI layer for the desktop GUI: app shell and one module per screen.

pub mod app;
mod event;
mod login;
mod sessions;

pub use app::{EventEngineApp, PersistedDesktopSettings, StartupConfig, SETTINGS_STORAGE_KEY};
