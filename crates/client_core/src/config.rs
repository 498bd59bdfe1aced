use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::table::PAGE_SIZE_OPTIONS;

pub const SETTINGS_FILE: &str = "eventengine.toml";
pub const STATIC_ASSET: &str = "wizexercise.txt";
const SIGN_OUT_REDIRECT: &str = "/login";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("{name} is not a valid http(s) base URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("page size {0} is not one of 5, 10, 25")]
    UnsupportedPageSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the REST API and the OAuth proxy endpoints.
    pub api_url: String,
    /// Origin the web front-end is served from; event links and sign-out point here.
    pub app_url: String,
    /// Where attendees are sent after acknowledging a registration.
    pub docs_url: String,
    /// Raw `Cookie` header value for the OAuth proxy session, if any.
    pub auth_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".into(),
            app_url: "http://localhost:3000".into(),
            docs_url: "https://docs.lacework.com".into(),
            auth_cookie: None,
            request_timeout_secs: 30,
            page_size: 5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_url: Option<String>,
    app_url: Option<String>,
    docs_url: Option<String>,
    auth_cookie: Option<String>,
    request_timeout_secs: Option<u64>,
    page_size: Option<usize>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Public registration link for a session, `{app_url}/event/{name}`.
    pub fn event_link(&self, session_name: &str) -> String {
        format!("{}/event/{session_name}", self.app_url)
    }

    pub fn sessions_page(&self) -> String {
        format!("{}/sessions/", self.app_url)
    }

    pub fn static_asset_url(&self) -> String {
        format!("{}/static/{STATIC_ASSET}", self.api_url)
    }

    pub fn sign_out_url(&self) -> Result<Url, SettingsError> {
        let mut url = Url::parse(&format!("{}/oauth2/sign_out", self.app_url)).map_err(|_| {
            SettingsError::InvalidUrl {
                name: "app_url",
                value: self.app_url.clone(),
            }
        })?;
        url.query_pairs_mut().append_pair("rd", SIGN_OUT_REDIRECT);
        Ok(url)
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.app_url {
            self.app_url = v;
        }
        if let Some(v) = file.docs_url {
            self.docs_url = v;
        }
        if let Some(v) = file.auth_cookie {
            self.auth_cookie = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.page_size {
            self.page_size = v;
        }
    }

    fn apply_env(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<(), SettingsError> {
        if let Some(v) = env("EVENTENGINE_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = env("APP__API_URL") {
            self.api_url = v;
        }

        if let Some(v) = env("EVENTENGINE_APP_URL") {
            self.app_url = v;
        }
        if let Some(v) = env("APP__APP_URL") {
            self.app_url = v;
        }

        if let Some(v) = env("EVENTENGINE_DOCS_URL") {
            self.docs_url = v;
        }

        if let Some(v) = env("EVENTENGINE_AUTH_COOKIE") {
            self.auth_cookie = Some(v);
        }

        if let Some(v) = env("EVENTENGINE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.parse().map_err(|_| SettingsError::InvalidNumber {
                name: "EVENTENGINE_REQUEST_TIMEOUT_SECS",
                value: v.clone(),
            })?;
        }

        if let Some(v) = env("EVENTENGINE_PAGE_SIZE") {
            self.page_size = v.parse().map_err(|_| SettingsError::InvalidNumber {
                name: "EVENTENGINE_PAGE_SIZE",
                value: v.clone(),
            })?;
        }

        Ok(())
    }

    /// Normalizes base URLs and checks values that would otherwise fail later.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        self.api_url = normalize_base_url("api_url", &self.api_url)?;
        self.app_url = normalize_base_url("app_url", &self.app_url)?;
        self.docs_url = normalize_base_url("docs_url", &self.docs_url)?;
        self.auth_cookie = self
            .auth_cookie
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if !PAGE_SIZE_OPTIONS.contains(&self.page_size) {
            return Err(SettingsError::UnsupportedPageSize(self.page_size));
        }
        Ok(self)
    }
}

/// Defaults, then `eventengine.toml` in the working directory, then the process environment.
pub fn load_settings() -> Result<ClientSettings, SettingsError> {
    let path = Path::new(SETTINGS_FILE);
    let file = path.exists().then_some(path);
    load_settings_with(file, &|name: &str| std::env::var(name).ok())
}

pub fn load_settings_with(
    file: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    if let Some(path) = file {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: FileSettings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.apply_file(parsed);
    }

    settings.apply_env(env)?;
    settings.validated()
}

fn normalize_base_url(name: &'static str, raw: &str) -> Result<String, SettingsError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || SettingsError::InvalidUrl {
        name,
        value: raw.to_string(),
    };
    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let settings = load_settings_with(None, &env_from(&[])).expect("defaults");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "api_url = \"https://api.example.com/\"\npage_size = 10\nauth_cookie = \"_oauth2_proxy=abc\""
        )
        .expect("write");

        let env = env_from(&[("APP__API_URL", "https://override.example.com")]);
        let settings = load_settings_with(Some(file.path()), &env).expect("load");
        assert_eq!(settings.api_url, "https://override.example.com");
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.auth_cookie.as_deref(), Some("_oauth2_proxy=abc"));
    }

    #[test]
    fn trims_trailing_slashes_from_base_urls() {
        let env = env_from(&[("EVENTENGINE_APP_URL", "https://ee.example.com///")]);
        let settings = load_settings_with(None, &env).expect("load");
        assert_eq!(settings.app_url, "https://ee.example.com");
        assert_eq!(
            settings.event_link("summit_2025"),
            "https://ee.example.com/event/summit_2025"
        );
    }

    #[test]
    fn rejects_unsupported_page_size_and_bad_urls() {
        let env = env_from(&[("EVENTENGINE_PAGE_SIZE", "7")]);
        assert!(matches!(
            load_settings_with(None, &env),
            Err(SettingsError::UnsupportedPageSize(7))
        ));

        let env = env_from(&[("EVENTENGINE_API_URL", "ftp://files.example.com")]);
        assert!(matches!(
            load_settings_with(None, &env),
            Err(SettingsError::InvalidUrl { name: "api_url", .. })
        ));

        let env = env_from(&[("EVENTENGINE_REQUEST_TIMEOUT_SECS", "soon")]);
        assert!(matches!(
            load_settings_with(None, &env),
            Err(SettingsError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn sign_out_url_encodes_login_redirect() {
        let settings = ClientSettings::default();
        assert_eq!(
            settings.sign_out_url().expect("url").as_str(),
            "http://localhost:3000/oauth2/sign_out?rd=%2Flogin"
        );
        assert_eq!(
            settings.static_asset_url(),
            "http://localhost:8080/static/wizexercise.txt"
        );
    }
}
