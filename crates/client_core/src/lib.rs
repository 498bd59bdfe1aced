use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, COOKIE},
    Client, Response, Url,
};
use shared::{
    domain::{AuthenticatedUser, Registration, Session},
    error::ApiError,
    protocol::{DeleteSessionsRequest, SessionUpsert},
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod auth;
pub mod commands;
pub mod config;
pub mod form;
pub mod registration_view;
pub mod routes;
pub mod sessions_view;
pub mod table;

pub use auth::AuthContext;
pub use commands::{execute, ApiCommand, ApiOutcome, MutationError, MutationKind};
pub use config::{load_settings, ClientSettings};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Text meant for a blocking error dialog: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

/// The collaborator REST API as seen by the views.
#[async_trait]
pub trait EventEngineApi: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<Session>, ClientError>;
    /// Endpoint URL backing `DEFAULT` sessions, `None` when the server has none configured.
    async fn default_instance(&self) -> Result<Option<String>, ClientError>;
    async fn create_session(&self, body: &SessionUpsert) -> Result<(), ClientError>;
    async fn update_session(&self, name: &str, body: &SessionUpsert) -> Result<(), ClientError>;
    async fn delete_sessions(&self, names: &[String]) -> Result<(), ClientError>;
    async fn register(
        &self,
        session_name: &str,
        registration: &Registration,
    ) -> Result<(), ClientError>;
    /// `Ok(None)` means the proxy did not recognise us as signed in.
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, ClientError>;
}

pub struct EventEngineClient {
    http: Client,
    api_url: Url,
}

impl EventEngineClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let api_url = Url::parse(&settings.api_url)
            .map_err(|err| ClientError::Config(format!("api_url {}: {err}", settings.api_url)))?;
        if api_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "api_url {} cannot be used as a base URL",
                settings.api_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &settings.auth_cookie {
            let mut value = HeaderValue::from_str(cookie)
                .map_err(|_| ClientError::Config("auth_cookie is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self { http, api_url })
    }

    /// Joins path segments onto the API base; an empty last segment yields a trailing `/`.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn expect_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let fallback = format!("request failed with status {status}");
    let body = response.text().await.unwrap_or_default();
    let err = ApiError::from_body(status.as_u16(), &body, &fallback);
    warn!(status = status.as_u16(), message = %err.message, "api request rejected");
    Err(err.into())
}

#[async_trait]
impl EventEngineApi for EventEngineClient {
    async fn list_sessions(&self) -> Result<Vec<Session>, ClientError> {
        let url = self.endpoint(&["api", "sessions", ""]);
        debug!(%url, "listing sessions");
        let response = expect_success(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn default_instance(&self) -> Result<Option<String>, ClientError> {
        let url = self.endpoint(&["api", "sessions", "defaultinstance"]);
        let response = expect_success(self.http.get(url).send().await?).await?;
        let text = response.text().await?;
        let trimmed = text.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    async fn create_session(&self, body: &SessionUpsert) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "sessions", ""]);
        expect_success(self.http.post(url).json(body).send().await?).await?;
        info!(session = %body.name, "session created");
        Ok(())
    }

    async fn update_session(&self, name: &str, body: &SessionUpsert) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "sessions", name]);
        expect_success(self.http.put(url).json(body).send().await?).await?;
        info!(session = %name, "session updated");
        Ok(())
    }

    async fn delete_sessions(&self, names: &[String]) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "sessions", ""]);
        let body = DeleteSessionsRequest {
            sessions: names.to_vec(),
        };
        expect_success(self.http.delete(url).json(&body).send().await?).await?;
        info!(count = names.len(), "sessions deleted");
        Ok(())
    }

    async fn register(
        &self,
        session_name: &str,
        registration: &Registration,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "register", session_name]);
        expect_success(self.http.post(url).json(registration).send().await?).await?;
        info!(session = %session_name, "attendee registered");
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, ClientError> {
        let url = self.endpoint(&["oauth2", "userinfo"]);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "userinfo rejected; treating as signed out");
            return Ok(None);
        }
        let user: AuthenticatedUser = response.json().await?;
        Ok((!user.email.is_empty()).then_some(user))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
