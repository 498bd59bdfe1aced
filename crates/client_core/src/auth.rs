//! Explicit signed-in user context, initialized once and refreshed on demand.

use shared::domain::AuthenticatedUser;
use tracing::{info, warn};

use crate::{commands::ApiCommand, ClientError, EventEngineApi};

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<AuthenticatedUser>,
    initialized: bool,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: AuthenticatedUser) -> Self {
        Self {
            user: Some(user),
            initialized: true,
        }
    }

    pub fn refresh_command(&self) -> ApiCommand {
        ApiCommand::FetchCurrentUser
    }

    /// Applies a userinfo lookup. Any failure leaves us signed out; nothing is retried.
    pub fn apply(&mut self, result: Result<Option<AuthenticatedUser>, ClientError>) {
        let user = match result {
            Ok(user) => user,
            Err(err) => {
                warn!("userinfo lookup failed, treating as signed out: {err}");
                None
            }
        };
        if let Some(user) = &user {
            if !self.is_authenticated() {
                info!(user = %user.email, "signed in");
            }
        }
        self.user = user;
        self.initialized = true;
    }

    pub async fn refresh(&mut self, api: &dyn EventEngineApi) {
        let result = api.current_user().await;
        self.apply(result);
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Identity stamped into `createdBy` / `updatedBy`; empty when signed out.
    pub fn actor(&self) -> &str {
        self.user.as_ref().map(|u| u.email.as_str()).unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(AuthenticatedUser::display_name)
            .unwrap_or("")
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }
}
