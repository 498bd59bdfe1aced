//! Requests the views hand to whoever owns the network, and the results they get back.
//!
//! Views never await anything themselves: they emit an [`ApiCommand`], a runtime runs it
//! through [`execute`], and the resulting [`ApiOutcome`] is fed back into the view.

use shared::{
    domain::{AuthenticatedUser, Registration, Session},
    protocol::SessionUpsert,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{ClientError, EventEngineApi};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCommand {
    ListSessions,
    FetchDefaultInstance,
    /// Session list plus the default instance URL, as loaded when the page opens.
    RefreshSessions,
    CreateSession(SessionUpsert),
    UpdateSession { name: String, body: SessionUpsert },
    DeleteSessions(Vec<String>),
    Register {
        session_name: String,
        registration: Registration,
    },
    FetchCurrentUser,
}

impl ApiCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ApiCommand::ListSessions => "list_sessions",
            ApiCommand::FetchDefaultInstance => "fetch_default_instance",
            ApiCommand::RefreshSessions => "refresh_sessions",
            ApiCommand::CreateSession(_) => "create_session",
            ApiCommand::UpdateSession { .. } => "update_session",
            ApiCommand::DeleteSessions(_) => "delete_sessions",
            ApiCommand::Register { .. } => "register",
            ApiCommand::FetchCurrentUser => "fetch_current_user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn past_tense(self) -> &'static str {
        match self {
            MutationKind::Create => "created",
            MutationKind::Update => "updated",
            MutationKind::Delete => "deleted",
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    /// The server refused the change; nothing was written.
    #[error(transparent)]
    Rejected(ClientError),
    /// The change went through but the list could not be fetched afterwards.
    #[error("change saved but the session list could not be reloaded: {0}")]
    RefreshFailed(ClientError),
}

#[derive(Debug)]
pub enum ApiOutcome {
    Sessions(Result<Vec<Session>, ClientError>),
    DefaultInstance(Result<Option<String>, ClientError>),
    Refreshed {
        sessions: Result<Vec<Session>, ClientError>,
        default_instance: Result<Option<String>, ClientError>,
    },
    /// A create, update or delete followed by a full reload of the list.
    Mutation {
        kind: MutationKind,
        result: Result<Vec<Session>, MutationError>,
    },
    Registered {
        session_name: String,
        result: Result<(), ClientError>,
    },
    User(Result<Option<AuthenticatedUser>, ClientError>),
}

/// Runs one command against the API. Every mutation that succeeds is followed by a full
/// re-fetch of the session list; no local merge is attempted.
pub async fn execute(api: &dyn EventEngineApi, command: ApiCommand) -> ApiOutcome {
    debug!(command = command.name(), "executing api command");
    match command {
        ApiCommand::ListSessions => ApiOutcome::Sessions(api.list_sessions().await),
        ApiCommand::FetchDefaultInstance => {
            ApiOutcome::DefaultInstance(api.default_instance().await)
        }
        ApiCommand::RefreshSessions => {
            let sessions = api.list_sessions().await;
            let default_instance = api.default_instance().await;
            ApiOutcome::Refreshed {
                sessions,
                default_instance,
            }
        }
        ApiCommand::CreateSession(body) => {
            let write = api.create_session(&body).await;
            mutation(api, MutationKind::Create, write).await
        }
        ApiCommand::UpdateSession { name, body } => {
            let write = api.update_session(&name, &body).await;
            mutation(api, MutationKind::Update, write).await
        }
        ApiCommand::DeleteSessions(names) => {
            let write = api.delete_sessions(&names).await;
            mutation(api, MutationKind::Delete, write).await
        }
        ApiCommand::Register {
            session_name,
            registration,
        } => {
            let result = api.register(&session_name, &registration).await;
            ApiOutcome::Registered {
                session_name,
                result,
            }
        }
        ApiCommand::FetchCurrentUser => ApiOutcome::User(api.current_user().await),
    }
}

async fn mutation(
    api: &dyn EventEngineApi,
    kind: MutationKind,
    write: Result<(), ClientError>,
) -> ApiOutcome {
    let result = match write {
        Err(err) => {
            warn!(?kind, "session mutation rejected: {err}");
            Err(MutationError::Rejected(err))
        }
        Ok(()) => api
            .list_sessions()
            .await
            .map_err(MutationError::RefreshFailed),
    };
    ApiOutcome::Mutation { kind, result }
}
