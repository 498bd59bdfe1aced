//! State machine behind the session management screen.

use chrono::{DateTime, Utc};
use shared::{
    domain::{local_part, InstanceType, Session, SessionColumn},
    validation::ValidationError,
};
use tracing::{info, warn};

use crate::{
    auth::AuthContext,
    commands::{ApiCommand, ApiOutcome, MutationError, MutationKind},
    form::{FormMode, SessionEdit, SessionForm},
    table::{abbreviate, expiry_date, SessionTable, TableError},
    ClientError,
};

/// Shown wherever the platform default instance is needed but unknown.
pub const DEFAULT_INSTANCE_UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDialog {
    Add,
    Edit,
    ConfirmDelete,
}

/// Blocking message shown over the dialog that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorModal {
    pub kind: MutationKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SessionsView {
    table: SessionTable,
    form: SessionForm,
    dialog: Option<SessionDialog>,
    error: Option<ErrorModal>,
    default_instance: Option<String>,
    status: Option<String>,
    in_flight: bool,
}

impl SessionsView {
    pub fn new(page_size: usize, now: DateTime<Utc>) -> Result<Self, TableError> {
        let mut view = Self::blank(now);
        view.set_page_size(page_size)?;
        Ok(view)
    }

    /// Empty view with the default page size.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            table: SessionTable::default(),
            form: SessionForm::blank(now),
            dialog: None,
            error: None,
            default_instance: None,
            status: None,
            in_flight: false,
        }
    }

    /// Initial load: the list plus the default instance URL.
    pub fn load(&mut self) -> ApiCommand {
        self.in_flight = true;
        ApiCommand::RefreshSessions
    }

    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    pub fn form(&self) -> &SessionForm {
        &self.form
    }

    pub fn dialog(&self) -> Option<SessionDialog> {
        self.dialog
    }

    pub fn error(&self) -> Option<&ErrorModal> {
        self.error.as_ref()
    }

    pub fn default_instance(&self) -> Option<&str> {
        self.default_instance.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn can_edit(&self) -> bool {
        self.table.selection().single().is_some()
    }

    pub fn can_delete(&self) -> bool {
        !self.table.selection().is_empty()
    }

    /// Opens the add dialog on a completely fresh form.
    pub fn launch_add(&mut self, now: DateTime<Utc>) {
        self.form = SessionForm::blank(now);
        self.dialog = Some(SessionDialog::Add);
    }

    /// Opens the edit dialog for the single selected session. Returns `false` when the
    /// selection does not name exactly one known session.
    pub fn launch_edit(&mut self) -> bool {
        let Some(session) = self
            .table
            .selection()
            .single()
            .and_then(|name| self.table.find(name))
        else {
            return false;
        };
        self.form = SessionForm::from_session(session);
        self.dialog = Some(SessionDialog::Edit);
        true
    }

    pub fn launch_delete(&mut self) -> bool {
        if !self.can_delete() {
            return false;
        }
        self.dialog = Some(SessionDialog::ConfirmDelete);
        true
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn edit_form(&mut self, edit: SessionEdit) -> Result<(), ValidationError> {
        self.form.apply(edit)
    }

    /// Submits the open dialog. Nothing is sent while a previous request is pending or an
    /// error is still on screen.
    pub fn confirm(&mut self, auth: &AuthContext) -> Option<ApiCommand> {
        if self.in_flight || self.error.is_some() {
            return None;
        }
        let command = match self.dialog? {
            SessionDialog::Add => {
                if self.form.mode() != &FormMode::Create {
                    return None;
                }
                ApiCommand::CreateSession(self.form.to_upsert(auth.actor()))
            }
            SessionDialog::Edit => {
                let FormMode::Edit { original } = self.form.mode() else {
                    return None;
                };
                ApiCommand::UpdateSession {
                    name: original.clone(),
                    body: self.form.to_upsert(auth.actor()),
                }
            }
            SessionDialog::ConfirmDelete => {
                ApiCommand::DeleteSessions(self.table.selection().names().to_vec())
            }
        };
        self.in_flight = true;
        Some(command)
    }

    /// Closes the error modal. A failed delete also closes its dialog and reloads the list,
    /// since some of the sessions may be gone regardless.
    pub fn dismiss_error(&mut self) -> Option<ApiCommand> {
        let modal = self.error.take()?;
        if modal.kind != MutationKind::Delete {
            return None;
        }
        self.dialog = None;
        self.in_flight = true;
        Some(ApiCommand::ListSessions)
    }

    /// Toggles a row; when exactly one row remains selected and no dialog is open the
    /// form is seeded from it. An open add/edit dialog keeps the form it was launched with.
    pub fn toggle_row(&mut self, name: &str) {
        let seed = self.table.toggle_row(name);
        if self.dialog.is_none() {
            if let Some(session) = seed {
                self.form = SessionForm::from_session(session);
            }
        }
    }

    /// Clears the busy flag for a command that never reached the backend.
    pub fn abandon_request(&mut self) {
        self.in_flight = false;
    }

    /// Lookup for the platform default instance, needed only while it is still unknown.
    pub fn default_instance_command(&self) -> Option<ApiCommand> {
        self.default_instance
            .is_none()
            .then_some(ApiCommand::FetchDefaultInstance)
    }

    pub fn set_all_selected(&mut self, checked: bool) {
        self.table.set_all_selected(checked);
    }

    pub fn request_sort(&mut self, column: SessionColumn) {
        self.table.request_sort(column);
    }

    pub fn set_page(&mut self, page: usize) {
        self.table.set_page(page);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        self.table.set_page_size(page_size)
    }

    /// URL column text: `DEFAULT` sessions without their own URL show the platform default.
    pub fn url_cell(&self, session: &Session) -> String {
        if session.instance_type == InstanceType::Default && session.url.is_empty() {
            return self
                .default_instance
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTANCE_UNAVAILABLE.to_string());
        }
        session.url.clone()
    }

    /// Display text for one table cell. Long identifiers are abbreviated and identities
    /// show only the part before `@`.
    pub fn cell(&self, session: &Session, column: SessionColumn) -> String {
        match column {
            SessionColumn::Name => session.name.clone(),
            SessionColumn::InstanceType => session.instance_type.to_string(),
            SessionColumn::Url => self.url_cell(session),
            SessionColumn::AccessKeyId => abbreviate(&session.access_key_id),
            SessionColumn::SecretKey => abbreviate(&session.secret_key),
            SessionColumn::UserGroup => abbreviate(&session.user_group),
            SessionColumn::ExpiresAt => expiry_date(session.expires_at),
            SessionColumn::CreatedBy => local_part(&session.created_by).to_string(),
            SessionColumn::UpdatedBy => local_part(&session.updated_by).to_string(),
            SessionColumn::RegCount => session.reg_count.to_string(),
        }
    }

    pub fn apply(&mut self, outcome: ApiOutcome) {
        self.apply_at(outcome, Utc::now());
    }

    /// Folds a finished request into the view. `now` seeds the form reset after a
    /// successful mutation.
    pub fn apply_at(&mut self, outcome: ApiOutcome, now: DateTime<Utc>) {
        match outcome {
            ApiOutcome::Sessions(result) => {
                self.in_flight = false;
                self.apply_sessions(result);
            }
            ApiOutcome::DefaultInstance(result) => self.apply_default_instance(result),
            ApiOutcome::Refreshed {
                sessions,
                default_instance,
            } => {
                self.in_flight = false;
                self.apply_sessions(sessions);
                self.apply_default_instance(default_instance);
            }
            ApiOutcome::Mutation { kind, result } => {
                self.in_flight = false;
                self.apply_mutation(kind, result, now);
            }
            ApiOutcome::Registered { .. } | ApiOutcome::User(_) => {}
        }
    }

    fn apply_sessions(&mut self, result: Result<Vec<Session>, ClientError>) {
        match result {
            Ok(rows) => {
                self.table.replace_rows(rows);
                self.status = None;
            }
            Err(err) => {
                warn!("session list unavailable: {err}");
                self.status = Some(format!("Could not load sessions: {}", err.user_message()));
            }
        }
    }

    fn apply_default_instance(&mut self, result: Result<Option<String>, ClientError>) {
        match result {
            Ok(url) => self.default_instance = url,
            Err(err) => warn!("default instance unavailable: {err}"),
        }
    }

    fn apply_mutation(
        &mut self,
        kind: MutationKind,
        result: Result<Vec<Session>, MutationError>,
        now: DateTime<Utc>,
    ) {
        match result {
            Ok(rows) => {
                info!(?kind, rows = rows.len(), "session list reloaded after change");
                self.finish_mutation(kind, now);
                self.table.replace_rows(rows);
                self.status = Some(format!("Session {}", kind.past_tense()));
            }
            Err(MutationError::Rejected(err)) => {
                self.error = Some(ErrorModal {
                    kind,
                    message: err.user_message(),
                });
            }
            Err(MutationError::RefreshFailed(err)) => {
                warn!(?kind, "change saved but reload failed: {err}");
                self.finish_mutation(kind, now);
                self.status = Some(format!(
                    "Session {}, but the list could not be reloaded: {}",
                    kind.past_tense(),
                    err.user_message()
                ));
            }
        }
    }

    fn finish_mutation(&mut self, kind: MutationKind, now: DateTime<Utc>) {
        self.dialog = None;
        self.form = SessionForm::blank(now);
        if kind == MutationKind::Delete {
            self.table.clear_selection();
        }
    }
}

#[cfg(test)]
#[path = "tests/sessions_view_tests.rs"]
mod tests;
