//! Attendee self-registration for one event.

use shared::validation::ValidationError;
use tracing::info;

use crate::{
    commands::{ApiCommand, ApiOutcome},
    form::{RegistrationEdit, RegistrationForm},
};

pub const SUCCESS_MESSAGE: &str = "Check your email for access instructions!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationMessage {
    Success(String),
    Failure(String),
}

impl RegistrationMessage {
    pub fn text(&self) -> &str {
        match self {
            RegistrationMessage::Success(text) | RegistrationMessage::Failure(text) => text,
        }
    }
}

/// What the host should do once a message is dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEffect {
    RedirectTo(String),
}

#[derive(Debug, Clone)]
pub struct RegistrationView {
    session_name: String,
    form: RegistrationForm,
    message: Option<RegistrationMessage>,
    in_flight: bool,
}

impl RegistrationView {
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            form: RegistrationForm::default(),
            message: None,
            in_flight: false,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn message(&self) -> Option<&RegistrationMessage> {
        self.message.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn edit(&mut self, edit: RegistrationEdit) {
        self.form.apply(edit);
    }

    pub fn issues(&self) -> Vec<ValidationError> {
        self.form.issues()
    }

    pub fn submit(&mut self) -> Option<ApiCommand> {
        if self.in_flight || self.message.is_some() {
            return None;
        }
        self.in_flight = true;
        Some(ApiCommand::Register {
            session_name: self.session_name.clone(),
            registration: self.form.to_registration(),
        })
    }

    /// Clears the busy flag for a submission that never reached the backend.
    pub fn abandon_request(&mut self) {
        self.in_flight = false;
    }

    pub fn apply(&mut self, outcome: ApiOutcome) {
        let ApiOutcome::Registered {
            session_name,
            result,
        } = outcome
        else {
            return;
        };
        if session_name != self.session_name {
            return;
        }
        self.in_flight = false;
        self.message = Some(match result {
            Ok(()) => {
                info!(session = %session_name, "registration accepted");
                RegistrationMessage::Success(SUCCESS_MESSAGE.to_string())
            }
            Err(err) => RegistrationMessage::Failure(err.user_message()),
        });
    }

    /// Closes the message. Only an acknowledged success leads on to the documentation;
    /// after an error the attendee stays on the form to correct it.
    pub fn dismiss(&mut self, docs_url: &str) -> Option<RegistrationEffect> {
        match self.message.take()? {
            RegistrationMessage::Success(_) => {
                Some(RegistrationEffect::RedirectTo(docs_url.to_string()))
            }
            RegistrationMessage::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::error::ApiError;

    use super::*;
    use crate::ClientError;

    fn filled() -> RegistrationView {
        let mut view = RegistrationView::new("reinvent_2024");
        view.edit(RegistrationEdit::Email("ada@example.com".into()));
        view.edit(RegistrationEdit::FirstName("Ada".into()));
        view.edit(RegistrationEdit::LastName("Lovelace".into()));
        view.edit(RegistrationEdit::Company("Engines".into()));
        view
    }

    #[test]
    fn submit_targets_the_event_session() {
        let mut view = filled();
        assert!(view.issues().is_empty());
        let Some(ApiCommand::Register {
            session_name,
            registration,
        }) = view.submit()
        else {
            panic!("expected register command");
        };
        assert_eq!(session_name, "reinvent_2024");
        assert_eq!(registration.last_name, "Lovelace");
        assert!(view.submit().is_none(), "second submit while pending");
    }

    #[test]
    fn abandoned_submission_can_be_retried() {
        let mut view = filled();
        assert!(view.submit().is_some());
        assert!(view.is_busy());

        view.abandon_request();
        assert!(!view.is_busy());
        assert!(view.submit().is_some());
    }

    #[test]
    fn success_redirects_to_docs_after_dismissal() {
        let mut view = filled();
        view.submit();
        view.apply(ApiOutcome::Registered {
            session_name: "reinvent_2024".into(),
            result: Ok(()),
        });
        assert_eq!(view.message().map(RegistrationMessage::text), Some(SUCCESS_MESSAGE));
        assert_eq!(
            view.dismiss("https://docs.lacework.com"),
            Some(RegistrationEffect::RedirectTo(
                "https://docs.lacework.com".into()
            ))
        );
        assert!(view.message().is_none());
    }

    #[test]
    fn failure_shows_server_message_and_stays() {
        let mut view = filled();
        view.submit();
        view.apply(ApiOutcome::Registered {
            session_name: "reinvent_2024".into(),
            result: Err(ClientError::Api(ApiError::new(400, "session expired"))),
        });
        assert_eq!(
            view.message(),
            Some(&RegistrationMessage::Failure("session expired".into()))
        );
        assert_eq!(view.dismiss("https://docs.lacework.com"), None);
        assert_eq!(view.form().fields().email, "ada@example.com");
        assert!(view.submit().is_some());
    }
}
