//! UI/backend events and error modeling for the desktop GUI controller.

use client_core::ApiOutcome;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    Outcome(ApiOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Sessions,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("sign in")
        {
            UiErrorCategory::Auth
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("unavailable")
            || lower.contains("disconnected")
            || lower.contains("request failed")
        {
            UiErrorCategory::Transport
        } else if lower.contains("invalid")
            || lower.contains("min length")
            || lower.contains("may only contain")
            || lower.contains("must not")
        {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
