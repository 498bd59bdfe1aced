//! Advisory client-side gates for session and registration fields.
//!
//! The collaborator API is authoritative; these checks only keep obviously broken values
//! out of the forms.

use std::fmt;

use thiserror::Error;

pub const MIN_SESSION_FIELD_LEN: usize = 4;
pub const MIN_EMAIL_LEN: usize = 4;
pub const MIN_PERSON_FIELD_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SessionName,
    Url,
    SubAccount,
    AccessKeyId,
    SecretKey,
    UserGroup,
    Email,
    FirstName,
    LastName,
    Company,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::SessionName => "Name",
            Field::Url => "Lacework URL",
            Field::SubAccount => "Sub-account",
            Field::AccessKeyId => "AccessKeyID",
            Field::SecretKey => "SecretKey",
            Field::UserGroup => "User group",
            Field::Email => "Email",
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Company => "Company",
        }
    }

    pub fn min_len(self) -> usize {
        match self {
            Field::SessionName
            | Field::Url
            | Field::AccessKeyId
            | Field::SecretKey
            | Field::UserGroup => MIN_SESSION_FIELD_LEN,
            Field::Email => MIN_EMAIL_LEN,
            Field::FirstName | Field::LastName | Field::Company => MIN_PERSON_FIELD_LEN,
            Field::SubAccount => 0,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} may only contain {allowed}")]
    InvalidCharacters { field: Field, allowed: &'static str },
    #[error("{field} must not start with a scheme such as https://")]
    SchemePrefix { field: Field },
    #[error("{field} must not end with '/'")]
    TrailingSeparator { field: Field },
    #[error("{field}: Min length > {}", .min - 1)]
    TooShort { field: Field, min: usize },
    #[error("{field} is supplied by the platform for DEFAULT sessions")]
    NotEditable { field: Field },
    #[error("{field} cannot change after the session is created")]
    Immutable { field: Field },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidCharacters { field, .. }
            | ValidationError::SchemePrefix { field }
            | ValidationError::TrailingSeparator { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::NotEditable { field }
            | ValidationError::Immutable { field } => *field,
        }
    }
}

/// Session names are restricted to ASCII letters, digits and `_`.
pub fn validate_session_name(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidCharacters {
            field: Field::SessionName,
            allowed: "letters, digits and '_'",
        })
    }
}

pub fn is_valid_session_name(value: &str) -> bool {
    validate_session_name(value).is_ok()
}

/// Instance URLs are bare hosts with an optional path, e.g. `account.lacework.net`.
///
/// The scheme is added when the canonical endpoint is built, so a leading `http:`/`https:`
/// or a trailing `/` is rejected.
pub fn validate_instance_url(value: &str) -> Result<(), ValidationError> {
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '/' | '-'))
    {
        return Err(ValidationError::InvalidCharacters {
            field: Field::Url,
            allowed: "letters, digits and '.', ':', '/', '-'",
        });
    }

    let lower = value.to_ascii_lowercase();
    if lower.starts_with("https:") || lower.starts_with("http:") {
        return Err(ValidationError::SchemePrefix { field: Field::Url });
    }
    if value.ends_with('/') {
        return Err(ValidationError::TrailingSeparator { field: Field::Url });
    }
    Ok(())
}

pub fn is_valid_instance_url(value: &str) -> bool {
    validate_instance_url(value).is_ok()
}

/// `https://{url}`, the endpoint the backing platform is reached at.
pub fn canonical_endpoint(url: &str) -> String {
    format!("https://{url}")
}

pub fn check_min_len(field: Field, value: &str) -> Result<(), ValidationError> {
    let min = field.min_len();
    if value.chars().count() < min {
        Err(ValidationError::TooShort { field, min })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_name_allows_word_characters_only() {
        assert!(is_valid_session_name("foo_bar1"));
        assert!(is_valid_session_name(""));
        assert!(!is_valid_session_name("foo bar"));
        assert!(!is_valid_session_name("foo-bar"));
        assert!(!is_valid_session_name("café"));
    }

    #[test]
    fn instance_url_rejects_scheme_and_trailing_separator() {
        assert!(is_valid_instance_url("x.com/api"));
        assert!(is_valid_instance_url("acme.lacework.net:443"));
        assert_eq!(
            validate_instance_url("https://x.com"),
            Err(ValidationError::SchemePrefix { field: Field::Url })
        );
        assert_eq!(
            validate_instance_url("HTTP://x.com"),
            Err(ValidationError::SchemePrefix { field: Field::Url })
        );
        assert_eq!(
            validate_instance_url("x.com/"),
            Err(ValidationError::TrailingSeparator { field: Field::Url })
        );
        assert!(!is_valid_instance_url("x.com?q=1"));
    }

    #[test]
    fn canonical_endpoint_prefixes_https() {
        assert_eq!(canonical_endpoint("acme.lacework.net"), "https://acme.lacework.net");
    }

    #[test]
    fn min_length_thresholds_follow_field_kind() {
        assert!(check_min_len(Field::SessionName, "abc").is_err());
        assert!(check_min_len(Field::SessionName, "abcd").is_ok());
        assert!(check_min_len(Field::FirstName, "Al").is_err());
        assert!(check_min_len(Field::FirstName, "Ada").is_ok());
        let err = check_min_len(Field::Email, "a@b").expect_err("too short");
        assert_eq!(err.to_string(), "Email: Min length > 3");
    }
}
