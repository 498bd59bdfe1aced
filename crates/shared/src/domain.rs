use std::{cmp::Ordering, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User group attendees land in when a session does not name one.
pub const DEFAULT_USER_GROUP: &str = "LACEWORK_USER_GROUP_READ_ONLY_USER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceType {
    /// Platform-managed endpoint and credentials.
    #[default]
    Default,
    /// Admin-supplied endpoint and credentials.
    Custom,
}

impl InstanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceType::Default => "DEFAULT",
            InstanceType::Custom => "CUSTOM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("default") {
            Some(InstanceType::Default)
        } else if value.eq_ignore_ascii_case("custom") {
            Some(InstanceType::Custom)
        } else {
            None
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed attendee-provisioning configuration as served by `/api/sessions/`.
///
/// `name` is the natural key: edit, delete and event links all address a session by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub name: String,
    #[serde(default)]
    pub instance_type: InstanceType,
    #[serde(default, rename = "lwUrl")]
    pub url: String,
    #[serde(default, rename = "lwSubAccount")]
    pub sub_account: String,
    #[serde(default, rename = "lwAccessKeyID")]
    pub access_key_id: String,
    #[serde(default, rename = "lwSecretKey")]
    pub secret_key: String,
    #[serde(default, rename = "lwUserGroup")]
    pub user_group: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub reg_count: u64,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Sortable columns of the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionColumn {
    Name,
    InstanceType,
    Url,
    AccessKeyId,
    SecretKey,
    UserGroup,
    ExpiresAt,
    CreatedBy,
    UpdatedBy,
    RegCount,
}

impl SessionColumn {
    pub const ALL: [SessionColumn; 10] = [
        SessionColumn::Name,
        SessionColumn::InstanceType,
        SessionColumn::Url,
        SessionColumn::AccessKeyId,
        SessionColumn::SecretKey,
        SessionColumn::UserGroup,
        SessionColumn::ExpiresAt,
        SessionColumn::CreatedBy,
        SessionColumn::UpdatedBy,
        SessionColumn::RegCount,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionColumn::Name => "Name",
            SessionColumn::InstanceType => "Type",
            SessionColumn::Url => "Lacework URL",
            SessionColumn::AccessKeyId => "Access Key ID",
            SessionColumn::SecretKey => "Secret Key",
            SessionColumn::UserGroup => "User Group",
            SessionColumn::ExpiresAt => "Expires At",
            SessionColumn::CreatedBy => "Created By",
            SessionColumn::UpdatedBy => "Updated By",
            SessionColumn::RegCount => "Reg Count",
        }
    }

    /// Key used on the command line, e.g. `--sort expires-at`.
    pub fn key(self) -> &'static str {
        match self {
            SessionColumn::Name => "name",
            SessionColumn::InstanceType => "type",
            SessionColumn::Url => "url",
            SessionColumn::AccessKeyId => "access-key-id",
            SessionColumn::SecretKey => "secret-key",
            SessionColumn::UserGroup => "user-group",
            SessionColumn::ExpiresAt => "expires-at",
            SessionColumn::CreatedBy => "created-by",
            SessionColumn::UpdatedBy => "updated-by",
            SessionColumn::RegCount => "reg-count",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(key))
    }

    /// Natural ordering of the column's field: lexicographic for text, numeric for the
    /// registrant count, chronological for the expiry.
    pub fn compare(self, a: &Session, b: &Session) -> Ordering {
        match self {
            SessionColumn::Name => a.name.cmp(&b.name),
            SessionColumn::InstanceType => a.instance_type.as_str().cmp(b.instance_type.as_str()),
            SessionColumn::Url => a.url.cmp(&b.url),
            SessionColumn::AccessKeyId => a.access_key_id.cmp(&b.access_key_id),
            SessionColumn::SecretKey => a.secret_key.cmp(&b.secret_key),
            SessionColumn::UserGroup => a.user_group.cmp(&b.user_group),
            SessionColumn::ExpiresAt => a.expires_at.cmp(&b.expires_at),
            SessionColumn::CreatedBy => a.created_by.cmp(&b.created_by),
            SessionColumn::UpdatedBy => a.updated_by.cmp(&b.updated_by),
            SessionColumn::RegCount => a.reg_count.cmp(&b.reg_count),
        }
    }
}

/// An attendee's self-service signup against one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
}

/// The signed-in administrator as reported by `/oauth2/userinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub email: String,
}

impl AuthenticatedUser {
    pub fn display_name(&self) -> &str {
        local_part(&self.email)
    }
}

/// Part of an email address before `@`, or the whole value when there is none.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_session_from_collaborator_payload() {
        let raw = r#"{
            "name": "reinvent_2024",
            "instanceType": "CUSTOM",
            "lwUrl": "acme.lacework.net",
            "lwSubAccount": "",
            "lwAccessKeyID": "ACME_0123",
            "lwSecretKey": "_secret",
            "lwUserGroup": "LACEWORK_USER_GROUP_READ_ONLY_USER",
            "createdBy": "alice@example.com",
            "updatedBy": "",
            "createdAt": "2024-11-01T10:00:00Z",
            "updatedAt": "2024-11-01T10:00:00Z",
            "expiresAt": "2024-11-04T10:00:00Z",
            "regCount": 12
        }"#;

        let session: Session = serde_json::from_str(raw).expect("decode session");
        assert_eq!(session.name, "reinvent_2024");
        assert_eq!(session.instance_type, InstanceType::Custom);
        assert_eq!(session.url, "acme.lacework.net");
        assert_eq!(session.access_key_id, "ACME_0123");
        assert_eq!(session.reg_count, 12);
        assert_eq!(
            session.expires_at,
            "2024-11-04T10:00:00Z".parse::<DateTime<Utc>>().expect("ts")
        );
    }

    #[test]
    fn decodes_sparse_default_session() {
        let raw = r#"{"name":"kubecon","instanceType":"DEFAULT","expiresAt":"2025-03-20T00:00:00Z"}"#;
        let session: Session = serde_json::from_str(raw).expect("decode session");
        assert_eq!(session.instance_type, InstanceType::Default);
        assert!(session.url.is_empty());
        assert_eq!(session.reg_count, 0);
        assert!(session.created_at.is_none());
    }

    #[test]
    fn column_keys_resolve_case_insensitively() {
        assert_eq!(SessionColumn::from_key("Expires-At"), Some(SessionColumn::ExpiresAt));
        assert_eq!(SessionColumn::from_key("name"), Some(SessionColumn::Name));
        assert_eq!(SessionColumn::from_key("colour"), None);
    }

    #[test]
    fn display_name_is_email_local_part() {
        let user = AuthenticatedUser {
            email: "jane.doe@example.com".to_string(),
        };
        assert_eq!(user.display_name(), "jane.doe");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn registration_uses_camel_case_wire_names() {
        let registration = Registration {
            email: "a@b.co".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            company: "Engines".to_string(),
        };
        let value = serde_json::to_value(&registration).expect("encode");
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["lastName"], "Lovelace");
    }
}
