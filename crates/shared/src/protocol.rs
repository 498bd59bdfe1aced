use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::InstanceType;

/// Body of `POST /api/sessions/` and `PUT /api/sessions/{name}`.
///
/// Create stamps `created_by`, update stamps `updated_by`; the other identity field is omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpsert {
    pub name: String,
    pub instance_type: InstanceType,
    #[serde(rename = "lwUrl")]
    pub url: String,
    #[serde(rename = "lwSubAccount")]
    pub sub_account: String,
    #[serde(rename = "lwAccessKeyID")]
    pub access_key_id: String,
    #[serde(rename = "lwSecretKey")]
    pub secret_key: String,
    #[serde(rename = "lwUserGroup")]
    pub user_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Body of the bulk `DELETE /api/sessions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSessionsRequest {
    pub sessions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_carries_creator_and_omits_updater() {
        let body = SessionUpsert {
            name: "summit".to_string(),
            instance_type: InstanceType::Default,
            url: String::new(),
            sub_account: String::new(),
            access_key_id: String::new(),
            secret_key: String::new(),
            user_group: "group-1".to_string(),
            created_by: Some("admin@example.com".to_string()),
            updated_by: None,
            expires_at: "2025-01-01T00:00:00Z".parse().expect("ts"),
        };

        let value = serde_json::to_value(&body).expect("encode");
        assert_eq!(value["instanceType"], "DEFAULT");
        assert_eq!(value["lwUserGroup"], "group-1");
        assert_eq!(value["createdBy"], "admin@example.com");
        assert!(value.get("updatedBy").is_none());
        assert_eq!(value["expiresAt"], "2025-01-01T00:00:00Z");
    }
}
