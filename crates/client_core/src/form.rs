//! Structured form state for the add/edit session dialog and the attendee registration form.
//!
//! Each form is one record changed through a single `apply` function, so a flow can never
//! leave half of its fields stale from a previous flow.

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{InstanceType, Registration, Session, DEFAULT_USER_GROUP},
    protocol::SessionUpsert,
    validation::{
        check_min_len, validate_instance_url, validate_session_name, Field, ValidationError,
    },
};

/// New sessions expire this many days after the add dialog opens.
pub const DEFAULT_EXPIRY_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing the session with this name; the name itself is fixed.
    Edit { original: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionFields {
    pub name: String,
    pub instance_type: InstanceType,
    pub url: String,
    pub sub_account: String,
    pub access_key_id: String,
    pub secret_key: String,
    pub user_group: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEdit {
    Name(String),
    InstanceType(InstanceType),
    Url(String),
    SubAccount(String),
    AccessKeyId(String),
    SecretKey(String),
    UserGroup(String),
    ExpiresAt(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionForm {
    mode: FormMode,
    fields: SessionFields,
}

impl SessionForm {
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            mode: FormMode::Create,
            fields: SessionFields {
                name: String::new(),
                instance_type: InstanceType::Default,
                url: String::new(),
                sub_account: String::new(),
                access_key_id: String::new(),
                secret_key: String::new(),
                user_group: DEFAULT_USER_GROUP.to_string(),
                expires_at: now + Duration::days(DEFAULT_EXPIRY_DAYS),
            },
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self {
            mode: FormMode::Edit {
                original: session.name.clone(),
            },
            fields: SessionFields {
                name: session.name.clone(),
                instance_type: session.instance_type,
                url: session.url.clone(),
                sub_account: session.sub_account.clone(),
                access_key_id: session.access_key_id.clone(),
                secret_key: session.secret_key.clone(),
                user_group: session.user_group.clone(),
                expires_at: session.expires_at,
            },
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &SessionFields {
        &self.fields
    }

    fn is_default_instance(&self) -> bool {
        self.fields.instance_type == InstanceType::Default
    }

    fn ensure_custom(&self, field: Field) -> Result<(), ValidationError> {
        if self.is_default_instance() {
            Err(ValidationError::NotEditable { field })
        } else {
            Ok(())
        }
    }

    /// Applies one edit. Rejected edits leave the form untouched.
    pub fn apply(&mut self, edit: SessionEdit) -> Result<(), ValidationError> {
        match edit {
            SessionEdit::Name(value) => {
                if matches!(self.mode, FormMode::Edit { .. }) {
                    return Err(ValidationError::Immutable {
                        field: Field::SessionName,
                    });
                }
                validate_session_name(&value)?;
                self.fields.name = value;
            }
            SessionEdit::InstanceType(value) => self.fields.instance_type = value,
            SessionEdit::Url(value) => {
                self.ensure_custom(Field::Url)?;
                validate_instance_url(&value)?;
                self.fields.url = value;
            }
            SessionEdit::SubAccount(value) => {
                self.ensure_custom(Field::SubAccount)?;
                self.fields.sub_account = value;
            }
            SessionEdit::AccessKeyId(value) => {
                self.ensure_custom(Field::AccessKeyId)?;
                self.fields.access_key_id = value;
            }
            SessionEdit::SecretKey(value) => {
                self.ensure_custom(Field::SecretKey)?;
                self.fields.secret_key = value;
            }
            SessionEdit::UserGroup(value) => self.fields.user_group = value,
            SessionEdit::ExpiresAt(value) => self.fields.expires_at = value,
        }
        Ok(())
    }

    /// Fields currently under their minimum length. Shown next to the inputs; they do not
    /// block submission.
    pub fn issues(&self) -> Vec<ValidationError> {
        let f = &self.fields;
        let mut checks = vec![
            (Field::SessionName, f.name.as_str()),
            (Field::UserGroup, f.user_group.as_str()),
        ];
        if !self.is_default_instance() {
            checks.extend([
                (Field::Url, f.url.as_str()),
                (Field::AccessKeyId, f.access_key_id.as_str()),
                (Field::SecretKey, f.secret_key.as_str()),
            ]);
        }
        checks
            .into_iter()
            .filter_map(|(field, value)| check_min_len(field, value).err())
            .collect()
    }

    pub fn issue_for(&self, field: Field) -> Option<ValidationError> {
        self.issues().into_iter().find(|issue| issue.field() == field)
    }

    /// Request body for the current mode, stamped with `actor` as creator or updater.
    /// `DEFAULT` sessions never carry endpoint or credential values.
    pub fn to_upsert(&self, actor: &str) -> SessionUpsert {
        let f = &self.fields;
        let custom = !self.is_default_instance();
        let keep = |value: &String| if custom { value.clone() } else { String::new() };
        let (created_by, updated_by) = match self.mode {
            FormMode::Create => (Some(actor.to_string()), None),
            FormMode::Edit { .. } => (None, Some(actor.to_string())),
        };
        SessionUpsert {
            name: f.name.clone(),
            instance_type: f.instance_type,
            url: keep(&f.url),
            sub_account: keep(&f.sub_account),
            access_key_id: keep(&f.access_key_id),
            secret_key: keep(&f.secret_key),
            user_group: f.user_group.clone(),
            created_by,
            updated_by,
            expires_at: f.expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEdit {
    Email(String),
    FirstName(String),
    LastName(String),
    Company(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    fields: Registration,
}

impl RegistrationForm {
    pub fn fields(&self) -> &Registration {
        &self.fields
    }

    pub fn apply(&mut self, edit: RegistrationEdit) {
        match edit {
            RegistrationEdit::Email(v) => self.fields.email = v,
            RegistrationEdit::FirstName(v) => self.fields.first_name = v,
            RegistrationEdit::LastName(v) => self.fields.last_name = v,
            RegistrationEdit::Company(v) => self.fields.company = v,
        }
    }

    pub fn issues(&self) -> Vec<ValidationError> {
        let f = &self.fields;
        [
            (Field::Email, f.email.as_str()),
            (Field::FirstName, f.first_name.as_str()),
            (Field::LastName, f.last_name.as_str()),
            (Field::Company, f.company.as_str()),
        ]
        .into_iter()
        .filter_map(|(field, value)| check_min_len(field, value).err())
        .collect()
    }

    pub fn to_registration(&self) -> Registration {
        self.fields.clone()
    }
}
