use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use lodge_core::fields::{self, FieldMap};
use lodge_core::{DomainError, DomainResult, Entity, UserId};

const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 50;

// `local@domain.tld` shape; full RFC address grammar is out of scope.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// User account record.
///
/// `password_hash` is the one-way derived credential. It is stored and
/// compared, never round-tripped in output; [`UserView`] is the only output
/// shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Output projection of a [`User`]: every field except the credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Validated creation fields for a user.
///
/// Holds the plaintext password transiently; the caller derives the stored
/// credential before constructing the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_admin: bool,
}

/// Field names accepted on creation.
pub const CREATE_FIELDS: &[&str] = &["email", "first_name", "last_name", "password", "is_admin"];

/// Field names accepted on update. `password` is extracted and derived by the
/// facade before [`User::apply_update`] sees the changes.
pub const UPDATE_FIELDS: &[&str] = &["email", "first_name", "last_name", "password", "is_admin"];

const APPLY_FIELDS: &[&str] = &["email", "first_name", "last_name", "is_admin"];

impl UserDraft {
    pub fn from_fields(input: &FieldMap) -> DomainResult<Self> {
        fields::ensure_known(input, CREATE_FIELDS)?;

        let email = validate_email(fields::require_str(input, "email")?)?;
        let first_name = validate_name(fields::require_str(input, "first_name")?, "first_name")?;
        let last_name = validate_name(fields::require_str(input, "last_name")?, "last_name")?;
        let password = fields::require_str(input, "password")?;
        if password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        let is_admin = fields::optional_bool(input, "is_admin")?.unwrap_or(false);

        Ok(Self {
            email,
            first_name,
            last_name,
            password: password.to_string(),
            is_admin,
        })
    }
}

impl User {
    /// Build the record from a validated draft and the derived credential.
    pub fn build(draft: UserDraft, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            password_hash,
            is_admin: draft.is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial field map, returning the updated record.
    ///
    /// Only fields present in `changes` are touched; each is validated by the
    /// same rules as creation. The stored record is never mutated in place.
    pub fn apply_update(&self, changes: &FieldMap) -> DomainResult<User> {
        fields::ensure_known(changes, APPLY_FIELDS)?;

        let mut updated = self.clone();
        if let Some(email) = fields::optional_str(changes, "email")? {
            updated.email = validate_email(email)?;
        }
        if let Some(name) = fields::optional_str(changes, "first_name")? {
            updated.first_name = validate_name(name, "first_name")?;
        }
        if let Some(name) = fields::optional_str(changes, "last_name")? {
            updated.last_name = validate_name(name, "last_name")?;
        }
        if let Some(flag) = fields::optional_bool(changes, "is_admin")? {
            updated.is_admin = flag;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }

    /// Replace the stored credential (already derived by the caller).
    pub fn with_password_hash(mut self, password_hash: String) -> Self {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
        self
    }

    /// Case-insensitive email comparison used for the uniqueness rule.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

fn validate_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(DomainError::validation("email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(DomainError::validation(format!(
            "email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    if !EMAIL_SHAPE.is_match(email) {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email.to_string())
}

fn validate_name(raw: &str, field: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> FieldMap {
        value.as_object().unwrap().clone()
    }

    fn draft() -> UserDraft {
        UserDraft::from_fields(&payload(json!({
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Smith",
            "password": "s3cret",
        })))
        .unwrap()
    }

    #[test]
    fn draft_from_valid_fields() {
        let draft = draft();
        assert_eq!(draft.email, "alice@example.com");
        assert_eq!(draft.first_name, "Alice");
        assert!(!draft.is_admin);
    }

    #[test]
    fn draft_trims_string_fields() {
        let draft = UserDraft::from_fields(&payload(json!({
            "email": "  alice@example.com  ",
            "first_name": "  Alice ",
            "last_name": "Smith",
            "password": "s3cret",
        })))
        .unwrap();
        assert_eq!(draft.email, "alice@example.com");
        assert_eq!(draft.first_name, "Alice");
    }

    #[test]
    fn draft_rejects_malformed_email() {
        for bad in ["not-an-email", "a@b", "a@b.", "@example.com", "a b@example.com"] {
            let err = UserDraft::from_fields(&payload(json!({
                "email": bad,
                "first_name": "Alice",
                "last_name": "Smith",
                "password": "s3cret",
            })))
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "accepted {bad}");
        }
    }

    #[test]
    fn draft_rejects_overlong_names() {
        let err = UserDraft::from_fields(&payload(json!({
            "email": "alice@example.com",
            "first_name": "a".repeat(51),
            "last_name": "Smith",
            "password": "s3cret",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("first_name"));
    }

    #[test]
    fn draft_rejects_unknown_field() {
        let err = UserDraft::from_fields(&payload(json!({
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Smith",
            "password": "s3cret",
            "nickname": "Al",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn draft_names_missing_field() {
        let err = UserDraft::from_fields(&payload(json!({
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Smith",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn build_assigns_id_and_timestamps() {
        let user = User::build(draft(), "derived".into());
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.password_hash, "derived");
    }

    #[test]
    fn apply_update_changes_only_present_fields() {
        let user = User::build(draft(), "derived".into());
        let updated = user
            .apply_update(&payload(json!({"first_name": "Alicia"})))
            .unwrap();
        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.last_name, user.last_name);
        assert_eq!(updated.email, user.email);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[test]
    fn apply_update_rejects_unknown_field() {
        let user = User::build(draft(), "derived".into());
        let err = user
            .apply_update(&payload(json!({"nickname": "Al"})))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn apply_update_rejects_password_key() {
        // The facade strips `password` before calling; a leftover key is a bug.
        let user = User::build(draft(), "derived".into());
        assert!(user.apply_update(&payload(json!({"password": "x"}))).is_err());
    }

    #[test]
    fn email_matching_is_case_insensitive() {
        let user = User::build(draft(), "derived".into());
        assert!(user.email_matches("ALICE@EXAMPLE.COM"));
        assert!(user.email_matches("  alice@example.com "));
        assert!(!user.email_matches("bob@example.com"));
    }

    #[test]
    fn view_carries_no_credential() {
        let user = User::build(draft(), "derived".into());
        let view = UserView::from(&user);
        let encoded = serde_json::to_string(&view).unwrap();
        assert!(!encoded.contains("derived"));
        assert!(!encoded.contains("password"));
    }
}
