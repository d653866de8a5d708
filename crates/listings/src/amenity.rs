use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lodge_core::fields::{self, FieldMap};
use lodge_core::{AmenityId, DomainError, DomainResult, Entity};

const MAX_NAME_LEN: usize = 50;

/// Amenity record. Names are unique (case-sensitive) across amenities; the
/// uniqueness rule needs store access and lives with the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenity {
    pub id: AmenityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Amenity {
    type Id = AmenityId;

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

/// Validated creation fields for an amenity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmenityDraft {
    pub name: String,
}

/// Field names accepted on creation and update.
pub const CREATE_FIELDS: &[&str] = &["name"];
pub const UPDATE_FIELDS: &[&str] = &["name"];

impl AmenityDraft {
    pub fn from_fields(input: &FieldMap) -> DomainResult<Self> {
        fields::ensure_known(input, CREATE_FIELDS)?;
        let name = validate_name(fields::require_str(input, "name")?)?;
        Ok(Self { name })
    }
}

impl Amenity {
    /// Build the record from a validated draft.
    pub fn build(draft: AmenityDraft) -> Self {
        let now = Utc::now();
        Self {
            id: AmenityId::new(),
            name: draft.name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial field map, returning the updated record.
    pub fn apply_update(&self, changes: &FieldMap) -> DomainResult<Amenity> {
        fields::ensure_known(changes, UPDATE_FIELDS)?;

        let mut updated = self.clone();
        if let Some(name) = fields::optional_str(changes, "name")? {
            updated.name = validate_name(name)?;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }
}

fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
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

    #[test]
    fn draft_trims_and_accepts_valid_name() {
        let draft = AmenityDraft::from_fields(&payload(json!({"name": "  Wifi "}))).unwrap();
        assert_eq!(draft.name, "Wifi");
    }

    #[test]
    fn draft_rejects_empty_name() {
        assert!(AmenityDraft::from_fields(&payload(json!({"name": "  "}))).is_err());
    }

    #[test]
    fn draft_rejects_overlong_name() {
        let err =
            AmenityDraft::from_fields(&payload(json!({"name": "a".repeat(51)}))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn draft_rejects_unknown_field() {
        let err =
            AmenityDraft::from_fields(&payload(json!({"name": "Wifi", "icon": "w"}))).unwrap_err();
        assert!(err.to_string().contains("icon"));
    }

    #[test]
    fn apply_update_renames() {
        let amenity = Amenity::build(AmenityDraft { name: "Wifi".into() });
        let updated = amenity
            .apply_update(&payload(json!({"name": "Fast Wifi"})))
            .unwrap();
        assert_eq!(updated.name, "Fast Wifi");
        assert_eq!(updated.id, amenity.id);
    }
}
