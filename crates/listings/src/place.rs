use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lodge_core::fields::{self, FieldMap};
use lodge_core::{AmenityId, DomainError, DomainResult, Entity, PlaceId, UserId};

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Rental place record.
///
/// `owner_id` and `amenity_ids` are foreign references by id; existence is
/// checked by the facade's relationship step, never embedded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub title: String,
    pub description: String,
    pub price_per_night: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: UserId,
    pub amenity_ids: Vec<AmenityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Place {
    type Id = PlaceId;

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

/// Validated creation fields for a place.
///
/// `owner_id` stays optional here: when omitted the facade defaults it to the
/// acting user.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDraft {
    pub title: String,
    pub description: String,
    pub price_per_night: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: Option<UserId>,
    pub amenity_ids: Vec<AmenityId>,
}

/// Field names accepted on creation.
pub const CREATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "price_per_night",
    "latitude",
    "longitude",
    "owner_id",
    "amenity_ids",
];

/// Field names accepted on update. Ownership is immutable: a place cannot be
/// transferred, so `owner_id` is not in the mutable set.
pub const UPDATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "price_per_night",
    "latitude",
    "longitude",
    "amenity_ids",
];

impl PlaceDraft {
    pub fn from_fields(input: &FieldMap) -> DomainResult<Self> {
        fields::ensure_known(input, CREATE_FIELDS)?;

        let title = validate_title(fields::require_str(input, "title")?)?;
        let description =
            validate_description(fields::optional_str(input, "description")?.unwrap_or(""))?;
        let price_per_night = validate_price(fields::require_f64(input, "price_per_night")?)?;
        let latitude = validate_latitude(fields::require_f64(input, "latitude")?)?;
        let longitude = validate_longitude(fields::require_f64(input, "longitude")?)?;
        let owner_id = fields::optional_str(input, "owner_id")?
            .map(str::parse::<UserId>)
            .transpose()?;
        let amenity_ids = parse_amenity_ids(
            fields::optional_str_list(input, "amenity_ids")?.unwrap_or_default(),
        )?;

        Ok(Self {
            title,
            description,
            price_per_night,
            latitude,
            longitude,
            owner_id,
            amenity_ids,
        })
    }
}

impl Place {
    /// Build the record from a validated draft and the resolved owner.
    pub fn build(draft: PlaceDraft, owner_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: PlaceId::new(),
            title: draft.title,
            description: draft.description,
            price_per_night: draft.price_per_night,
            latitude: draft.latitude,
            longitude: draft.longitude,
            owner_id,
            amenity_ids: draft.amenity_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial field map, returning the updated record.
    pub fn apply_update(&self, changes: &FieldMap) -> DomainResult<Place> {
        fields::ensure_known(changes, UPDATE_FIELDS)?;

        let mut updated = self.clone();
        if let Some(title) = fields::optional_str(changes, "title")? {
            updated.title = validate_title(title)?;
        }
        if let Some(description) = fields::optional_str(changes, "description")? {
            updated.description = validate_description(description)?;
        }
        if let Some(price) = fields::optional_f64(changes, "price_per_night")? {
            updated.price_per_night = validate_price(price)?;
        }
        if let Some(latitude) = fields::optional_f64(changes, "latitude")? {
            updated.latitude = validate_latitude(latitude)?;
        }
        if let Some(longitude) = fields::optional_f64(changes, "longitude")? {
            updated.longitude = validate_longitude(longitude)?;
        }
        if let Some(ids) = fields::optional_str_list(changes, "amenity_ids")? {
            updated.amenity_ids = parse_amenity_ids(ids)?;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }

    /// Drop a dangling amenity reference (used when an amenity is deleted).
    pub fn without_amenity(&self, amenity_id: AmenityId) -> Place {
        let mut updated = self.clone();
        updated.amenity_ids.retain(|id| *id != amenity_id);
        updated.updated_at = Utc::now();
        updated
    }
}

fn validate_title(raw: &str) -> DomainResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(raw: &str) -> DomainResult<String> {
    let description = raw.trim();
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

fn validate_price(price: f64) -> DomainResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price_per_night must be >= 0"));
    }
    Ok(price)
}

fn validate_latitude(latitude: f64) -> DomainResult<f64> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DomainError::validation("latitude must be within [-90, 90]"));
    }
    Ok(latitude)
}

fn validate_longitude(longitude: f64) -> DomainResult<f64> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::validation(
            "longitude must be within [-180, 180]",
        ));
    }
    Ok(longitude)
}

/// Parse and deduplicate amenity ids, preserving first-seen order.
fn parse_amenity_ids(raw: Vec<&str>) -> DomainResult<Vec<AmenityId>> {
    let mut ids: Vec<AmenityId> = Vec::with_capacity(raw.len());
    for s in raw {
        let id: AmenityId = s.parse()?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
