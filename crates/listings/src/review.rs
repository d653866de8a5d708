use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lodge_core::fields::{self, FieldMap};
use lodge_core::{DomainError, DomainResult, Entity, PlaceId, ReviewId, UserId};

const MAX_TEXT_LEN: usize = 1000;
const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Review record: one user's rating of one place.
///
/// The (user_id, place_id) pair is unique among reviews and the author must
/// not own the place; both rules are enforced by the facade's business-rule
/// step, since they need store access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub text: String,
    pub rating: u8,
    pub user_id: UserId,
    pub place_id: PlaceId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = ReviewId;

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

/// Validated creation fields for a review.
///
/// `user_id` stays optional here: when omitted the facade defaults it to the
/// acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub text: String,
    pub rating: u8,
    pub user_id: Option<UserId>,
    pub place_id: PlaceId,
}

/// Field names accepted on creation.
pub const CREATE_FIELDS: &[&str] = &["text", "rating", "user_id", "place_id"];

/// Field names accepted on update. The referenced user and place are fixed
/// for the lifetime of a review.
pub const UPDATE_FIELDS: &[&str] = &["text", "rating"];

impl ReviewDraft {
    pub fn from_fields(input: &FieldMap) -> DomainResult<Self> {
        fields::ensure_known(input, CREATE_FIELDS)?;

        let text = validate_text(fields::require_str(input, "text")?)?;
        let rating = validate_rating(fields::require_i64(input, "rating")?)?;
        let user_id = fields::optional_str(input, "user_id")?
            .map(str::parse::<UserId>)
            .transpose()?;
        let place_id: PlaceId = fields::require_str(input, "place_id")?.parse()?;

        Ok(Self {
            text,
            rating,
            user_id,
            place_id,
        })
    }
}

impl Review {
    /// Build the record from a validated draft and the resolved author.
    pub fn build(draft: ReviewDraft, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ReviewId::new(),
            text: draft.text,
            rating: draft.rating,
            user_id,
            place_id: draft.place_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial field map, returning the updated record.
    pub fn apply_update(&self, changes: &FieldMap) -> DomainResult<Review> {
        fields::ensure_known(changes, UPDATE_FIELDS)?;

        let mut updated = self.clone();
        if let Some(text) = fields::optional_str(changes, "text")? {
            updated.text = validate_text(text)?;
        }
        if let Some(rating) = fields::optional_i64(changes, "rating")? {
            updated.rating = validate_rating(rating)?;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }
}

fn validate_text(raw: &str) -> DomainResult<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DomainError::validation("text cannot be empty"));
    }
    if text.len() > MAX_TEXT_LEN {
        return Err(DomainError::validation(format!(
            "text cannot exceed {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(text.to_string())
}

fn validate_rating(rating: i64) -> DomainResult<u8> {
    if !RATING_RANGE.contains(&rating) {
        return Err(DomainError::validation("rating must be between 1 and 5"));
    }
    Ok(rating as u8)
}
