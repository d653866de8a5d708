//! Cross-entity existence and integrity checks.
//!
//! All checks are read-only snapshots over the injected stores; no locking
//! beyond what the store already guarantees per id.

use std::sync::Arc;

use lodge_core::{AmenityId, DomainResult, PlaceId, UserId};
use lodge_listings::{Amenity, Place, Review, User};

use crate::store::Store;

#[derive(Clone)]
pub struct RelationshipValidator {
    users: Arc<dyn Store<User>>,
    places: Arc<dyn Store<Place>>,
    reviews: Arc<dyn Store<Review>>,
    amenities: Arc<dyn Store<Amenity>>,
}

impl RelationshipValidator {
    pub fn new(
        users: Arc<dyn Store<User>>,
        places: Arc<dyn Store<Place>>,
        reviews: Arc<dyn Store<Review>>,
        amenities: Arc<dyn Store<Amenity>>,
    ) -> Self {
        Self {
            users,
            places,
            reviews,
            amenities,
        }
    }

    pub fn user_exists(&self, user_id: UserId) -> DomainResult<bool> {
        Ok(self.users.get(&user_id)?.is_some())
    }

    pub fn place_exists(&self, place_id: PlaceId) -> DomainResult<bool> {
        Ok(self.places.get(&place_id)?.is_some())
    }

    /// Ids in `amenity_ids` that do not reference an existing amenity
    /// (empty means all are valid).
    pub fn missing_amenities(&self, amenity_ids: &[AmenityId]) -> DomainResult<Vec<AmenityId>> {
        let mut missing = Vec::new();
        for id in amenity_ids {
            if self.amenities.get(id)?.is_none() {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// Whether a review by this user for this place already exists.
    pub fn review_conflict(&self, user_id: UserId, place_id: PlaceId) -> DomainResult<bool> {
        Ok(self
            .reviews
            .find_one(&|r: &Review| r.user_id == user_id && r.place_id == place_id)?
            .is_some())
    }

    /// Whether `user_id` owns the reviewed place. A missing place counts as
    /// no self-review; callers check place existence first.
    pub fn is_self_review(&self, user_id: UserId, place_id: PlaceId) -> DomainResult<bool> {
        Ok(self
            .places
            .get(&place_id)?
            .is_some_and(|place| place.owner_id == user_id))
    }
}
