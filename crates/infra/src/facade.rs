//! The access facade: one operation per use case.
//!
//! This is the single component the transport layer calls. Every write runs
//! the same pipeline: validate fields, check relationships, check
//! authorization, check business rules, persist. A failure at any step
//! leaves nothing persisted. For operations targeting an existing record,
//! existence is checked before authorization, so a missing target yields
//! `NotFound` rather than `Unauthorized` (deliberate, documented choice).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use lodge_auth::policy::{self, EntityKind, MutationTarget};
use lodge_auth::{derive_password, verify_password, Actor};
use lodge_core::fields::{self, FieldMap};
use lodge_core::{AmenityId, DomainError, DomainResult, PlaceId, ReviewId, UserId};
use lodge_listings::{
    user, Amenity, AmenityDraft, Place, PlaceDraft, Review, ReviewDraft, User, UserDraft, UserView,
};

use crate::relationships::RelationshipValidator;
use crate::store::{InMemoryStore, Store};

/// Denormalized read view of a place: foreign ids resolved to records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceView {
    pub id: PlaceId,
    pub title: String,
    pub description: String,
    pub price_per_night: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner: UserView,
    pub amenities: Vec<Amenity>,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Orchestration point over the entity models, stores, relationship
/// validator and authorization policy.
///
/// Constructed explicitly with injected stores; there is no ambient global
/// instance. The transport layer receives one `Facade` at startup.
#[derive(Clone)]
pub struct Facade {
    users: Arc<dyn Store<User>>,
    places: Arc<dyn Store<Place>>,
    reviews: Arc<dyn Store<Review>>,
    amenities: Arc<dyn Store<Amenity>>,
    relationships: RelationshipValidator,
}

impl Facade {
    pub fn new(
        users: Arc<dyn Store<User>>,
        places: Arc<dyn Store<Place>>,
        reviews: Arc<dyn Store<Review>>,
        amenities: Arc<dyn Store<Amenity>>,
    ) -> Self {
        let relationships = RelationshipValidator::new(
            users.clone(),
            places.clone(),
            reviews.clone(),
            amenities.clone(),
        );
        Self {
            users,
            places,
            reviews,
            amenities,
            relationships,
        }
    }

    /// Facade over fresh in-memory stores (tests/dev).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    /// Register a user. No actor is required for self-registration, but
    /// granting `is_admin` at creation takes an admin actor.
    pub fn create_user(&self, actor: Option<&Actor>, input: &FieldMap) -> DomainResult<UserView> {
        let draft = UserDraft::from_fields(input)?;
        policy::can_create(actor, EntityKind::User)?;
        if draft.is_admin && !actor.is_some_and(|a| a.is_admin) {
            return Err(DomainError::Unauthorized);
        }
        if self
            .users
            .find_one(&|u: &User| u.email_matches(&draft.email))?
            .is_some()
        {
            return Err(DomainError::conflict("email already registered"));
        }

        let password_hash = derive_password(&draft.password)?;
        let user = self.users.add(User::build(draft, password_hash))?;
        info!(user_id = %user.id, "user created");
        Ok(UserView::from(&user))
    }

    /// Verify credentials and produce the opaque actor descriptor.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn authenticate(&self, email: &str, password: &str) -> DomainResult<Actor> {
        let user = self
            .users
            .find_one(&|u: &User| u.email_matches(email))?
            .ok_or(DomainError::Authentication)?;
        if !verify_password(password, &user.password_hash) {
            return Err(DomainError::Authentication);
        }
        info!(user_id = %user.id, "user authenticated");
        Ok(Actor::new(user.id, user.is_admin))
    }

    pub fn get_user(&self, id: UserId) -> DomainResult<UserView> {
        let user = self.users.get(&id)?.ok_or(DomainError::NotFound)?;
        Ok(UserView::from(&user))
    }

    pub fn get_user_by_email(&self, email: &str) -> DomainResult<UserView> {
        let user = self
            .users
            .find_one(&|u: &User| u.email_matches(email))?
            .ok_or(DomainError::NotFound)?;
        Ok(UserView::from(&user))
    }

    pub fn list_users(&self) -> DomainResult<Vec<UserView>> {
        Ok(self.users.get_all()?.iter().map(UserView::from).collect())
    }

    /// Update a user. Admins may change anything; a user updating themselves
    /// may not touch `email` or `password`.
    pub fn update_user(&self, actor: &Actor, id: UserId, input: &FieldMap) -> DomainResult<UserView> {
        let current = self.users.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_mutate(actor, MutationTarget::User { id })?;

        fields::ensure_known(input, user::UPDATE_FIELDS)?;
        if !actor.is_admin
            && (input.contains_key("email") || input.contains_key("password"))
        {
            return Err(DomainError::validation(
                "you cannot modify email or password",
            ));
        }
        // The admin flag is only ever granted by another admin.
        if !actor.is_admin && input.contains_key("is_admin") {
            return Err(DomainError::Unauthorized);
        }

        let mut changes = input.clone();
        let password_hash = match changes.remove("password") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if !s.is_empty() => Some(derive_password(&s)?),
            Some(_) => {
                return Err(DomainError::validation(
                    "password must be a non-empty string",
                ));
            }
        };

        // Fail fast on field errors, then re-check email uniqueness against
        // the candidate before persisting.
        let candidate = current.apply_update(&changes)?;
        if !current.email_matches(&candidate.email)
            && self
                .users
                .find_one(&|u: &User| u.email_matches(&candidate.email) && u.id != id)?
                .is_some()
        {
            return Err(DomainError::conflict("email already registered"));
        }

        let updated = self.users.update(&id, &mut |rec| {
            let mut next = rec.apply_update(&changes)?;
            if let Some(hash) = &password_hash {
                next = next.with_password_hash(hash.clone());
            }
            *rec = next;
            Ok(())
        })?;
        info!(user_id = %id, "user updated");
        Ok(UserView::from(&updated))
    }

    /// Delete a user. Blocked while the user still owns places or has
    /// authored reviews (no cascade).
    pub fn delete_user(&self, actor: &Actor, id: UserId) -> DomainResult<()> {
        self.users.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_delete(actor, MutationTarget::User { id })?;

        if self
            .places
            .find_one(&|p: &Place| p.owner_id == id)?
            .is_some()
        {
            return Err(DomainError::conflict("user still owns places"));
        }
        if self
            .reviews
            .find_one(&|r: &Review| r.user_id == id)?
            .is_some()
        {
            return Err(DomainError::conflict("user still has reviews"));
        }

        self.users.delete(&id)?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Places
    // ─────────────────────────────────────────────────────────────────────

    /// Create a place. An omitted `owner_id` defaults to the actor; creating
    /// a place for another owner is admin-only.
    pub fn create_place(&self, actor: &Actor, input: &FieldMap) -> DomainResult<Place> {
        let draft = PlaceDraft::from_fields(input)?;

        let owner_id = draft.owner_id.unwrap_or(actor.id);
        if !self.relationships.user_exists(owner_id)? {
            return Err(DomainError::relationship("owner not found"));
        }
        let missing = self.relationships.missing_amenities(&draft.amenity_ids)?;
        if let Some(first) = missing.first() {
            return Err(DomainError::relationship(format!("amenity {first} not found")));
        }

        policy::can_create(Some(actor), EntityKind::Place)?;
        if owner_id != actor.id && !actor.is_admin {
            return Err(DomainError::Unauthorized);
        }

        let place = self.places.add(Place::build(draft, owner_id))?;
        info!(place_id = %place.id, owner_id = %owner_id, "place created");
        Ok(place)
    }

    pub fn get_place(&self, id: PlaceId) -> DomainResult<Place> {
        self.places.get(&id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_places(&self) -> DomainResult<Vec<Place>> {
        Ok(self.places.get_all()?)
    }

    /// Denormalized read path: place with owner, amenity records and reviews
    /// resolved. Amenity ids left dangling by a concurrent amenity deletion
    /// are skipped.
    pub fn place_details(&self, id: PlaceId) -> DomainResult<PlaceView> {
        let place = self.places.get(&id)?.ok_or(DomainError::NotFound)?;
        let owner = self
            .users
            .get(&place.owner_id)?
            .ok_or_else(|| DomainError::relationship("owner not found"))?;

        let mut amenities = Vec::with_capacity(place.amenity_ids.len());
        for amenity_id in &place.amenity_ids {
            if let Some(amenity) = self.amenities.get(amenity_id)? {
                amenities.push(amenity);
            }
        }
        let reviews = self.reviews.find_all(&|r: &Review| r.place_id == id)?;

        Ok(PlaceView {
            id: place.id,
            title: place.title,
            description: place.description,
            price_per_night: place.price_per_night,
            latitude: place.latitude,
            longitude: place.longitude,
            owner: UserView::from(&owner),
            amenities,
            reviews,
            created_at: place.created_at,
            updated_at: place.updated_at,
        })
    }

    pub fn update_place(&self, actor: &Actor, id: PlaceId, input: &FieldMap) -> DomainResult<Place> {
        let current = self.places.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_mutate(actor, MutationTarget::Place { owner_id: current.owner_id })?;

        // Fail fast on field errors and validate any new amenity references
        // before taking the write path.
        let candidate = current.apply_update(input)?;
        if candidate.amenity_ids != current.amenity_ids {
            let missing = self.relationships.missing_amenities(&candidate.amenity_ids)?;
            if let Some(first) = missing.first() {
                return Err(DomainError::relationship(format!(
                    "amenity {first} not found"
                )));
            }
        }

        let updated = self.places.update(&id, &mut |rec| {
            *rec = rec.apply_update(input)?;
            Ok(())
        })?;
        info!(place_id = %id, "place updated");
        Ok(updated)
    }

    /// Delete a place. Blocked while reviews reference it (no cascade).
    pub fn delete_place(&self, actor: &Actor, id: PlaceId) -> DomainResult<()> {
        let current = self.places.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_delete(actor, MutationTarget::Place { owner_id: current.owner_id })?;

        if self
            .reviews
            .find_one(&|r: &Review| r.place_id == id)?
            .is_some()
        {
            return Err(DomainError::conflict("place still has reviews"));
        }

        self.places.delete(&id)?;
        info!(place_id = %id, "place deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reviews
    // ─────────────────────────────────────────────────────────────────────

    /// Create a review. An omitted `user_id` defaults to the actor; authoring
    /// as another user is admin-only. Self-reviews and duplicate reviews are
    /// rejected regardless of admin status.
    pub fn create_review(&self, actor: &Actor, input: &FieldMap) -> DomainResult<Review> {
        let draft = ReviewDraft::from_fields(input)?;

        if !self.relationships.place_exists(draft.place_id)? {
            return Err(DomainError::relationship("place not found"));
        }
        let author_id = draft.user_id.unwrap_or(actor.id);
        if !self.relationships.user_exists(author_id)? {
            return Err(DomainError::relationship("user not found"));
        }

        policy::can_create(Some(actor), EntityKind::Review)?;
        if author_id != actor.id && !actor.is_admin {
            return Err(DomainError::Unauthorized);
        }

        if self.relationships.is_self_review(author_id, draft.place_id)? {
            return Err(DomainError::validation("you cannot review your own place"));
        }
        if self.relationships.review_conflict(author_id, draft.place_id)? {
            return Err(DomainError::conflict(
                "you have already reviewed this place",
            ));
        }

        let review = self.reviews.add(Review::build(draft, author_id))?;
        info!(review_id = %review.id, place_id = %review.place_id, "review created");
        Ok(review)
    }

    pub fn get_review(&self, id: ReviewId) -> DomainResult<Review> {
        self.reviews.get(&id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_reviews(&self) -> DomainResult<Vec<Review>> {
        Ok(self.reviews.get_all()?)
    }

    /// All reviews for one place, insertion order. Fails with `NotFound` when
    /// the place itself does not exist.
    pub fn reviews_for_place(&self, place_id: PlaceId) -> DomainResult<Vec<Review>> {
        if !self.relationships.place_exists(place_id)? {
            return Err(DomainError::NotFound);
        }
        Ok(self.reviews.find_all(&|r: &Review| r.place_id == place_id)?)
    }

    pub fn update_review(
        &self,
        actor: &Actor,
        id: ReviewId,
        input: &FieldMap,
    ) -> DomainResult<Review> {
        let current = self.reviews.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_mutate(actor, MutationTarget::Review { author_id: current.user_id })?;

        let updated = self.reviews.update(&id, &mut |rec| {
            *rec = rec.apply_update(input)?;
            Ok(())
        })?;
        info!(review_id = %id, "review updated");
        Ok(updated)
    }

    /// Delete a review. Unconditional once authorized.
    pub fn delete_review(&self, actor: &Actor, id: ReviewId) -> DomainResult<()> {
        let current = self.reviews.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_delete(actor, MutationTarget::Review { author_id: current.user_id })?;
        self.reviews.delete(&id)?;
        info!(review_id = %id, "review deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Amenities (admin-managed)
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_amenity(&self, actor: &Actor, input: &FieldMap) -> DomainResult<Amenity> {
        let draft = AmenityDraft::from_fields(input)?;
        policy::can_create(Some(actor), EntityKind::Amenity)?;

        if self
            .amenities
            .find_one(&|a: &Amenity| a.name == draft.name)?
            .is_some()
        {
            return Err(DomainError::conflict("name already registered"));
        }

        let amenity = self.amenities.add(Amenity::build(draft))?;
        info!(amenity_id = %amenity.id, "amenity created");
        Ok(amenity)
    }

    pub fn get_amenity(&self, id: AmenityId) -> DomainResult<Amenity> {
        self.amenities.get(&id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_amenities(&self) -> DomainResult<Vec<Amenity>> {
        Ok(self.amenities.get_all()?)
    }

    pub fn update_amenity(
        &self,
        actor: &Actor,
        id: AmenityId,
        input: &FieldMap,
    ) -> DomainResult<Amenity> {
        let current = self.amenities.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_mutate(actor, MutationTarget::Amenity)?;

        let candidate = current.apply_update(input)?;
        if candidate.name != current.name
            && self
                .amenities
                .find_one(&|a: &Amenity| a.name == candidate.name && a.id != id)?
                .is_some()
        {
            return Err(DomainError::conflict("name already registered"));
        }

        let updated = self.amenities.update(&id, &mut |rec| {
            *rec = rec.apply_update(input)?;
            Ok(())
        })?;
        info!(amenity_id = %id, "amenity updated");
        Ok(updated)
    }

    /// Delete an amenity and detach its id from every place referencing it.
    pub fn delete_amenity(&self, actor: &Actor, id: AmenityId) -> DomainResult<()> {
        self.amenities.get(&id)?.ok_or(DomainError::NotFound)?;
        policy::can_delete(actor, MutationTarget::Amenity)?;

        self.amenities.delete(&id)?;
        let referencing = self
            .places
            .find_all(&|p: &Place| p.amenity_ids.contains(&id))?;
        for place in referencing {
            self.places.update(&place.id, &mut |rec| {
                *rec = rec.without_amenity(id);
                Ok(())
            })?;
        }
        info!(amenity_id = %id, "amenity deleted");
        Ok(())
    }
}
