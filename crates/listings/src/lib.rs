//! `lodge-listings` — entity models for the rental-listing domain.
//!
//! Each module owns one entity: its record type, the pure validate-and-build
//! path from an untyped field map, and the pure partial-update path. Nothing
//! in this crate performs IO; relationship and uniqueness checks live with
//! the facade.

pub mod amenity;
pub mod place;
pub mod review;
pub mod user;

pub use amenity::{Amenity, AmenityDraft};
pub use place::{Place, PlaceDraft};
pub use review::{Review, ReviewDraft};
pub use user::{User, UserDraft, UserView};
