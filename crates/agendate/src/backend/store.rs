use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::listings::{Coordinates, Listing, ListingId, UserId};
use crate::profiles::UserProfile;

pub const LISTINGS_COLLECTION: &str = "propiedades";
pub const USERS_COLLECTION: &str = "users";

/// Full contents of the listings collection at one point in time.
pub type ListingSnapshot = Arc<Vec<Listing>>;

/// Listing collection access. Listings are created and deleted, never updated.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Equality query on both coordinate fields.
    async fn find_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<Listing>, StoreError>;
    async fn create(&self, listing: &Listing) -> Result<(), StoreError>;
    async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    async fn delete(&self, id: &ListingId) -> Result<(), StoreError>;
    /// Live subscription; the receiver always holds the latest snapshot.
    fn subscribe(&self) -> watch::Receiver<ListingSnapshot>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError>;
    /// Merge-write: creates the document or overwrites the supplied fields.
    async fn merge(&self, profile: &UserProfile) -> Result<(), StoreError>;
}

/// Error enumeration for document store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document already exists")]
    Conflict,
    #[error("document not found")]
    NotFound,
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}
