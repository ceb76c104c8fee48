use std::fmt;

use async_trait::async_trait;
use mime::Mime;

use crate::listings::{Amenity, ListingId, PhotoRef, UserId};

/// Object key inside the storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    /// `propiedades/{listingId}/{purpose}.jpg`
    pub fn listing_photo(listing: &ListingId, purpose: &str) -> Self {
        Self(format!("propiedades/{listing}/{purpose}.jpg"))
    }

    pub fn gallery_photo(listing: &ListingId, index: usize) -> Self {
        Self::listing_photo(listing, &format!("foto_{index}"))
    }

    pub fn amenity_photo(listing: &ListingId, amenity: Amenity) -> Option<Self> {
        amenity
            .photo_purpose()
            .map(|purpose| Self::listing_photo(listing, purpose))
    }

    /// `profile_images/{userId}.jpg`
    pub fn profile_avatar(user: &UserId) -> Self {
        Self(format!("profile_images/{user}.jpg"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the local photo and return its public download URL.
    async fn upload(
        &self,
        path: &StoragePath,
        source: &PhotoRef,
        content_type: &Mime,
    ) -> Result<String, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload of {path} rejected: {reason}")]
    Rejected { path: String, reason: String },
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}
