use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{Amenity, AmenityPhotos, Category, Listing, ListingId, UserId};
use super::wizard::{
    reduce, DraftIssue, ListingDraft, Notice, WizardAction, WizardEffect, WizardState,
};
use crate::backend::{ListingStore, ObjectStorage, StorageError, StoragePath, StoreError};

/// How free-text price and area are treated when a draft is published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Persist whatever text was entered.
    Tolerate,
    /// Refuse to publish unless both parse as numbers.
    #[default]
    RejectAtSubmit,
}

/// Checks re-applied at submission time, independent of the wizard's step gates.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRules {
    pub numeric_policy: NumericPolicy,
}

impl SubmissionRules {
    pub fn check(&self, draft: &ListingDraft) -> Result<(), DraftIssue> {
        if let Some((_, issue)) = draft.first_invalid_step() {
            return Err(issue);
        }

        if draft.category != Category::Land {
            if draft.bedrooms == 0 {
                return Err(DraftIssue::BedroomsRequired);
            }
            if draft.bathrooms == 0 {
                return Err(DraftIssue::BathroomsRequired);
            }
        }
        if draft.category == Category::Office && draft.amenities.pool {
            return Err(DraftIssue::PoolNotAllowed);
        }

        if self.numeric_policy == NumericPolicy::RejectAtSubmit {
            if !is_numeric(&draft.price) {
                return Err(DraftIssue::NonNumericPrice);
            }
            if !is_numeric(&draft.area) {
                return Err(DraftIssue::NonNumericArea);
            }
        }
        Ok(())
    }
}

fn is_numeric(raw: &str) -> bool {
    raw.trim()
        .parse::<f64>()
        .map(|value| value.is_finite() && value >= 0.0)
        .unwrap_or(false)
}

/// Service composing the listing store and object storage behind the publish flow.
pub struct ListingService<S, O> {
    store: Arc<S>,
    storage: Arc<O>,
    rules: SubmissionRules,
}

impl<S, O> ListingService<S, O>
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    pub fn new(store: Arc<S>, storage: Arc<O>, rules: SubmissionRules) -> Self {
        Self {
            store,
            storage,
            rules,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validate, reject duplicates, upload every photo, then write the document.
    ///
    /// The document is written last, so a failed upload never leaves a listing behind.
    pub async fn publish(
        &self,
        owner: &UserId,
        draft: &ListingDraft,
    ) -> Result<Listing, ListingServiceError> {
        self.rules.check(draft)?;

        let existing = self.store.find_by_coordinates(draft.coordinates).await?;
        if let Some(duplicate) = existing.first() {
            warn!(
                owner = %owner,
                duplicate = %duplicate.id,
                lat = draft.coordinates.lat,
                lng = draft.coordinates.lng,
                "rejected listing at an occupied location"
            );
            return Err(ListingServiceError::Duplicate {
                existing: duplicate.id.clone(),
            });
        }

        let listing_id = ListingId::generate();
        let images = self.upload_gallery(&listing_id, draft).await?;
        let amenity_photos = self.upload_amenity_photos(&listing_id, draft).await?;

        let listing = Listing {
            id: listing_id,
            owner: owner.clone(),
            category: draft.category,
            operation: draft.operation,
            title: draft.title.clone(),
            price: draft.price.trim().to_string(),
            currency: draft.currency,
            description: draft.description.clone(),
            area: draft.area.trim().to_string(),
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            amenities: draft.amenities,
            amenity_photos,
            coordinates: draft.coordinates,
            address: draft.address.clone(),
            cover: images.first().cloned(),
            images,
            favorited_by: Vec::new(),
            published_at: Some(Utc::now()),
        };

        self.store.create(&listing).await?;
        info!(
            listing = %listing.id,
            owner = %owner,
            photos = listing.images.len(),
            "listing published"
        );
        Ok(listing)
    }

    /// Run the wizard's submit transition and feed the outcome back into the reducer.
    pub async fn submit_wizard(&self, owner: &UserId, state: &WizardState) -> WizardState {
        let transition = reduce(state, WizardAction::Submit);
        let Some(WizardEffect::Publish(draft)) = transition.effect else {
            return transition.state;
        };

        let outcome = match self.publish(owner, &draft).await {
            Ok(listing) => WizardAction::SubmissionSucceeded(listing.id),
            Err(err) => {
                debug!(owner = %owner, error = %err, "wizard submission aborted");
                WizardAction::SubmissionFailed(err.notice())
            }
        };
        reduce(&transition.state, outcome).state
    }

    /// Delete a listing on behalf of its owner.
    pub async fn delete(
        &self,
        actor: &UserId,
        listing_id: &ListingId,
    ) -> Result<(), ListingServiceError> {
        let listing = self
            .store
            .fetch(listing_id)
            .await?
            .ok_or(ListingServiceError::NotFound)?;
        if !listing.is_owned_by(actor) {
            return Err(ListingServiceError::Forbidden);
        }
        self.store.delete(listing_id).await?;
        info!(listing = %listing_id, owner = %actor, "listing deleted");
        Ok(())
    }

    async fn upload_gallery(
        &self,
        listing_id: &ListingId,
        draft: &ListingDraft,
    ) -> Result<Vec<String>, StorageError> {
        let mut urls = Vec::with_capacity(draft.gallery.len());
        for (index, photo) in draft.gallery.iter().enumerate() {
            let path = StoragePath::gallery_photo(listing_id, index);
            let url = self
                .storage
                .upload(&path, photo, &mime::IMAGE_JPEG)
                .await?;
            urls.push(url);
        }
        Ok(urls)
    }

    async fn upload_amenity_photos(
        &self,
        listing_id: &ListingId,
        draft: &ListingDraft,
    ) -> Result<AmenityPhotos<String>, StorageError> {
        let mut urls = AmenityPhotos::default();
        for amenity in Amenity::WITH_PHOTOS {
            if !draft.amenities.get(amenity) {
                continue;
            }
            let (Some(photo), Some(path)) = (
                draft.amenity_photos.get(amenity),
                StoragePath::amenity_photo(listing_id, amenity),
            ) else {
                continue;
            };
            let url = self
                .storage
                .upload(&path, photo, &mime::IMAGE_JPEG)
                .await?;
            urls.set(amenity, Some(url));
        }
        Ok(urls)
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Invalid(#[from] DraftIssue),
    #[error("a listing already exists at these coordinates ({existing})")]
    Duplicate { existing: ListingId },
    #[error("only the owner can delete this listing")]
    Forbidden,
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ListingServiceError {
    /// Transient message shown to the user when a submission aborts.
    pub fn notice(&self) -> Notice {
        match self {
            ListingServiceError::Invalid(issue) => Notice::Incomplete(*issue),
            ListingServiceError::Duplicate { .. } => Notice::Duplicate,
            other => Notice::SubmissionFailed(other.to_string()),
        }
    }
}
