use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::domain::{Category, Coordinates, Listing, ListingId, OperationType, UserId};
use crate::backend::ListingSnapshot;

/// Filter chips on the home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFilter {
    #[default]
    Buy,
    Rent,
}

impl FeedFilter {
    pub fn operation(self) -> OperationType {
        match self {
            FeedFilter::Buy => OperationType::Sale,
            FeedFilter::Rent => OperationType::Rental,
        }
    }
}

/// Client-side cache of the listings collection, replaced wholesale by each snapshot.
#[derive(Debug, Clone, Default)]
pub struct ListingFeed {
    snapshot: ListingSnapshot,
    filter: FeedFilter,
}

impl ListingFeed {
    pub fn new(filter: FeedFilter) -> Self {
        Self {
            snapshot: Arc::new(Vec::new()),
            filter,
        }
    }

    pub fn apply(&mut self, snapshot: ListingSnapshot) {
        self.snapshot = snapshot;
    }

    /// Pull the latest snapshot from a live subscription, marking it seen.
    pub fn sync(&mut self, subscription: &mut watch::Receiver<ListingSnapshot>) {
        let latest = subscription.borrow_and_update().clone();
        self.apply(latest);
    }

    /// Wait for the next snapshot. Returns false once the publisher is gone.
    pub async fn next_snapshot(
        &mut self,
        subscription: &mut watch::Receiver<ListingSnapshot>,
    ) -> bool {
        if subscription.changed().await.is_err() {
            return false;
        }
        self.sync(subscription);
        true
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FeedFilter) {
        self.filter = filter;
    }

    /// Listings matching the active filter, in snapshot order.
    pub fn visible(&self) -> Vec<&Listing> {
        let operation = self.filter.operation();
        self.snapshot
            .iter()
            .filter(|listing| listing.operation == operation)
            .collect()
    }

    pub fn find(&self, id: &ListingId) -> Option<&Listing> {
        self.snapshot.iter().find(|listing| &listing.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

/// Compact projection used for map markers and list cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingCard {
    pub id: ListingId,
    pub title: String,
    pub price: String,
    pub category: Category,
    pub operation: OperationType,
    pub address: String,
    pub cover: Option<String>,
    pub area: Option<String>,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub coordinates: Coordinates,
    pub owned: bool,
    pub favorited: bool,
}

impl ListingCard {
    pub fn from_listing(listing: &Listing, viewer: Option<&UserId>) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            price: listing.price_label(),
            category: listing.category,
            operation: listing.operation,
            address: listing.address.clone(),
            cover: listing.gallery().first().map(|url| url.to_string()),
            area: (!listing.area.is_empty()).then(|| format!("{} m²", listing.area)),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            coordinates: listing.coordinates,
            owned: viewer.is_some_and(|user| listing.is_owned_by(user)),
            favorited: viewer.is_some_and(|user| listing.is_favorited_by(user)),
        }
    }
}
