//! Listing model, publish wizard, submission pipeline, live feed cache, and HTTP routes.

pub mod domain;
pub mod feed;
pub mod router;
pub mod service;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    Amenities, Amenity, AmenityPhotos, Category, Coordinates, Currency, Listing, ListingId,
    OperationType, PhotoRef, UserId,
};
pub use feed::{FeedFilter, ListingCard, ListingFeed};
pub use router::{listing_router, ListingApi, SessionError, USER_HEADER};
pub use service::{ListingService, ListingServiceError, NumericPolicy, SubmissionRules};
pub use wizard::{
    reduce, DraftIssue, FieldUpdate, ListingDraft, LocationCommit, Notice, Transition,
    WizardAction, WizardEffect, WizardPhase, WizardState, WizardStep,
};
