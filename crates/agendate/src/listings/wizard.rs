//! Four-step publish wizard modelled as an immutable state and a pure reducer.
//!
//! Every user intent is a [`WizardAction`]; [`reduce`] returns the next state plus an
//! optional [`WizardEffect`] for the caller to execute (publishing or leaving the flow).
//! Validation never performs I/O, so the whole flow is testable without a UI harness.

use serde::{Deserialize, Serialize};

use super::domain::{
    Amenities, Amenity, AmenityPhotos, Category, Coordinates, Currency, ListingId,
    OperationType, PhotoRef,
};
use crate::search::SEARCHING_ADDRESS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Category,
    Location,
    Details,
    Photos,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Category,
        WizardStep::Location,
        WizardStep::Details,
        WizardStep::Photos,
    ];

    pub fn number(self) -> u8 {
        match self {
            WizardStep::Category => 1,
            WizardStep::Location => 2,
            WizardStep::Details => 3,
            WizardStep::Photos => 4,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::Category => Some(WizardStep::Location),
            WizardStep::Location => Some(WizardStep::Details),
            WizardStep::Details => Some(WizardStep::Photos),
            WizardStep::Photos => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Category => None,
            WizardStep::Location => Some(WizardStep::Category),
            WizardStep::Details => Some(WizardStep::Location),
            WizardStep::Photos => Some(WizardStep::Details),
        }
    }
}

/// Result handed back by the map picker: `(latitude, longitude, addressText)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCommit {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Reason a step or a submission cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum DraftIssue {
    #[error("pick a location on the map")]
    MissingLocation,
    #[error("an address is required")]
    MissingAddress,
    #[error("a title is required")]
    MissingTitle,
    #[error("a price is required")]
    MissingPrice,
    #[error("the total area is required")]
    MissingArea,
    #[error("select at least one photo")]
    MissingPhotos,
    #[error("price must be a number")]
    NonNumericPrice,
    #[error("area must be a number")]
    NonNumericArea,
    #[error("at least one bedroom is required for this category")]
    BedroomsRequired,
    #[error("at least one bathroom is required for this category")]
    BathroomsRequired,
    #[error("offices cannot list a pool")]
    PoolNotAllowed,
}

/// Transient, user-facing message attached to the state produced by the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    Incomplete(DraftIssue),
    Duplicate,
    SubmissionFailed(String),
    Published,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Incomplete(issue) => format!("missing data: {issue}"),
            Notice::Duplicate => "a listing already exists at this location".to_string(),
            Notice::SubmissionFailed(reason) => format!("could not publish: {reason}"),
            Notice::Published => "listing published".to_string(),
        }
    }
}

/// Everything collected across the four steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub operation: OperationType,
    pub category: Category,
    pub title: String,
    pub price: String,
    pub currency: Currency,
    pub description: String,
    pub area: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub amenities: Amenities,
    pub amenity_photos: AmenityPhotos<PhotoRef>,
    pub gallery: Vec<PhotoRef>,
    pub coordinates: Coordinates,
    pub address: String,
}

impl ListingDraft {
    pub fn new(operation: OperationType) -> Self {
        Self {
            operation,
            category: Category::House,
            title: String::new(),
            price: String::new(),
            currency: Currency::Soles,
            description: String::new(),
            area: String::new(),
            bedrooms: 1,
            bathrooms: 1,
            amenities: Amenities::default(),
            amenity_photos: AmenityPhotos::default(),
            gallery: Vec::new(),
            coordinates: Coordinates::default(),
            address: String::new(),
        }
    }

    /// Apply a category and normalize the fields that depend on it.
    pub fn select_category(&mut self, category: Category) {
        self.category = category;
        match category {
            Category::Land => {
                self.bedrooms = 0;
                self.bathrooms = 0;
                for amenity in [
                    Amenity::Pool,
                    Amenity::Garage,
                    Amenity::Garden,
                    Amenity::PetFriendly,
                ] {
                    self.disable(amenity);
                }
            }
            Category::Office => {
                self.disable(Amenity::Pool);
                self.ensure_rooms();
            }
            Category::House | Category::Apartment => self.ensure_rooms(),
        }
    }

    /// Coordinates always move; the address only when the picker produced a final value.
    pub fn commit_location(&mut self, commit: LocationCommit) {
        self.coordinates = Coordinates::new(commit.lat, commit.lng);
        if !commit.address.is_empty() && commit.address != SEARCHING_ADDRESS {
            self.address = commit.address;
        }
    }

    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Title(value) => self.title = value,
            FieldUpdate::Price(value) => self.price = value,
            FieldUpdate::Area(value) => self.area = value,
            FieldUpdate::Description(value) => self.description = value,
            FieldUpdate::Currency(currency) => self.currency = currency,
            FieldUpdate::ToggleCurrency => self.currency = self.currency.toggled(),
            FieldUpdate::IncrementBedrooms if self.category.has_rooms() => {
                self.bedrooms = self.bedrooms.saturating_add(1);
            }
            FieldUpdate::DecrementBedrooms if self.category.has_rooms() => {
                self.bedrooms = self.bedrooms.saturating_sub(1);
            }
            FieldUpdate::IncrementBathrooms if self.category.has_rooms() => {
                self.bathrooms = self.bathrooms.saturating_add(1);
            }
            FieldUpdate::DecrementBathrooms if self.category.has_rooms() => {
                self.bathrooms = self.bathrooms.saturating_sub(1);
            }
            FieldUpdate::IncrementBedrooms
            | FieldUpdate::DecrementBedrooms
            | FieldUpdate::IncrementBathrooms
            | FieldUpdate::DecrementBathrooms => {}
            FieldUpdate::Amenity { amenity, enabled } => {
                if !enabled {
                    self.disable(amenity);
                } else if amenity.applies_to(self.category) {
                    self.amenities.set(amenity, true);
                }
            }
            FieldUpdate::AmenityPhoto { amenity, photo } => {
                if photo.is_none() || amenity.applies_to(self.category) {
                    self.amenity_photos.set(amenity, photo);
                }
            }
            FieldUpdate::Gallery(photos) => self.gallery = photos,
            FieldUpdate::Address(value) => self.address = value,
            FieldUpdate::Location(commit) => self.commit_location(commit),
        }
    }

    /// The first unmet requirement of `step`, if any.
    pub fn step_issue(&self, step: WizardStep) -> Option<DraftIssue> {
        match step {
            WizardStep::Category => None,
            WizardStep::Location => {
                if !self.coordinates.is_set() {
                    Some(DraftIssue::MissingLocation)
                } else if self.address.trim().is_empty() || self.address == SEARCHING_ADDRESS {
                    Some(DraftIssue::MissingAddress)
                } else {
                    None
                }
            }
            WizardStep::Details => {
                if self.title.trim().is_empty() {
                    Some(DraftIssue::MissingTitle)
                } else if self.price.trim().is_empty() {
                    Some(DraftIssue::MissingPrice)
                } else if self.area.trim().is_empty() {
                    Some(DraftIssue::MissingArea)
                } else {
                    None
                }
            }
            WizardStep::Photos => self.gallery.is_empty().then_some(DraftIssue::MissingPhotos),
        }
    }

    pub fn is_step_valid(&self, step: WizardStep) -> bool {
        self.step_issue(step).is_none()
    }

    pub fn first_invalid_step(&self) -> Option<(WizardStep, DraftIssue)> {
        WizardStep::ALL
            .into_iter()
            .find_map(|step| self.step_issue(step).map(|issue| (step, issue)))
    }

    fn disable(&mut self, amenity: Amenity) {
        self.amenities.set(amenity, false);
        self.amenity_photos.set(amenity, None);
    }

    fn ensure_rooms(&mut self) {
        if self.bedrooms == 0 {
            self.bedrooms = 1;
        }
        if self.bathrooms == 0 {
            self.bathrooms = 1;
        }
    }
}

/// Single-field edit on the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Title(String),
    Price(String),
    Area(String),
    Description(String),
    Currency(Currency),
    ToggleCurrency,
    IncrementBedrooms,
    DecrementBedrooms,
    IncrementBathrooms,
    DecrementBathrooms,
    Amenity {
        amenity: Amenity,
        enabled: bool,
    },
    AmenityPhoto {
        amenity: Amenity,
        photo: Option<PhotoRef>,
    },
    Gallery(Vec<PhotoRef>),
    Address(String),
    Location(LocationCommit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WizardAction {
    SelectCategory(Category),
    SetField(FieldUpdate),
    GoNext,
    GoBack,
    ConfirmExit,
    CancelExit,
    Submit,
    SubmissionSucceeded(ListingId),
    SubmissionFailed(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "listing_id", rename_all = "snake_case")]
pub enum WizardPhase {
    Editing,
    ConfirmingExit,
    Submitting,
    Exited,
    Published(ListingId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub phase: WizardPhase,
    pub draft: ListingDraft,
    pub notice: Option<Notice>,
}

impl WizardState {
    pub fn new(operation: OperationType) -> Self {
        Self {
            step: WizardStep::Category,
            phase: WizardPhase::Editing,
            draft: ListingDraft::new(operation),
            notice: None,
        }
    }

    /// Whether "Next" would move forward from the current step.
    pub fn can_advance(&self) -> bool {
        self.phase == WizardPhase::Editing
            && self.step.next().is_some()
            && self.draft.is_step_valid(self.step)
    }

    /// Whether the publish control is enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == WizardPhase::Editing
            && self.step == WizardStep::Photos
            && self.draft.first_invalid_step().is_none()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, WizardPhase::Exited | WizardPhase::Published(_))
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    Publish(ListingDraft),
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WizardState,
    pub effect: Option<WizardEffect>,
}

impl Transition {
    fn stay(state: WizardState) -> Self {
        Self {
            state,
            effect: None,
        }
    }
}

pub fn reduce(state: &WizardState, action: WizardAction) -> Transition {
    let mut next = state.clone();
    next.notice = None;

    match (&state.phase, action) {
        (WizardPhase::Exited | WizardPhase::Published(_), _) => Transition::stay(next),

        (WizardPhase::Submitting, WizardAction::SubmissionSucceeded(listing_id)) => {
            next.phase = WizardPhase::Published(listing_id);
            next.notice = Some(Notice::Published);
            Transition {
                state: next,
                effect: Some(WizardEffect::Leave),
            }
        }
        (WizardPhase::Submitting, WizardAction::SubmissionFailed(notice)) => {
            next.phase = WizardPhase::Editing;
            next.notice = Some(notice);
            Transition::stay(next)
        }
        (WizardPhase::Submitting, _) => Transition::stay(next),

        (WizardPhase::ConfirmingExit, WizardAction::ConfirmExit) => {
            next.draft = ListingDraft::new(state.draft.operation);
            next.step = WizardStep::Category;
            next.phase = WizardPhase::Exited;
            Transition {
                state: next,
                effect: Some(WizardEffect::Leave),
            }
        }
        (WizardPhase::ConfirmingExit, WizardAction::CancelExit) => {
            next.phase = WizardPhase::Editing;
            Transition::stay(next)
        }
        (WizardPhase::ConfirmingExit, _) => Transition::stay(next),

        (WizardPhase::Editing, action) => reduce_editing(next, action),
    }
}

fn reduce_editing(mut next: WizardState, action: WizardAction) -> Transition {
    match action {
        WizardAction::SelectCategory(category) => next.draft.select_category(category),
        WizardAction::SetField(update) => next.draft.apply(update),
        WizardAction::GoNext => {
            if let Some(following) = next.step.next() {
                match next.draft.step_issue(next.step) {
                    Some(issue) => next.notice = Some(Notice::Incomplete(issue)),
                    None => next.step = following,
                }
            }
        }
        WizardAction::GoBack => match next.step.previous() {
            Some(previous) => next.step = previous,
            None => next.phase = WizardPhase::ConfirmingExit,
        },
        WizardAction::Submit if next.step == WizardStep::Photos => {
            if let Some((_, issue)) = next.draft.first_invalid_step() {
                next.notice = Some(Notice::Incomplete(issue));
            } else {
                next.phase = WizardPhase::Submitting;
                let draft = next.draft.clone();
                return Transition {
                    state: next,
                    effect: Some(WizardEffect::Publish(draft)),
                };
            }
        }
        WizardAction::Submit
        | WizardAction::ConfirmExit
        | WizardAction::CancelExit
        | WizardAction::SubmissionSucceeded(_)
        | WizardAction::SubmissionFailed(_) => {}
    }
    Transition::stay(next)
}
