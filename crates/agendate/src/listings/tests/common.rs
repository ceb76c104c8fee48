use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mime::Mime;
use tokio::sync::watch;

use crate::backend::memory::{InMemoryListingStore, InMemoryObjectStorage};
use crate::backend::{
    ListingSnapshot, ListingStore, ObjectStorage, StorageError, StoragePath, StoreError,
};
use crate::listings::{
    reduce, Category, Coordinates, FieldUpdate, Listing, ListingId, ListingService,
    LocationCommit, OperationType, PhotoRef, SubmissionRules, UserId, WizardAction,
    WizardState, WizardStep,
};

pub(super) fn owner() -> UserId {
    UserId("owner-1".to_string())
}

pub(super) fn miraflores() -> LocationCommit {
    LocationCommit {
        lat: -12.1211,
        lng: -77.0297,
        address: "Av. Larco 345, Miraflores".to_string(),
    }
}

pub(super) fn apply_all(state: WizardState, actions: Vec<WizardAction>) -> WizardState {
    actions
        .into_iter()
        .fold(state, |state, action| reduce(&state, action).state)
}

pub(super) fn set(update: FieldUpdate) -> WizardAction {
    WizardAction::SetField(update)
}

/// A house listing walked through every step and parked on the photos step.
pub(super) fn ready_state() -> WizardState {
    let state = apply_all(
        WizardState::new(OperationType::Sale),
        vec![
            WizardAction::SelectCategory(Category::House),
            WizardAction::GoNext,
            set(FieldUpdate::Location(miraflores())),
            WizardAction::GoNext,
            set(FieldUpdate::Title("Casa Bonita".to_string())),
            set(FieldUpdate::Price("150000".to_string())),
            set(FieldUpdate::Area("120".to_string())),
            WizardAction::GoNext,
            set(FieldUpdate::Gallery(vec![
                PhotoRef::new("content://media/1"),
                PhotoRef::new("content://media/2"),
            ])),
        ],
    );
    assert_eq!(state.step, WizardStep::Photos, "fixture reaches photos");
    state
}

pub(super) fn memory_service() -> (
    ListingService<InMemoryListingStore, InMemoryObjectStorage>,
    Arc<InMemoryListingStore>,
    Arc<InMemoryObjectStorage>,
) {
    let store = Arc::new(InMemoryListingStore::default());
    let storage = Arc::new(InMemoryObjectStorage::default());
    let service = ListingService::new(store.clone(), storage.clone(), SubmissionRules::default());
    (service, store, storage)
}

/// Storage that accepts `successes` uploads and then fails every call.
pub(super) struct FlakyStorage {
    successes: usize,
    calls: AtomicUsize,
}

impl FlakyStorage {
    pub(super) fn failing_after(successes: usize) -> Self {
        Self {
            successes,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for FlakyStorage {
    async fn upload(
        &self,
        path: &StoragePath,
        _source: &PhotoRef,
        _content_type: &Mime,
    ) -> Result<String, StorageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.successes {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        Ok(format!("https://cdn.example/{path}"))
    }
}

/// Store whose every call fails, except the subscription.
pub(super) struct UnavailableStore {
    snapshots: watch::Sender<ListingSnapshot>,
}

impl Default for UnavailableStore {
    fn default() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshots }
    }
}

#[async_trait]
impl ListingStore for UnavailableStore {
    async fn find_by_coordinates(
        &self,
        _coordinates: Coordinates,
    ) -> Result<Vec<Listing>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn create(&self, _listing: &Listing) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn delete(&self, _id: &ListingId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn subscribe(&self) -> watch::Receiver<ListingSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Store that finds no neighbours but refuses the final document write.
pub(super) struct RejectingCreateStore {
    snapshots: watch::Sender<ListingSnapshot>,
    creates: AtomicUsize,
}

impl Default for RejectingCreateStore {
    fn default() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            snapshots,
            creates: AtomicUsize::new(0),
        }
    }
}

impl RejectingCreateStore {
    pub(super) fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingStore for RejectingCreateStore {
    async fn find_by_coordinates(
        &self,
        _coordinates: Coordinates,
    ) -> Result<Vec<Listing>, StoreError> {
        Ok(Vec::new())
    }

    async fn create(&self, _listing: &Listing) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("write rejected".to_string()))
    }

    async fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: &ListingId) -> Result<(), StoreError> {
        Err(StoreError::NotFound)
    }

    fn subscribe(&self) -> watch::Receiver<ListingSnapshot> {
        self.snapshots.subscribe()
    }
}
