use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mime::Mime;
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;

use super::storage::{ObjectStorage, StorageError, StoragePath};
use super::store::{ListingSnapshot, ListingStore, ProfileStore, StoreError};
use crate::listings::{Coordinates, Listing, ListingId, PhotoRef, UserId};
use crate::profiles::UserProfile;

/// Listing collection kept as raw documents, decoded on every snapshot.
pub struct InMemoryListingStore {
    documents: Mutex<BTreeMap<String, Value>>,
    snapshots: watch::Sender<ListingSnapshot>,
}

impl Default for InMemoryListingStore {
    fn default() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            documents: Mutex::new(BTreeMap::new()),
            snapshots,
        }
    }
}

impl InMemoryListingStore {
    /// Seed a raw document, bypassing the typed write path.
    pub fn insert_document(&self, id: impl Into<String>, document: Value) {
        let mut guard = self.documents.lock().expect("listing store mutex poisoned");
        guard.insert(id.into(), document);
        self.publish(&guard);
    }

    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .expect("listing store mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn decode_all(documents: &BTreeMap<String, Value>) -> Vec<Listing> {
        documents
            .iter()
            .filter_map(
                |(id, document)| match Listing::from_document(id, document.clone()) {
                    Ok(listing) => Some(listing),
                    Err(err) => {
                        warn!(document_id = %id, error = %err, "skipping undecodable listing");
                        None
                    }
                },
            )
            .collect()
    }

    fn publish(&self, documents: &BTreeMap<String, Value>) {
        self.snapshots
            .send_replace(Arc::new(Self::decode_all(documents)));
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn find_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<Listing>, StoreError> {
        let guard = self.documents.lock().expect("listing store mutex poisoned");
        Ok(Self::decode_all(&guard)
            .into_iter()
            .filter(|listing| listing.coordinates.same_pin(&coordinates))
            .collect())
    }

    async fn create(&self, listing: &Listing) -> Result<(), StoreError> {
        let document = listing
            .to_document()
            .map_err(|err| StoreError::Malformed(err.to_string()))?;
        let mut guard = self.documents.lock().expect("listing store mutex poisoned");
        if guard.contains_key(listing.id.as_str()) {
            return Err(StoreError::Conflict);
        }
        guard.insert(listing.id.0.clone(), document);
        self.publish(&guard);
        Ok(())
    }

    async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let guard = self.documents.lock().expect("listing store mutex poisoned");
        guard
            .get(id.as_str())
            .map(|document| {
                Listing::from_document(id.as_str(), document.clone())
                    .map_err(|err| StoreError::Malformed(err.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let mut guard = self.documents.lock().expect("listing store mutex poisoned");
        if guard.remove(id.as_str()).is_none() {
            return Err(StoreError::NotFound);
        }
        self.publish(&guard);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<ListingSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Records uploads and serves them from a fixed base URL.
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: Mutex<Vec<(StoragePath, PhotoRef)>>,
}

impl Default for InMemoryObjectStorage {
    fn default() -> Self {
        Self::with_base_url("memory://agendate")
    }
}

impl InMemoryObjectStorage {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(Vec::new()),
        }
    }

    /// Upload log in issue order.
    pub fn uploads(&self) -> Vec<(StoragePath, PhotoRef)> {
        self.objects.lock().expect("storage mutex poisoned").clone()
    }

    fn url_for(&self, path: &StoragePath) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(
        &self,
        path: &StoragePath,
        source: &PhotoRef,
        content_type: &Mime,
    ) -> Result<String, StorageError> {
        if content_type.type_() != mime::IMAGE {
            return Err(StorageError::Rejected {
                path: path.to_string(),
                reason: format!("unsupported content type {content_type}"),
            });
        }
        let mut guard = self.objects.lock().expect("storage mutex poisoned");
        guard.retain(|(existing, _)| existing != path);
        guard.push((path.clone(), source.clone()));
        Ok(self.url_for(path))
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let guard = self.profiles.lock().expect("profile store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn merge(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut guard = self.profiles.lock().expect("profile store mutex poisoned");
        guard.insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}
