//! Seams to the remote document store and object storage.
//!
//! Production adapters wrap the vendor SDKs; [`memory`] holds the in-process
//! implementations used by the service binary and the test suites.

pub mod memory;
mod storage;
mod store;

pub use storage::{ObjectStorage, StorageError, StoragePath};
pub use store::{
    ListingSnapshot, ListingStore, ProfileStore, StoreError, LISTINGS_COLLECTION,
    USERS_COLLECTION,
};
