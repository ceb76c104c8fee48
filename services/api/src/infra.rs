use agendate::backend::memory::{InMemoryListingStore, InMemoryObjectStorage, InMemoryProfileStore};
use agendate::backend::ListingStore;
use agendate::config::AppConfig;
use agendate::listings::{FeedFilter, ListingApi, ListingFeed, ListingService, SubmissionRules};
use agendate::profiles::ProfileService;
use agendate::search::Geocoder;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type MemoryListingApi = ListingApi<InMemoryListingStore, InMemoryObjectStorage>;
pub(crate) type MemoryProfileService = ProfileService<InMemoryProfileStore, InMemoryObjectStorage>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) geocoder: Arc<dyn Geocoder>,
    pub(crate) profiles: Arc<MemoryProfileService>,
}

/// In-process backends shared by the listing and profile services.
pub(crate) struct Backends {
    pub(crate) listings: Arc<InMemoryListingStore>,
    pub(crate) profiles: Arc<InMemoryProfileStore>,
    pub(crate) storage: Arc<InMemoryObjectStorage>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            listings: Arc::new(InMemoryListingStore::default()),
            profiles: Arc::new(InMemoryProfileStore::default()),
            storage: Arc::new(InMemoryObjectStorage::default()),
        }
    }
}

impl Backends {
    pub(crate) fn listing_api(&self, config: &AppConfig) -> Arc<MemoryListingApi> {
        let rules = SubmissionRules {
            numeric_policy: config.listings.numeric_policy,
        };
        let service = ListingService::new(self.listings.clone(), self.storage.clone(), rules);
        Arc::new(ListingApi::new(service, config.listings.contact_phone.clone()))
    }

    pub(crate) fn profile_service(&self) -> Arc<MemoryProfileService> {
        Arc::new(ProfileService::new(
            self.profiles.clone(),
            self.storage.clone(),
        ))
    }
}

/// Follow the live listings subscription and log each snapshot.
pub(crate) fn spawn_feed_logger(store: Arc<InMemoryListingStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut subscription = store.subscribe();
        let mut sales = ListingFeed::new(FeedFilter::Buy);
        while sales.next_snapshot(&mut subscription).await {
            info!(
                listings = sales.len(),
                for_sale = sales.visible().len(),
                "listing snapshot received"
            );
        }
    })
}
