use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::debounce::Debouncer;
use super::geocoder::Geocoder;
use super::place::{Place, LIMA_CALLAO};
use super::{MAX_RESULTS, MIN_QUERY_CHARS};
use crate::listings::Coordinates;

pub const FOCUS_ZOOM: f64 = 16.0;

/// Camera target produced by picking a search result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapFocus {
    pub center: Coordinates,
    pub zoom: f64,
}

/// Debounced place search bound to one text field.
///
/// Every text change bumps a generation counter; a scheduled search only publishes
/// when its generation is still current, so a cancelled search is never visible.
pub struct LocationSearch<G> {
    geocoder: Arc<G>,
    quiet_period: Duration,
    query: String,
    debouncer: Debouncer,
    generation: Arc<AtomicU64>,
    results: Arc<watch::Sender<Vec<Place>>>,
}

impl<G> LocationSearch<G>
where
    G: Geocoder + 'static,
{
    pub fn new(geocoder: Arc<G>, quiet_period: Duration) -> Self {
        let (results, _) = watch::channel(Vec::new());
        Self {
            geocoder,
            quiet_period,
            query: String::new(),
            debouncer: Debouncer::new(),
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(results),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> Vec<Place> {
        self.results.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Place>> {
        self.results.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Record the new field text and reschedule the search.
    pub fn on_query_changed(&mut self, query: impl Into<String>) {
        self.query = query.into();
        let generation = self.invalidate();

        let trimmed = self.query.trim().to_string();
        if trimmed.is_empty() {
            self.results.send_replace(Vec::new());
            return;
        }

        let geocoder = self.geocoder.clone();
        let current = self.generation.clone();
        let results = self.results.clone();
        self.debouncer.schedule(self.quiet_period, async move {
            let places = run_search(geocoder.as_ref(), &trimmed).await;
            results.send_if_modified(|slot| {
                if current.load(Ordering::SeqCst) != generation {
                    debug!(query = %trimmed, "discarding stale search results");
                    return false;
                }
                *slot = places;
                true
            });
        });
    }

    /// Pick a candidate: clears the field and results, and focuses the map on it.
    pub fn select(&mut self, place: &Place) -> Option<MapFocus> {
        self.invalidate();
        self.query.clear();
        self.results.send_replace(Vec::new());
        place.coordinates.map(|center| MapFocus {
            center,
            zoom: FOCUS_ZOOM,
        })
    }

    fn invalidate(&mut self) -> u64 {
        self.debouncer.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn run_search<G: Geocoder + ?Sized>(geocoder: &G, query: &str) -> Vec<Place> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    match geocoder.search(query, LIMA_CALLAO, MAX_RESULTS).await {
        Ok(places) => places.into_iter().filter(Place::is_usable).collect(),
        Err(err) => {
            warn!(query, error = %err, "place search failed");
            Vec::new()
        }
    }
}
