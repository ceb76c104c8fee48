use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::listings::Coordinates;

const QUIET: Duration = Duration::from_millis(800);

#[derive(Default)]
struct ScriptedGeocoder {
    calls: Mutex<Vec<(String, BoundingBox, usize)>>,
    reverse_calls: Mutex<Vec<Coordinates>>,
    places: Vec<Place>,
    reverse: Option<Place>,
    latency: Duration,
    fail: bool,
}

impl ScriptedGeocoder {
    fn answering(places: Vec<Place>) -> Self {
        Self {
            places,
            ..Self::default()
        }
    }

    fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls mutex")
            .iter()
            .map(|(query, _, _)| query.clone())
            .collect()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn search(
        &self,
        query: &str,
        bounds: BoundingBox,
        limit: usize,
    ) -> Result<Vec<Place>, GeocodeError> {
        self.calls
            .lock()
            .expect("calls mutex")
            .push((query.to_string(), bounds, limit));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail {
            return Err(GeocodeError::Status(503));
        }
        Ok(self
            .places
            .iter()
            .filter(|place| place.title().contains(query) || query.contains(place.title()))
            .cloned()
            .collect())
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, GeocodeError> {
        self.reverse_calls.lock().expect("reverse mutex").push(point);
        if self.fail {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.reverse.clone())
    }
}

fn named(name: &str, lat: f64, lng: f64) -> Place {
    Place {
        feature_name: Some(name.to_string()),
        sub_locality: Some(name.to_string()),
        coordinates: Some(Coordinates::new(lat, lng)),
        ..Place::default()
    }
}

fn catalogue() -> Vec<Place> {
    vec![
        named("Miraflores", -12.1211, -77.0297),
        named("Barranco", -12.1490, -77.0210),
        Place {
            feature_name: Some("Miraflores sin coordenadas".to_string()),
            ..Place::default()
        },
    ]
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_issue_a_single_search() {
    let geocoder = Arc::new(ScriptedGeocoder::answering(catalogue()));
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Miraflo");
    tokio::time::sleep(Duration::from_millis(250)).await;
    search.on_query_changed("Mirafl");
    tokio::time::sleep(Duration::from_millis(250)).await;
    search.on_query_changed("Miraflor");
    assert!(geocoder.queries().is_empty());

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(geocoder.queries(), vec!["Miraflor".to_string()]);

    let results = search.results();
    assert_eq!(results.len(), 1, "unusable candidate dropped");
    assert_eq!(results[0].title(), "Miraflores");
}

#[tokio::test(start_paused = true)]
async fn search_is_bounded_to_lima() {
    let geocoder = Arc::new(ScriptedGeocoder::answering(catalogue()));
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Barranco");
    tokio::time::sleep(QUIET * 2).await;

    let calls = geocoder.calls.lock().expect("calls mutex").clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, LIMA_CALLAO);
    assert_eq!(calls[0].2, MAX_RESULTS);
}

#[tokio::test(start_paused = true)]
async fn blank_query_clears_results_immediately() {
    let geocoder = Arc::new(ScriptedGeocoder::answering(catalogue()));
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Barranco");
    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(search.results().len(), 1);

    search.on_query_changed("   ");
    assert!(search.results().is_empty());
    assert!(!search.is_pending());

    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(geocoder.queries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn short_queries_never_reach_the_geocoder() {
    let geocoder = Arc::new(ScriptedGeocoder::answering(catalogue()));
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Mi");
    tokio::time::sleep(QUIET * 2).await;

    assert!(geocoder.queries().is_empty());
    assert!(search.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn geocoder_failure_yields_empty_results() {
    let geocoder = Arc::new(ScriptedGeocoder {
        fail: true,
        ..ScriptedGeocoder::answering(catalogue())
    });
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Miraflores");
    tokio::time::sleep(QUIET * 2).await;

    assert_eq!(geocoder.queries().len(), 1, "no retry");
    assert!(search.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn in_flight_search_is_cancelled_by_a_new_edit() {
    let geocoder = Arc::new(ScriptedGeocoder {
        latency: Duration::from_secs(2),
        ..ScriptedGeocoder::answering(catalogue())
    });
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);
    let mut updates = search.subscribe();

    search.on_query_changed("Miraflores");
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(geocoder.queries().len(), 1, "first search in flight");

    search.on_query_changed("Barranco");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(geocoder.queries(), vec!["Miraflores", "Barranco"]);
    let results = updates.borrow_and_update().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title(), "Barranco");
}

#[tokio::test(start_paused = true)]
async fn selecting_a_result_cancels_and_focuses() {
    let geocoder = Arc::new(ScriptedGeocoder::answering(catalogue()));
    let mut search = LocationSearch::new(geocoder.clone(), QUIET);

    search.on_query_changed("Barranco");
    tokio::time::sleep(QUIET * 2).await;
    let picked = search.results()[0].clone();

    search.on_query_changed("Barranco Sur");
    let focus = search.select(&picked).expect("candidate has coordinates");
    assert_eq!(focus.center, Coordinates::new(-12.1490, -77.0210));
    assert_eq!(focus.zoom, FOCUS_ZOOM);
    assert!(search.query().is_empty());
    assert!(search.results().is_empty());

    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(geocoder.queries().len(), 1, "pending search was cancelled");
    assert!(search.results().is_empty());
}

#[tokio::test]
async fn picker_shows_placeholder_then_resolved_address() {
    let geocoder = Arc::new(ScriptedGeocoder {
        reverse: Some(Place {
            thoroughfare: Some("Avenida Grau".to_string()),
            sub_thoroughfare: Some("120".to_string()),
            sub_locality: Some("Barranco".to_string()),
            ..Place::default()
        }),
        ..ScriptedGeocoder::default()
    });
    let mut picker = MapPicker::new(geocoder.clone());
    assert_eq!(picker.address(), IDLE_PROMPT);
    assert_eq!(picker.center(), DEFAULT_CENTER);

    picker.camera_moving();
    assert_eq!(picker.commit().address, SEARCHING_ADDRESS);

    let center = Coordinates::new(-12.149, -77.021);
    assert_eq!(
        picker.camera_idle(center).await,
        "Avenida Grau 120, Barranco"
    );
    let commit = picker.commit();
    assert_eq!((commit.lat, commit.lng), (center.lat, center.lng));
    assert_eq!(commit.address, "Avenida Grau 120, Barranco");
    assert_eq!(
        geocoder.reverse_calls.lock().expect("reverse mutex").clone(),
        vec![center]
    );
}

#[tokio::test]
async fn picker_falls_back_to_unnamed_location() {
    let mut empty = MapPicker::new(Arc::new(ScriptedGeocoder::default()));
    assert_eq!(
        empty.camera_idle(Coordinates::new(-12.0, -77.1)).await,
        UNNAMED_ADDRESS
    );

    let mut failing = MapPicker::new(Arc::new(ScriptedGeocoder {
        fail: true,
        ..ScriptedGeocoder::default()
    }));
    assert_eq!(
        failing.camera_idle(Coordinates::new(-12.0, -77.1)).await,
        UNNAMED_ADDRESS
    );
}
