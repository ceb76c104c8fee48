use std::sync::Arc;

use tracing::warn;

use super::geocoder::Geocoder;
use super::location::MapFocus;
use super::{IDLE_PROMPT, SEARCHING_ADDRESS, UNNAMED_ADDRESS};
use crate::listings::{Coordinates, LocationCommit};

/// Central Lima, where the picker camera starts.
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(-12.0464, -77.0428);

/// Pin-under-crosshair picker: the committed point is always the camera center.
pub struct MapPicker<G> {
    geocoder: Arc<G>,
    center: Coordinates,
    address: String,
}

impl<G: Geocoder> MapPicker<G> {
    pub fn new(geocoder: Arc<G>) -> Self {
        Self::centered_on(geocoder, DEFAULT_CENTER)
    }

    pub fn centered_on(geocoder: Arc<G>, center: Coordinates) -> Self {
        Self {
            geocoder,
            center,
            address: IDLE_PROMPT.to_string(),
        }
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn camera_moving(&mut self) {
        self.address = SEARCHING_ADDRESS.to_string();
    }

    /// Move the camera to a search result.
    pub fn focus(&mut self, focus: MapFocus) {
        self.center = focus.center;
        self.camera_moving();
    }

    /// Camera settled on `center`: reverse-geocode it into the address line.
    pub async fn camera_idle(&mut self, center: Coordinates) -> &str {
        self.center = center;
        let address = match self.geocoder.reverse(center).await {
            Ok(Some(place)) => place.display_address(),
            Ok(None) => String::new(),
            Err(err) => {
                warn!(lat = center.lat, lng = center.lng, error = %err, "reverse geocoding failed");
                String::new()
            }
        };
        self.address = if address.is_empty() {
            UNNAMED_ADDRESS.to_string()
        } else {
            address
        };
        &self.address
    }

    /// `(lat, lng, addressText)` as currently displayed, placeholder included.
    pub fn commit(&self) -> LocationCommit {
        LocationCommit {
            lat: self.center.lat,
            lng: self.center.lng,
            address: self.address.clone(),
        }
    }
}
