//! Place search for the location step: debounced forward geocoding, the map picker,
//! and address formatting.

mod debounce;
mod geocoder;
mod location;
mod picker;
mod place;

#[cfg(test)]
mod tests;

pub use debounce::Debouncer;
pub use geocoder::{GeocodeError, Geocoder, HttpGeocoder};
pub use location::{LocationSearch, MapFocus, FOCUS_ZOOM};
pub use picker::{MapPicker, DEFAULT_CENTER};
pub use place::{BoundingBox, Place, LIMA_CALLAO};

/// Address placeholder while the picker camera is moving. Never a valid address.
pub const SEARCHING_ADDRESS: &str = "Buscando...";
/// Shown when reverse geocoding yields nothing.
pub const UNNAMED_ADDRESS: &str = "Ubicación sin nombre";
/// Picker address before the camera first settles.
pub const IDLE_PROMPT: &str = "Mueve el mapa...";
pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_RESULTS: usize = 20;
