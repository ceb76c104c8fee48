use serde::{Deserialize, Serialize};

use crate::listings::{Coordinates, LocationCommit};

/// Rectangular search area in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }
}

/// Lima and Callao metropolitan area.
pub const LIMA_CALLAO: BoundingBox = BoundingBox {
    south: -12.36,
    west: -77.20,
    north: -11.80,
    east: -76.80,
};

/// Geocoder candidate, with the address components the UI formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub feature_name: Option<String>,
    pub thoroughfare: Option<String>,
    pub sub_thoroughfare: Option<String>,
    pub sub_locality: Option<String>,
    pub locality: Option<String>,
    pub coordinates: Option<Coordinates>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Place {
    /// Candidates need coordinates and either a feature name or a street.
    pub fn is_usable(&self) -> bool {
        self.coordinates.is_some()
            && (non_empty(&self.feature_name).is_some() || non_empty(&self.thoroughfare).is_some())
    }

    /// Primary line in a result list.
    pub fn title(&self) -> &str {
        non_empty(&self.feature_name)
            .or_else(|| non_empty(&self.thoroughfare))
            .unwrap_or_default()
    }

    /// Secondary line in a result list: `"{subLocality}, {locality}"`.
    pub fn subtitle(&self) -> String {
        format!(
            "{}, {}",
            non_empty(&self.sub_locality).unwrap_or_default(),
            non_empty(&self.locality).unwrap_or_default()
        )
    }

    /// Address text stored when a result is picked from the list.
    pub fn selection_label(&self) -> String {
        match non_empty(&self.sub_locality) {
            Some(district) => format!("{}, {district}", self.title()),
            None => self.title().to_string(),
        }
    }

    /// Street-first address used by the map picker after reverse geocoding.
    ///
    /// Empty when the candidate has no usable component at all.
    pub fn display_address(&self) -> String {
        let street = match non_empty(&self.thoroughfare) {
            Some(street) => format!(
                "{street} {}",
                non_empty(&self.sub_thoroughfare).unwrap_or_default()
            )
            .trim()
            .to_string(),
            None => non_empty(&self.feature_name)
                .unwrap_or_default()
                .to_string(),
        };
        let district = non_empty(&self.sub_locality)
            .or_else(|| non_empty(&self.locality))
            .unwrap_or_default();

        match (street.is_empty(), district.is_empty()) {
            (false, false) if street != district => format!("{street}, {district}"),
            (false, _) => street,
            (true, _) => district.to_string(),
        }
    }

    /// Picker result for this candidate, if it has coordinates.
    pub fn commit(&self) -> Option<LocationCommit> {
        self.coordinates.map(|point| LocationCommit {
            lat: point.lat,
            lng: point.lng,
            address: self.selection_label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn larco() -> Place {
        Place {
            feature_name: Some("345".to_string()),
            thoroughfare: Some("Avenida Larco".to_string()),
            sub_thoroughfare: Some("345".to_string()),
            sub_locality: Some("Miraflores".to_string()),
            locality: Some("Lima".to_string()),
            coordinates: Some(Coordinates::new(-12.1211, -77.0297)),
        }
    }

    #[test]
    fn display_address_prefers_street_and_district() {
        assert_eq!(larco().display_address(), "Avenida Larco 345, Miraflores");

        let no_number = Place {
            sub_thoroughfare: None,
            sub_locality: None,
            ..larco()
        };
        assert_eq!(no_number.display_address(), "Avenida Larco, Lima");

        let landmark = Place {
            feature_name: Some("Parque Kennedy".to_string()),
            thoroughfare: None,
            ..larco()
        };
        assert_eq!(landmark.display_address(), "Parque Kennedy, Miraflores");
    }

    #[test]
    fn display_address_collapses_repeated_or_missing_parts() {
        let same = Place {
            feature_name: Some("Miraflores".to_string()),
            thoroughfare: None,
            sub_locality: Some("Miraflores".to_string()),
            ..Place::default()
        };
        assert_eq!(same.display_address(), "Miraflores");

        let district_only = Place {
            locality: Some("Callao".to_string()),
            ..Place::default()
        };
        assert_eq!(district_only.display_address(), "Callao");
        assert_eq!(Place::default().display_address(), "");
    }

    #[test]
    fn list_labels_follow_feature_then_street() {
        let place = larco();
        assert_eq!(place.title(), "345");
        assert_eq!(place.subtitle(), "Miraflores, Lima");

        let street = Place {
            feature_name: None,
            ..larco()
        };
        assert_eq!(street.title(), "Avenida Larco");
        assert_eq!(street.selection_label(), "Avenida Larco, Miraflores");
    }

    #[test]
    fn candidates_without_name_or_coordinates_are_unusable() {
        assert!(larco().is_usable());
        let unnamed = Place {
            feature_name: None,
            thoroughfare: Some("  ".to_string()),
            ..larco()
        };
        assert!(!unnamed.is_usable());
        let floating = Place {
            coordinates: None,
            ..larco()
        };
        assert!(!floating.is_usable());
        assert!(floating.commit().is_none());
    }

    #[test]
    fn lima_box_bounds() {
        assert!(LIMA_CALLAO.contains(Coordinates::new(-12.1211, -77.0297)));
        assert!(!LIMA_CALLAO.contains(Coordinates::new(-13.5, -71.9)));
    }
}
