use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::place::{BoundingBox, Place};
use crate::listings::Coordinates;

/// Forward and reverse geocoding against a remote provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(
        &self,
        query: &str,
        bounds: BoundingBox,
        limit: usize,
    ) -> Result<Vec<Place>, GeocodeError>;

    /// Best candidate for a point, if the provider knows one.
    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, GeocodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("unexpected geocoder payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Nominatim-compatible HTTP geocoder.
pub struct HttpGeocoder {
    client: Client,
    base_url: String,
}

impl HttpGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn search(
        &self,
        query: &str,
        bounds: BoundingBox,
        limit: usize,
    ) -> Result<Vec<Place>, GeocodeError> {
        let body = self
            .get(
                "search",
                &[
                    ("q", query.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("addressdetails", "1".to_string()),
                    ("limit", limit.to_string()),
                    ("viewbox", viewbox(bounds)),
                    ("bounded", "1".to_string()),
                ],
            )
            .await?;
        let places = parse_search(&body)?;
        debug!(query, candidates = places.len(), "geocoder search");
        Ok(places)
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, GeocodeError> {
        let body = self
            .get(
                "reverse",
                &[
                    ("lat", point.lat.to_string()),
                    ("lon", point.lng.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;
        parse_reverse(&body)
    }
}

/// `viewbox` parameter ordered `west,north,east,south`.
fn viewbox(bounds: BoundingBox) -> String {
    format!(
        "{},{},{},{}",
        bounds.west, bounds.north, bounds.east, bounds.south
    )
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city_district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl NominatimPlace {
    fn into_place(self) -> Place {
        let coordinates = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => lat
                .parse::<f64>()
                .ok()
                .zip(lon.parse::<f64>().ok())
                .map(|(lat, lng)| Coordinates::new(lat, lng)),
            _ => None,
        };
        let address = self.address;
        Place {
            feature_name: self.name.filter(|name| !name.is_empty()),
            thoroughfare: address.road,
            sub_thoroughfare: address.house_number,
            sub_locality: address
                .suburb
                .or(address.neighbourhood)
                .or(address.city_district),
            locality: address.city.or(address.town).or(address.village),
            coordinates,
        }
    }
}

fn parse_search(body: &str) -> Result<Vec<Place>, GeocodeError> {
    let raw: Vec<NominatimPlace> = serde_json::from_str(body)?;
    Ok(raw.into_iter().map(NominatimPlace::into_place).collect())
}

/// Nominatim answers an unknown point with `{"error": ...}` rather than a status code.
fn parse_reverse(body: &str) -> Result<Option<Place>, GeocodeError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.get("error").is_some() {
        return Ok(None);
    }
    let raw: NominatimPlace = serde_json::from_value(value)?;
    Ok(Some(raw.into_place()))
}
