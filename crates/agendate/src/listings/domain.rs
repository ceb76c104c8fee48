use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a listing document in the `propiedades` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier issued by the auth provider; doubles as the `users` document key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device-local reference to a picked photo, uploaded during submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "Casa")]
    House,
    #[serde(rename = "Departamento")]
    Apartment,
    #[serde(rename = "Oficina")]
    Office,
    #[serde(rename = "Terreno")]
    Land,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::House,
        Category::Apartment,
        Category::Office,
        Category::Land,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::House => "Casa",
            Category::Apartment => "Departamento",
            Category::Office => "Oficina",
            Category::Land => "Terreno",
        }
    }

    pub fn is_land(self) -> bool {
        matches!(self, Category::Land)
    }

    /// Land carries no rooms.
    pub fn has_rooms(self) -> bool {
        !self.is_land()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    #[default]
    #[serde(rename = "Venta")]
    Sale,
    #[serde(rename = "Alquiler")]
    Rental,
}

impl OperationType {
    pub fn label(self) -> &'static str {
        match self {
            OperationType::Sale => "Venta",
            OperationType::Rental => "Alquiler",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Venta" => Some(OperationType::Sale),
            "Alquiler" => Some(OperationType::Rental),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "S/")]
    Soles,
    #[serde(rename = "$")]
    Dollars,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Soles => "S/",
            Currency::Dollars => "$",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Currency::Soles => Currency::Dollars,
            Currency::Dollars => Currency::Soles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Pool,
    Garage,
    Garden,
    PetFriendly,
    PapersInOrder,
}

impl Amenity {
    /// Amenities that may carry their own photo, in upload order.
    pub const WITH_PHOTOS: [Amenity; 3] = [Amenity::Pool, Amenity::Garage, Amenity::Garden];

    pub fn applies_to(self, category: Category) -> bool {
        match (self, category) {
            (Amenity::PapersInOrder, _) => true,
            (_, Category::Land) => false,
            (Amenity::Pool, Category::Office) => false,
            _ => true,
        }
    }

    /// Object name used under the listing's storage folder.
    pub fn photo_purpose(self) -> Option<&'static str> {
        match self {
            Amenity::Pool => Some("piscina"),
            Amenity::Garage => Some("cochera"),
            Amenity::Garden => Some("jardin"),
            Amenity::PetFriendly | Amenity::PapersInOrder => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Amenities {
    #[serde(rename = "tienePiscina")]
    pub pool: bool,
    #[serde(rename = "tieneCochera")]
    pub garage: bool,
    #[serde(rename = "tieneJardin")]
    pub garden: bool,
    #[serde(rename = "esPetFriendly")]
    pub pet_friendly: bool,
    #[serde(rename = "papelesEnRegla")]
    pub papers_in_order: bool,
}

impl Amenities {
    pub fn get(&self, amenity: Amenity) -> bool {
        match amenity {
            Amenity::Pool => self.pool,
            Amenity::Garage => self.garage,
            Amenity::Garden => self.garden,
            Amenity::PetFriendly => self.pet_friendly,
            Amenity::PapersInOrder => self.papers_in_order,
        }
    }

    pub fn set(&mut self, amenity: Amenity, enabled: bool) {
        let slot = match amenity {
            Amenity::Pool => &mut self.pool,
            Amenity::Garage => &mut self.garage,
            Amenity::Garden => &mut self.garden,
            Amenity::PetFriendly => &mut self.pet_friendly,
            Amenity::PapersInOrder => &mut self.papers_in_order,
        };
        *slot = enabled;
    }
}

/// Optional per-amenity photos; `T` is a local [`PhotoRef`] in drafts and a URL on listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmenityPhotos<T> {
    #[serde(rename = "fotoPiscina", skip_serializing_if = "Option::is_none")]
    pub pool: Option<T>,
    #[serde(rename = "fotoCochera", skip_serializing_if = "Option::is_none")]
    pub garage: Option<T>,
    #[serde(rename = "fotoJardin", skip_serializing_if = "Option::is_none")]
    pub garden: Option<T>,
}

impl<T> Default for AmenityPhotos<T> {
    fn default() -> Self {
        Self {
            pool: None,
            garage: None,
            garden: None,
        }
    }
}

impl<T> AmenityPhotos<T> {
    pub fn get(&self, amenity: Amenity) -> Option<&T> {
        match amenity {
            Amenity::Pool => self.pool.as_ref(),
            Amenity::Garage => self.garage.as_ref(),
            Amenity::Garden => self.garden.as_ref(),
            Amenity::PetFriendly | Amenity::PapersInOrder => None,
        }
    }

    /// Returns false when the amenity cannot carry a photo.
    pub fn set(&mut self, amenity: Amenity, photo: Option<T>) -> bool {
        let slot = match amenity {
            Amenity::Pool => &mut self.pool,
            Amenity::Garage => &mut self.garage,
            Amenity::Garden => &mut self.garden,
            Amenity::PetFriendly | Amenity::PapersInOrder => return false,
        };
        *slot = photo;
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `(0, 0)` is the unset default.
    pub fn is_set(&self) -> bool {
        !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Exact pin equality, as used by the duplicate-listing query.
    pub fn same_pin(&self, other: &Coordinates) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

/// Property record as stored in the `propiedades` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: ListingId,
    #[serde(rename = "userId", default)]
    pub owner: UserId,
    #[serde(rename = "categoria", default)]
    pub category: Category,
    #[serde(rename = "tipo", default)]
    pub operation: OperationType,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "precio", default)]
    pub price: String,
    #[serde(rename = "moneda", default)]
    pub currency: Currency,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(default)]
    pub area: String,
    #[serde(rename = "habitaciones", default)]
    pub bedrooms: u8,
    #[serde(rename = "banos", default)]
    pub bathrooms: u8,
    #[serde(flatten)]
    pub amenities: Amenities,
    #[serde(flatten)]
    pub amenity_photos: AmenityPhotos<String>,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<String>,
    #[serde(rename = "imagen", default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(rename = "favoritos", default)]
    pub favorited_by: Vec<UserId>,
    #[serde(rename = "publicadoEn", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Decode a snapshot document, filling the id from the document key when absent.
    pub fn from_document(
        document_id: &str,
        document: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut listing: Listing = serde_json::from_value(document)?;
        if listing.id.0.is_empty() {
            listing.id = ListingId(document_id.to_string());
        }
        Ok(listing)
    }

    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Gallery URLs, falling back to the single cover image of older documents.
    pub fn gallery(&self) -> Vec<&str> {
        if !self.images.is_empty() {
            return self.images.iter().map(String::as_str).collect();
        }
        self.cover
            .as_deref()
            .filter(|cover| !cover.is_empty())
            .into_iter()
            .collect()
    }

    pub fn price_label(&self) -> String {
        format!("{} {}", self.currency.symbol(), self.price)
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        !self.owner.0.is_empty() && &self.owner == user
    }

    pub fn is_favorited_by(&self, user: &UserId) -> bool {
        self.favorited_by.iter().any(|fan| fan == user)
    }
}
