//! Outbound deep links from the listing detail sheet.

use std::fmt::Write;

use serde::Serialize;

use crate::listings::{Listing, UserId};

pub const MAPS_PACKAGE: &str = "com.google.android.apps.maps";
pub const DEFAULT_CONTACT_PHONE: &str = "51910202020";

/// Link to hand to the platform, with an optional target app and a fallback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepLink {
    pub uri: String,
    pub package: Option<String>,
    pub fallback: Option<String>,
}

pub fn map_link(listing: &Listing) -> DeepLink {
    let lat = listing.coordinates.lat;
    let lng = listing.coordinates.lng;
    DeepLink {
        uri: format!(
            "geo:{lat},{lng}?q={lat},{lng}({})",
            encode_component(&listing.title)
        ),
        package: Some(MAPS_PACKAGE.to_string()),
        fallback: Some(format!(
            "https://www.google.com/maps/search/?api=1&query={lat},{lng}"
        )),
    }
}

pub fn contact_message(title: &str) -> String {
    format!("Hola, estoy interesado en {title}.")
}

pub fn contact_link(phone: &str, listing: &Listing) -> DeepLink {
    DeepLink {
        uri: format!(
            "https://api.whatsapp.com/send?phone={phone}&text={}",
            encode_component(&contact_message(&listing.title))
        ),
        package: None,
        fallback: None,
    }
}

/// What the detail sheet offers: owners delete, everyone else gets in touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailAction {
    Delete,
    Contact { link: DeepLink },
}

impl DetailAction {
    pub fn for_viewer(listing: &Listing, viewer: Option<&UserId>, phone: &str) -> Self {
        match viewer {
            Some(user) if listing.is_owned_by(user) => DetailAction::Delete,
            _ => DetailAction::Contact {
                link: contact_link(phone, listing),
            },
        }
    }
}

/// URI-component encoding: unreserved `A-Z a-z 0-9 - _ . ! ~ * ' ( )` pass through,
/// every other byte of the UTF-8 form becomes `%XX`.
pub fn encode_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            other => {
                let _ = write!(encoded, "%{other:02X}");
            }
        }
    }
    encoded
}
