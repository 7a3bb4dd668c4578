//! Listing items.

use chrono::{DateTime, Utc};
use forkspin_cache::Coordinates;
use serde::{Deserialize, Serialize};

use crate::geo;
use crate::ids::RestaurantId;

/// A restaurant as shown in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub id: RestaurantId,
    pub name: String,
    /// Free-form address, used as the geocoding query.
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Known position. Filled in lazily by geocoding.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Whether this row is the featured card.
    #[serde(default)]
    pub is_sponsored: bool,
}

impl DisplayItem {
    pub fn new(id: impl Into<RestaurantId>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            created_at,
            coordinates: None,
            is_sponsored: false,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Mark as the featured card.
    pub fn sponsored(mut self) -> Self {
        self.is_sponsored = true;
        self
    }

    /// Distance from `origin`, if both positions are known.
    pub fn distance_from(&self, origin: Option<Coordinates>) -> Option<f64> {
        match (origin, self.coordinates) {
            (Some(from), Some(to)) => Some(geo::distance_km(from, to)),
            _ => None,
        }
    }

    /// The text to geocode: the address when present, else the name.
    pub fn geocode_query(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.name)
    }
}
