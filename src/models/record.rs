//! Place record flowing through the lookup pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Parent;

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Address components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// Raw ZIP field as found in the source, e.g. "CA 94610-2737"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    /// Other address fields (unit, city, ...), carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Place record.
///
/// Only the centroid, the address ZIP and the parent list are interpreted;
/// every other field is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier, e.g. "whosonfirst:venue:1"
    pub id: String,

    pub centroid: GeoPoint,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Administrative hierarchy, rewritten by the lookup stage
    #[serde(default)]
    pub parents: Vec<Parent>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, centroid: GeoPoint) -> Self {
        Self {
            id: id.into(),
            centroid,
            address: None,
            parents: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.address.get_or_insert_with(Address::default).zip = Some(zip.into());
        self
    }

    /// Raw ZIP field, if the record has one
    pub fn zip(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.zip.as_deref())
    }
}
