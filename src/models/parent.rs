//! Parent entries of a record's administrative hierarchy.

use serde::{Deserialize, Serialize};

use super::Layer;

/// One entry in a record's administrative hierarchy.
///
/// A record may carry several parents on the same layer (e.g. a postal city
/// alongside the municipality containing the point); their order is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub layer: Layer,

    pub name: String,

    /// Gazetteer ID of the area
    pub id: i64,

    /// Abbreviation (e.g., "USA", "NYC")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
}

impl Parent {
    pub fn new(layer: Layer, name: impl Into<String>, id: i64) -> Self {
        Self {
            layer,
            name: name.into(),
            id,
            abbreviation: None,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    /// Whether this entry names the same area tier and name as `(layer, name)`
    pub fn same_as(&self, layer: Layer, name: &str) -> bool {
        self.layer == layer && self.name == name
    }
}
