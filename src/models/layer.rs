//! Administrative layer tags.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative tier of a parent entry, ordered coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Country
    Country,
    /// Dependent territory (e.g. Puerto Rico)
    Dependency,
    /// Macro region / federal district
    MacroRegion,
    /// Region / state / province
    Region,
    /// Macro county
    MacroCounty,
    /// County / district
    County,
    /// Local admin / municipality
    LocalAdmin,
    /// Locality / city / town / village
    Locality,
    /// Borough / city district
    Borough,
    /// Macro neighbourhood
    MacroHood,
    /// Neighbourhood / suburb
    Neighbourhood,
}

impl Layer {
    /// Get all layers in hierarchical order (country first)
    pub fn all() -> &'static [Layer] {
        &[
            Layer::Country,
            Layer::Dependency,
            Layer::MacroRegion,
            Layer::Region,
            Layer::MacroCounty,
            Layer::County,
            Layer::LocalAdmin,
            Layer::Locality,
            Layer::Borough,
            Layer::MacroHood,
            Layer::Neighbourhood,
        ]
    }

    /// Tag used on the wire and in the postal table
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Country => "country",
            Layer::Dependency => "dependency",
            Layer::MacroRegion => "macroregion",
            Layer::Region => "region",
            Layer::MacroCounty => "macrocounty",
            Layer::County => "county",
            Layer::LocalAdmin => "localadmin",
            Layer::Locality => "locality",
            Layer::Borough => "borough",
            Layer::MacroHood => "macrohood",
            Layer::Neighbourhood => "neighbourhood",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a layer tag is not one of [`Layer::all`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layer tag: {0}")]
pub struct UnknownLayer(pub String);

impl FromStr for Layer {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Layer::all()
            .iter()
            .copied()
            .find(|layer| layer.as_str() == tag)
            .ok_or_else(|| UnknownLayer(s.to_string()))
    }
}

// Parsed through FromStr so tags work as map keys in both JSON and TOML
impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}
