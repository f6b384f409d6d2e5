//! Per-point result returned by a PIP resolver.

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::models::{Layer, Parent};

/// An administrative area containing the looked-up point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCandidate {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "abbr", skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
}

impl AdminCandidate {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            abbreviation: None,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    fn to_parent(&self, layer: Layer) -> Parent {
        Parent {
            layer,
            name: self.name.clone(),
            id: self.id,
            abbreviation: self.abbreviation.clone(),
        }
    }
}

/// Layer -> containing areas, in the order the resolver reported them.
///
/// A layer the resolver did not report has no entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverResult {
    layers: Vec<(Layer, Vec<AdminCandidate>)>,
}

impl ResolverResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ResolverResult::push`]
    pub fn with(mut self, layer: Layer, candidate: AdminCandidate) -> Self {
        self.push(layer, candidate);
        self
    }

    /// Add an area to a layer, after any areas already on that layer
    pub fn push(&mut self, layer: Layer, candidate: AdminCandidate) {
        match self.layers.iter_mut().find(|(l, _)| *l == layer) {
            Some((_, areas)) => areas.push(candidate),
            None => self.layers.push((layer, vec![candidate])),
        }
    }

    /// Areas reported for a layer
    pub fn get(&self, layer: Layer) -> &[AdminCandidate] {
        self.layers
            .iter()
            .find(|(l, _)| *l == layer)
            .map(|(_, areas)| areas.as_slice())
            .unwrap_or(&[])
    }

    /// Country abbreviation of the first country area, if any
    pub fn country_abbreviation(&self) -> Option<&str> {
        self.get(Layer::Country)
            .first()
            .and_then(|c| c.abbreviation.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|(_, areas)| areas.is_empty())
    }

    /// Flatten into a parent sequence: country first, then the remaining
    /// layers in reported order, each keeping its own area order.
    pub fn flatten(&self) -> Vec<Parent> {
        let country = self
            .get(Layer::Country)
            .iter()
            .map(|c| c.to_parent(Layer::Country));

        let rest = self
            .layers
            .iter()
            .filter(|(layer, _)| *layer != Layer::Country)
            .flat_map(|(layer, areas)| areas.iter().map(|c| c.to_parent(*layer)));

        country.chain(rest).collect()
    }
}

impl<'de> Deserialize<'de> for ResolverResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = ResolverResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of layer to admin areas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut result = ResolverResult::new();
                while let Some(key) = map.next_key::<String>()? {
                    // The PIP service may return layers we don't model (e.g. postalcode)
                    match key.parse::<Layer>() {
                        Ok(layer) => {
                            for candidate in map.next_value::<Vec<AdminCandidate>>()? {
                                result.push(layer, candidate);
                            }
                        }
                        Err(_) => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(ResultVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_puts_country_first() {
        let result = ResolverResult::new()
            .with(Layer::Borough, AdminCandidate::new(421205765, "Brooklyn"))
            .with(
                Layer::Country,
                AdminCandidate::new(1, "United States").with_abbreviation("USA"),
            )
            .with(
                Layer::Locality,
                AdminCandidate::new(85977539, "New York").with_abbreviation("NYC"),
            );

        let parents = result.flatten();
        let layers: Vec<Layer> = parents.iter().map(|p| p.layer).collect();
        assert_eq!(layers, vec![Layer::Country, Layer::Borough, Layer::Locality]);
        assert_eq!(parents[0].abbreviation.as_deref(), Some("USA"));
    }

    #[test]
    fn test_flatten_keeps_order_within_layer() {
        let result = ResolverResult::new()
            .with(Layer::Locality, AdminCandidate::new(1, "A"))
            .with(Layer::County, AdminCandidate::new(2, "C"))
            .with(Layer::Locality, AdminCandidate::new(3, "B"));

        let names: Vec<String> = result.flatten().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_deserialize_preserves_layer_order_and_skips_unknown() {
        let json = r#"{
            "country": [{"id": 1, "name": "United States", "abbr": "USA"}],
            "postalcode": [{"id": 9, "name": "11238"}],
            "borough": [{"id": 421205765, "name": "Brooklyn"}],
            "locality": [{"id": 85977539, "name": "New York", "abbr": "NYC"}]
        }"#;
        let result: ResolverResult = serde_json::from_str(json).unwrap();

        let names: Vec<String> = result.flatten().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["United States", "Brooklyn", "New York"]);
        assert_eq!(result.country_abbreviation(), Some("USA"));
    }

    #[test]
    fn test_missing_layer_is_empty() {
        let result = ResolverResult::new();
        assert!(result.get(Layer::Locality).is_empty());
        assert!(result.is_empty());
        assert!(result.flatten().is_empty());
    }
}
