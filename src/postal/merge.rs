//! Merge postal cities into the resolver's admin hierarchy.
//!
//! The resolver result is flattened into a base hierarchy (country first), then
//! each postal candidate is applied in table order:
//!
//! - a candidate whose `(layer, name)` is already present is dropped;
//! - if the resolver supplied parents on the candidate's layer, the layer's
//!   [`InsertionMode`] decides: `Promote` goes before the first resolver parent
//!   of that layer, `Append` goes after the last parent of that layer;
//! - otherwise the candidate is anchored directly after country, ahead of the
//!   resolver's other parents.
//!
//! Promoted and anchored candidates keep their table order.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::PostalCityCandidate;
use crate::models::{Layer, Parent};
use crate::resolver::ResolverResult;

/// Where a postal candidate goes when its layer is already populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertionMode {
    /// Before the resolver's entries for the layer (postal name becomes primary)
    Promote,
    /// After the existing entries for the layer (postal name is an alternate)
    Append,
}

/// Per-layer insertion modes. Layers without an entry use `Append`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPolicy {
    modes: HashMap<Layer, InsertionMode>,
}

impl Default for InsertionPolicy {
    fn default() -> Self {
        let mut modes = HashMap::new();
        modes.insert(Layer::Locality, InsertionMode::Promote);
        Self { modes }
    }
}

impl InsertionPolicy {
    pub fn mode(&self, layer: Layer) -> InsertionMode {
        self.modes
            .get(&layer)
            .copied()
            .unwrap_or(InsertionMode::Append)
    }

    pub fn set(&mut self, layer: Layer, mode: InsertionMode) {
        self.modes.insert(layer, mode);
    }

    /// Default policy with `overrides` applied on top
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a Layer, &'a InsertionMode)>,
    ) -> Self {
        let mut policy = Self::default();
        for (layer, mode) in overrides {
            policy.set(*layer, *mode);
        }
        policy
    }
}

/// What happened to one postal candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Suppressed,
    Promoted,
    Appended,
    Anchored,
}

/// Merged hierarchy plus the per-candidate decisions, in candidate order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub parents: Vec<Parent>,
    pub insertions: Vec<Insertion>,
}

impl MergeOutcome {
    pub fn inserted(&self) -> usize {
        self.insertions
            .iter()
            .filter(|i| **i != Insertion::Suppressed)
            .count()
    }

    pub fn suppressed(&self) -> usize {
        self.insertions.len() - self.inserted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Resolver,
    Postal,
}

struct Slot {
    parent: Parent,
    origin: Origin,
}

/// Merge postal candidates into the flattened resolver hierarchy
pub fn merge(
    result: &ResolverResult,
    candidates: &[PostalCityCandidate],
    policy: &InsertionPolicy,
) -> Vec<Parent> {
    merge_with_outcome(result, candidates, policy).parents
}

/// Like [`merge`], also reporting what happened to each candidate
pub fn merge_with_outcome(
    result: &ResolverResult,
    candidates: &[PostalCityCandidate],
    policy: &InsertionPolicy,
) -> MergeOutcome {
    let mut slots: Vec<Slot> = result
        .flatten()
        .into_iter()
        .map(|parent| Slot {
            parent,
            origin: Origin::Resolver,
        })
        .collect();

    // End of the anchored block: after country and any candidates anchored so far
    let mut anchor = slots
        .iter()
        .rposition(|s| s.parent.layer == Layer::Country)
        .map_or(0, |i| i + 1);

    let mut insertions = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let insertion = if slots
            .iter()
            .any(|s| s.parent.same_as(candidate.layer, &candidate.name))
        {
            Insertion::Suppressed
        } else if let Some(first) = slots
            .iter()
            .position(|s| s.origin == Origin::Resolver && s.parent.layer == candidate.layer)
        {
            let (index, insertion) = match policy.mode(candidate.layer) {
                InsertionMode::Promote => (first, Insertion::Promoted),
                InsertionMode::Append => {
                    let last = slots
                        .iter()
                        .rposition(|s| s.parent.layer == candidate.layer)
                        .unwrap_or(first);
                    (last + 1, Insertion::Appended)
                }
            };
            if index < anchor {
                anchor += 1;
            } else if candidate.layer == Layer::Country {
                anchor = index + 1;
            }
            slots.insert(index, candidate.to_slot());
            insertion
        } else {
            slots.insert(anchor, candidate.to_slot());
            anchor += 1;
            Insertion::Anchored
        };

        insertions.push(insertion);
    }

    MergeOutcome {
        parents: slots.into_iter().map(|s| s.parent).collect(),
        insertions,
    }
}

impl PostalCityCandidate {
    fn to_slot(&self) -> Slot {
        Slot {
            parent: self.to_parent(),
            origin: Origin::Postal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AdminCandidate;

    fn usa() -> ResolverResult {
        ResolverResult::new().with(
            Layer::Country,
            AdminCandidate::new(1, "United States").with_abbreviation("USA"),
        )
    }

    fn country_parent() -> Parent {
        Parent::new(Layer::Country, "United States", 1).with_abbreviation("USA")
    }

    fn locality(id: i64, name: &str) -> PostalCityCandidate {
        PostalCityCandidate::new(Layer::Locality, id, name)
    }

    fn borough(id: i64, name: &str) -> PostalCityCandidate {
        PostalCityCandidate::new(Layer::Borough, id, name)
    }

    fn names(parents: &[Parent]) -> Vec<&str> {
        parents.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_no_candidates_is_flatten() {
        let result = usa()
            .with(Layer::Region, AdminCandidate::new(5, "Pennsylvania"))
            .with(Layer::Locality, AdminCandidate::new(2, "Locality 1"));

        let merged = merge(&result, &[], &InsertionPolicy::default());
        assert_eq!(merged, result.flatten());
    }

    #[test]
    fn test_postal_locality_promoted() {
        // ZIP 18964
        let result = usa().with(
            Layer::Locality,
            AdminCandidate::new(2, "Locality 1").with_abbreviation("ABC"),
        );
        let merged = merge(
            &result,
            &[locality(101717367, "Souderton")],
            &InsertionPolicy::default(),
        );

        assert_eq!(
            merged,
            vec![
                country_parent(),
                Parent::new(Layer::Locality, "Souderton", 101717367),
                Parent::new(Layer::Locality, "Locality 1", 2).with_abbreviation("ABC"),
            ]
        );
    }

    #[test]
    fn test_multiple_localities_keep_table_order() {
        // ZIP 21236
        let result = usa().with(Layer::Locality, AdminCandidate::new(2, "Locality 1"));
        let candidates = vec![
            locality(1125996559, "Nottingham"),
            locality(85949461, "Baltimore"),
            locality(85950213, "Perry Hall"),
            locality(85950229, "White Marsh"),
        ];

        let merged = merge(&result, &candidates, &InsertionPolicy::default());
        assert_eq!(
            names(&merged),
            vec![
                "United States",
                "Nottingham",
                "Baltimore",
                "Perry Hall",
                "White Marsh",
                "Locality 1"
            ]
        );
    }

    #[test]
    fn test_promoted_ahead_of_all_resolver_localities() {
        let result = usa()
            .with(Layer::Locality, AdminCandidate::new(2, "Locality 1"))
            .with(Layer::Locality, AdminCandidate::new(3, "Locality 2"));

        let outcome = merge_with_outcome(
            &result,
            &[locality(101717689, "Hummelstown"), locality(101719813, "Hershey")],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            names(&outcome.parents),
            vec![
                "United States",
                "Hummelstown",
                "Hershey",
                "Locality 1",
                "Locality 2"
            ]
        );
        assert_eq!(
            outcome.insertions,
            vec![Insertion::Promoted, Insertion::Promoted]
        );
    }

    #[test]
    fn test_duplicate_borough_suppressed() {
        // ZIP 11238
        let result = usa()
            .with(Layer::Borough, AdminCandidate::new(421205765, "Brooklyn"))
            .with(
                Layer::Locality,
                AdminCandidate::new(85977539, "New York").with_abbreviation("NYC"),
            );

        let outcome = merge_with_outcome(
            &result,
            &[borough(421205765, "Brooklyn")],
            &InsertionPolicy::default(),
        );
        assert_eq!(outcome.parents, result.flatten());
        assert_eq!(outcome.insertions, vec![Insertion::Suppressed]);
        assert_eq!(outcome.suppressed(), 1);
    }

    #[test]
    fn test_borough_appended_after_existing() {
        let result = usa()
            .with(Layer::Borough, AdminCandidate::new(999, "Example Borough"))
            .with(Layer::Locality, AdminCandidate::new(85977539, "New York"));

        let outcome = merge_with_outcome(
            &result,
            &[borough(421205765, "Brooklyn"), borough(7, "Queens")],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            names(&outcome.parents),
            vec![
                "United States",
                "Example Borough",
                "Brooklyn",
                "Queens",
                "New York"
            ]
        );
        assert_eq!(
            outcome.insertions,
            vec![Insertion::Appended, Insertion::Appended]
        );
    }

    #[test]
    fn test_missing_borough_anchored_after_country() {
        let result = usa().with(
            Layer::Locality,
            AdminCandidate::new(85977539, "New York").with_abbreviation("NYC"),
        );

        let merged = merge(
            &result,
            &[borough(421205765, "Brooklyn")],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            merged,
            vec![
                country_parent(),
                Parent::new(Layer::Borough, "Brooklyn", 421205765),
                Parent::new(Layer::Locality, "New York", 85977539).with_abbreviation("NYC"),
            ]
        );
    }

    #[test]
    fn test_no_pip_locality_anchors_in_table_order() {
        // ZIP "CA 94610-2737"
        let outcome = merge_with_outcome(
            &usa(),
            &[locality(85921877, "Piedmont"), locality(85921881, "Oakland")],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            outcome.parents,
            vec![
                country_parent(),
                Parent::new(Layer::Locality, "Piedmont", 85921877),
                Parent::new(Layer::Locality, "Oakland", 85921881),
            ]
        );
        assert_eq!(
            outcome.insertions,
            vec![Insertion::Anchored, Insertion::Anchored]
        );
    }

    #[test]
    fn test_anchored_block_precedes_resolver_parents() {
        let result = usa()
            .with(Layer::Region, AdminCandidate::new(5, "New York State"))
            .with(Layer::Locality, AdminCandidate::new(85977539, "New York"));

        let merged = merge(
            &result,
            &[
                borough(421205765, "Brooklyn"),
                PostalCityCandidate::new(Layer::Neighbourhood, 8, "Fort Greene"),
            ],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            names(&merged),
            vec![
                "United States",
                "Brooklyn",
                "Fort Greene",
                "New York State",
                "New York"
            ]
        );
    }

    #[test]
    fn test_promote_after_anchor_keeps_country_first() {
        let result = usa().with(Layer::Locality, AdminCandidate::new(2, "Locality 1"));

        let merged = merge(
            &result,
            &[borough(3, "Brooklyn"), locality(4, "Souderton")],
            &InsertionPolicy::default(),
        );
        assert_eq!(
            names(&merged),
            vec!["United States", "Brooklyn", "Souderton", "Locality 1"]
        );
    }

    #[test]
    fn test_duplicate_within_table_suppressed() {
        let merged = merge(
            &usa(),
            &[locality(1, "Davis"), locality(1, "Davis")],
            &InsertionPolicy::default(),
        );
        assert_eq!(names(&merged), vec!["United States", "Davis"]);
    }

    #[test]
    fn test_no_country_anchors_at_head() {
        let result = ResolverResult::new().with(Layer::County, AdminCandidate::new(3, "Yolo"));

        let merged = merge(&result, &[locality(85922419, "Davis")], &InsertionPolicy::default());
        assert_eq!(names(&merged), vec!["Davis", "Yolo"]);
    }

    #[test]
    fn test_policy_override() {
        let mut policy = InsertionPolicy::default();
        policy.set(Layer::Borough, InsertionMode::Promote);
        policy.set(Layer::Locality, InsertionMode::Append);

        let result = usa()
            .with(Layer::Borough, AdminCandidate::new(999, "Example Borough"))
            .with(Layer::Locality, AdminCandidate::new(2, "Locality 1"));

        let merged = merge(
            &result,
            &[borough(421205765, "Brooklyn"), locality(5, "Souderton")],
            &policy,
        );
        assert_eq!(
            names(&merged),
            vec![
                "United States",
                "Brooklyn",
                "Example Borough",
                "Locality 1",
                "Souderton"
            ]
        );
    }

    #[test]
    fn test_default_modes() {
        let policy = InsertionPolicy::default();
        assert_eq!(policy.mode(Layer::Locality), InsertionMode::Promote);
        assert_eq!(policy.mode(Layer::Borough), InsertionMode::Append);
        assert_eq!(policy.mode(Layer::County), InsertionMode::Append);
    }

    #[test]
    fn test_merged_hierarchy_has_no_duplicates() {
        let result = usa()
            .with(Layer::Borough, AdminCandidate::new(421205765, "Brooklyn"))
            .with(Layer::Locality, AdminCandidate::new(85977539, "New York"));
        let candidates = vec![
            borough(421205765, "Brooklyn"),
            locality(85977539, "New York"),
            locality(1, "Brooklyn"),
            locality(1, "Brooklyn"),
            borough(2, "Queens"),
        ];

        let merged = merge(&result, &candidates, &InsertionPolicy::default());
        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                assert!(!b.same_as(a.layer, &a.name), "duplicate {:?}", a);
            }
        }
        assert_eq!(merged[0], country_parent());
    }
}
