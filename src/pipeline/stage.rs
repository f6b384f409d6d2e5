//! Admin lookup stage for a stream of records.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::LookupStats;
use crate::config::Config;
use crate::error::{LookupError, LookupResult};
use crate::models::{Layer, Record};
use crate::postal::{
    merge_with_outcome, normalize_zip, InsertionPolicy, PostalCityCandidate, PostalCityTable,
};
use crate::resolver::{Resolver, ResolverResult};

/// Postal city settings for the stage
struct PostalCities {
    table: Arc<PostalCityTable>,
    policy: InsertionPolicy,
    country: String,
}

/// Enriches records with the admin hierarchy for their centroid.
///
/// The stage holds no per-record state, so one instance can serve any number
/// of concurrent records.
pub struct AdminLookup<R> {
    resolver: Arc<R>,
    postal: Option<PostalCities>,
    admin_layers: Vec<Layer>,
    timeout: Option<Duration>,
    stats: LookupStats,
}

impl<R: Resolver> AdminLookup<R> {
    /// Stage with postal cities disabled, requesting only the country layer
    pub fn new(resolver: Arc<R>) -> Self {
        Self {
            resolver,
            postal: None,
            admin_layers: vec![Layer::Country],
            timeout: None,
            stats: LookupStats::default(),
        }
    }

    /// Build the stage from configuration. `table` is only used when postal
    /// cities are enabled.
    pub fn from_config(
        resolver: Arc<R>,
        config: &Config,
        table: Option<Arc<PostalCityTable>>,
    ) -> Self {
        let mut lookup = Self::new(resolver)
            .with_layers(config.resolver.layers.iter().copied())
            .with_timeout(config.resolver.timeout());

        if config.postal_cities.enabled {
            match table {
                Some(table) => {
                    lookup = lookup.with_postal_cities(
                        table,
                        config.postal_cities.policy(),
                        &config.postal_cities.country,
                    );
                }
                None => warn!("Postal cities enabled but no table loaded; skipping augmentation"),
            }
        }

        lookup
    }

    /// Enable postal city augmentation for records in `country`
    pub fn with_postal_cities(
        mut self,
        table: Arc<PostalCityTable>,
        policy: InsertionPolicy,
        country: &str,
    ) -> Self {
        self.postal = Some(PostalCities {
            table,
            policy,
            country: country.to_string(),
        });
        self
    }

    /// Additional admin layers to request from the resolver
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = Layer>) -> Self {
        self.admin_layers.extend(layers);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Layers requested per record: country, the configured admin layers and
    /// every layer the postal table can supply, coarse to fine.
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers = self.admin_layers.clone();
        layers.push(Layer::Country);
        if let Some(postal) = &self.postal {
            layers.extend_from_slice(postal.table.layers());
        }
        layers.sort();
        layers.dedup();
        layers
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    /// Replace the record's parents with its merged admin hierarchy
    pub async fn process(&self, mut record: Record) -> LookupResult<Record> {
        let result = match self.resolve(&record).await {
            Ok(result) => result,
            Err(e) => {
                self.stats.record_failed();
                return Err(e);
            }
        };

        record.parents = match self.postal_candidates(&record, &result) {
            Some((candidates, policy)) => {
                let outcome = merge_with_outcome(&result, candidates, policy);
                debug!(
                    "{}: postal cities {:?} -> {:?}",
                    record.id, candidates, outcome.insertions
                );
                self.stats
                    .record_merge(outcome.inserted(), outcome.suppressed());
                outcome.parents
            }
            None => result.flatten(),
        };

        self.stats.record_processed();
        Ok(record)
    }

    /// Process records with up to `concurrency` lookups in flight.
    /// Results come out in input order.
    pub fn process_stream<'a, S>(
        &'a self,
        records: S,
        concurrency: usize,
    ) -> impl Stream<Item = LookupResult<Record>> + 'a
    where
        S: Stream<Item = Record> + 'a,
    {
        records
            .map(move |record| self.process(record))
            .buffered(concurrency.max(1))
    }

    async fn resolve(&self, record: &Record) -> LookupResult<ResolverResult> {
        let layers = self.layers();
        let lookup = self.resolver.lookup(record.centroid, &layers);

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup).await.map_err(|_| {
                LookupError::Timeout {
                    id: record.id.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => lookup.await,
        };

        result.map_err(|source| LookupError::Resolver {
            id: record.id.clone(),
            source,
        })
    }

    /// Postal cities applicable to a record, if augmentation applies at all
    fn postal_candidates<'s>(
        &'s self,
        record: &Record,
        result: &ResolverResult,
    ) -> Option<(&'s [PostalCityCandidate], &'s InsertionPolicy)> {
        let postal = self.postal.as_ref()?;

        // The table only describes one country's postal system
        if let Some(country) = result.country_abbreviation() {
            if !country.eq_ignore_ascii_case(&postal.country) {
                return None;
            }
        }

        let zip = normalize_zip(record.zip()?)?;
        let candidates = postal.table.candidates(&zip);
        if candidates.is_empty() {
            return None;
        }

        Some((candidates, &postal.policy))
    }
}
