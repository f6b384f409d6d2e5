//! Static ZIP -> postal city table.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::normalize_zip;
use crate::models::{Layer, Parent};

/// One postal city entry for a ZIP code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalCityCandidate {
    pub layer: Layer,
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
}

impl PostalCityCandidate {
    pub fn new(layer: Layer, id: i64, name: impl Into<String>) -> Self {
        Self {
            layer,
            id,
            name: name.into(),
            abbreviation: None,
        }
    }

    pub fn to_parent(&self) -> Parent {
        Parent {
            layer: self.layer,
            name: self.name.clone(),
            id: self.id,
            abbreviation: self.abbreviation.clone(),
        }
    }
}

/// Read-only map of normalized ZIP -> postal cities, in table order.
///
/// Built once at startup and shared between workers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PostalCityTable {
    by_zip: HashMap<String, Vec<PostalCityCandidate>>,
    layers: Vec<Layer>,
}

impl PostalCityTable {
    /// Build a table from `(zip, candidate)` pairs; unusable ZIPs are dropped
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PostalCityCandidate)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (zip, candidate) in entries {
            if let Some(zip) = normalize_zip(zip.as_ref()) {
                table.insert(zip, candidate);
            }
        }
        table
    }

    fn insert(&mut self, zip: String, candidate: PostalCityCandidate) {
        if !self.layers.contains(&candidate.layer) {
            self.layers.push(candidate.layer);
            self.layers.sort();
        }
        self.by_zip.entry(zip).or_default().push(candidate);
    }

    /// Load the table from a tab-separated file (optionally gzipped).
    ///
    /// Expected columns: `postalcode`, `id`, `name`, `abbreviation`, `layer`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading postal cities from {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open postal cities file: {}", path.display()))?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let table = Self::from_reader(reader)?;
        info!(
            "Loaded postal cities for {} ZIP codes across layers {:?}",
            table.len(),
            table.layers
        );
        Ok(table)
    }

    /// Parse the tab-separated table format from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        //postalcode  id          name        abbreviation  layer
        //18964       101717367   Souderton                 locality
        //11238       421205765   Brooklyn                  borough

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("Column '{}' not found", name))
        };
        let zip_idx = column("postalcode")?;
        let id_idx = column("id")?;
        let name_idx = column("name")?;
        let layer_idx = column("layer")?;
        let abbr_idx = headers.iter().position(|h| h.trim() == "abbreviation");

        let mut table = Self::default();
        let mut skipped = 0usize;

        for result in csv_reader.records() {
            let record = result?;
            let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

            let zip = normalize_zip(field(zip_idx));
            let id = field(id_idx).parse::<i64>().ok();
            let name = field(name_idx);
            let layer = field(layer_idx).parse::<Layer>().ok();

            let (Some(zip), Some(id), Some(layer)) = (zip, id, layer) else {
                skipped += 1;
                continue;
            };
            if name.is_empty() {
                skipped += 1;
                continue;
            }

            let abbreviation = abbr_idx
                .map(field)
                .filter(|a| !a.is_empty())
                .map(str::to_string);

            table.insert(
                zip,
                PostalCityCandidate {
                    layer,
                    id,
                    name: name.to_string(),
                    abbreviation,
                },
            );
        }

        if skipped > 0 {
            warn!("Skipped {} malformed postal city rows", skipped);
        }

        Ok(table)
    }

    /// Postal cities for a normalized ZIP, in table order
    pub fn candidates(&self, zip: &str) -> &[PostalCityCandidate] {
        self.by_zip.get(zip).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct layers present in the table, coarse to fine
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of ZIP codes with at least one postal city
    pub fn len(&self) -> usize {
        self.by_zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zip.is_empty()
    }
}
