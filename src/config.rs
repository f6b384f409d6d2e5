use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Layer;
use crate::postal::{InsertionMode, InsertionPolicy};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub postal_cities: PostalCitiesConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the PIP service
    pub url: String,
    /// Per-record lookup timeout in milliseconds; 0 disables it
    pub timeout_ms: u64,
    /// Admin layers to request besides country and the postal table's layers
    pub layers: Vec<Layer>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4200".to_string(),
            timeout_ms: 5_000,
            layers: vec![
                Layer::Country,
                Layer::Region,
                Layer::County,
                Layer::Locality,
                Layer::Borough,
            ],
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PostalCitiesConfig {
    pub enabled: bool,
    /// Tab-separated ZIP -> postal city table (may be gzipped)
    pub file: Option<PathBuf>,
    /// ISO3 country the table applies to
    pub country: String,
    /// Per-layer insertion mode overrides
    pub insertion: BTreeMap<Layer, InsertionMode>,
}

impl Default for PostalCitiesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file: None,
            country: "USA".to_string(),
            insertion: BTreeMap::new(),
        }
    }
}

impl PostalCitiesConfig {
    pub fn policy(&self) -> InsertionPolicy {
        InsertionPolicy::with_overrides(&self.insertion)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records looked up concurrently
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 32 }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
