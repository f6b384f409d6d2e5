//! HTTP client for a remote PIP service.

use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{Resolver, ResolverError, ResolverResult};
use crate::models::{GeoPoint, Layer};

/// Resolver backed by a PIP service answering `GET /{lon}/{lat}?layers=...`
#[derive(Clone)]
pub struct RemoteResolver {
    base_url: Url,
    client: Client,
}

impl RemoteResolver {
    /// Create a resolver for the service at `url`
    pub fn new(url: &str) -> Result<Self, ResolverError> {
        let mut base_url = Url::parse(url)?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    /// Request URL for a point and layer set
    pub fn request_url(&self, centroid: GeoPoint, layers: &[Layer]) -> Result<Url, ResolverError> {
        let mut url = self
            .base_url
            .join(&format!("{}/{}", centroid.lon, centroid.lat))?;

        if !layers.is_empty() {
            let layers = layers
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("layers", &layers);
        }

        Ok(url)
    }
}

impl Resolver for RemoteResolver {
    async fn lookup(
        &self,
        centroid: GeoPoint,
        layers: &[Layer],
    ) -> Result<ResolverResult, ResolverError> {
        let url = self.request_url(centroid, layers)?;
        debug!("PIP request: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<ResolverResult>().await?)
    }
}
