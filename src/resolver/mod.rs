//! Point-in-Polygon (PIP) resolver interface.
//!
//! The resolver maps a coordinate to the administrative areas containing it.
//! How containment is computed is up to the implementation; the lookup stage
//! only depends on the [`Resolver`] trait.

mod remote;
mod result;

pub use remote::RemoteResolver;
pub use result::{AdminCandidate, ResolverResult};

use std::future::Future;

use crate::models::{GeoPoint, Layer};

/// Errors raised by a resolver for a single lookup
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("PIP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PIP service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid PIP service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

/// Admin area lookup for a point
pub trait Resolver: Send + Sync {
    /// Find the areas on `layers` that contain `centroid`
    fn lookup(
        &self,
        centroid: GeoPoint,
        layers: &[Layer],
    ) -> impl Future<Output = Result<ResolverResult, ResolverError>> + Send;
}
