use thiserror::Error;

use crate::resolver::ResolverError;

/// Failure to enrich a single record. Other records are unaffected.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("resolver lookup failed for {id}: {source}")]
    Resolver {
        id: String,
        #[source]
        source: ResolverError,
    },

    #[error("resolver lookup for {id} timed out after {timeout_ms}ms")]
    Timeout { id: String, timeout_ms: u64 },
}

impl LookupError {
    /// Identifier of the record that failed
    pub fn record_id(&self) -> &str {
        match self {
            LookupError::Resolver { id, .. } | LookupError::Timeout { id, .. } => id,
        }
    }
}

pub type LookupResult<T> = Result<T, LookupError>;
