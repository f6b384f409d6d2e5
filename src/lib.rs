//! Admin lookup - attaches administrative hierarchies to place records.
//!
//! Combines point-in-polygon results with a static ZIP -> postal city table so
//! that the mailing city a user expects on an envelope shows up in the record's
//! parents alongside the municipality that actually contains it.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod postal;
pub mod resolver;

pub use error::{LookupError, LookupResult};
pub use models::{Layer, Parent, Record};
pub use pipeline::AdminLookup;
pub use postal::{merge, normalize_zip, InsertionPolicy, PostalCityTable};
pub use resolver::{RemoteResolver, Resolver, ResolverResult};
