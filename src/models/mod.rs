//! Core data models for the admin lookup.

pub mod layer;
pub mod parent;
pub mod record;

pub use layer::{Layer, UnknownLayer};
pub use parent::Parent;
pub use record::{Address, GeoPoint, Record};
