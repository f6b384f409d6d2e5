//! Postal city augmentation.
//!
//! A ZIP code's preferred mailing city often differs from the municipality
//! whose boundary contains the point. This module normalizes ZIP fields, holds
//! the static ZIP -> postal city table and merges its entries into a resolver
//! hierarchy.

mod merge;
mod table;
mod zip;

pub use merge::{
    merge, merge_with_outcome, Insertion, InsertionMode, InsertionPolicy, MergeOutcome,
};
pub use table::{PostalCityCandidate, PostalCityTable};
pub use zip::normalize_zip;
