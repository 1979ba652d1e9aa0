//! Ridership aggregation.
//!
//! Every operation here is a pure reduction over a filtered view of
//! [`CanonicalRecord`](crate::record::CanonicalRecord)s and returns a table
//! or scalar the presentation layer renders as-is. Empty input always yields
//! an empty table, zero, or `None`, never an error.

pub mod aggregate;
pub mod dashboard;
pub mod types;
pub mod utility;
