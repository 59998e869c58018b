//! Configuration diffing for converge
//!
//! Compares the remote view of a resource's configuration with the locally
//! declared one and renders the result for humans.

pub mod diff;

pub use diff::{ConfigDiff, FieldChange};
