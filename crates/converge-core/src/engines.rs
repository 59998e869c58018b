//! Pluggable checksum and diff strategies
//!
//! The reconciler receives both through its constructor, so callers and
//! tests can substitute their own.

use converge_diff::ConfigDiff;
use serde_json::Value;

/// Computes a stable checksum of a declaration payload.
pub trait ChecksumEngine {
    fn compute(&self, payload: &Value) -> String;
}

/// Computes the difference between remote and local configuration.
pub trait DiffEngine {
    fn diff(&self, remote: &Value, local: &Value) -> ConfigDiff;
}

/// SHA-256 over the canonical (key-sorted) JSON form of the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Checksum;

impl ChecksumEngine for Sha256Checksum {
    fn compute(&self, payload: &Value) -> String {
        converge_fs::compute_value_checksum(payload)
    }
}

/// Field-by-field structural diff.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralDiff;

impl DiffEngine for StructuralDiff {
    fn diff(&self, remote: &Value, local: &Value) -> ConfigDiff {
        ConfigDiff::compute(remote, local)
    }
}
