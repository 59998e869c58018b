//! Filesystem primitives for converge
//!
//! Canonical checksums, atomic writes and format-agnostic config files.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use checksum::{canonicalize, compute_content_checksum, compute_value_checksum};
pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
