//! Fatal bundle errors.
//!
//! Per-asset download failures during packing are not errors; they are
//! collected in the pack report instead.

use thiserror::Error;

use crate::domain::CollectionError;

/// Errors that abort a pack or unpack operation
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Malformed bundle: {reason}")]
    MalformedBundle { reason: String },

    #[error("Bundle source unreachable: {source_ref}: {reason}")]
    BundleSourceUnreachable { source_ref: String, reason: String },

    #[error("Invalid bundle source: '{0}' is neither an http(s) URL nor an existing file")]
    InvalidSource(String),

    #[error("Invalid item collection: {0}")]
    InvalidCollection(#[from] CollectionError),
}

impl BundleError {
    /// Shorthand for a malformed-bundle error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedBundle {
            reason: reason.into(),
        }
    }
}
