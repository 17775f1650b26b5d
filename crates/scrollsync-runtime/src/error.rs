#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! - Missing elements degrade the owning component to a no-op.
//! - Unparsed colors are not errors; dependent writes are skipped.
//! - Anything else that fails during setup is caught by
//!   [`crate::ScrollSync::init`], which fails open.

use scrollsync_core::DomError;

/// Errors raised while mounting or running the scroll sync.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A component's required element is absent.
    #[error("required element missing: {0}")]
    MissingElement(&'static str),
    /// The document host rejected a batch.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
