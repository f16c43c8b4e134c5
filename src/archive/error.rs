//! Archive error types.

use thiserror::Error;

/// Errors that can occur while exporting or restoring an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Archive version is not supported by this build
    #[error("Unsupported archive version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
