//! Compliance export of an instance and its audit trail.
//!
//! An archive is a versioned, serializable snapshot that can be handed
//! to auditors or replayed for debugging long after the fact. JSON is
//! the interchange format; bincode is the compact storage format.

pub mod error;

pub use error::ArchiveError;

use crate::audit::{replay, TransitionRecord};
use crate::catalog::BasketState;
use crate::store::StateMachineInstance;
use crate::table::TransitionTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version identifier for the archive format.
pub const ARCHIVE_VERSION: u32 = 1;

/// Snapshot of one entity: instance record plus full trail.
///
/// # Example
///
/// ```rust
/// use basketflow::archive::AuditArchive;
/// use basketflow::store::StateMachineInstance;
/// use uuid::Uuid;
///
/// let instance = StateMachineInstance::fresh(Uuid::new_v4());
/// let archive = AuditArchive::new(instance, Vec::new());
///
/// let json = archive.to_json().unwrap();
/// let restored = AuditArchive::from_json(&json).unwrap();
/// assert_eq!(restored.instance, archive.instance);
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AuditArchive {
    /// Archive format version.
    pub version: u32,
    /// Unique archive identifier.
    pub id: Uuid,
    /// When the archive was taken.
    pub created_at: DateTime<Utc>,
    pub instance: StateMachineInstance,
    pub trail: Vec<TransitionRecord>,
}

impl AuditArchive {
    pub fn new(instance: StateMachineInstance, trail: Vec<TransitionRecord>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            instance,
            trail,
        }
    }

    /// Replay the archived trail through a table. Used to verify that
    /// the archived instance state matches its own history.
    pub fn replayed_state(&self, table: &TransitionTable) -> BasketState {
        replay(BasketState::Draft, &self.trail, table)
    }

    /// Serialize to pretty JSON for interchange.
    pub fn to_json(&self) -> Result<String, ArchiveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ArchiveError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, validating the format version.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        let archive: Self = serde_json::from_str(json)
            .map_err(|e| ArchiveError::DeserializationFailed(e.to_string()))?;
        archive.validate_version()
    }

    /// Serialize to the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        bincode::serialize(self).map_err(|e| ArchiveError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from the binary format, validating the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let archive: Self = bincode::deserialize(bytes)
            .map_err(|e| ArchiveError::DeserializationFailed(e.to_string()))?;
        archive.validate_version()
    }

    fn validate_version(self) -> Result<Self, ArchiveError> {
        if self.version != ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion {
                found: self.version,
                supported: ARCHIVE_VERSION,
            });
        }
        Ok(self)
    }
}
