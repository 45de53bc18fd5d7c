// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline synchronization.

use crate::scene::SceneObjectId;
use crate::unit::UnitId;

/// Errors reported by timeline operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// The scene object has no timeline track (usually a stale id after deletion)
    #[error("No track for scene object {0}")]
    MissingTrack(SceneObjectId),

    /// The animation unit or its tween could not be found
    #[error("Animation unit not found: {0}")]
    MissingUnit(UnitId),

    /// The scene object to snapshot is gone
    #[error("Scene object not found: {0}")]
    MissingSceneObject(SceneObjectId),

    /// A drag or resize produced an out-of-range time or duration
    #[error("Invalid geometry: start {start:.3}s, duration {duration:.3}s")]
    InvalidGeometry {
        /// Offending start time in seconds
        start: f32,
        /// Offending duration in seconds
        duration: f32,
    },

    /// A unit is present in one tween registry map but not in its pair
    #[error("Tween registry out of sync for unit {unit} of object {object}")]
    RegistryDesync {
        /// Scene object owning the unit
        object: SceneObjectId,
        /// Unit missing its counterpart
        unit: UnitId,
    },

    /// The unit id is already registered
    #[error("Animation unit already registered: {0}")]
    DuplicateUnit(UnitId),

    /// Recapture requested without an active unit
    #[error("No active animation unit")]
    NoActiveUnit,

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, SyncError>;
