// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation units: interval tweens and instant points.

use crate::error::{Result, SyncError};
use crate::scene::SceneObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Slack allowed when comparing an end time against the total duration
const END_TOLERANCE: f32 = 1e-4;

/// Unique identifier for an animation unit (and its visual proxy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    /// Create a new random unit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Easing curve name handed to the animation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// No easing (linear)
    #[default]
    None,
    /// Ease in
    In,
    /// Ease out
    Out,
    /// Ease in and out
    InOut,
}

impl Easing {
    /// Backend curve name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::In => "power1.in",
            Self::Out => "power1.out",
            Self::InOut => "power1.inOut",
        }
    }
}

/// Snapshot of the animatable transform of a scene object
///
/// Positions are canvas coordinates (scene position plus ad-module origin).
/// Width and height are deliberately absent: they belong to the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Horizontal scale
    pub scale_x: f32,
    /// Vertical scale
    pub scale_y: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Opacity (0-1)
    pub opacity: f32,
}

impl TransformState {
    /// Same transform moved by a delta
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// Which end of a unit a captured transform is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// `from_state` of an interval (the single state of a point)
    Start,
    /// `to_state` of an interval (the single state of a point)
    End,
}

/// Timed transition between two transform snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalTween {
    /// Unit ID
    pub id: UnitId,
    /// Animated scene object
    pub scene_object_id: SceneObjectId,
    /// Start time in seconds
    pub start: f32,
    /// Duration in seconds
    pub duration: f32,
    /// State at `start`
    pub from_state: TransformState,
    /// State at `start + duration`
    pub to_state: TransformState,
    /// Easing curve
    pub easing: Easing,
}

/// Instantaneous transform assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantPoint {
    /// Unit ID
    pub id: UnitId,
    /// Animated scene object
    pub scene_object_id: SceneObjectId,
    /// Time in seconds
    pub start: f32,
    /// State assigned at `start`
    pub state: TransformState,
}

/// Kind of animation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Interval tween (bar)
    Interval,
    /// Instant point
    Point,
}

/// An animation unit targeting one scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnimationUnit {
    /// Timed transition
    IntervalTween(IntervalTween),
    /// Instant assignment
    InstantPoint(InstantPoint),
}

impl AnimationUnit {
    /// Zero-effect interval: from and to are the same snapshot
    pub fn interval(
        scene_object_id: SceneObjectId,
        start: f32,
        duration: f32,
        state: TransformState,
    ) -> Self {
        Self::IntervalTween(IntervalTween {
            id: UnitId::new(),
            scene_object_id,
            start,
            duration,
            from_state: state,
            to_state: state,
            easing: Easing::None,
        })
    }

    /// Instant point assigning `state`
    pub fn point(scene_object_id: SceneObjectId, start: f32, state: TransformState) -> Self {
        Self::InstantPoint(InstantPoint {
            id: UnitId::new(),
            scene_object_id,
            start,
            state,
        })
    }

    /// Unit ID
    pub fn id(&self) -> UnitId {
        match self {
            Self::IntervalTween(t) => t.id,
            Self::InstantPoint(p) => p.id,
        }
    }

    /// Target scene object
    pub fn scene_object_id(&self) -> SceneObjectId {
        match self {
            Self::IntervalTween(t) => t.scene_object_id,
            Self::InstantPoint(p) => p.scene_object_id,
        }
    }

    /// Kind of unit
    pub fn kind(&self) -> UnitKind {
        match self {
            Self::IntervalTween(_) => UnitKind::Interval,
            Self::InstantPoint(_) => UnitKind::Point,
        }
    }

    /// Start time in seconds
    pub fn start(&self) -> f32 {
        match self {
            Self::IntervalTween(t) => t.start,
            Self::InstantPoint(p) => p.start,
        }
    }

    /// Duration in seconds (zero for points)
    pub fn duration(&self) -> f32 {
        match self {
            Self::IntervalTween(t) => t.duration,
            Self::InstantPoint(_) => 0.0,
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f32 {
        self.start() + self.duration()
    }

    /// Copy with a new start time
    pub fn with_start(&self, start: f32) -> Self {
        let mut unit = self.clone();
        match &mut unit {
            Self::IntervalTween(t) => t.start = start,
            Self::InstantPoint(p) => p.start = start,
        }
        unit
    }

    /// Copy with a new start and duration (intervals only)
    pub fn with_timing(&self, start: f32, duration: f32) -> Result<Self> {
        match self {
            Self::IntervalTween(t) => Ok(Self::IntervalTween(IntervalTween {
                start,
                duration,
                ..t.clone()
            })),
            Self::InstantPoint(p) => Err(SyncError::InvalidGeometry {
                start: p.start,
                duration,
            }),
        }
    }

    /// Copy with a captured transform written to an endpoint
    pub fn with_captured(&self, endpoint: Endpoint, state: TransformState) -> Self {
        let mut unit = self.clone();
        match (&mut unit, endpoint) {
            (Self::IntervalTween(t), Endpoint::Start) => t.from_state = state,
            (Self::IntervalTween(t), Endpoint::End) => t.to_state = state,
            (Self::InstantPoint(p), _) => p.state = state,
        }
        unit
    }

    /// Copy with every stored position moved by a delta
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut unit = self.clone();
        match &mut unit {
            Self::IntervalTween(t) => {
                t.from_state = t.from_state.translated(dx, dy);
                t.to_state = t.to_state.translated(dx, dy);
            }
            Self::InstantPoint(p) => p.state = p.state.translated(dx, dy),
        }
        unit
    }

    /// Check timing against the timeline length
    pub fn validate(&self, total_duration: f32) -> Result<()> {
        let start = self.start();
        let duration = self.duration();
        let invalid = SyncError::InvalidGeometry { start, duration };

        if !start.is_finite() || start < 0.0 || start > total_duration + END_TOLERANCE {
            return Err(invalid);
        }
        if let Self::IntervalTween(_) = self {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(invalid);
            }
            if start + duration > total_duration + END_TOLERANCE {
                return Err(invalid);
            }
        }
        Ok(())
    }
}
