// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gesture state carried through begin/move/end pointer callbacks.

use crate::unit::{AnimationUnit, UnitId};
use crate::units::TIME_RESOLUTION;
use serde::{Deserialize, Serialize};

/// Which edge of an interval bar is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    /// Left edge: moves the start, keeps the end
    Left,
    /// Right edge: keeps the start, moves the end
    Right,
}

/// In-progress drag of a unit proxy along its track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragGesture {
    /// Dragged unit
    pub unit_id: UnitId,
    /// Unit start when the drag began
    pub origin_start: f32,
    /// Pointer x (absolute) when the drag began
    pub origin_pointer_x: f32,
    /// Proxy x (track-relative) when the drag began
    pub origin_proxy_x: f32,
    /// Whether any move event arrived
    pub moved: bool,
}

impl DragGesture {
    /// Start dragging a unit
    pub fn begin(unit: &AnimationUnit, pointer_x: f32, proxy_x: f32) -> Self {
        Self {
            unit_id: unit.id(),
            origin_start: unit.start(),
            origin_pointer_x: pointer_x,
            origin_proxy_x: proxy_x,
            moved: false,
        }
    }

    /// Proxy x (track-relative) for the current pointer position
    pub fn proxy_x_for(&self, pointer_x: f32) -> f32 {
        self.origin_proxy_x + (pointer_x - self.origin_pointer_x)
    }

    /// Whether ending at `start` changes the unit
    pub fn retimes(&self, start: f32) -> bool {
        self.moved && !same_time(start, self.origin_start)
    }
}

/// In-progress resize of an interval bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeGesture {
    /// Resized unit
    pub unit_id: UnitId,
    /// Dragged edge
    pub edge: ResizeEdge,
    /// Unit start when the resize began
    pub origin_start: f32,
    /// Unit duration when the resize began
    pub origin_duration: f32,
    /// Whether any move event arrived
    pub moved: bool,
}

impl ResizeGesture {
    /// Start resizing a unit
    pub fn begin(unit: &AnimationUnit, edge: ResizeEdge) -> Self {
        Self {
            unit_id: unit.id(),
            edge,
            origin_start: unit.start(),
            origin_duration: unit.duration(),
            moved: false,
        }
    }

    /// Whether ending at `start` + `duration` changes the unit
    pub fn reshapes(&self, start: f32, duration: f32) -> bool {
        self.moved && !(same_time(start, self.origin_start) && same_time(duration, self.origin_duration))
    }
}

fn same_time(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.5 / TIME_RESOLUTION
}

/// Gesture to commit once a pointer sequence is over
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureCommit {
    /// Commit a drag as a retime
    Retime(DragGesture),
    /// Commit a resize as a reduration
    Reduration(ResizeGesture),
}

impl GestureCommit {
    /// Unit being committed
    pub fn unit_id(&self) -> UnitId {
        match self {
            Self::Retime(g) => g.unit_id,
            Self::Reduration(g) => g.unit_id,
        }
    }
}

/// Gestures that ended in the same event tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EndedGestures {
    /// Finished drag, if any
    pub drag: Option<DragGesture>,
    /// Finished resize, if any
    pub resize: Option<ResizeGesture>,
}

impl EndedGestures {
    /// Pick the gesture to commit and the one to discard
    ///
    /// A reduration recomputes the left edge as well, so it wins over a retime.
    /// A resize that never moved yields to the drag.
    pub fn resolve(self) -> (Option<GestureCommit>, Option<DragGesture>) {
        match (self.drag, self.resize.filter(|r| r.moved)) {
            (drag, Some(resize)) => (Some(GestureCommit::Reduration(resize)), drag),
            (Some(drag), None) => (Some(GestureCommit::Retime(drag)), None),
            (None, None) => (None, None),
        }
    }
}
