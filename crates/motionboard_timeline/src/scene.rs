// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene objects participating in animation.

use crate::unit::TransformState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneObjectId(pub Uuid);

impl SceneObjectId {
    /// Create a new random scene object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry of a drawable, as exchanged with the canvas library
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectGeometry {
    /// X position (relative to the ad-module origin)
    pub x: f32,
    /// Y position (relative to the ad-module origin)
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Horizontal scale
    pub scale_x: f32,
    /// Vertical scale
    pub scale_y: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Opacity (0-1)
    pub opacity: f32,
}

impl ObjectGeometry {
    /// Unscaled, unrotated, opaque geometry at a position
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

impl Default for ObjectGeometry {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }
}

/// A placeable, animatable visual entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Unique object ID
    pub id: SceneObjectId,
    /// Display label
    pub label: String,
    /// Current geometry
    pub geometry: ObjectGeometry,
}

impl SceneObject {
    /// Create a new scene object
    pub fn new(label: impl Into<String>, geometry: ObjectGeometry) -> Self {
        Self {
            id: SceneObjectId::new(),
            label: label.into(),
            geometry,
        }
    }

    /// Snapshot of the animatable transform, in canvas coordinates
    ///
    /// `origin` is the current ad-module origin, added to the stored position.
    pub fn transform(&self, origin: [f32; 2]) -> TransformState {
        let g = &self.geometry;
        TransformState {
            x: g.x + origin[0],
            y: g.y + origin[1],
            scale_x: g.scale_x,
            scale_y: g.scale_y,
            rotation: g.rotation,
            opacity: g.opacity,
        }
    }
}

/// Authoritative list of scene objects, in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneRegistry {
    objects: IndexMap<SceneObjectId, SceneObject>,
}

impl SceneRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    pub fn add(&mut self, object: SceneObject) -> SceneObjectId {
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Remove an object, keeping the order of the rest
    pub fn remove(&mut self, id: SceneObjectId) -> Option<SceneObject> {
        self.objects.shift_remove(&id)
    }

    /// Get an object
    pub fn get(&self, id: SceneObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Get a mutable object
    pub fn get_mut(&mut self, id: SceneObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Check whether an object exists
    pub fn contains(&self, id: SceneObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Find an object by label
    pub fn find_by_label(&self, label: &str) -> Option<&SceneObject> {
        self.objects.values().find(|o| o.label == label)
    }

    /// All objects in creation order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
