// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract with the external scene-graph canvas.

use crate::scene::{ObjectGeometry, SceneObjectId};
use indexmap::IndexMap;

/// Layer to redraw after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedrawLayer {
    /// Main canvas holding the scene objects
    Scene,
    /// Timeline strip holding tracks and proxies
    Timeline,
}

/// Canvas library holding the drawables of scene objects
pub trait SceneCanvas {
    /// Create the drawable for a scene object
    fn add_drawable(&mut self, id: SceneObjectId, geometry: &ObjectGeometry);

    /// Destroy a drawable
    fn destroy_drawable(&mut self, id: SceneObjectId);

    /// Look up a drawable's geometry by id
    fn find(&self, id: SceneObjectId) -> Option<ObjectGeometry>;

    /// Set a drawable's geometry; false if it does not exist
    fn set_geometry(&mut self, id: SceneObjectId, geometry: &ObjectGeometry) -> bool;

    /// Select a drawable and give the canvas keyboard focus
    fn focus(&mut self, id: SceneObjectId);

    /// Currently selected drawable
    fn focused(&self) -> Option<SceneObjectId>;

    /// Ask the renderer to redraw a layer
    fn request_redraw(&mut self, layer: RedrawLayer);
}

/// In-memory canvas recording drawables, focus and redraw requests
#[derive(Debug, Default)]
pub struct MemoryCanvas {
    drawables: IndexMap<SceneObjectId, ObjectGeometry>,
    focused: Option<SceneObjectId>,
    scene_redraws: u64,
    timeline_redraws: u64,
}

impl MemoryCanvas {
    /// Create an empty canvas
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of drawables
    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    /// Whether the canvas has no drawables
    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Redraw requests received for a layer
    pub fn redraws(&self, layer: RedrawLayer) -> u64 {
        match layer {
            RedrawLayer::Scene => self.scene_redraws,
            RedrawLayer::Timeline => self.timeline_redraws,
        }
    }
}

impl SceneCanvas for MemoryCanvas {
    fn add_drawable(&mut self, id: SceneObjectId, geometry: &ObjectGeometry) {
        self.drawables.insert(id, *geometry);
    }

    fn destroy_drawable(&mut self, id: SceneObjectId) {
        self.drawables.shift_remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    fn find(&self, id: SceneObjectId) -> Option<ObjectGeometry> {
        self.drawables.get(&id).copied()
    }

    fn set_geometry(&mut self, id: SceneObjectId, geometry: &ObjectGeometry) -> bool {
        match self.drawables.get_mut(&id) {
            Some(g) => {
                *g = *geometry;
                true
            }
            None => false,
        }
    }

    fn focus(&mut self, id: SceneObjectId) {
        if self.drawables.contains_key(&id) {
            self.focused = Some(id);
        }
    }

    fn focused(&self) -> Option<SceneObjectId> {
        self.focused
    }

    fn request_redraw(&mut self, layer: RedrawLayer) {
        match layer {
            RedrawLayer::Scene => self.scene_redraws += 1,
            RedrawLayer::Timeline => self.timeline_redraws += 1,
        }
    }
}
