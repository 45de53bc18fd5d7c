// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline visual model: tracks and the proxies drawn on them.
//!
//! Proxies are views. Their geometry is derived from an [`AnimationUnit`]
//! through the current [`TimeScale`] and read back when a gesture ends.

use crate::config::TimelineConfig;
use crate::error::{Result, SyncError};
use crate::gesture::ResizeEdge;
use crate::scene::SceneObjectId;
use crate::unit::{AnimationUnit, UnitId, UnitKind};
use crate::units::{round_to, TimeScale, PIXEL_RESOLUTION};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Pixel layout of the timeline strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    /// X where the time axis starts
    pub track_start_x: f32,
    /// Height of one row
    pub track_height: f32,
    /// Gap between rows
    pub track_gap_y: f32,
    /// Width of a point proxy
    pub point_width: f32,
}

impl TrackLayout {
    /// Layout taken from the timeline settings
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            track_start_x: config.track_start_x,
            track_height: config.track_height,
            track_gap_y: config.track_gap_y,
            point_width: config.point_width,
        }
    }

    /// Row offset of a slot
    pub fn slot_y(&self, slot: usize) -> f32 {
        slot as f32 * (self.track_height + self.track_gap_y)
    }
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self::from_config(&TimelineConfig::default())
    }
}

/// One lane per scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTrack {
    /// Owning scene object
    pub scene_object_id: SceneObjectId,
    /// Label shown in the thumbnail column
    pub label: String,
    /// Vertical slot
    pub slot: usize,
}

/// Draggable representation of one animation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualUnitProxy {
    /// Represented unit
    pub unit_id: UnitId,
    /// Track owner
    pub scene_object_id: SceneObjectId,
    /// Bar or point
    pub kind: UnitKind,
    /// Left edge, relative to the track start
    pub x: f32,
    /// Row offset
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Horizontal scale left behind by a transformer
    pub scale_x: f32,
    /// Highlighted as the active unit
    pub active: bool,
}

impl VisualUnitProxy {
    /// Right edge, relative to the track start
    pub fn right(&self) -> f32 {
        self.x + self.width * self.scale_x
    }
}

/// Box reported by a transformer at the end of a resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyBox {
    /// Left edge, absolute
    pub x: f32,
    /// Unscaled width
    pub width: f32,
    /// Horizontal scale
    pub scale_x: f32,
}

/// Tracks, proxies, highlight and resize handle
#[derive(Debug, Clone)]
pub struct TimelineModel {
    layout: TrackLayout,
    scale: TimeScale,
    tracks: IndexMap<SceneObjectId, TimelineTrack>,
    proxies: IndexMap<UnitId, VisualUnitProxy>,
    active: Option<UnitId>,
    resize_handle: Option<UnitId>,
}

impl TimelineModel {
    /// Create an empty timeline
    pub fn new(layout: TrackLayout, scale: TimeScale) -> Self {
        Self {
            layout,
            scale,
            tracks: IndexMap::new(),
            proxies: IndexMap::new(),
            active: None,
            resize_handle: None,
        }
    }

    /// Current layout
    pub fn layout(&self) -> TrackLayout {
        self.layout
    }

    /// Scale the proxies were last laid out with
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Append a lane at the next free slot
    pub fn create_track(&mut self, scene_object_id: SceneObjectId, label: impl Into<String>) -> usize {
        if let Some(track) = self.tracks.get(&scene_object_id) {
            return track.slot;
        }
        let slot = self.tracks.len();
        self.tracks.insert(
            scene_object_id,
            TimelineTrack {
                scene_object_id,
                label: label.into(),
                slot,
            },
        );
        tracing::info!("Created track {slot} for {scene_object_id}");
        slot
    }

    /// Remove a lane and its proxies, then re-pack the remaining lanes
    pub fn delete_track(&mut self, scene_object_id: SceneObjectId) -> Result<Vec<UnitId>> {
        if self.tracks.shift_remove(&scene_object_id).is_none() {
            return Err(SyncError::MissingTrack(scene_object_id));
        }

        let removed: Vec<UnitId> = self
            .proxies
            .values()
            .filter(|p| p.scene_object_id == scene_object_id)
            .map(|p| p.unit_id)
            .collect();
        for unit_id in &removed {
            self.destroy_proxy(*unit_id);
        }

        for (slot, track) in self.tracks.values_mut().enumerate() {
            track.slot = slot;
        }
        let layout = self.layout;
        let tracks = &self.tracks;
        for proxy in self.proxies.values_mut() {
            if let Some(track) = tracks.get(&proxy.scene_object_id) {
                proxy.y = layout.slot_y(track.slot);
            }
        }
        tracing::info!("Deleted track of {scene_object_id}, {} proxies removed", removed.len());
        Ok(removed)
    }

    /// Track of a scene object
    pub fn track(&self, scene_object_id: SceneObjectId) -> Option<&TimelineTrack> {
        self.tracks.get(&scene_object_id)
    }

    /// Tracks in slot order
    pub fn tracks(&self) -> impl Iterator<Item = &TimelineTrack> {
        self.tracks.values()
    }

    /// Number of tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Create the proxy of a unit on its object's track
    pub fn create_proxy(&mut self, unit: &AnimationUnit) -> Result<UnitId> {
        let object = unit.scene_object_id();
        let track = self.tracks.get(&object).ok_or(SyncError::MissingTrack(object))?;
        let y = self.layout.slot_y(track.slot);
        let (x, width) = self.geometry_of(unit);
        self.proxies.insert(
            unit.id(),
            VisualUnitProxy {
                unit_id: unit.id(),
                scene_object_id: object,
                kind: unit.kind(),
                x,
                y,
                width,
                scale_x: 1.0,
                active: false,
            },
        );
        tracing::debug!("Proxy for {} at x {x}, width {width}", unit.id());
        Ok(unit.id())
    }

    /// Remove a proxy, clearing highlight and resize handle bound to it
    pub fn destroy_proxy(&mut self, unit_id: UnitId) -> Option<VisualUnitProxy> {
        if self.active == Some(unit_id) {
            self.active = None;
        }
        if self.resize_handle == Some(unit_id) {
            self.resize_handle = None;
        }
        self.proxies.shift_remove(&unit_id)
    }

    /// Proxy of a unit
    pub fn proxy(&self, unit_id: UnitId) -> Option<&VisualUnitProxy> {
        self.proxies.get(&unit_id)
    }

    /// All proxies
    pub fn proxies(&self) -> impl Iterator<Item = &VisualUnitProxy> {
        self.proxies.values()
    }

    /// Re-derive a proxy's geometry from its unit
    pub fn sync_proxy(&mut self, unit: &AnimationUnit) -> Result<()> {
        let (x, width) = self.geometry_of(unit);
        let proxy = self
            .proxies
            .get_mut(&unit.id())
            .ok_or(SyncError::MissingUnit(unit.id()))?;
        proxy.x = x;
        proxy.width = width;
        proxy.scale_x = 1.0;
        Ok(())
    }

    /// Switch to a new scale and re-derive every proxy from its unit
    pub fn relayout<'a>(&mut self, scale: TimeScale, units: impl IntoIterator<Item = &'a AnimationUnit>) {
        self.scale = scale;
        for unit in units {
            // Units without proxies are skipped
            let _ = self.sync_proxy(unit);
        }
        tracing::debug!("Relayout at track width {}", scale.track_pixel_width());
    }

    /// Latest time a point proxy fits on the track
    pub fn latest_point_start(&self) -> f32 {
        let track_width = self.scale.track_pixel_width();
        self.scale.time_from_x((track_width - self.layout.point_width).max(0.0))
    }

    /// Clamp an absolute drag position to the proxy's track
    pub fn drag_bound(&self, unit_id: UnitId, pos: [f32; 2]) -> Result<[f32; 2]> {
        let proxy = self.proxies.get(&unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let min_x = self.layout.track_start_x;
        let max_x = (min_x + self.scale.track_pixel_width() - proxy.width).max(min_x);
        Ok([pos[0].clamp(min_x, max_x), proxy.y])
    }

    /// Move a proxy to an absolute x, within its track
    ///
    /// Returns the bounded, track-relative x.
    pub fn move_proxy(&mut self, unit_id: UnitId, abs_x: f32) -> Result<f32> {
        let [x, _] = self.drag_bound(unit_id, [abs_x, 0.0])?;
        let rel = round_to(x - self.layout.track_start_x, PIXEL_RESOLUTION);
        if let Some(proxy) = self.proxies.get_mut(&unit_id) {
            proxy.x = rel;
        }
        Ok(rel)
    }

    /// Bind the resize handle to an interval proxy
    pub fn attach_resize_handle(&mut self, unit_id: UnitId) -> Result<()> {
        let proxy = self.proxies.get(&unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        if proxy.kind != UnitKind::Interval {
            return Err(SyncError::InvalidGeometry {
                start: self.scale.time_from_x(proxy.x),
                duration: 0.0,
            });
        }
        self.resize_handle = Some(unit_id);
        Ok(())
    }

    /// Unbind the resize handle
    pub fn detach_resize_handle(&mut self) {
        self.resize_handle = None;
    }

    /// Proxy the resize handle is bound to
    pub fn resize_handle(&self) -> Option<UnitId> {
        self.resize_handle
    }

    /// Drag one edge of the bound proxy to an absolute pointer x
    pub fn resize_proxy(&mut self, unit_id: UnitId, edge: ResizeEdge, pointer_x: f32) -> Result<()> {
        let proxy = self.bound_proxy(unit_id)?;
        let start_x = self.layout.track_start_x;
        let left = start_x + proxy.x;
        let right = start_x + proxy.right();
        let bounds = match edge {
            ResizeEdge::Left => {
                let x = pointer_x.min(right);
                ProxyBox {
                    x,
                    width: right - x,
                    scale_x: 1.0,
                }
            }
            ResizeEdge::Right => ProxyBox {
                x: left,
                width: (pointer_x - left).max(0.0),
                scale_x: 1.0,
            },
        };
        self.apply_transform(unit_id, edge, bounds)
    }

    /// Apply a transformer box, folding its scale into the width
    ///
    /// The left edge only moves when the left edge was dragged. The result is
    /// kept inside the track.
    pub fn apply_transform(&mut self, unit_id: UnitId, edge: ResizeEdge, bounds: ProxyBox) -> Result<()> {
        let proxy = self.bound_proxy(unit_id)?;
        let track_width = self.scale.track_pixel_width();
        let right_before = proxy.right();

        let width = (bounds.width * bounds.scale_x).abs();
        let (x, width) = match edge {
            ResizeEdge::Left => {
                let x = (bounds.x - self.layout.track_start_x).max(0.0);
                (x, width.min(right_before - x))
            }
            ResizeEdge::Right => (proxy.x, width.min(track_width - proxy.x)),
        };

        if let Some(proxy) = self.proxies.get_mut(&unit_id) {
            proxy.x = round_to(x, PIXEL_RESOLUTION);
            proxy.width = round_to(width.max(0.0), PIXEL_RESOLUTION);
            proxy.scale_x = 1.0;
        }
        Ok(())
    }

    /// Start time encoded by a proxy's left edge
    pub fn proxy_start(&self, unit_id: UnitId) -> Result<f32> {
        let proxy = self.proxies.get(&unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        Ok(self.scale.time_from_x(proxy.x))
    }

    /// Duration encoded by a proxy's width
    pub fn proxy_duration(&self, unit_id: UnitId) -> Result<f32> {
        let proxy = self.proxies.get(&unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        Ok(self.scale.duration_from_width(proxy.width * proxy.scale_x))
    }

    /// Highlight one proxy, clearing any other first
    pub fn activate(&mut self, unit_id: UnitId) -> Result<()> {
        if !self.proxies.contains_key(&unit_id) {
            return Err(SyncError::MissingUnit(unit_id));
        }
        self.deactivate();
        if let Some(proxy) = self.proxies.get_mut(&unit_id) {
            proxy.active = true;
        }
        self.active = Some(unit_id);
        Ok(())
    }

    /// Clear the highlight
    pub fn deactivate(&mut self) {
        for proxy in self.proxies.values_mut() {
            proxy.active = false;
        }
        self.active = None;
    }

    /// Highlighted unit
    pub fn active(&self) -> Option<UnitId> {
        self.active
    }

    fn bound_proxy(&self, unit_id: UnitId) -> Result<&VisualUnitProxy> {
        let proxy = self.proxies.get(&unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        if self.resize_handle != Some(unit_id) || proxy.kind != UnitKind::Interval {
            return Err(SyncError::InvalidGeometry {
                start: self.scale.time_from_x(proxy.x),
                duration: self.scale.duration_from_width(proxy.width),
            });
        }
        Ok(proxy)
    }

    fn geometry_of(&self, unit: &AnimationUnit) -> (f32, f32) {
        let x = self.scale.x_from_time(unit.start());
        let width = match unit {
            AnimationUnit::IntervalTween(t) => self.scale.width_from_duration(t.duration),
            AnimationUnit::InstantPoint(_) => self.layout.point_width,
        };
        (x, width)
    }
}
