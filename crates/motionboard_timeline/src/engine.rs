// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline engine: one owned context keeping scene objects, timeline
//! proxies and engine tweens consistent.
//!
//! Every mutating entry point returns a [`Result`]. A failed operation leaves
//! all three representations as they were; proxies touched by a gesture are
//! re-derived from their unchanged unit.

use crate::backend::AnimationBackend;
use crate::canvas::{RedrawLayer, SceneCanvas};
use crate::config::{TimelineConfig, Viewport};
use crate::error::{Result, SyncError};
use crate::gesture::{DragGesture, EndedGestures, GestureCommit, ResizeEdge, ResizeGesture};
use crate::playback::PlaybackController;
use crate::registry::TweenRegistry;
use crate::resize::ResizeDebouncer;
use crate::scene::{ObjectGeometry, SceneObject, SceneObjectId, SceneRegistry};
use crate::track::{ProxyBox, TimelineModel, TrackLayout};
use crate::unit::{AnimationUnit, Endpoint, TransformState, UnitId, UnitKind};
use crate::units::TimeScale;
use std::time::Instant;

/// Synchronization context over an animation engine and a canvas
pub struct TimelineEngine<B: AnimationBackend, C: SceneCanvas> {
    config: TimelineConfig,
    viewport: Viewport,
    origin: [f32; 2],
    scene: SceneRegistry,
    timeline: TimelineModel,
    tweens: TweenRegistry,
    playback: PlaybackController,
    backend: B,
    canvas: C,
    capture_endpoint: Option<Endpoint>,
    drag: Option<DragGesture>,
    resize: Option<ResizeGesture>,
    debouncer: ResizeDebouncer,
}

impl<B: AnimationBackend, C: SceneCanvas> TimelineEngine<B, C> {
    /// Create an engine and build the master timeline
    pub fn new(config: TimelineConfig, viewport: Viewport, mut backend: B, canvas: C) -> Self {
        let mut playback = PlaybackController::new(config.total_duration);
        playback.rebuild(&mut backend);

        tracing::info!(
            "Timeline engine ready: {}s over {}px",
            config.total_duration,
            config.track_pixel_width(viewport)
        );
        Self {
            origin: config.ad_module_origin(viewport),
            timeline: TimelineModel::new(TrackLayout::from_config(&config), config.time_scale(viewport)),
            debouncer: ResizeDebouncer::new(config.resize_debounce()),
            config,
            viewport,
            scene: SceneRegistry::new(),
            tweens: TweenRegistry::new(),
            playback,
            backend,
            canvas,
            capture_endpoint: None,
            drag: None,
            resize: None,
        }
    }

    /// Discard every tween and the end marker, handing back the collaborators
    pub fn teardown(mut self) -> (B, C) {
        self.tweens.clear(&mut self.backend);
        self.playback.teardown(&mut self.backend);
        tracing::info!("Timeline engine torn down");
        (self.backend, self.canvas)
    }

    // Scene objects

    /// Add a scene object with its drawable and track
    pub fn add_scene_object(&mut self, label: impl Into<String>, geometry: ObjectGeometry) -> SceneObjectId {
        let object = SceneObject::new(label, geometry);
        let id = object.id;
        self.canvas.add_drawable(id, &object.geometry);
        self.timeline.create_track(id, object.label.clone());
        self.tweens.open_track(id);
        self.scene.add(object);
        self.canvas.request_redraw(RedrawLayer::Scene);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        id
    }

    /// Delete a scene object and everything that animates it
    pub fn delete_scene_object(&mut self, id: SceneObjectId) -> Result<Vec<AnimationUnit>> {
        if !self.scene.contains(id) {
            return Err(SyncError::MissingSceneObject(id));
        }
        self.cancel_gestures_on(|unit| unit.scene_object_id() == id);

        let units = self.tweens.close_track(&mut self.backend, id)?;
        if let Err(e) = self.timeline.delete_track(id) {
            tracing::warn!("Deleting {id}: {e}");
        }
        self.scene.remove(id);
        self.canvas.destroy_drawable(id);
        self.canvas.request_redraw(RedrawLayer::Scene);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        tracing::info!("Deleted scene object {id} with {} units", units.len());
        Ok(units)
    }

    /// Update a scene object's geometry, recapturing the active unit when armed
    ///
    /// A failed recapture leaves the object at its previous geometry.
    pub fn edit_object(&mut self, id: SceneObjectId, geometry: ObjectGeometry) -> Result<()> {
        let object = self.scene.get_mut(id).ok_or(SyncError::MissingSceneObject(id))?;
        let previous = std::mem::replace(&mut object.geometry, geometry);

        let targets_active = self
            .active_unit()
            .is_some_and(|unit| unit.scene_object_id() == id);
        if let Some(endpoint) = self.capture_endpoint.filter(|_| targets_active) {
            if let Err(e) = self.recapture(endpoint) {
                if let Some(object) = self.scene.get_mut(id) {
                    object.geometry = previous;
                }
                return Err(e);
            }
        }
        self.canvas.set_geometry(id, &geometry);
        self.canvas.request_redraw(RedrawLayer::Scene);
        Ok(())
    }

    /// Focus a scene object from its track, without activating any unit
    pub fn select_object_from_track(&mut self, id: SceneObjectId) -> Result<()> {
        if !self.scene.contains(id) {
            return Err(SyncError::MissingSceneObject(id));
        }
        self.canvas.focus(id);
        Ok(())
    }

    // Animation units

    /// Create a zero-effect interval tween at the playhead
    pub fn create_animation(&mut self, object: SceneObjectId) -> Result<UnitId> {
        let total = self.config.total_duration;
        let duration = self.config.default_interval_duration;
        let start = self.playback.current_time().min(total - duration).max(0.0);
        let state = self.snapshot(object)?;
        self.materialize(AnimationUnit::interval(object, start, duration, state))
    }

    /// Create an instant point at the playhead
    pub fn create_point(&mut self, object: SceneObjectId) -> Result<UnitId> {
        let start = self.playback.current_time().min(self.timeline.latest_point_start());
        let state = self.snapshot(object)?;
        self.materialize(AnimationUnit::point(object, start, state))
    }

    /// Delete a unit: tween first, then proxy, then selection
    pub fn delete_unit(&mut self, unit_id: UnitId) -> Result<AnimationUnit> {
        let object = self
            .tweens
            .find(unit_id)
            .map(AnimationUnit::scene_object_id)
            .ok_or(SyncError::MissingUnit(unit_id))?;
        self.cancel_gestures_on(|unit| unit.id() == unit_id);

        let unit = self.tweens.unregister(&mut self.backend, object, unit_id)?;
        self.timeline.destroy_proxy(unit_id);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        tracing::info!("Deleted unit {unit_id}");
        Ok(unit)
    }

    /// Make a unit the single active one and focus its object
    pub fn activate_unit(&mut self, unit_id: UnitId) -> Result<()> {
        if self.timeline.active() == Some(unit_id) {
            return Ok(());
        }
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let object = unit.scene_object_id();
        let is_interval = unit.kind() == UnitKind::Interval;

        self.timeline.activate(unit_id)?;
        if is_interval {
            self.timeline.attach_resize_handle(unit_id)?;
        } else {
            self.timeline.detach_resize_handle();
        }
        self.canvas.focus(object);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        tracing::debug!("Activated unit {unit_id}");
        Ok(())
    }

    /// Clear the active unit
    pub fn deactivate(&mut self) {
        self.timeline.deactivate();
        self.timeline.detach_resize_handle();
        self.canvas.request_redraw(RedrawLayer::Timeline);
    }

    /// Designate the endpoint that object edits are captured into
    pub fn set_capture_endpoint(&mut self, endpoint: Option<Endpoint>) {
        self.capture_endpoint = endpoint;
    }

    /// Write the active unit's object transform into an endpoint
    pub fn recapture(&mut self, endpoint: Endpoint) -> Result<UnitId> {
        let unit_id = self.timeline.active().ok_or(SyncError::NoActiveUnit)?;
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let state = self.snapshot(unit.scene_object_id())?;
        let captured = unit.with_captured(endpoint, state);

        self.tweens.replace(&mut self.backend, captured)?;
        tracing::info!("Recaptured {endpoint:?} of unit {unit_id}");
        Ok(unit_id)
    }

    /// Move a unit to a new start time
    pub fn retime(&mut self, unit_id: UnitId, start: f32) -> Result<()> {
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let latest = match unit.kind() {
            UnitKind::Interval => (self.config.total_duration - unit.duration()).max(0.0),
            UnitKind::Point => self.timeline.latest_point_start(),
        };
        let retimed = unit.with_start(start.clamp(0.0, latest));
        self.commit(retimed)
    }

    /// Give an interval a new start and duration
    pub fn reduration(&mut self, unit_id: UnitId, start: f32, duration: f32) -> Result<()> {
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        match unit.with_timing(start, duration) {
            Ok(changed) => self.commit(changed),
            Err(e) => {
                self.restore_proxy(unit_id);
                Err(e)
            }
        }
    }

    // Gestures

    /// Start dragging a proxy, abandoning any drag still in progress
    pub fn begin_drag(&mut self, unit_id: UnitId, pointer_x: f32) -> Result<()> {
        self.cancel_drag();
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let proxy = self.timeline.proxy(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        self.drag = Some(DragGesture::begin(unit, pointer_x, proxy.x));
        Ok(())
    }

    /// Follow the pointer during a drag
    pub fn drag_to(&mut self, pointer_x: f32) -> Result<()> {
        let Some(gesture) = self.drag.as_mut() else {
            return Ok(());
        };
        let abs_x = self.timeline.layout().track_start_x + gesture.proxy_x_for(pointer_x);
        self.timeline.move_proxy(gesture.unit_id, abs_x)?;
        gesture.moved = true;
        self.canvas.request_redraw(RedrawLayer::Timeline);
        Ok(())
    }

    /// Finish a drag and retime its unit
    ///
    /// Returns whether the unit changed.
    pub fn end_drag(&mut self) -> Result<bool> {
        let ended = EndedGestures {
            drag: self.drag.take(),
            resize: None,
        };
        self.end_gestures(ended)
    }

    /// Abandon a drag without committing
    pub fn cancel_drag(&mut self) {
        if let Some(gesture) = self.drag.take() {
            self.restore_proxy(gesture.unit_id);
        }
    }

    /// Start resizing an interval by one edge, abandoning any resize in progress
    pub fn begin_resize(&mut self, unit_id: UnitId, edge: ResizeEdge) -> Result<()> {
        self.cancel_resize();
        let unit = self.tweens.find(unit_id).ok_or(SyncError::MissingUnit(unit_id))?;
        let gesture = ResizeGesture::begin(unit, edge);
        self.timeline.attach_resize_handle(unit_id)?;
        self.resize = Some(gesture);
        Ok(())
    }

    /// Follow the pointer during a resize
    pub fn resize_to(&mut self, pointer_x: f32) -> Result<()> {
        let Some(gesture) = self.resize.as_mut() else {
            return Ok(());
        };
        self.timeline.resize_proxy(gesture.unit_id, gesture.edge, pointer_x)?;
        gesture.moved = true;
        self.canvas.request_redraw(RedrawLayer::Timeline);
        Ok(())
    }

    /// Apply a transformer box during a resize
    pub fn transform_to(&mut self, bounds: ProxyBox) -> Result<()> {
        let Some(gesture) = self.resize.as_mut() else {
            return Ok(());
        };
        self.timeline.apply_transform(gesture.unit_id, gesture.edge, bounds)?;
        gesture.moved = true;
        self.canvas.request_redraw(RedrawLayer::Timeline);
        Ok(())
    }

    /// Finish a resize and reduration its unit
    ///
    /// Returns whether the unit changed.
    pub fn end_resize(&mut self) -> Result<bool> {
        let ended = EndedGestures {
            drag: None,
            resize: self.resize.take(),
        };
        self.end_gestures(ended)
    }

    /// Abandon a resize without committing
    pub fn cancel_resize(&mut self) {
        if let Some(gesture) = self.resize.take() {
            self.restore_proxy(gesture.unit_id);
        }
    }

    /// Commit gestures that ended in the same tick
    ///
    /// A gesture that leaves the timing as it was commits nothing and keeps the
    /// engine tween. Returns whether a unit changed.
    pub fn end_gestures(&mut self, ended: EndedGestures) -> Result<bool> {
        let (commit, discarded) = ended.resolve();
        let committed = commit.map(|c| c.unit_id());
        if let Some(drag) = discarded.filter(|d| Some(d.unit_id) != committed) {
            self.restore_proxy(drag.unit_id);
        }
        match commit {
            Some(GestureCommit::Reduration(gesture)) => {
                let start = self.timeline.proxy_start(gesture.unit_id)?;
                let duration = self.timeline.proxy_duration(gesture.unit_id)?;
                if !gesture.reshapes(start, duration) {
                    self.restore_proxy(gesture.unit_id);
                    return Ok(false);
                }
                self.reduration(gesture.unit_id, start, duration).map(|()| true)
            }
            Some(GestureCommit::Retime(gesture)) => {
                let start = self.timeline.proxy_start(gesture.unit_id)?;
                if !gesture.retimes(start) {
                    self.restore_proxy(gesture.unit_id);
                    return Ok(false);
                }
                self.retime(gesture.unit_id, start).map(|()| true)
            }
            None => Ok(false),
        }
    }

    /// Take both in-progress gestures as if they ended now
    pub fn take_gestures(&mut self) -> EndedGestures {
        EndedGestures {
            drag: self.drag.take(),
            resize: self.resize.take(),
        }
    }

    // Viewport

    /// Record a window resize; applied by [`Self::poll_resize`]
    pub fn on_viewport_resize(&mut self, viewport: Viewport, now: Instant) {
        self.debouncer.push(viewport, now);
    }

    /// Apply the pending resize once the storm is over
    pub fn poll_resize(&mut self, now: Instant) -> Result<bool> {
        match self.debouncer.poll(now) {
            Some(viewport) => self.apply_viewport(viewport).map(|()| true),
            None => Ok(false),
        }
    }

    /// Re-layout every proxy for a new viewport and follow the ad-module origin
    pub fn apply_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.tweens.verify_pairing()?;
        self.cancel_drag();
        self.cancel_resize();

        let origin = self.config.ad_module_origin(viewport);
        let dx = origin[0] - self.origin[0];
        let dy = origin[1] - self.origin[1];
        if dx != 0.0 || dy != 0.0 {
            let moved: Vec<AnimationUnit> =
                self.tweens.all_units().map(|u| u.translated(dx, dy)).collect();
            for unit in moved {
                self.tweens.replace(&mut self.backend, unit)?;
            }
            tracing::debug!("Ad-module origin moved by ({dx}, {dy})");
        }

        let scale = self.config.time_scale(viewport);
        self.timeline.relayout(scale, self.tweens.all_units());
        self.viewport = viewport;
        self.origin = origin;
        self.canvas.request_redraw(RedrawLayer::Scene);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        tracing::info!(
            "Viewport {}x{}, track width {}px",
            viewport.width,
            viewport.height,
            scale.track_pixel_width()
        );
        Ok(())
    }

    // Playback

    /// Resume playback
    pub fn play(&mut self) {
        self.playback.play(&mut self.backend);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.playback.pause(&mut self.backend);
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        self.playback.toggle(&mut self.backend);
    }

    /// Jump to a time
    pub fn seek(&mut self, time: f32) {
        self.playback.seek(&mut self.backend, time);
        self.canvas.request_redraw(RedrawLayer::Timeline);
    }

    /// Seek to the time under a track-relative pointer x
    pub fn scrub_pointer(&mut self, x: f32) {
        let time = self.time_scale().time_from_x(x);
        self.seek(time);
    }

    /// The user grabbed the playhead
    pub fn begin_pointer_drag(&mut self) {
        self.playback.lock_pointer();
    }

    /// The user released the playhead
    pub fn end_pointer_drag(&mut self) {
        self.playback.unlock_pointer();
    }

    /// Engine tick: refresh the cursor and redraw both layers
    pub fn on_update(&mut self) -> f32 {
        let time = self.playback.on_update(&self.backend);
        self.canvas.request_redraw(RedrawLayer::Scene);
        self.canvas.request_redraw(RedrawLayer::Timeline);
        time
    }

    /// Playhead x relative to the track start
    pub fn pointer_x(&self) -> f32 {
        self.playback.pointer_x(self.time_scale())
    }

    /// Rebuild the master timeline and re-materialize every unit
    pub fn rebuild_master(&mut self) -> Result<()> {
        self.tweens.verify_pairing()?;
        self.playback.rebuild(&mut self.backend);
        let units: Vec<AnimationUnit> = self.tweens.all_units().cloned().collect();
        let count = units.len();
        for unit in units {
            self.tweens.replace(&mut self.backend, unit)?;
        }
        tracing::info!("Re-materialized {count} units");
        Ok(())
    }

    // Accessors

    /// Settings
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Applied viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current ad-module origin
    pub fn ad_module_origin(&self) -> [f32; 2] {
        self.origin
    }

    /// Scale for the applied viewport
    pub fn time_scale(&self) -> TimeScale {
        self.timeline.scale()
    }

    /// Scene object registry
    pub fn scene(&self) -> &SceneRegistry {
        &self.scene
    }

    /// Timeline visual model
    pub fn timeline(&self) -> &TimelineModel {
        &self.timeline
    }

    /// Tween registry
    pub fn tweens(&self) -> &TweenRegistry {
        &self.tweens
    }

    /// Playback state
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Animation engine
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable animation engine, for hosts that drive its clock
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Canvas
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// A unit by id
    pub fn unit(&self, unit_id: UnitId) -> Option<&AnimationUnit> {
        self.tweens.find(unit_id)
    }

    /// The active unit
    pub fn active_unit(&self) -> Option<&AnimationUnit> {
        self.timeline.active().and_then(|id| self.tweens.find(id))
    }

    /// Endpoint object edits are captured into
    pub fn capture_endpoint(&self) -> Option<Endpoint> {
        self.capture_endpoint
    }

    /// Drag in progress
    pub fn drag_gesture(&self) -> Option<&DragGesture> {
        self.drag.as_ref()
    }

    /// Resize in progress
    pub fn resize_gesture(&self) -> Option<&ResizeGesture> {
        self.resize.as_ref()
    }

    fn snapshot(&self, object: SceneObjectId) -> Result<TransformState> {
        let scene_object = self.scene.get(object).ok_or(SyncError::MissingSceneObject(object))?;
        if self.timeline.track(object).is_none() || !self.tweens.has_track(object) {
            return Err(SyncError::MissingTrack(object));
        }
        Ok(scene_object.transform(self.origin))
    }

    fn materialize(&mut self, unit: AnimationUnit) -> Result<UnitId> {
        unit.validate(self.config.total_duration)?;
        let unit_id = unit.id();
        let object = unit.scene_object_id();

        self.tweens.register(&mut self.backend, unit.clone())?;
        if let Err(e) = self.timeline.create_proxy(&unit) {
            self.tweens.unregister(&mut self.backend, object, unit_id)?;
            return Err(e);
        }
        self.canvas.request_redraw(RedrawLayer::Timeline);
        tracing::info!("Created {:?} {unit_id} at {}s", unit.kind(), unit.start());
        Ok(unit_id)
    }

    fn commit(&mut self, unit: AnimationUnit) -> Result<()> {
        let unit_id = unit.id();
        let result = unit
            .validate(self.config.total_duration)
            .and_then(|()| self.tweens.replace(&mut self.backend, unit.clone()));
        match result {
            Ok(_) => {
                self.timeline.sync_proxy(&unit)?;
                self.canvas.request_redraw(RedrawLayer::Timeline);
                tracing::debug!("Unit {unit_id} now {}s + {}s", unit.start(), unit.duration());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Edit of unit {unit_id} aborted: {e}");
                self.restore_proxy(unit_id);
                Err(e)
            }
        }
    }

    fn restore_proxy(&mut self, unit_id: UnitId) {
        if let Some(unit) = self.tweens.find(unit_id) {
            // Proxy may already be gone with its track
            let _ = self.timeline.sync_proxy(unit);
        }
    }

    fn cancel_gestures_on(&mut self, matches: impl Fn(&AnimationUnit) -> bool) {
        let hit = |id: UnitId, tweens: &TweenRegistry| tweens.find(id).is_some_and(&matches);
        if self.drag.is_some_and(|g| hit(g.unit_id, &self.tweens)) {
            self.cancel_drag();
        }
        if self.resize.is_some_and(|g| hit(g.unit_id, &self.tweens)) {
            self.cancel_resize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::canvas::MemoryCanvas;
    use std::time::Duration;

    type TestEngine = TimelineEngine<MemoryBackend, MemoryCanvas>;

    // 1110 - 71 - 39 = 1000px of track
    fn engine_with_total(total: f32) -> TestEngine {
        let config = TimelineConfig {
            total_duration: total,
            ..Default::default()
        };
        TimelineEngine::new(config, Viewport::new(1110.0, 800.0), MemoryBackend::new(), MemoryCanvas::new())
    }

    fn engine() -> TestEngine {
        engine_with_total(12.0)
    }

    fn start_x(engine: &TestEngine) -> f32 {
        engine.config().track_start_x
    }

    #[test]
    fn test_new_pins_master_timeline() {
        let engine = engine();
        assert_eq!(engine.backend().markers(), vec![12.0]);
        assert_eq!(engine.backend().duration(), 12.0);
        assert!(engine.playback().is_paused());
        assert_eq!(engine.time_scale().track_pixel_width(), 1000.0);
    }

    #[test]
    fn test_create_animation_snapshots_object() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::new(10.0, 20.0, 50.0, 50.0));
        let unit_id = engine.create_animation(a).unwrap();

        let origin = engine.ad_module_origin();
        let Some(AnimationUnit::IntervalTween(tween)) = engine.unit(unit_id) else {
            panic!("expected an interval tween");
        };
        assert_eq!(tween.start, 0.0);
        assert_eq!(tween.duration, 1.0);
        assert_eq!(tween.from_state, tween.to_state);
        assert_eq!(tween.from_state.x, 10.0 + origin[0]);
        assert_eq!(tween.from_state.y, 20.0 + origin[1]);

        let handle = engine.tweens().handle(a, unit_id).unwrap();
        assert_eq!(engine.backend().tween(handle).map(|s| s.offset), Some(0.0));
        let proxy = engine.timeline().proxy(unit_id).unwrap();
        assert_eq!((proxy.x, proxy.width), (0.0, 83.0));
    }

    #[test]
    fn test_create_at_playhead_clamps_to_end() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        engine.seek(11.5);
        let interval = engine.create_animation(a).unwrap();
        let point = engine.create_point(a).unwrap();
        assert_eq!(engine.unit(interval).map(AnimationUnit::start), Some(11.0));
        assert_eq!(engine.unit(point).map(AnimationUnit::start), Some(11.5));
        assert_eq!(engine.unit(point).map(AnimationUnit::kind), Some(UnitKind::Point));
    }

    #[test]
    fn test_create_on_missing_object_leaves_no_state() {
        let mut engine = engine();
        let ghost = SceneObjectId::new();
        assert_eq!(
            engine.create_animation(ghost).unwrap_err(),
            SyncError::MissingSceneObject(ghost)
        );
        assert_eq!(engine.backend().tween_count(), 0);
        assert_eq!(engine.timeline().proxies().count(), 0);
    }

    #[test]
    fn test_drag_scenario_retimes() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let old_handle = engine.tweens().handle(a, unit_id).unwrap();

        let x0 = start_x(&engine);
        engine.begin_drag(unit_id, x0 + 10.0).unwrap();
        engine.drag_to(x0 + 300.0).unwrap();
        engine.drag_to(x0 + 510.0).unwrap();
        engine.end_drag().unwrap();

        assert_eq!(engine.unit(unit_id).map(AnimationUnit::start), Some(6.0));
        let new_handle = engine.tweens().handle(a, unit_id).unwrap();
        assert_ne!(old_handle, new_handle);
        assert!(!engine.backend().contains(old_handle));
        assert_eq!(engine.backend().tween(new_handle).map(|s| s.offset), Some(6.0));
        assert_eq!(engine.timeline().proxy(unit_id).map(|p| p.x), Some(500.0));
    }

    #[test]
    fn test_drag_is_bounded_by_track() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();

        let x0 = start_x(&engine);
        engine.begin_drag(unit_id, x0).unwrap();
        engine.drag_to(x0 + 5000.0).unwrap();
        engine.end_drag().unwrap();

        let unit = engine.unit(unit_id).unwrap();
        assert!(unit.end() <= 12.0);
        assert!(unit.start() > 10.9);
    }

    #[test]
    fn test_cancel_drag_restores_proxy() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();

        let x0 = start_x(&engine);
        engine.begin_drag(unit_id, x0).unwrap();
        engine.drag_to(x0 + 400.0).unwrap();
        engine.cancel_drag();

        assert_eq!(engine.timeline().proxy(unit_id).map(|p| p.x), Some(0.0));
        assert_eq!(engine.unit(unit_id).map(AnimationUnit::start), Some(0.0));
        assert!(engine.drag_gesture().is_none());
    }

    #[test]
    fn test_resize_reduration() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        engine.retime(unit_id, 6.0).unwrap();

        let x0 = start_x(&engine);
        engine.begin_resize(unit_id, ResizeEdge::Right).unwrap();
        engine.resize_to(x0 + 750.0).unwrap();
        engine.end_resize().unwrap();

        let unit = engine.unit(unit_id).unwrap();
        assert_eq!(unit.start(), 6.0);
        assert_eq!(unit.duration(), 3.0);

        engine.begin_resize(unit_id, ResizeEdge::Left).unwrap();
        engine.resize_to(x0 + 250.0).unwrap();
        engine.end_resize().unwrap();
        let unit = engine.unit(unit_id).unwrap();
        assert_eq!(unit.start(), 3.0);
        assert_eq!(unit.duration(), 6.0);
    }

    #[test]
    fn test_collapsed_resize_is_rejected_and_restored() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let handle = engine.tweens().handle(a, unit_id).unwrap();

        let x0 = start_x(&engine);
        engine.begin_resize(unit_id, ResizeEdge::Right).unwrap();
        engine.resize_to(x0 - 100.0).unwrap();
        let err = engine.end_resize().unwrap_err();
        assert!(matches!(err, SyncError::InvalidGeometry { .. }));

        assert_eq!(engine.unit(unit_id).map(AnimationUnit::duration), Some(1.0));
        assert_eq!(engine.timeline().proxy(unit_id).map(|p| p.width), Some(83.0));
        assert_eq!(engine.tweens().handle(a, unit_id), Some(handle));
    }

    #[test]
    fn test_points_cannot_be_resized() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let point = engine.create_point(a).unwrap();
        assert!(engine.begin_resize(point, ResizeEdge::Right).is_err());
        assert!(engine.reduration(point, 0.0, 2.0).is_err());
        assert!(engine.resize_gesture().is_none());
    }

    #[test]
    fn test_reduration_wins_same_tick() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let x0 = start_x(&engine);

        engine.begin_drag(unit_id, x0).unwrap();
        engine.drag_to(x0 + 500.0).unwrap();
        engine.begin_resize(unit_id, ResizeEdge::Right).unwrap();
        engine.resize_to(x0 + 750.0).unwrap();

        let ended = engine.take_gestures();
        engine.end_gestures(ended).unwrap();
        let unit = engine.unit(unit_id).unwrap();
        assert_eq!(unit.start(), 6.0);
        assert_eq!(unit.duration(), 3.0);
    }

    #[test]
    fn test_single_active_unit() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let b = engine.add_scene_object("B", ObjectGeometry::default());
        let unit_a = engine.create_animation(a).unwrap();
        let unit_b = engine.create_point(b).unwrap();

        engine.activate_unit(unit_a).unwrap();
        assert_eq!(engine.canvas().focused(), Some(a));
        assert_eq!(engine.timeline().resize_handle(), Some(unit_a));

        engine.activate_unit(unit_b).unwrap();
        assert_eq!(engine.active_unit().map(AnimationUnit::id), Some(unit_b));
        assert!(!engine.timeline().proxy(unit_a).unwrap().active);
        assert_eq!(engine.canvas().focused(), Some(b));
        assert_eq!(engine.timeline().resize_handle(), None);
    }

    #[test]
    fn test_track_selection_does_not_activate() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        engine.create_animation(a).unwrap();
        engine.select_object_from_track(a).unwrap();
        assert_eq!(engine.canvas().focused(), Some(a));
        assert!(engine.active_unit().is_none());
    }

    #[test]
    fn test_edit_recaptures_active_unit() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::new(0.0, 0.0, 50.0, 50.0));
        let unit_id = engine.create_animation(a).unwrap();
        let origin = engine.ad_module_origin();

        // Not armed: plain edit
        engine.edit_object(a, ObjectGeometry::new(5.0, 0.0, 50.0, 50.0)).unwrap();
        let Some(AnimationUnit::IntervalTween(t)) = engine.unit(unit_id) else {
            panic!("expected an interval tween");
        };
        assert_eq!(t.to_state.x, origin[0]);

        engine.activate_unit(unit_id).unwrap();
        engine.set_capture_endpoint(Some(Endpoint::End));
        let mut moved = ObjectGeometry::new(100.0, 40.0, 50.0, 50.0);
        moved.rotation = 45.0;
        engine.edit_object(a, moved).unwrap();

        let Some(AnimationUnit::IntervalTween(t)) = engine.unit(unit_id) else {
            panic!("expected an interval tween");
        };
        assert_eq!(t.from_state.x, origin[0]);
        assert_eq!(t.to_state.x, 100.0 + origin[0]);
        assert_eq!(t.to_state.rotation, 45.0);
        assert_eq!(engine.canvas().find(a), Some(moved));
    }

    #[test]
    fn test_recapture_without_active_unit() {
        let mut engine = engine();
        assert_eq!(engine.recapture(Endpoint::Start).unwrap_err(), SyncError::NoActiveUnit);
    }

    #[test]
    fn test_delete_unit() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let handle = engine.tweens().handle(a, unit_id).unwrap();
        engine.activate_unit(unit_id).unwrap();

        engine.delete_unit(unit_id).unwrap();
        assert!(!engine.backend().contains(handle));
        assert!(engine.timeline().proxy(unit_id).is_none());
        assert!(engine.active_unit().is_none());
        assert_eq!(engine.delete_unit(unit_id).unwrap_err(), SyncError::MissingUnit(unit_id));
    }

    #[test]
    fn test_delete_object_cascades() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let b = engine.add_scene_object("B", ObjectGeometry::default());
        let first = engine.create_animation(a).unwrap();
        engine.create_point(a).unwrap();
        let kept = engine.create_animation(b).unwrap();
        engine.activate_unit(first).unwrap();

        let removed = engine.delete_scene_object(a).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(engine.timeline().track(a).is_none());
        assert!(!engine.tweens().has_track(a));
        assert_eq!(engine.backend().tween_count(), 1);
        assert!(engine.active_unit().is_none());
        assert_eq!(engine.timeline().track(b).map(|t| t.slot), Some(0));
        assert_eq!(engine.timeline().proxy(kept).map(|p| p.y), Some(0.0));
        assert!(engine.canvas().find(a).is_none());

        assert_eq!(engine.create_animation(a).unwrap_err(), SyncError::MissingSceneObject(a));
        engine.tweens().verify_pairing().unwrap();
    }

    #[test]
    fn test_resize_invariance() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        engine.reduration(unit_id, 6.0, 3.0).unwrap();

        // 1310 - 71 - 39 = 1200px
        engine.apply_viewport(Viewport::new(1310.0, 800.0)).unwrap();
        let scale = engine.time_scale();
        let proxy = engine.timeline().proxy(unit_id).unwrap();
        assert_eq!(scale.track_pixel_width(), 1200.0);
        assert_eq!(scale.time_from_x(proxy.x), 6.0);
        assert_eq!(scale.duration_from_width(proxy.width), 3.0);
    }

    #[test]
    fn test_origin_shift_translates_every_unit() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::new(10.0, 10.0, 50.0, 50.0));
        let interval = engine.create_animation(a).unwrap();
        let point = engine.create_point(a).unwrap();
        let before = engine.ad_module_origin();
        let old_handle = engine.tweens().handle(a, interval).unwrap();

        engine.apply_viewport(Viewport::new(1310.0, 900.0)).unwrap();
        let after = engine.ad_module_origin();
        assert_eq!(after, [before[0] + 100.0, before[1] + 50.0]);

        let Some(AnimationUnit::IntervalTween(t)) = engine.unit(interval) else {
            panic!("expected an interval tween");
        };
        assert_eq!(t.from_state.x, 10.0 + after[0]);
        assert_eq!(t.to_state.y, 10.0 + after[1]);
        let Some(AnimationUnit::InstantPoint(p)) = engine.unit(point) else {
            panic!("expected an instant point");
        };
        assert_eq!(p.state.x, 10.0 + after[0]);

        let new_handle = engine.tweens().handle(a, interval).unwrap();
        assert!(!engine.backend().contains(old_handle));
        assert_eq!(engine.backend().tween(new_handle).map(|s| s.from.x), Some(10.0 + after[0]));
    }

    #[test]
    fn test_resize_storm_is_debounced() {
        let mut engine = engine();
        let t0 = Instant::now();
        for i in 0..20u64 {
            let vp = Viewport::new(1110.0 + i as f32 * 10.0, 800.0);
            engine.on_viewport_resize(vp, t0 + Duration::from_millis(i * 5));
            assert!(!engine.poll_resize(t0 + Duration::from_millis(i * 5)).unwrap());
        }
        assert_eq!(engine.viewport(), Viewport::new(1110.0, 800.0));

        assert!(engine.poll_resize(t0 + Duration::from_secs(1)).unwrap());
        assert_eq!(engine.viewport(), Viewport::new(1300.0, 800.0));
        assert!(!engine.poll_resize(t0 + Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_playback_and_pointer() {
        let mut engine = engine();
        engine.scrub_pointer(500.0);
        assert_eq!(engine.playback().current_time(), 6.0);
        assert!(engine.playback().is_paused());

        engine.play();
        engine.backend_mut().advance(1.5);
        assert_eq!(engine.on_update(), 7.5);
        assert_eq!(engine.pointer_x(), 625.0);

        engine.begin_pointer_drag();
        engine.backend_mut().advance(1.0);
        assert_eq!(engine.on_update(), 7.5);
        engine.end_pointer_drag();

        engine.pause();
        assert!(engine.playback().is_paused());
        assert!(engine.canvas().redraws(RedrawLayer::Scene) >= 2);
    }

    #[test]
    fn test_rebuild_master_rematerializes() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        engine.retime(unit_id, 4.0).unwrap();

        engine.rebuild_master().unwrap();
        assert_eq!(engine.backend().build_count(), 2);
        assert_eq!(engine.backend().markers(), vec![12.0]);
        assert_eq!(engine.backend().tween_count(), 1);
        let handle = engine.tweens().handle(a, unit_id).unwrap();
        assert_eq!(engine.backend().tween(handle).map(|s| s.offset), Some(4.0));
    }

    #[test]
    fn test_teardown_releases_engine() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        engine.create_animation(a).unwrap();
        engine.create_point(a).unwrap();

        let (backend, canvas) = engine.teardown();
        assert_eq!(backend.tween_count(), 0);
        assert!(backend.markers().is_empty());
        assert_eq!(canvas.len(), 1);
    }

    #[test]
    fn test_pairing_after_mixed_operations() {
        let mut engine = engine_with_total(6.0);
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let b = engine.add_scene_object("B", ObjectGeometry::default());
        let mut units = Vec::new();
        for i in 0..6 {
            engine.seek(i as f32 * 0.75);
            let object = if i % 2 == 0 { a } else { b };
            units.push(engine.create_animation(object).unwrap());
            units.push(engine.create_point(object).unwrap());
        }
        engine.retime(units[0], 2.0).unwrap();
        engine.reduration(units[2], 1.0, 2.5).unwrap();
        engine.delete_unit(units[3]).unwrap();
        engine.activate_unit(units[4]).unwrap();
        engine.recapture(Endpoint::Start).unwrap();
        engine.apply_viewport(Viewport::new(1400.0, 950.0)).unwrap();
        engine.delete_scene_object(b).unwrap();

        engine.tweens().verify_pairing().unwrap();
        assert_eq!(engine.backend().tween_count(), engine.tweens().unit_count());
        assert_eq!(engine.timeline().proxies().count(), engine.tweens().unit_count());
    }

    #[test]
    fn test_new_drag_restores_abandoned_one() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let first = engine.create_animation(a).unwrap();
        engine.seek(3.0);
        let second = engine.create_animation(a).unwrap();

        let x0 = start_x(&engine);
        engine.begin_drag(first, x0).unwrap();
        engine.drag_to(x0 + 400.0).unwrap();
        // Pointer-up was lost; a new press starts on another bar
        engine.begin_drag(second, x0 + 250.0).unwrap();
        assert!(!engine.end_drag().unwrap());

        assert_eq!(engine.unit(first).map(AnimationUnit::start), Some(0.0));
        assert_eq!(engine.timeline().proxy(first).map(|p| p.x), Some(0.0));
        assert_eq!(engine.timeline().proxy(second).map(|p| p.x), Some(250.0));
    }

    #[test]
    fn test_new_resize_restores_abandoned_one() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();

        let x0 = start_x(&engine);
        engine.begin_resize(unit_id, ResizeEdge::Right).unwrap();
        engine.resize_to(x0 + 500.0).unwrap();
        engine.begin_resize(unit_id, ResizeEdge::Left).unwrap();

        assert_eq!(engine.timeline().proxy(unit_id).map(|p| p.width), Some(83.0));
        assert!(!engine.end_resize().unwrap());
        assert_eq!(engine.unit(unit_id).map(AnimationUnit::duration), Some(1.0));
    }

    #[test]
    fn test_click_release_keeps_tween() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let handle = engine.tweens().handle(a, unit_id).unwrap();
        let x0 = start_x(&engine);

        engine.begin_drag(unit_id, x0 + 10.0).unwrap();
        assert!(!engine.end_drag().unwrap());

        engine.begin_drag(unit_id, x0 + 10.0).unwrap();
        engine.drag_to(x0 + 10.0).unwrap();
        assert!(!engine.end_drag().unwrap());

        engine.begin_resize(unit_id, ResizeEdge::Right).unwrap();
        assert!(!engine.end_resize().unwrap());

        assert_eq!(engine.tweens().handle(a, unit_id), Some(handle));
        assert!(engine.backend().contains(handle));
        assert_eq!(engine.timeline().proxy(unit_id).map(|p| (p.x, p.width)), Some((0.0, 83.0)));
    }

    #[test]
    fn test_point_at_end_stays_draggable() {
        let mut engine = engine();
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        engine.seek(12.0);
        let point = engine.create_point(a).unwrap();

        // 1000px track, 8px point
        let latest = engine.timeline().latest_point_start();
        assert_eq!(latest, 11.904);
        assert_eq!(engine.unit(point).map(AnimationUnit::start), Some(latest));
        let proxy = engine.timeline().proxy(point).unwrap();
        assert!(proxy.right() <= 1000.0);

        let x0 = start_x(&engine);
        engine.begin_drag(point, x0 + proxy.x).unwrap();
        engine.drag_to(x0 + 500.0).unwrap();
        assert!(engine.end_drag().unwrap());
        assert_eq!(engine.unit(point).map(AnimationUnit::start), Some(6.0));

        engine.begin_drag(point, x0 + 500.0).unwrap();
        engine.drag_to(x0 + 5000.0).unwrap();
        assert!(engine.end_drag().unwrap());
        assert_eq!(engine.unit(point).map(AnimationUnit::start), Some(latest));

        engine.retime(point, 12.0).unwrap();
        assert_eq!(engine.unit(point).map(AnimationUnit::start), Some(latest));
    }

    #[test]
    fn test_failed_recapture_keeps_object_geometry() {
        let mut engine = engine();
        let original = ObjectGeometry::new(10.0, 10.0, 50.0, 50.0);
        let a = engine.add_scene_object("A", original);
        let unit_id = engine.create_animation(a).unwrap();
        engine.activate_unit(unit_id).unwrap();
        engine.set_capture_endpoint(Some(Endpoint::End));
        engine.tweens.forget_handle(a, unit_id);
        let scene_redraws = engine.canvas().redraws(RedrawLayer::Scene);

        let err = engine
            .edit_object(a, ObjectGeometry::new(200.0, 10.0, 50.0, 50.0))
            .unwrap_err();
        assert_eq!(err, SyncError::RegistryDesync { object: a, unit: unit_id });

        assert_eq!(engine.scene().get(a).map(|o| o.geometry), Some(original));
        assert_eq!(engine.canvas().find(a), Some(original));
        assert_eq!(engine.canvas().redraws(RedrawLayer::Scene), scene_redraws);
    }
}
