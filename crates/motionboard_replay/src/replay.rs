// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drives a timeline engine through a script.
//!
//! A failing step is recorded as an error notice and the replay moves on.

use crate::error::{ReplayError, Result};
use crate::script::Step;
use motionboard_timeline::{
    MemoryBackend, MemoryCanvas, Notice, ObjectGeometry, SceneObjectId, TimelineConfig, TimelineEngine,
    UnitId, Viewport,
};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Engine used for replays
pub type ReplayEngine = TimelineEngine<MemoryBackend, MemoryCanvas>;

/// What happened at one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Position in the script
    pub index: usize,
    /// Action name
    pub action: &'static str,
    /// Notice shown to the user, if any
    pub notice: Option<Notice>,
}

/// Replays steps against an in-memory engine
pub struct Replayer {
    engine: ReplayEngine,
    objects: Vec<(String, SceneObjectId)>,
    units: Vec<(String, UnitId)>,
    epoch: Instant,
    elapsed: Duration,
    outcomes: Vec<StepOutcome>,
}

impl Replayer {
    /// Create a replayer over a fresh engine
    pub fn new(config: TimelineConfig, viewport: Viewport) -> Self {
        Self {
            engine: TimelineEngine::new(config, viewport, MemoryBackend::new(), MemoryCanvas::new()),
            objects: Vec::new(),
            units: Vec::new(),
            epoch: Instant::now(),
            elapsed: Duration::ZERO,
            outcomes: Vec::new(),
        }
    }

    /// Run every step in order
    pub fn run(&mut self, steps: &[Step]) {
        for (index, step) in steps.iter().enumerate() {
            self.step(index, step);
        }
    }

    /// Run one step and record its outcome
    pub fn step(&mut self, index: usize, step: &Step) {
        let notice = match self.execute(step) {
            Ok(Some(title)) => Some(Notice::success(title)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Step {index} ({}) failed: {e}", step.name());
                Some(Notice::error(e.to_string()))
            }
        };
        if let Some(notice) = &notice {
            tracing::debug!("Step {index} ({}): {}", step.name(), notice.title);
        }
        self.outcomes.push(StepOutcome {
            index,
            action: step.name(),
            notice,
        });
    }

    /// Engine being driven
    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    /// Named objects in creation order
    pub fn objects(&self) -> &[(String, SceneObjectId)] {
        &self.objects
    }

    /// Named units in creation order
    pub fn units(&self) -> &[(String, UnitId)] {
        &self.units
    }

    /// Recorded outcomes
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    fn execute(&mut self, step: &Step) -> Result<Option<&'static str>> {
        let track_start = self.engine.config().track_start_x;
        match step {
            Step::AddObject {
                name,
                label,
                x,
                y,
                width,
                height,
            } => {
                if self.objects.iter().any(|(n, _)| n == name) {
                    return Err(ReplayError::DuplicateName(name.clone()));
                }
                let label = label.clone().unwrap_or_else(|| name.clone());
                let id = self
                    .engine
                    .add_scene_object(label, ObjectGeometry::new(*x, *y, *width, *height));
                self.objects.push((name.clone(), id));
                Ok(None)
            }
            Step::CreateAnimation { object, name } => {
                self.check_unit_name(name)?;
                let id = self.object(object)?;
                let unit_id = self.engine.create_animation(id)?;
                self.units.push((name.clone(), unit_id));
                Ok(Some(Notice::CREATED))
            }
            Step::CreatePoint { object, name } => {
                self.check_unit_name(name)?;
                let id = self.object(object)?;
                let unit_id = self.engine.create_point(id)?;
                self.units.push((name.clone(), unit_id));
                Ok(Some(Notice::CREATED))
            }
            Step::Activate { unit } => {
                let unit_id = self.unit(unit)?;
                self.engine.activate_unit(unit_id)?;
                Ok(None)
            }
            Step::Drag { unit, to_x } => {
                let unit_id = self.unit(unit)?;
                let from_x = self
                    .engine
                    .timeline()
                    .proxy(unit_id)
                    .map(|p| p.x)
                    .unwrap_or_default();
                self.engine.activate_unit(unit_id)?;
                self.engine.begin_drag(unit_id, track_start + from_x)?;
                if let Err(e) = self.engine.drag_to(track_start + to_x) {
                    self.engine.cancel_drag();
                    return Err(e.into());
                }
                let changed = self.engine.end_drag()?;
                Ok(changed.then_some(Notice::UPDATED))
            }
            Step::Resize { unit, edge, to_x } => {
                let unit_id = self.unit(unit)?;
                self.engine.activate_unit(unit_id)?;
                self.engine.begin_resize(unit_id, *edge)?;
                if let Err(e) = self.engine.resize_to(track_start + to_x) {
                    self.engine.cancel_resize();
                    return Err(e.into());
                }
                let changed = self.engine.end_resize()?;
                Ok(changed.then_some(Notice::UPDATED))
            }
            Step::EditObject {
                object,
                x,
                y,
                width,
                height,
                scale_x,
                scale_y,
                rotation,
                opacity,
            } => {
                let id = self.object(object)?;
                let mut geometry = self
                    .engine
                    .scene()
                    .get(id)
                    .map(|o| o.geometry)
                    .ok_or_else(|| ReplayError::UnknownObject(object.clone()))?;
                let fields = [
                    (&mut geometry.x, x),
                    (&mut geometry.y, y),
                    (&mut geometry.width, width),
                    (&mut geometry.height, height),
                    (&mut geometry.scale_x, scale_x),
                    (&mut geometry.scale_y, scale_y),
                    (&mut geometry.rotation, rotation),
                    (&mut geometry.opacity, opacity),
                ];
                for (field, value) in fields {
                    if let Some(value) = value {
                        *field = *value;
                    }
                }
                let armed = self.engine.capture_endpoint().is_some()
                    && self
                        .engine
                        .active_unit()
                        .is_some_and(|u| u.scene_object_id() == id);
                self.engine.edit_object(id, geometry)?;
                Ok(armed.then_some(Notice::UPDATED))
            }
            Step::SetCaptureEndpoint(endpoint) => {
                self.engine.set_capture_endpoint(*endpoint);
                Ok(None)
            }
            Step::DeleteUnit { unit } => {
                let unit_id = self.unit(unit)?;
                self.engine.delete_unit(unit_id)?;
                Ok(Some(Notice::DELETED))
            }
            Step::DeleteObject { object } => {
                let id = self.object(object)?;
                let removed = self.engine.delete_scene_object(id)?;
                Ok((!removed.is_empty()).then_some(Notice::DELETED))
            }
            Step::ResizeViewport { width, height } => {
                self.elapsed += Duration::from_millis(1);
                let now = self.now();
                self.engine.on_viewport_resize(Viewport::new(*width, *height), now);
                Ok(None)
            }
            Step::Settle => {
                self.elapsed += self.engine.config().resize_debounce();
                let now = self.now();
                self.engine.poll_resize(now)?;
                Ok(None)
            }
            Step::Play => {
                self.engine.play();
                Ok(None)
            }
            Step::Pause => {
                self.engine.pause();
                Ok(None)
            }
            Step::Seek(time) => {
                self.engine.seek(*time);
                Ok(None)
            }
            Step::Tick(seconds) => {
                self.elapsed += Duration::try_from_secs_f32(*seconds).unwrap_or_default();
                self.engine.backend_mut().advance(*seconds);
                self.engine.on_update();
                let now = self.now();
                self.engine.poll_resize(now)?;
                Ok(None)
            }
        }
    }

    fn now(&self) -> Instant {
        self.epoch + self.elapsed
    }

    fn object(&self, name: &str) -> Result<SceneObjectId> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| ReplayError::UnknownObject(name.to_string()))
    }

    fn unit(&self, name: &str) -> Result<UnitId> {
        self.units
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| ReplayError::UnknownUnit(name.to_string()))
    }

    fn check_unit_name(&self, name: &str) -> Result<()> {
        if self.units.iter().any(|(n, _)| n == name) {
            return Err(ReplayError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use motionboard_timeline::{AnimationUnit, NoticeLevel};

    fn replay(source: &str) -> Replayer {
        let script = Script::from_ron(source).unwrap();
        let config = TimelineConfig {
            total_duration: 12.0,
            ..Default::default()
        };
        let mut replayer = Replayer::new(config, script.viewport);
        replayer.run(&script.steps);
        replayer
    }

    fn unit<'a>(replayer: &'a Replayer, name: &str) -> &'a AnimationUnit {
        let id = replayer.unit(name).unwrap();
        replayer.engine().unit(id).unwrap()
    }

    #[test]
    fn test_drag_scenario() {
        let replayer = replay(
            r#"(
                viewport: (width: 1110.0, height: 800.0),
                steps: [
                    AddObject(name: "A"),
                    CreateAnimation(object: "A", name: "move"),
                    Drag(unit: "move", to_x: 500.0),
                ],
            )"#,
        );
        assert_eq!(unit(&replayer, "move").start(), 6.0);
        let titles: Vec<_> = replayer
            .outcomes()
            .iter()
            .filter_map(|o| o.notice.as_ref().map(|n| n.title.as_str()))
            .collect();
        assert_eq!(titles, vec!["Animation created", "Animation updated"]);
    }

    #[test]
    fn test_failures_do_not_abort() {
        let replayer = replay(
            r#"(
                viewport: (width: 1110.0, height: 800.0),
                steps: [
                    AddObject(name: "A"),
                    DeleteUnit(unit: "ghost"),
                    CreatePoint(object: "B", name: "p"),
                    CreateAnimation(object: "A", name: "bar"),
                    Resize(unit: "bar", edge: Right, to_x: -50.0),
                    DeleteObject(object: "A"),
                    CreateAnimation(object: "A", name: "late"),
                ],
            )"#,
        );
        let levels: Vec<_> = replayer
            .outcomes()
            .iter()
            .map(|o| o.notice.as_ref().map(|n| n.level))
            .collect();
        assert_eq!(
            levels,
            vec![
                None,
                Some(NoticeLevel::Error),
                Some(NoticeLevel::Error),
                Some(NoticeLevel::Success),
                Some(NoticeLevel::Error),
                Some(NoticeLevel::Success),
                Some(NoticeLevel::Error),
            ]
        );
        assert_eq!(replayer.engine().backend().tween_count(), 0);
    }

    #[test]
    fn test_resize_applies_after_settle() {
        let replayer = replay(
            r#"(
                viewport: (width: 1110.0, height: 800.0),
                steps: [
                    AddObject(name: "A"),
                    CreateAnimation(object: "A", name: "bar"),
                    Resize(unit: "bar", edge: Right, to_x: 250.0),
                    Drag(unit: "bar", to_x: 500.0),
                    ResizeViewport(width: 1200.0, height: 800.0),
                    ResizeViewport(width: 1310.0, height: 800.0),
                ],
            )"#,
        );
        assert_eq!(replayer.engine().viewport(), Viewport::new(1110.0, 800.0));

        let mut replayer = replayer;
        replayer.step(6, &Step::Settle);
        assert_eq!(replayer.engine().viewport(), Viewport::new(1310.0, 800.0));
        let id = replayer.unit("bar").unwrap();
        let proxy = replayer.engine().timeline().proxy(id).unwrap();
        assert_eq!((proxy.x, proxy.width), (600.0, 300.0));
        assert_eq!(unit(&replayer, "bar").duration(), 3.0);
    }

    #[test]
    fn test_edit_recaptures_when_armed() {
        let replayer = replay(
            r#"(
                steps: [
                    AddObject(name: "A"),
                    CreateAnimation(object: "A", name: "spin"),
                    Activate(unit: "spin"),
                    SetCaptureEndpoint(Some(End)),
                    EditObject(object: "A", rotation: Some(180.0)),
                ],
            )"#,
        );
        let AnimationUnit::IntervalTween(t) = unit(&replayer, "spin") else {
            panic!("expected an interval tween");
        };
        assert_eq!(t.from_state.rotation, 0.0);
        assert_eq!(t.to_state.rotation, 180.0);
        assert_eq!(
            replayer.outcomes().last().and_then(|o| o.notice.clone()),
            Some(Notice::success(Notice::UPDATED))
        );
    }

    #[test]
    fn test_playback_steps() {
        let replayer = replay(
            r#"(
                steps: [
                    Seek(2.0),
                    Play,
                    Tick(1.5),
                    Pause,
                    Tick(1.0),
                ],
            )"#,
        );
        assert_eq!(replayer.engine().playback().current_time(), 3.5);
        assert!(replayer.engine().playback().is_paused());
    }
}
