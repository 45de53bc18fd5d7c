// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON summary of the timeline after a replay.

use crate::error::Result;
use crate::replay::{Replayer, StepOutcome};
use motionboard_timeline::{AnimationUnit, SceneObject, TimelineTrack, Viewport, VisualUnitProxy};
use serde::Serialize;

/// Playback state at the end of the replay
#[derive(Debug, Serialize)]
pub struct PlaybackReport {
    /// Cursor in seconds
    pub current_time: f32,
    /// Fixed total duration
    pub total_duration: f32,
    /// Paused
    pub paused: bool,
    /// Playhead x relative to the track start
    pub pointer_x: f32,
}

/// A scene object with its script name
#[derive(Debug, Serialize)]
pub struct ObjectReport {
    /// Script name
    pub name: String,
    /// Object state
    pub object: SceneObject,
}

/// A unit with its script name and proxy
#[derive(Debug, Serialize)]
pub struct UnitReport {
    /// Script name
    pub name: String,
    /// Declarative parameters
    pub unit: AnimationUnit,
    /// Timeline geometry
    pub proxy: Option<VisualUnitProxy>,
}

/// Final timeline state
#[derive(Debug, Serialize)]
pub struct Report {
    /// Applied viewport
    pub viewport: Viewport,
    /// Ad-module origin
    pub ad_module_origin: [f32; 2],
    /// Pixels of the time axis
    pub track_pixel_width: f32,
    /// Playback
    pub playback: PlaybackReport,
    /// Live scene objects
    pub objects: Vec<ObjectReport>,
    /// Tracks in slot order
    pub tracks: Vec<TimelineTrack>,
    /// Live units
    pub units: Vec<UnitReport>,
    /// Per-step outcomes
    pub outcomes: Vec<StepOutcome>,
}

impl Report {
    /// Collect the state of a replayer
    pub fn collect(replayer: &Replayer) -> Self {
        let engine = replayer.engine();
        let objects = replayer
            .objects()
            .iter()
            .filter_map(|(name, id)| {
                engine.scene().get(*id).map(|object| ObjectReport {
                    name: name.clone(),
                    object: object.clone(),
                })
            })
            .collect();
        let units = replayer
            .units()
            .iter()
            .filter_map(|(name, id)| {
                engine.unit(*id).map(|unit| UnitReport {
                    name: name.clone(),
                    unit: unit.clone(),
                    proxy: engine.timeline().proxy(*id).cloned(),
                })
            })
            .collect();

        Self {
            viewport: engine.viewport(),
            ad_module_origin: engine.ad_module_origin(),
            track_pixel_width: engine.time_scale().track_pixel_width(),
            playback: PlaybackReport {
                current_time: engine.playback().current_time(),
                total_duration: engine.playback().total_duration(),
                paused: engine.playback().is_paused(),
                pointer_x: engine.pointer_x(),
            },
            objects,
            tracks: engine.timeline().tracks().cloned().collect(),
            units,
            outcomes: replayer.outcomes().to_vec(),
        }
    }

    /// Number of failed steps
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.notice.as_ref().is_some_and(|n| n.is_error()))
            .count()
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
