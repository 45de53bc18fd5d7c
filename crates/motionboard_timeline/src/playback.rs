// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback controller for the master timeline.

use crate::backend::{AnimationBackend, EngineTweenHandle};
use crate::units::TimeScale;
use serde::{Deserialize, Serialize};

/// Play/pause/seek over the looping master timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackController {
    paused: bool,
    current_time: f32,
    total_duration: f32,
    #[serde(skip)]
    marker: Option<EngineTweenHandle>,
    pointer_locked: bool,
}

impl PlaybackController {
    /// Create a paused controller at time zero
    pub fn new(total_duration: f32) -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            total_duration,
            marker: None,
            pointer_locked: false,
        }
    }

    /// Build the master timeline and pin its length with the end marker
    ///
    /// Must run on every reconstruction: the engine sizes an unpinned timeline
    /// to its latest tween. Tweens are re-added by the caller afterwards.
    pub fn rebuild(&mut self, backend: &mut dyn AnimationBackend) {
        backend.build_master(true);
        self.marker = Some(backend.add_marker(self.total_duration));
        backend.seek(self.current_time);
        if self.paused {
            backend.pause();
        } else {
            backend.play();
        }
        tracing::info!("Master timeline built, pinned at {}s", self.total_duration);
    }

    /// Resume from the current position
    pub fn play(&mut self, backend: &mut dyn AnimationBackend) {
        backend.play();
        self.paused = false;
    }

    /// Stop advancing
    pub fn pause(&mut self, backend: &mut dyn AnimationBackend) {
        backend.pause();
        self.paused = true;
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, backend: &mut dyn AnimationBackend) {
        if self.paused {
            self.play(backend);
        } else {
            self.pause(backend);
        }
    }

    /// Jump to a time without changing the paused state
    pub fn seek(&mut self, backend: &mut dyn AnimationBackend, time: f32) {
        let time = time.clamp(0.0, self.total_duration);
        backend.seek(time);
        self.current_time = time;
    }

    /// Engine tick: refresh the cursor from the engine
    ///
    /// The cursor stays put while the user holds the playhead.
    pub fn on_update(&mut self, backend: &dyn AnimationBackend) -> f32 {
        if !self.pointer_locked {
            self.current_time = backend.time();
        }
        self.current_time
    }

    /// Playhead x relative to the track start
    pub fn pointer_x(&self, scale: TimeScale) -> f32 {
        scale.x_from_time(self.current_time)
    }

    /// Hold the playhead under the pointer
    pub fn lock_pointer(&mut self) {
        self.pointer_locked = true;
    }

    /// Release the playhead
    pub fn unlock_pointer(&mut self) {
        self.pointer_locked = false;
    }

    /// Whether the playhead is held
    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Remove the end marker and stop
    pub fn teardown(&mut self, backend: &mut dyn AnimationBackend) {
        if let Some(marker) = self.marker.take() {
            backend.remove_tween(marker);
        }
        self.pause(backend);
    }

    /// Is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current cursor in seconds
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Fixed total duration
    pub fn total_duration(&self) -> f32 {
        self.total_duration
    }

    /// Handle of the end marker
    pub fn marker(&self) -> Option<EngineTweenHandle> {
        self.marker
    }
}
