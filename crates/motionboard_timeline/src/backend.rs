// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract with the external tweening engine.
//!
//! The engine owns one master timeline. Tweens are built from a declarative
//! [`TweenSpec`] and placed at an offset; a live tween can only be removed,
//! never edited, so every parameter change goes through remove + add.

use crate::scene::SceneObjectId;
use crate::unit::{AnimationUnit, Easing, TransformState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a tween living inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineTweenHandle(pub u64);

impl fmt::Display for EngineTweenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

/// Parameters for materializing one tween
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    /// Animated scene object
    pub target: SceneObjectId,
    /// State at the offset
    pub from: TransformState,
    /// State at offset + duration
    pub to: TransformState,
    /// Tween length in seconds (zero for a set)
    pub duration: f32,
    /// Position on the master timeline in seconds
    pub offset: f32,
    /// Easing curve
    pub easing: Easing,
}

impl TweenSpec {
    /// Spec producing the given animation unit
    pub fn from_unit(unit: &AnimationUnit) -> Self {
        match unit {
            AnimationUnit::IntervalTween(t) => Self {
                target: t.scene_object_id,
                from: t.from_state,
                to: t.to_state,
                duration: t.duration,
                offset: t.start,
                easing: t.easing,
            },
            AnimationUnit::InstantPoint(p) => Self {
                target: p.scene_object_id,
                from: p.state,
                to: p.state,
                duration: 0.0,
                offset: p.start,
                easing: Easing::None,
            },
        }
    }

    /// End of the tween on the master timeline
    pub fn end(&self) -> f32 {
        self.offset + self.duration
    }
}

/// External animation engine driving the master timeline
pub trait AnimationBackend {
    /// Discard the master timeline and start a new, empty one
    fn build_master(&mut self, looping: bool);

    /// Materialize a tween on the master timeline
    fn add_tween(&mut self, spec: &TweenSpec) -> EngineTweenHandle;

    /// Remove a tween; unknown handles are ignored
    fn remove_tween(&mut self, handle: EngineTweenHandle);

    /// Insert a no-op marker at a time, extending the master duration to it
    fn add_marker(&mut self, at: f32) -> EngineTweenHandle;

    /// Resume from the current position
    fn play(&mut self);

    /// Stop advancing
    fn pause(&mut self);

    /// Jump to a time
    fn seek(&mut self, time: f32);

    /// Current master time
    fn time(&self) -> f32;

    /// Master timeline duration
    fn duration(&self) -> f32;

    /// Whether the master timeline is paused
    fn is_paused(&self) -> bool;

    /// Current position as a fraction of the duration
    fn progress(&self) -> f32 {
        let duration = self.duration();
        if duration > 0.0 {
            (self.time() / duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Entry on the in-memory master timeline
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEntry {
    /// A materialized tween
    Tween(TweenSpec),
    /// A no-op marker
    Marker(f32),
}

impl BackendEntry {
    fn end(&self) -> f32 {
        match self {
            Self::Tween(spec) => spec.end(),
            Self::Marker(at) => *at,
        }
    }
}

/// In-memory engine: keeps the master timeline as a list and advances a clock
///
/// It does not interpolate; hosts that need pixels plug in a real engine.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: IndexMap<EngineTweenHandle, BackendEntry>,
    next_handle: u64,
    time: f32,
    paused: bool,
    looping: bool,
    builds: u32,
}

impl MemoryBackend {
    /// Create an engine with no master timeline yet
    pub fn new() -> Self {
        Self {
            paused: true,
            ..Default::default()
        }
    }

    /// Advance the clock by `delta` seconds, wrapping when looping
    pub fn advance(&mut self, delta: f32) {
        if self.paused {
            return;
        }
        let duration = self.duration();
        self.time += delta;
        if duration <= 0.0 {
            self.time = 0.0;
        } else if self.time >= duration {
            if self.looping {
                self.time %= duration;
            } else {
                self.time = duration;
                self.paused = true;
            }
        }
    }

    /// Look up a live tween
    pub fn tween(&self, handle: EngineTweenHandle) -> Option<&TweenSpec> {
        match self.entries.get(&handle) {
            Some(BackendEntry::Tween(spec)) => Some(spec),
            _ => None,
        }
    }

    /// Whether a handle is live
    pub fn contains(&self, handle: EngineTweenHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Number of live tweens (markers excluded)
    pub fn tween_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, BackendEntry::Tween(_)))
            .count()
    }

    /// Times of all markers
    pub fn markers(&self) -> Vec<f32> {
        self.entries
            .values()
            .filter_map(|e| match e {
                BackendEntry::Marker(at) => Some(*at),
                BackendEntry::Tween(_) => None,
            })
            .collect()
    }

    /// How many times the master timeline was built
    pub fn build_count(&self) -> u32 {
        self.builds
    }

    /// Whether the master timeline loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn allocate(&mut self, entry: BackendEntry) -> EngineTweenHandle {
        self.next_handle += 1;
        let handle = EngineTweenHandle(self.next_handle);
        self.entries.insert(handle, entry);
        handle
    }
}

impl AnimationBackend for MemoryBackend {
    fn build_master(&mut self, looping: bool) {
        self.entries.clear();
        self.time = 0.0;
        self.paused = true;
        self.looping = looping;
        self.builds += 1;
    }

    fn add_tween(&mut self, spec: &TweenSpec) -> EngineTweenHandle {
        self.allocate(BackendEntry::Tween(spec.clone()))
    }

    fn remove_tween(&mut self, handle: EngineTweenHandle) {
        self.entries.shift_remove(&handle);
    }

    fn add_marker(&mut self, at: f32) -> EngineTweenHandle {
        self.allocate(BackendEntry::Marker(at))
    }

    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.duration().max(0.0));
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn duration(&self) -> f32 {
        self.entries.values().map(BackendEntry::end).fold(0.0, f32::max)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
