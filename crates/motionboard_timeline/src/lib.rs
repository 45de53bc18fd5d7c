// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline/animation synchronization for the Motionboard editor.
//!
//! This crate keeps three representations of an animation consistent:
//! - Scene objects and their live transform
//! - Timeline proxies (bars and points on per-object tracks)
//! - Tweens materialized in an external animation engine
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A pixel/time scale recomputed on every viewport change
//! - A tween registry that pairs engine handles with the parameters behind them
//! - Replace-only tween updates, since engines cannot edit a live tween
//! - Explicit gesture state passed through begin/move/end calls
//! - A looping master timeline pinned to a fixed length by an end marker

pub mod backend;
pub mod canvas;
pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod notice;
pub mod playback;
pub mod registry;
pub mod resize;
pub mod scene;
pub mod track;
pub mod ui;
pub mod unit;
pub mod units;

pub use backend::{AnimationBackend, BackendEntry, EngineTweenHandle, MemoryBackend, TweenSpec};
pub use canvas::{MemoryCanvas, RedrawLayer, SceneCanvas};
pub use config::{AdModuleConfig, TimelineConfig, Viewport};
pub use engine::TimelineEngine;
pub use error::{Result, SyncError};
pub use gesture::{DragGesture, EndedGestures, GestureCommit, ResizeEdge, ResizeGesture};
pub use notice::{Notice, NoticeLevel};
pub use playback::PlaybackController;
pub use registry::TweenRegistry;
pub use resize::ResizeDebouncer;
pub use scene::{ObjectGeometry, SceneObject, SceneObjectId, SceneRegistry};
pub use track::{ProxyBox, TimelineModel, TimelineTrack, TrackLayout, VisualUnitProxy};
pub use ui::{TimelineView, ViewAction};
pub use unit::{AnimationUnit, Easing, Endpoint, InstantPoint, IntervalTween, TransformState, UnitId, UnitKind};
pub use units::{round_to, TimeScale, PIXEL_RESOLUTION, TIME_RESOLUTION};
