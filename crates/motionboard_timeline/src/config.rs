// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline configuration.
//!
//! Layout constants for the timeline strip, the fixed total duration and the
//! ad-module rectangle. Settings are stored as RON.

use crate::error::{Result, SyncError};
use crate::units::TimeScale;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Host window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Window width
    pub width: f32,
    /// Window height
    pub height: f32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Reference rectangle that all scene object coordinates are offset by
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdModuleConfig {
    /// Rectangle width
    pub width: f32,
    /// Rectangle height
    pub height: f32,
}

impl Default for AdModuleConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 320.0,
        }
    }
}

/// Timeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Fixed total length of the master timeline in seconds
    pub total_duration: f32,
    /// Duration given to a newly created interval tween
    pub default_interval_duration: f32,
    /// X where the time axis starts (after the thumbnail column)
    pub track_start_x: f32,
    /// Horizontal pixels consumed by paddings and the playhead tick
    pub track_width_subtraction: f32,
    /// Height of one track row
    pub track_height: f32,
    /// Vertical gap between track rows
    pub track_gap_y: f32,
    /// Fixed width of an instant point proxy
    pub point_width: f32,
    /// Pixels taken from the viewport by chrome around the main canvas (x, y)
    pub canvas_inset: [f32; 2],
    /// Ad-module rectangle
    pub ad_module: AdModuleConfig,
    /// Quiet period before a window resize is applied
    pub resize_debounce_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            total_duration: 6.0,
            default_interval_duration: 1.0,
            track_start_x: 39.0,
            track_width_subtraction: 71.0,
            track_height: 24.0,
            track_gap_y: 4.0,
            point_width: 8.0,
            canvas_inset: [72.0, 216.0],
            ad_module: AdModuleConfig::default(),
            resize_debounce_ms: 150,
        }
    }
}

impl TimelineConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ron(&content)
    }

    /// Parse settings from a RON string
    pub fn from_ron(content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| SyncError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
    }

    /// Horizontal pixels usable for the time axis
    pub fn track_pixel_width(&self, viewport: Viewport) -> f32 {
        (viewport.width - self.track_width_subtraction - self.track_start_x).max(1.0)
    }

    /// Unit conversion for the given viewport
    pub fn time_scale(&self, viewport: Viewport) -> TimeScale {
        TimeScale::new(self.track_pixel_width(viewport), self.total_duration)
    }

    /// Size of the main canvas for the given viewport
    pub fn canvas_size(&self, viewport: Viewport) -> [f32; 2] {
        [
            (viewport.width - self.canvas_inset[0]).max(0.0),
            (viewport.height - self.canvas_inset[1]).max(0.0),
        ]
    }

    /// Ad-module origin: the rectangle centered in the main canvas
    pub fn ad_module_origin(&self, viewport: Viewport) -> [f32; 2] {
        let [w, h] = self.canvas_size(viewport);
        [
            w / 2.0 - self.ad_module.width / 2.0,
            h / 2.0 - self.ad_module.height / 2.0,
        ]
    }

    /// Resize debounce window
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Vertical pixel offset of a track slot
    pub fn slot_y(&self, slot: usize) -> f32 {
        slot as f32 * (self.track_height + self.track_gap_y)
    }
}
