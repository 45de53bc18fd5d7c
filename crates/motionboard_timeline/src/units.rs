// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion between timeline pixels and animation seconds.
//!
//! Times are rounded to milliseconds and pixels to whole pixels so that
//! repeated pixel -> time -> pixel round-trips settle instead of drifting.
//! A [`TimeScale`] is only valid for the track width it was built with; build
//! a fresh one whenever the viewport changes.

use serde::{Deserialize, Serialize};

/// Rounding resolution for seconds (1 ms)
pub const TIME_RESOLUTION: f32 = 1000.0;

/// Rounding resolution for pixels (1 px)
pub const PIXEL_RESOLUTION: f32 = 1.0;

/// Round `value` to `1 / resolution`
pub fn round_to(value: f32, resolution: f32) -> f32 {
    (value * resolution).round() / resolution
}

/// Pixel/time mapping for one track width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    track_pixel_width: f32,
    total_duration: f32,
}

impl TimeScale {
    /// Create a scale for a track width and total duration
    pub fn new(track_pixel_width: f32, total_duration: f32) -> Self {
        Self {
            track_pixel_width: track_pixel_width.max(1.0),
            total_duration: total_duration.max(f32::EPSILON),
        }
    }

    /// Horizontal pixels usable for the time axis
    pub fn track_pixel_width(&self) -> f32 {
        self.track_pixel_width
    }

    /// Total duration in seconds
    pub fn total_duration(&self) -> f32 {
        self.total_duration
    }

    /// Time at a track-relative x position
    pub fn time_from_x(&self, x: f32) -> f32 {
        let time = round_to(x / self.track_pixel_width * self.total_duration, TIME_RESOLUTION);
        time.clamp(0.0, self.total_duration)
    }

    /// Track-relative x position of a time
    pub fn x_from_time(&self, time: f32) -> f32 {
        let x = round_to(time / self.total_duration * self.track_pixel_width, PIXEL_RESOLUTION);
        x.clamp(0.0, self.track_pixel_width)
    }

    /// Duration covered by a bar width
    pub fn duration_from_width(&self, width: f32) -> f32 {
        round_to(width / self.track_pixel_width * self.total_duration, TIME_RESOLUTION).max(0.0)
    }

    /// Bar width covering a duration
    pub fn width_from_duration(&self, duration: f32) -> f32 {
        round_to(duration / self.total_duration * self.track_pixel_width, PIXEL_RESOLUTION).max(0.0)
    }
}
