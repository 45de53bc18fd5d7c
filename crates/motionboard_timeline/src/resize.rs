// SPDX-License-Identifier: MIT OR Apache-2.0
//! Coalescing of window-resize storms.

use crate::config::Viewport;
use std::time::{Duration, Instant};

/// Keeps the latest viewport until the window has been quiet long enough
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<(Viewport, Instant)>,
}

impl ResizeDebouncer {
    /// Create a debouncer with a quiet period
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a resize event, replacing any pending one
    pub fn push(&mut self, viewport: Viewport, now: Instant) {
        self.pending = Some((viewport, now));
    }

    /// Take the latest viewport once no event arrived for the quiet period
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        match self.pending {
            Some((viewport, at)) if now.saturating_duration_since(at) >= self.window => {
                self.pending = None;
                Some(viewport)
            }
            _ => None,
        }
    }

    /// Whether a resize is waiting
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
