// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay scripts: a viewport and a list of editor actions, stored as RON.
//!
//! Objects and units are referred to by script-local names. Pointer positions
//! are track-relative pixels.

use crate::error::Result;
use motionboard_timeline::{Endpoint, ResizeEdge, Viewport};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_size() -> f32 {
    100.0
}

/// One editor action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Place a scene object
    AddObject {
        /// Script name
        name: String,
        /// Display label (defaults to the name)
        #[serde(default)]
        label: Option<String>,
        /// X relative to the ad-module origin
        #[serde(default)]
        x: f32,
        /// Y relative to the ad-module origin
        #[serde(default)]
        y: f32,
        /// Width
        #[serde(default = "default_size")]
        width: f32,
        /// Height
        #[serde(default = "default_size")]
        height: f32,
    },
    /// Create an interval tween at the playhead
    CreateAnimation {
        /// Target object
        object: String,
        /// Script name of the new unit
        name: String,
    },
    /// Create an instant point at the playhead
    CreatePoint {
        /// Target object
        object: String,
        /// Script name of the new unit
        name: String,
    },
    /// Click a unit
    Activate {
        /// Unit name
        unit: String,
    },
    /// Drag a unit so its left edge lands on `to_x`
    Drag {
        /// Unit name
        unit: String,
        /// Target left edge
        to_x: f32,
    },
    /// Drag one edge of an interval to `to_x`
    Resize {
        /// Unit name
        unit: String,
        /// Dragged edge
        edge: ResizeEdge,
        /// Target edge position
        to_x: f32,
    },
    /// Change an object's geometry; unset fields keep their value
    EditObject {
        /// Object name
        object: String,
        /// New x
        #[serde(default)]
        x: Option<f32>,
        /// New y
        #[serde(default)]
        y: Option<f32>,
        /// New width
        #[serde(default)]
        width: Option<f32>,
        /// New height
        #[serde(default)]
        height: Option<f32>,
        /// New horizontal scale
        #[serde(default)]
        scale_x: Option<f32>,
        /// New vertical scale
        #[serde(default)]
        scale_y: Option<f32>,
        /// New rotation
        #[serde(default)]
        rotation: Option<f32>,
        /// New opacity
        #[serde(default)]
        opacity: Option<f32>,
    },
    /// Arm (or disarm) recapture on object edits
    SetCaptureEndpoint(Option<Endpoint>),
    /// Delete a unit
    DeleteUnit {
        /// Unit name
        unit: String,
    },
    /// Delete an object and its units
    DeleteObject {
        /// Object name
        object: String,
    },
    /// Window resize event (debounced)
    ResizeViewport {
        /// New width
        width: f32,
        /// New height
        height: f32,
    },
    /// Let the resize debounce window pass
    Settle,
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Jump to a time
    Seek(f32),
    /// Advance the engine clock by seconds
    Tick(f32),
}

impl Step {
    /// Action name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddObject { .. } => "AddObject",
            Self::CreateAnimation { .. } => "CreateAnimation",
            Self::CreatePoint { .. } => "CreatePoint",
            Self::Activate { .. } => "Activate",
            Self::Drag { .. } => "Drag",
            Self::Resize { .. } => "Resize",
            Self::EditObject { .. } => "EditObject",
            Self::SetCaptureEndpoint(_) => "SetCaptureEndpoint",
            Self::DeleteUnit { .. } => "DeleteUnit",
            Self::DeleteObject { .. } => "DeleteObject",
            Self::ResizeViewport { .. } => "ResizeViewport",
            Self::Settle => "Settle",
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Seek(_) => "Seek",
            Self::Tick(_) => "Tick",
        }
    }
}

/// A recorded editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Initial window size
    #[serde(default)]
    pub viewport: Viewport,
    /// Actions in order
    pub steps: Vec<Step>,
}

impl Script {
    /// Load a script from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse a script from a RON string
    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }
}
