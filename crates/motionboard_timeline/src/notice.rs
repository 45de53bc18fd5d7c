// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured outcomes for the host to show as toasts.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    /// Operation went through
    Success,
    /// Operation was aborted
    Error,
}

/// One human-readable notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Message
    pub title: String,
}

impl Notice {
    /// Message after a successful create
    pub const CREATED: &'static str = "Animation created";
    /// Message after a successful edit
    pub const UPDATED: &'static str = "Animation updated";
    /// Message after a successful delete
    pub const DELETED: &'static str = "Animation deleted";

    /// Success notice
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
        }
    }

    /// Error notice
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
        }
    }

    /// Exactly one notice for an outcome
    pub fn from_result<T>(result: &Result<T>, success_title: &str) -> Self {
        match result {
            Ok(_) => Self::success(success_title),
            Err(e) => Self::error(e.to_string()),
        }
    }

    /// Notice for an edit that may have left the unit as it was
    ///
    /// `Ok(false)` reports nothing.
    pub fn from_change(result: &Result<bool>, success_title: &str) -> Option<Self> {
        match result {
            Ok(false) => None,
            _ => Some(Self::from_result(result, success_title)),
        }
    }

    /// Whether this reports a failure
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
