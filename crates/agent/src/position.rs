//! Position sources.
//!
//! A [`PositionSource`] stands in for the platform positioning system (GPS
//! receiver, fused provider, or a recorded trace). Sources are one-shot:
//! continuous tracking is a sampling loop owned by the tracker.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use validator::Validate;

use domain::models::PositionFix;

/// Position failure categories, mirroring the platform error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorKind {
    PermissionDenied,
    Unavailable,
    Timeout,
    Unsupported,
    Unknown,
}

/// A position-source failure with a fixed human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PositionError {
    pub kind: PositionErrorKind,
    pub message: String,
}

impl PositionError {
    pub fn permission_denied() -> Self {
        Self {
            kind: PositionErrorKind::PermissionDenied,
            message: "Permission denied. Please allow location access.".to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            kind: PositionErrorKind::Unavailable,
            message: "Position unavailable. Check your internet connection.".to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: PositionErrorKind::Timeout,
            message: "Timeout. Location request took too long.".to_string(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            kind: PositionErrorKind::Unsupported,
            message: "Geolocation is not supported".to_string(),
        }
    }

    /// Map a platform error code (1 = denied, 2 = unavailable, 3 = timeout).
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::permission_denied(),
            2 => Self::unavailable(),
            3 => Self::timeout(),
            _ => Self {
                kind: PositionErrorKind::Unknown,
                message: "Unknown geolocation error occurred.".to_string(),
            },
        }
    }
}

/// Sampling options for a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Application-level timeout for the request.
    pub timeout: Duration,
    /// Maximum age of a cached fix the caller will accept.
    pub max_age: Duration,
}

impl PositionOptions {
    /// One-shot profile: extended timeout and a generous cache window, tuned
    /// for low-bandwidth conditions.
    pub fn one_shot() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(300),
        }
    }

    /// Continuous-tracking profile.
    pub fn watch() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(20),
            max_age: Duration::from_secs(60),
        }
    }
}

/// A one-shot provider of position fixes.
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
    /// Produce the current position, or fail with a typed position error.
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<PositionFix, PositionError>;
}

/// Position source that serves a recorded queue of fixes.
///
/// Used in demo mode and tests. An exhausted queue reads as position
/// unavailable; injected errors are returned ahead of queued fixes.
#[derive(Debug, Default)]
pub struct ReplayPositionSource {
    queue: Mutex<VecDeque<QueueItem>>,
}

#[derive(Debug)]
enum QueueItem {
    Fix(PositionFix),
    Error(PositionError),
}

impl ReplayPositionSource {
    /// An empty source; every sample reads as unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A source pre-loaded with fixes, served in order.
    pub fn from_fixes(fixes: Vec<PositionFix>) -> Self {
        Self {
            queue: Mutex::new(fixes.into_iter().map(QueueItem::Fix).collect()),
        }
    }

    /// Load a recorded trace from a JSON-lines file, one fix per line.
    ///
    /// Fixes with out-of-range coordinates or negative accuracy are rejected
    /// along with malformed lines.
    pub fn from_jsonl_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut fixes = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fix: PositionFix = serde_json::from_str(&line).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            })?;
            fix.validate().map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            })?;
            fixes.push(fix);
        }
        Ok(Self::from_fixes(fixes))
    }

    /// Append a fix to the end of the queue.
    pub async fn push_fix(&self, fix: PositionFix) {
        self.queue.lock().await.push_back(QueueItem::Fix(fix));
    }

    /// Append an error; it is served when its queue position is reached.
    pub async fn push_error(&self, error: PositionError) {
        self.queue.lock().await.push_back(QueueItem::Error(error));
    }

    /// Number of queued items left.
    pub async fn remaining(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait::async_trait]
impl PositionSource for ReplayPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<PositionFix, PositionError> {
        match self.queue.lock().await.pop_front() {
            Some(QueueItem::Fix(fix)) => Ok(fix),
            Some(QueueItem::Error(error)) => Err(error),
            None => Err(PositionError::unavailable()),
        }
    }
}
