use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, non-owning reference to a top-level window.
///
/// Only valid until the next enumeration; never keep one across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Externally observable identity of a window, used as the dedup key.
///
/// Two identities are equal iff title, process name and pid all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowIdentity {
    pub title: String,
    pub process_name: String,
    pub process_id: u32,
}

impl WindowIdentity {
    pub fn new(title: impl Into<String>, process_name: impl Into<String>, process_id: u32) -> Self {
        Self {
            title: title.into(),
            process_name: process_name.into(),
            process_id,
        }
    }
}

impl fmt::Display for WindowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, pid {})",
            self.title, self.process_name, self.process_id
        )
    }
}

/// A window observed at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub identity: WindowIdentity,
    pub handle: WindowHandle,
    pub observed_at: DateTime<Utc>,
}

impl WindowSnapshot {
    pub fn new(identity: WindowIdentity, handle: WindowHandle) -> Self {
        Self {
            identity,
            handle,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    #[must_use]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn center(&self) -> (i32, i32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }
}

/// One entry of a fresh enumeration of visible windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratedWindow {
    pub identity: WindowIdentity,
    pub handle: WindowHandle,
    pub bounding_rect: WindowRect,
}

impl EnumeratedWindow {
    #[must_use]
    pub fn to_snapshot(&self) -> WindowSnapshot {
        WindowSnapshot::new(self.identity.clone(), self.handle)
    }
}
