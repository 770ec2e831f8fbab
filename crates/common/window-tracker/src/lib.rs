pub use window_tracker_core::*;

pub mod activity;
pub mod bootstrap;
pub mod engine;
pub mod observer;
pub mod strategies;
pub mod system;
mod tracker;

pub use activity::{CpuTimeActivity, ProcessActivity, sample_system_load};
pub use bootstrap::{BootstrapPipeline, BootstrapProbe, BootstrapReport};
pub use engine::ActivationEngine;
pub use observer::WindowObserver;
pub use strategies::{ActivationStrategy, default_strategies};
pub use system::{ModifierKey, MouseButton, WindowSystem};
pub use tracker::*;

#[cfg(target_os = "linux")]
#[path = "linux/mod.rs"]
mod platform;

#[cfg(target_os = "windows")]
#[path = "windows/mod.rs"]
mod platform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
#[path = "unsupported/mod.rs"]
mod platform;

// For platform specific util API's
pub use platform::utils;

#[cfg(target_os = "linux")]
pub use platform::X11System;

#[cfg(target_os = "windows")]
pub use platform::Win32System;

/// The window system of the running desktop session.
///
/// # Errors
///
/// [`TrackerError::NoDisplay`], [`TrackerError::NotInteractiveSession`] or
/// [`TrackerError::Unsupported`] when there is nothing to drive.
pub fn native_system() -> TrackerResult<std::sync::Arc<dyn WindowSystem>> {
    platform::native_system()
}
