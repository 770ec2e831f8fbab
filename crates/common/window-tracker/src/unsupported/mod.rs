pub mod utils {}

use crate::{TrackerError, TrackerResult, system::WindowSystem};
use std::sync::Arc;

/// Only Windows and X11 have a backend; hosts can still supply their own
/// [`WindowSystem`] through [`WindowTracker::with_system`](crate::WindowTracker::with_system).
pub fn native_system() -> TrackerResult<Arc<dyn WindowSystem>> {
    Err(TrackerError::Unsupported)
}
