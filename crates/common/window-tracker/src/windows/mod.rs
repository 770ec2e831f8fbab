pub mod utils;
mod win32_system;

pub use win32_system::Win32System;

use crate::{TrackerResult, system::WindowSystem};
use std::sync::Arc;

pub fn native_system() -> TrackerResult<Arc<dyn WindowSystem>> {
    Ok(Arc::new(Win32System::new()?))
}
