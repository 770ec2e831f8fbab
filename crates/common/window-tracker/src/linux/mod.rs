pub mod utils;
mod x11_system;

pub use x11_system::X11System;

use crate::{TrackerResult, system::WindowSystem};
use std::sync::Arc;

pub fn native_system() -> TrackerResult<Arc<dyn WindowSystem>> {
    let system = X11System::connect().map_err(utils::qualify_x11_error)?;
    Ok(Arc::new(system))
}
