use crate::{TrackerError, TrackerResult};
use std::env::var_os;
use std::path::Path;
use std::time::{Duration, Instant};

/// Whether the session runs under Wayland, from `XDG_SESSION_TYPE` or a
/// non-empty `WAYLAND_DISPLAY`.
pub fn wayland_detect() -> bool {
    let is_wayland_session = var_os("XDG_SESSION_TYPE")
        .map(|v| v.to_string_lossy().eq_ignore_ascii_case("wayland"))
        .unwrap_or(false);

    let has_wayland_display = var_os("WAYLAND_DISPLAY")
        .map(|v| !v.is_empty())
        .unwrap_or(false);

    is_wayland_session || has_wayland_display
}

/// A missing X display under Wayland means the platform is unsupported,
/// not that the user forgot to export `DISPLAY`.
pub(crate) fn qualify_x11_error(err: TrackerError) -> TrackerError {
    if matches!(err, TrackerError::NoDisplay) && wayland_detect() {
        TrackerError::Unsupported
    } else {
        err
    }
}

/// Re-evaluates `check` every `interval` until it holds or `timeout` elapses.
///
/// The window manager applies EWMH requests asynchronously, so their effect
/// is only visible after it has processed the message.
pub(crate) fn poll_until(
    timeout: Duration,
    interval: Duration,
    mut check: impl FnMut() -> TrackerResult<bool>,
) -> TrackerResult<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        if check()? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}

/// Lower-cased process name, preferring the executable's file name.
///
/// `/proc/<pid>/comm` is truncated to 15 bytes, so it is only a fallback.
pub(crate) fn process_name_from(exe: Option<&Path>, comm: Option<&str>) -> Option<String> {
    let from_exe = exe
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy())
        .map(|name| name.trim_end_matches(" (deleted)").to_owned());

    from_exe
        .or_else(|| comm.map(|comm| comm.trim_end_matches('\n').to_owned()))
        .filter(|name| !name.is_empty())
        .map(|name| name.to_lowercase())
}
