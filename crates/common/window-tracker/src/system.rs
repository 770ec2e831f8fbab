use crate::{TrackerResult, WindowHandle, WindowRect};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Alt,
    Shift,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Every OS facility the tracker touches.
///
/// Implementations are thin: no retries, no caching, no policy. A primitive
/// that the platform cannot express returns [`TrackerError::Unsupported`].
/// Boolean returns carry the OS's own success signal for that primitive.
///
/// [`TrackerError::Unsupported`]: crate::TrackerError::Unsupported
pub trait WindowSystem: Send + Sync {
    fn foreground_window(&self) -> TrackerResult<Option<WindowHandle>>;

    /// Visible top-level windows in the platform's native order.
    fn enumerate_windows(&self) -> TrackerResult<Vec<WindowHandle>>;

    fn window_title(&self, window: WindowHandle) -> TrackerResult<String>;

    fn window_process_id(&self, window: WindowHandle) -> TrackerResult<u32>;

    fn window_thread_id(&self, window: WindowHandle) -> TrackerResult<u32>;

    fn window_rect(&self, window: WindowHandle) -> TrackerResult<WindowRect>;

    /// Executable-derived name of a process, lower-cased.
    fn process_name(&self, process_id: u32) -> TrackerResult<String>;

    fn process_executable(&self, process_id: u32) -> TrackerResult<PathBuf>;

    fn current_thread_id(&self) -> TrackerResult<u32>;

    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> TrackerResult<bool>;

    /// Un-minimizes the window.
    fn restore_window(&self, window: WindowHandle) -> TrackerResult<()>;

    /// Moves the window to the top of the Z-order.
    fn raise_window(&self, window: WindowHandle) -> TrackerResult<()>;

    /// Convenience-level foreground request.
    fn request_foreground(&self, window: WindowHandle) -> TrackerResult<bool>;

    /// Lowest-level foreground primitive; `true` is the raw success return.
    fn set_foreground_raw(&self, window: WindowHandle) -> TrackerResult<bool>;

    fn key_down(&self, key: ModifierKey) -> TrackerResult<()>;

    fn key_up(&self, key: ModifierKey) -> TrackerResult<()>;

    fn cursor_position(&self) -> TrackerResult<(i32, i32)>;

    fn set_cursor_position(&self, x: i32, y: i32) -> TrackerResult<()>;

    /// Synthesizes a press followed by a release at the current pointer position.
    fn click(&self, button: MouseButton) -> TrackerResult<()>;

    fn minimize_window(&self, window: WindowHandle) -> TrackerResult<bool>;

    fn maximize_window(&self, window: WindowHandle) -> TrackerResult<bool>;

    fn close_window(&self, window: WindowHandle) -> TrackerResult<bool>;
}
