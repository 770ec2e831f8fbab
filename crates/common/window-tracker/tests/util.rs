//! Common test utilities for window-tracker integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use window_tracker::{
    ModifierKey, MouseButton, ProcessActivity, TrackerConfig, TrackerError, TrackerResult,
    WindowHandle, WindowRect, WindowSystem, WindowTracker, default_strategies,
};

/// Thread id the fake reports for the calling thread.
pub const CALLER_THREAD: u32 = 1;

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub handle: u64,
    pub title: String,
    pub process_name: String,
    pub process_id: u32,
    pub rect: WindowRect,
}

impl FakeWindow {
    pub fn new(handle: u64, title: &str, process_name: &str, process_id: u32) -> Self {
        let left = (handle as i32) * 1000;
        Self {
            handle,
            title: title.to_owned(),
            process_name: process_name.to_owned(),
            process_id,
            rect: WindowRect {
                left,
                top: 100,
                right: left + 800,
                bottom: 700,
            },
        }
    }

    /// Owning thread, derived from the pid so it never equals [`CALLER_THREAD`].
    pub fn thread_id(&self) -> u32 {
        self.process_id * 10 + 7
    }
}

/// Every side-effecting primitive the fake has seen, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Attach { from: u32, to: u32, attach: bool },
    Restore(u64),
    Raise(u64),
    RequestForeground(u64),
    SetForegroundRaw(u64),
    KeyDown(ModifierKey),
    KeyUp(ModifierKey),
    SetCursor(i32, i32),
    Click(MouseButton),
    Minimize(u64),
    Maximize(u64),
    Close(u64),
}

/// Which activation primitives succeed. All fail by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Outcomes {
    pub attach: bool,
    pub request_foreground: bool,
    /// `request_foreground` only succeeds while Alt is held.
    pub request_foreground_needs_alt: bool,
    /// `request_foreground` is granted from this 1-based request onwards.
    pub request_foreground_from: Option<usize>,
    pub set_foreground_raw: bool,
    pub click_activates: bool,
    pub raise_fails: bool,
    pub request_foreground_fails: bool,
    pub click_fails: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    windows: Vec<FakeWindow>,
    foreground: Option<u64>,
    outcomes: Outcomes,
    calls: Vec<Call>,
    held_keys: Vec<ModifierKey>,
    attached: HashSet<(u32, u32)>,
    cursor: (i32, i32),
    denied_pids: HashSet<u32>,
    enumeration_fails: bool,
    foreground_requests: usize,
    rotation: Vec<u64>,
    rotation_pos: usize,
    last_reported: Option<u64>,
}

/// Scriptable in-memory [`WindowSystem`].
#[derive(Debug, Default)]
pub struct FakeSystem {
    state: Mutex<FakeState>,
}

impl FakeSystem {
    pub fn new(windows: Vec<FakeWindow>) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.windows = windows;
            state.cursor = (5, 5);
        }
        Arc::new(fake)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn window(&self, handle: WindowHandle) -> TrackerResult<FakeWindow> {
        self.state()
            .windows
            .iter()
            .find(|w| w.handle == handle.0)
            .cloned()
            .ok_or_else(|| TrackerError::not_found(format!("window {handle}")))
    }

    pub fn set_foreground(&self, handle: Option<u64>) {
        self.state().foreground = handle;
    }

    /// Every foreground query reports the next handle of `handles`, cycling.
    pub fn rotate_foreground(&self, handles: Vec<u64>) {
        let mut state = self.state();
        state.rotation = handles;
        state.rotation_pos = 0;
    }

    /// Ends the rotation and leaves no window in the foreground.
    pub fn stop_rotation(&self) {
        let mut state = self.state();
        state.rotation.clear();
        state.foreground = None;
    }

    /// Last handle a foreground query returned.
    pub fn last_reported_foreground(&self) -> Option<u64> {
        self.state().last_reported
    }

    pub fn set_outcomes(&self, outcomes: Outcomes) {
        self.state().outcomes = outcomes;
    }

    pub fn deny_process(&self, pid: u32) {
        self.state().denied_pids.insert(pid);
    }

    pub fn fail_enumeration(&self) {
        self.state().enumeration_fails = true;
    }

    pub fn add_window(&self, window: FakeWindow) {
        self.state().windows.push(window);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn held_keys(&self) -> Vec<ModifierKey> {
        self.state().held_keys.clone()
    }

    pub fn attached_pairs(&self) -> usize {
        self.state().attached.len()
    }

    pub fn cursor(&self) -> (i32, i32) {
        self.state().cursor
    }

    pub fn foreground_requests(&self) -> usize {
        self.state().foreground_requests
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

impl WindowSystem for FakeSystem {
    fn foreground_window(&self) -> TrackerResult<Option<WindowHandle>> {
        let mut state = self.state();
        if !state.rotation.is_empty() {
            let next = state.rotation[state.rotation_pos % state.rotation.len()];
            state.rotation_pos += 1;
            state.foreground = Some(next);
        }
        state.last_reported = state.foreground;
        Ok(state.foreground.map(WindowHandle))
    }

    fn enumerate_windows(&self) -> TrackerResult<Vec<WindowHandle>> {
        let state = self.state();
        if state.enumeration_fails {
            return Err(TrackerError::platform("enumeration failed"));
        }
        Ok(state.windows.iter().map(|w| WindowHandle(w.handle)).collect())
    }

    fn window_title(&self, window: WindowHandle) -> TrackerResult<String> {
        Ok(self.window(window)?.title)
    }

    fn window_process_id(&self, window: WindowHandle) -> TrackerResult<u32> {
        Ok(self.window(window)?.process_id)
    }

    fn window_thread_id(&self, window: WindowHandle) -> TrackerResult<u32> {
        Ok(self.window(window)?.thread_id())
    }

    fn window_rect(&self, window: WindowHandle) -> TrackerResult<WindowRect> {
        Ok(self.window(window)?.rect)
    }

    fn process_name(&self, process_id: u32) -> TrackerResult<String> {
        let state = self.state();
        if state.denied_pids.contains(&process_id) {
            return Err(TrackerError::AccessDenied);
        }
        state
            .windows
            .iter()
            .find(|w| w.process_id == process_id)
            .map(|w| w.process_name.clone())
            .ok_or_else(|| TrackerError::not_found(format!("process {process_id}")))
    }

    fn process_executable(&self, process_id: u32) -> TrackerResult<PathBuf> {
        let name = self.process_name(process_id)?;
        Ok(PathBuf::from("/opt/apps").join(name))
    }

    fn current_thread_id(&self) -> TrackerResult<u32> {
        Ok(CALLER_THREAD)
    }

    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> TrackerResult<bool> {
        let mut state = self.state();
        state.calls.push(Call::Attach { from, to, attach });
        if attach {
            if !state.outcomes.attach {
                return Ok(false);
            }
            state.attached.insert((from, to));
            Ok(true)
        } else {
            Ok(state.attached.remove(&(from, to)))
        }
    }

    fn restore_window(&self, window: WindowHandle) -> TrackerResult<()> {
        self.record(Call::Restore(window.0));
        Ok(())
    }

    fn raise_window(&self, window: WindowHandle) -> TrackerResult<()> {
        let mut state = self.state();
        state.calls.push(Call::Raise(window.0));
        if state.outcomes.raise_fails {
            return Err(TrackerError::platform("raise refused"));
        }
        Ok(())
    }

    fn request_foreground(&self, window: WindowHandle) -> TrackerResult<bool> {
        let mut state = self.state();
        state.calls.push(Call::RequestForeground(window.0));
        state.foreground_requests += 1;
        if state.outcomes.request_foreground_fails {
            return Err(TrackerError::platform("foreground request rejected"));
        }

        let alt_held = state.held_keys.contains(&ModifierKey::Alt);
        let granted = match state.outcomes.request_foreground_from {
            Some(nth) => state.foreground_requests >= nth,
            None => {
                state.outcomes.request_foreground
                    && (!state.outcomes.request_foreground_needs_alt || alt_held)
            }
        };
        if granted {
            state.foreground = Some(window.0);
        }
        Ok(granted)
    }

    fn set_foreground_raw(&self, window: WindowHandle) -> TrackerResult<bool> {
        let mut state = self.state();
        state.calls.push(Call::SetForegroundRaw(window.0));
        if state.outcomes.set_foreground_raw {
            state.foreground = Some(window.0);
        }
        Ok(state.outcomes.set_foreground_raw)
    }

    fn key_down(&self, key: ModifierKey) -> TrackerResult<()> {
        let mut state = self.state();
        state.calls.push(Call::KeyDown(key));
        state.held_keys.push(key);
        Ok(())
    }

    fn key_up(&self, key: ModifierKey) -> TrackerResult<()> {
        let mut state = self.state();
        state.calls.push(Call::KeyUp(key));
        if let Some(pos) = state.held_keys.iter().position(|held| *held == key) {
            state.held_keys.remove(pos);
        }
        Ok(())
    }

    fn cursor_position(&self) -> TrackerResult<(i32, i32)> {
        Ok(self.state().cursor)
    }

    fn set_cursor_position(&self, x: i32, y: i32) -> TrackerResult<()> {
        let mut state = self.state();
        state.calls.push(Call::SetCursor(x, y));
        state.cursor = (x, y);
        Ok(())
    }

    fn click(&self, button: MouseButton) -> TrackerResult<()> {
        let mut state = self.state();
        state.calls.push(Call::Click(button));
        if state.outcomes.click_fails {
            return Err(TrackerError::platform("click injection failed"));
        }
        if state.outcomes.click_activates {
            let (x, y) = state.cursor;
            let under = state
                .windows
                .iter()
                .find(|w| {
                    x >= w.rect.left && x < w.rect.right && y >= w.rect.top && y < w.rect.bottom
                })
                .map(|w| w.handle);
            if under.is_some() {
                state.foreground = under;
            }
        }
        Ok(())
    }

    fn minimize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.record(Call::Minimize(window.0));
        Ok(true)
    }

    fn maximize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.record(Call::Maximize(window.0));
        Ok(true)
    }

    fn close_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.record(Call::Close(window.0));
        Ok(true)
    }
}

/// Fixed activity ranking that counts how often it was asked.
#[derive(Debug, Default)]
pub struct FakeActivity {
    pub ranked: Vec<u32>,
    pub queries: AtomicUsize,
}

impl FakeActivity {
    pub fn new(ranked: Vec<u32>) -> Arc<Self> {
        Arc::new(Self {
            ranked,
            queries: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl ProcessActivity for FakeActivity {
    fn ranked_process_ids(&self) -> TrackerResult<Vec<u32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.ranked.clone())
    }
}

/// Defaults without any sleeping.
pub fn fast_config() -> TrackerConfig {
    TrackerConfig {
        retry_backoff: Duration::ZERO,
        input_settle_delay: Duration::ZERO,
        bootstrap_timeout: Duration::from_secs(2),
        ..TrackerConfig::default()
    }
}

pub fn tracker_with(fake: &Arc<FakeSystem>, ranked: Vec<u32>) -> WindowTracker {
    tracker_with_config(fake, ranked, fast_config())
}

pub fn tracker_with_config(
    fake: &Arc<FakeSystem>,
    ranked: Vec<u32>,
    config: TrackerConfig,
) -> WindowTracker {
    tracker_with_activity(fake, FakeActivity::new(ranked), config)
}

pub fn tracker_with_activity(
    fake: &Arc<FakeSystem>,
    activity: Arc<FakeActivity>,
    config: TrackerConfig,
) -> WindowTracker {
    let system: Arc<dyn WindowSystem> = fake.clone();
    WindowTracker::with_components(
        system,
        activity,
        default_strategies(config.input_settle_delay),
        config,
    )
}

/// Check if integration tests should run
/// Tests will only run if INTEGRATION_TEST=1 environment variable is set
pub fn should_run_integration_tests() -> bool {
    env::var("INTEGRATION_TEST")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}
