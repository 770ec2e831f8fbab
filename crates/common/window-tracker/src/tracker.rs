use crate::{
    ActivationResult, ContextReport, ContextSynthesizer, EnumeratedWindow, RecencyHistory,
    SearchScope, SystemLoad, TrackerConfig, TrackerError, TrackerResult, WindowSnapshot,
    activity::{CpuTimeActivity, ProcessActivity, sample_system_load},
    bootstrap::{BootstrapPipeline, BootstrapReport},
    engine::ActivationEngine,
    observer::WindowObserver,
    strategies::{ActivationStrategy, default_strategies},
    system::WindowSystem,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Process half of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentProcess {
    pub process_name: String,
    pub process_id: u32,
}

/// Enumerated window enriched for listing.
#[derive(Debug, Clone, Serialize)]
pub struct WindowDetails {
    pub window: EnumeratedWindow,
    pub executable: Option<PathBuf>,
    pub width: i32,
    pub height: i32,
}

struct HistoryState {
    history: RecencyHistory,
    bootstrapped: bool,
}

struct TrackerInner {
    observer: WindowObserver,
    engine: ActivationEngine,
    bootstrap: BootstrapPipeline,
    synthesizer: ContextSynthesizer,
    state: Mutex<HistoryState>,
}

/// Foreground observation, recency history and activation behind one handle.
///
/// Cloning is cheap and clones share the same history. Independent trackers
/// (for example in tests) are created with their own constructor call.
#[derive(Clone)]
pub struct WindowTracker {
    inner: Arc<TrackerInner>,
}

impl WindowTracker {
    /// Tracker over the native window system with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails when no usable window system is available (no display,
    /// non-interactive session, unsupported platform).
    pub fn new() -> TrackerResult<Self> {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> TrackerResult<Self> {
        let system = crate::platform::native_system()?;
        Ok(Self::with_system(system, config))
    }

    pub fn with_system(system: Arc<dyn WindowSystem>, config: TrackerConfig) -> Self {
        let strategies = default_strategies(config.input_settle_delay);
        Self::with_components(system, Arc::new(CpuTimeActivity), strategies, config)
    }

    pub fn with_components(
        system: Arc<dyn WindowSystem>,
        activity: Arc<dyn ProcessActivity>,
        strategies: Vec<Box<dyn ActivationStrategy>>,
        config: TrackerConfig,
    ) -> Self {
        let observer = WindowObserver::new(system);
        let engine = ActivationEngine::with_strategies(observer.clone(), strategies, &config);
        let bootstrap = BootstrapPipeline::standard(&observer, activity, &config);

        Self {
            inner: Arc::new(TrackerInner {
                observer,
                engine,
                bootstrap,
                synthesizer: ContextSynthesizer,
                state: Mutex::new(HistoryState {
                    history: RecencyHistory::with_capacity(config.history_capacity),
                    bootstrapped: false,
                }),
            }),
        }
    }

    #[must_use]
    pub fn observer(&self) -> &WindowObserver {
        &self.inner.observer
    }

    #[must_use]
    pub fn engine(&self) -> &ActivationEngine {
        &self.inner.engine
    }

    fn lock_state(&self) -> TrackerResult<MutexGuard<'_, HistoryState>> {
        Ok(self.inner.state.lock()?)
    }

    fn ensure_bootstrapped(&self, state: &mut HistoryState) -> BootstrapReport {
        if state.bootstrapped {
            return BootstrapReport::default();
        }
        // Marked even when every probe fails so a broken environment does
        // not rerun the pipeline on each query.
        state.bootstrapped = true;
        self.inner.bootstrap.run(&mut state.history)
    }

    /// Current foreground window without touching the history.
    pub fn foreground_window(&self) -> TrackerResult<WindowSnapshot> {
        self.inner.observer.foreground_window()
    }

    pub fn enumerate_visible_windows(&self) -> TrackerResult<Vec<EnumeratedWindow>> {
        self.inner.observer.enumerate_visible_windows()
    }

    /// Queries the foreground window and records it in the history.
    ///
    /// The query runs under the history lock so concurrent observations are
    /// recorded in the order the window system reported them.
    pub fn observe_foreground(&self) -> TrackerResult<WindowSnapshot> {
        let mut state = self.lock_state()?;
        let snapshot = self.inner.observer.foreground_window()?;
        state.history.observe(snapshot.clone());
        Ok(snapshot)
    }

    /// Records an externally obtained observation.
    pub fn observe(&self, snapshot: WindowSnapshot) -> TrackerResult<()> {
        let mut state = self.lock_state()?;
        state.history.observe(snapshot);
        Ok(())
    }

    /// Seeds an empty history from the bootstrap probes.
    ///
    /// Runs at most once per tracker and never alters a non-empty history.
    pub fn bootstrap(&self) -> TrackerResult<BootstrapReport> {
        let mut state = self.lock_state()?;
        Ok(self.ensure_bootstrapped(&mut state))
    }

    /// Bootstraps if needed, then moves the live foreground window to the
    /// front before handing the locked state to `f`.
    fn with_refreshed_history<T>(
        &self,
        f: impl FnOnce(&RecencyHistory) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        let mut state = self.lock_state()?;
        self.ensure_bootstrapped(&mut state);
        match self.inner.observer.foreground_window() {
            Ok(current) => state.history.observe(current),
            Err(e) => debug!("Foreground window unavailable for refresh: {e}"),
        }
        f(&state.history)
    }

    /// The window active `index` activations ago; `0` is the current one.
    pub fn index_of(&self, index: usize) -> TrackerResult<WindowSnapshot> {
        self.with_refreshed_history(|history| history.index_of(index).cloned())
    }

    /// Read-only copy of the history, most recent first.
    pub fn snapshot(&self) -> TrackerResult<Vec<WindowSnapshot>> {
        self.with_refreshed_history(|history| Ok(history.snapshot()))
    }

    pub fn recent_processes(&self) -> TrackerResult<Vec<RecentProcess>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|snapshot| !snapshot.identity.process_name.is_empty())
            .map(|snapshot| RecentProcess {
                process_name: snapshot.identity.process_name,
                process_id: snapshot.identity.process_id,
            })
            .collect())
    }

    /// Most recent history entry that belongs to a different process than
    /// the current foreground window and is not in `excluded_processes`.
    pub fn previous_window(
        &self,
        excluded_processes: &[&str],
    ) -> TrackerResult<Option<WindowSnapshot>> {
        let history = self.snapshot()?;
        let Some((current, older)) = history.split_first() else {
            return Ok(None);
        };

        Ok(older
            .iter()
            .find(|entry| {
                entry.identity.process_id != current.identity.process_id
                    && !excluded_processes
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&entry.identity.process_name))
            })
            .cloned())
    }

    /// Does not record anything; observe afterwards to confirm the switch.
    pub fn activate_by_pid(&self, process_id: u32) -> TrackerResult<ActivationResult> {
        self.inner.engine.activate_by_process_id(process_id)
    }

    pub fn activate_by_search(
        &self,
        term: &str,
        scope: SearchScope,
    ) -> TrackerResult<ActivationResult> {
        self.inner.engine.activate_by_search(term, scope)
    }

    /// Activates the window `index` steps back in the history.
    pub fn switch_to_index(&self, index: usize) -> TrackerResult<ActivationResult> {
        let target = self.index_of(index)?;
        self.inner
            .engine
            .activate_by_process_id(target.identity.process_id)
    }

    /// Visible windows with executable paths, sorted by title ignoring case.
    pub fn list_windows_detailed(&self) -> TrackerResult<Vec<WindowDetails>> {
        let system = self.inner.observer.system();
        let mut details: Vec<WindowDetails> = self
            .inner
            .observer
            .enumerate_visible_windows()?
            .into_iter()
            .map(|window| {
                let executable = system
                    .process_executable(window.identity.process_id)
                    .map_err(|e| debug!("No executable for pid {}: {e}", window.identity.process_id))
                    .ok();
                WindowDetails {
                    width: window.bounding_rect.width(),
                    height: window.bounding_rect.height(),
                    executable,
                    window,
                }
            })
            .collect();

        details.sort_by_cached_key(|d| d.window.identity.title.to_lowercase());
        Ok(details)
    }

    fn first_window_of(&self, process_id: u32) -> TrackerResult<EnumeratedWindow> {
        self.inner
            .observer
            .windows_for_process(process_id)?
            .into_iter()
            .next()
            .ok_or_else(|| TrackerError::not_found(format!("visible window for pid {process_id}")))
    }

    pub fn minimize_by_pid(&self, process_id: u32) -> TrackerResult<bool> {
        let window = self.first_window_of(process_id)?;
        self.inner.observer.system().minimize_window(window.handle)
    }

    pub fn maximize_by_pid(&self, process_id: u32) -> TrackerResult<bool> {
        let window = self.first_window_of(process_id)?;
        self.inner.observer.system().maximize_window(window.handle)
    }

    /// Asks the window to close; the application may still refuse.
    pub fn close_by_pid(&self, process_id: u32) -> TrackerResult<bool> {
        let window = self.first_window_of(process_id)?;
        self.inner.observer.system().close_window(window.handle)
    }

    /// Context signals derived from the current history.
    pub fn context(&self, load: Option<SystemLoad>) -> TrackerResult<ContextReport> {
        let history = self.snapshot()?;
        Ok(self
            .inner
            .synthesizer
            .synthesize(&history, chrono::Local::now(), load))
    }

    /// Like [`context`](Self::context) with a fresh CPU/memory sample.
    pub fn context_with_system_load(&self) -> TrackerResult<ContextReport> {
        self.context(Some(sample_system_load()))
    }

    #[cfg(feature = "async")]
    async fn run_blocking<T, F>(&self, f: F) -> TrackerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(WindowTracker) -> TrackerResult<T> + Send + 'static,
    {
        let tracker = self.clone();
        tokio::task::spawn_blocking(move || f(tracker))
            .await
            .map_err(|e| TrackerError::platform_with_source("blocking tracker task failed", e))?
    }

    /// Async variant of [`observe_foreground`](Self::observe_foreground).
    #[cfg(feature = "async")]
    pub async fn observe_foreground_async(&self) -> TrackerResult<WindowSnapshot> {
        self.run_blocking(|tracker| tracker.observe_foreground())
            .await
    }

    /// Async variant of [`activate_by_pid`](Self::activate_by_pid).
    #[cfg(feature = "async")]
    pub async fn activate_by_pid_async(&self, process_id: u32) -> TrackerResult<ActivationResult> {
        self.run_blocking(move |tracker| tracker.activate_by_pid(process_id))
            .await
    }

    /// Async variant of [`activate_by_search`](Self::activate_by_search).
    #[cfg(feature = "async")]
    pub async fn activate_by_search_async(
        &self,
        term: String,
        scope: SearchScope,
    ) -> TrackerResult<ActivationResult> {
        self.run_blocking(move |tracker| tracker.activate_by_search(&term, scope))
            .await
    }
}

impl std::fmt::Debug for WindowTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowTracker")
            .field("engine", &self.inner.engine)
            .field("bootstrap", &self.inner.bootstrap)
            .finish_non_exhaustive()
    }
}
