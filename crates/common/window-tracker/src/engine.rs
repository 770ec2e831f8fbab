use crate::{
    ActivationResult, EnumeratedWindow, SearchScope, TrackerConfig, TrackerError, TrackerResult,
    observer::WindowObserver,
    strategies::{ActivationStrategy, default_strategies},
};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

static ACTIVATION_LOCK: Mutex<()> = Mutex::new(());

/// Brings background windows to the foreground by escalating through an
/// ordered list of strategies.
///
/// Input attachment and pointer save/restore touch global input state, so
/// activations are serialized across every engine in the process.
pub struct ActivationEngine {
    observer: WindowObserver,
    strategies: Vec<Box<dyn ActivationStrategy>>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ActivationEngine {
    pub fn new(observer: WindowObserver, config: &TrackerConfig) -> Self {
        Self::with_strategies(
            observer,
            default_strategies(config.input_settle_delay),
            config,
        )
    }

    pub fn with_strategies(
        observer: WindowObserver,
        strategies: Vec<Box<dyn ActivationStrategy>>,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            observer,
            strategies,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        }
    }

    pub fn strategy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|strategy| strategy.name())
    }

    /// Activates the canonical window of `process_id` using the configured retry count.
    ///
    /// # Errors
    ///
    /// Only a failing window enumeration is an error. A process without
    /// visible windows, or one whose window resists every strategy, yields
    /// an unsuccessful [`ActivationResult`].
    pub fn activate_by_process_id(&self, process_id: u32) -> TrackerResult<ActivationResult> {
        self.activate_by_process_id_with_retries(process_id, self.max_retries)
    }

    pub fn activate_by_process_id_with_retries(
        &self,
        process_id: u32,
        max_retries: u32,
    ) -> TrackerResult<ActivationResult> {
        let _serialized = ACTIVATION_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let windows = self.observer.windows_for_process(process_id)?;

        // Enumeration already drops untitled windows, so the first one is
        // the first titled window. This is a heuristic for the main window.
        let Some(target) = windows.into_iter().next() else {
            debug!("No visible window owned by pid {process_id}");
            return Ok(ActivationResult::failed(0));
        };

        debug!(
            "Located window {} for pid {process_id}: {}",
            target.handle, target.identity.title
        );

        Ok(self.run_passes(&target, max_retries.max(1)))
    }

    /// Activates the first visible window matching `term` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] when nothing matches, which is
    /// distinct from a match whose activation failed.
    pub fn activate_by_search(
        &self,
        term: &str,
        scope: SearchScope,
    ) -> TrackerResult<ActivationResult> {
        let matched = self.observer.find_window(term, scope)?.ok_or_else(|| {
            TrackerError::not_found(format!("window with {scope:?} containing '{term}'"))
        })?;

        debug!(
            "Search '{term}' matched {} (pid {})",
            matched.identity.title, matched.identity.process_id
        );

        self.activate_by_process_id(matched.identity.process_id)
    }

    fn run_passes(&self, target: &EnumeratedWindow, max_retries: u32) -> ActivationResult {
        let system = self.observer.system().as_ref();

        for pass in 1..=max_retries {
            for strategy in &self.strategies {
                match strategy.attempt(system, target) {
                    Ok(true) => {
                        info!(
                            "Activated {} via {} on pass {pass}/{max_retries}",
                            target.identity,
                            strategy.name()
                        );
                        return ActivationResult::succeeded(strategy.kind(), pass);
                    }
                    Ok(false) => {
                        debug!("Strategy {} did not activate {}", strategy.name(), target.handle);
                    }
                    Err(e) => {
                        debug!("Strategy {} failed for {}: {e}", strategy.name(), target.handle);
                    }
                }
            }

            if pass < max_retries && !self.retry_backoff.is_zero() {
                std::thread::sleep(self.retry_backoff);
            }
        }

        warn!(
            "Activation of {} exhausted after {max_retries} passes",
            target.identity
        );
        ActivationResult::failed(max_retries)
    }
}

impl std::fmt::Debug for ActivationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationEngine")
            .field("strategies", &self.strategy_names().collect::<Vec<_>>())
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .finish_non_exhaustive()
    }
}
