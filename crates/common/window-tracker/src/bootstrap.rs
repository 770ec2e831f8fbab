//! Best-effort reconstruction of recent window history for a tracker that
//! started after the desktop already had windows open.

use crate::{
    RecencyHistory, TrackerConfig, TrackerError, TrackerResult, WindowSnapshot,
    activity::ProcessActivity, observer::WindowObserver,
};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// An independent source of "probably recently active" windows.
pub trait BootstrapProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates, most likely recent first.
    fn collect(&self) -> TrackerResult<Vec<WindowSnapshot>>;
}

#[derive(Debug, Clone)]
pub struct ForegroundProbe {
    observer: WindowObserver,
}

impl ForegroundProbe {
    pub fn new(observer: WindowObserver) -> Self {
        Self { observer }
    }
}

impl BootstrapProbe for ForegroundProbe {
    fn name(&self) -> &'static str {
        "foreground"
    }

    fn collect(&self) -> TrackerResult<Vec<WindowSnapshot>> {
        Ok(vec![self.observer.foreground_window()?])
    }
}

#[derive(Debug, Clone)]
pub struct EnumerationProbe {
    observer: WindowObserver,
}

impl EnumerationProbe {
    pub fn new(observer: WindowObserver) -> Self {
        Self { observer }
    }
}

impl BootstrapProbe for EnumerationProbe {
    fn name(&self) -> &'static str {
        "enumeration"
    }

    fn collect(&self) -> TrackerResult<Vec<WindowSnapshot>> {
        Ok(self
            .observer
            .enumerate_visible_windows()?
            .iter()
            .map(|window| window.to_snapshot())
            .collect())
    }
}

/// Windowed processes ordered by activity, each mapped to its first titled window.
pub struct ProcessActivityProbe {
    observer: WindowObserver,
    activity: Arc<dyn ProcessActivity>,
    limit: usize,
}

impl ProcessActivityProbe {
    pub fn new(observer: WindowObserver, activity: Arc<dyn ProcessActivity>, limit: usize) -> Self {
        Self {
            observer,
            activity,
            limit,
        }
    }
}

impl BootstrapProbe for ProcessActivityProbe {
    fn name(&self) -> &'static str {
        "process-activity"
    }

    fn collect(&self) -> TrackerResult<Vec<WindowSnapshot>> {
        let windows = self.observer.enumerate_visible_windows()?;
        let ranked = self.activity.ranked_process_ids()?;

        Ok(ranked
            .into_iter()
            .filter_map(|pid| {
                windows
                    .iter()
                    .find(|window| window.identity.process_id == pid)
            })
            .take(self.limit)
            .map(|window| window.to_snapshot())
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub seeded: usize,
    pub completed: Vec<&'static str>,
    pub failed: Vec<&'static str>,
    pub timed_out: Vec<&'static str>,
}

/// Runs every probe on its own thread and merges their results in probe
/// order under one shared deadline.
pub struct BootstrapPipeline {
    probes: Vec<Arc<dyn BootstrapProbe>>,
    timeout: Duration,
}

impl BootstrapPipeline {
    pub fn new(probes: Vec<Arc<dyn BootstrapProbe>>, timeout: Duration) -> Self {
        Self { probes, timeout }
    }

    /// Foreground window, then the visible windows, then the activity ranking.
    pub fn standard(
        observer: &WindowObserver,
        activity: Arc<dyn ProcessActivity>,
        config: &TrackerConfig,
    ) -> Self {
        Self::new(
            vec![
                Arc::new(ForegroundProbe::new(observer.clone())),
                Arc::new(EnumerationProbe::new(observer.clone())),
                Arc::new(ProcessActivityProbe::new(
                    observer.clone(),
                    activity,
                    config.activity_probe_limit,
                )),
            ],
            config.bootstrap_timeout,
        )
    }

    /// Seeds an empty `history`; a non-empty one is left untouched.
    ///
    /// Never fails: probe errors and timeouts are logged and reported.
    pub fn run(&self, history: &mut RecencyHistory) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        if !history.is_empty() {
            debug!("History already populated, skipping bootstrap");
            return report;
        }

        let deadline = Instant::now() + self.timeout;
        let pending: Vec<_> = self
            .probes
            .iter()
            .map(|probe| (probe.name(), spawn_probe(Arc::clone(probe))))
            .collect();

        for (name, receiver) in pending {
            if history.is_full() {
                break;
            }

            let receiver = match receiver {
                Ok(receiver) => receiver,
                Err(e) => {
                    debug!("Bootstrap probe {name} could not start: {e}");
                    report.failed.push(name);
                    continue;
                }
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok(Ok(candidates)) => {
                    for snapshot in candidates {
                        if history.is_full() {
                            break;
                        }
                        if history.seed(snapshot) {
                            report.seeded += 1;
                        }
                    }
                    report.completed.push(name);
                }
                Ok(Err(e)) => {
                    debug!("Bootstrap probe {name} failed: {e}");
                    report.failed.push(name);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let err = TrackerError::Timeout {
                        probe: name.to_owned(),
                        after: self.timeout,
                    };
                    warn!("{err}, continuing with {} windows", history.len());
                    report.timed_out.push(name);
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    debug!("Bootstrap probe {name} exited without a result");
                    report.failed.push(name);
                }
            }
        }

        info!(
            "Bootstrapped window history with {} windows ({} probes completed)",
            report.seeded,
            report.completed.len()
        );
        report
    }
}

/// The probe thread is detached; a late result is dropped with the receiver.
fn spawn_probe(
    probe: Arc<dyn BootstrapProbe>,
) -> TrackerResult<mpsc::Receiver<TrackerResult<Vec<WindowSnapshot>>>> {
    let (sender, receiver) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("bootstrap-{}", probe.name()))
        .spawn(move || {
            let _ = sender.send(probe.collect());
        })
        .map_err(|e| TrackerError::platform_with_source("failed to spawn bootstrap probe", e))?;
    Ok(receiver)
}

impl std::fmt::Debug for BootstrapPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapPipeline")
            .field(
                "probes",
                &self.probes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}
