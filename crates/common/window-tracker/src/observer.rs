use crate::{
    EnumeratedWindow, SearchScope, TrackerError, TrackerResult, WindowHandle, WindowIdentity,
    WindowSnapshot, system::WindowSystem,
};
use std::sync::Arc;
use tracing::debug;

/// Read-only queries against the live window system.
#[derive(Clone)]
pub struct WindowObserver {
    system: Arc<dyn WindowSystem>,
}

impl WindowObserver {
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        Self { system }
    }

    #[must_use]
    pub fn system(&self) -> &Arc<dyn WindowSystem> {
        &self.system
    }

    /// The focused top-level window with a fully resolved identity.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] when there is no foreground window
    /// or its owning process cannot be resolved.
    pub fn foreground_window(&self) -> TrackerResult<WindowSnapshot> {
        let handle = self
            .system
            .foreground_window()?
            .ok_or_else(|| TrackerError::not_found("foreground window"))?;

        let identity = self.resolve_identity(handle).map_err(|e| {
            debug!("Failed to resolve foreground window {handle}: {e}");
            TrackerError::not_found(format!("owner of foreground window {handle}"))
        })?;

        Ok(WindowSnapshot::new(identity, handle))
    }

    pub(crate) fn resolve_identity(&self, handle: WindowHandle) -> TrackerResult<WindowIdentity> {
        let title = self.system.window_title(handle)?;
        let process_id = self.system.window_process_id(handle)?;
        let process_name = self.system.process_name(process_id)?;

        Ok(WindowIdentity {
            title,
            process_name,
            process_id,
        })
    }

    /// Fresh enumeration of titled, resolvable, visible top-level windows.
    ///
    /// Windows that fail to resolve are omitted; only a failure of the
    /// enumeration itself is reported.
    pub fn enumerate_visible_windows(&self) -> TrackerResult<Vec<EnumeratedWindow>> {
        let handles = self.system.enumerate_windows()?;
        let mut windows = Vec::with_capacity(handles.len());

        for handle in handles {
            match self.resolve_enumerated(handle) {
                Ok(Some(window)) => windows.push(window),
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    debug!("Skipping window {handle}: {e}");
                }
                Err(e) => {
                    debug!("Skipping window {handle} after platform error: {e}");
                }
            }
        }

        Ok(windows)
    }

    fn resolve_enumerated(&self, handle: WindowHandle) -> TrackerResult<Option<EnumeratedWindow>> {
        let title = self.system.window_title(handle)?;
        if title.is_empty() {
            return Ok(None);
        }

        let process_id = self.system.window_process_id(handle)?;
        let process_name = self.system.process_name(process_id)?;
        let bounding_rect = self.system.window_rect(handle)?;

        Ok(Some(EnumeratedWindow {
            identity: WindowIdentity {
                title,
                process_name,
                process_id,
            },
            handle,
            bounding_rect,
        }))
    }

    /// Visible windows owned by `process_id`, in enumeration order.
    pub fn windows_for_process(&self, process_id: u32) -> TrackerResult<Vec<EnumeratedWindow>> {
        Ok(self
            .enumerate_visible_windows()?
            .into_iter()
            .filter(|window| window.identity.process_id == process_id)
            .collect())
    }

    /// First visible window whose scoped field contains `term`, ignoring case.
    pub fn find_window(
        &self,
        term: &str,
        scope: SearchScope,
    ) -> TrackerResult<Option<EnumeratedWindow>> {
        Ok(self.enumerate_visible_windows()?.into_iter().find(|window| {
            scope.matches(term, &window.identity.title, &window.identity.process_name)
        }))
    }
}

impl std::fmt::Debug for WindowObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowObserver").finish_non_exhaustive()
    }
}
