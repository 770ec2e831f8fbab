//! Foreground activation mechanisms, tried in order by the engine.

use crate::{
    EnumeratedWindow, StrategyKind, TrackerError, TrackerResult,
    system::{ModifierKey, MouseButton, WindowSystem},
};
use std::time::Duration;
use tracing::debug;

/// One way of moving a window to the foreground.
///
/// `Ok(false)` and `Err(_)` both mean "try the next strategy".
pub trait ActivationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn attempt(&self, system: &dyn WindowSystem, target: &EnumeratedWindow)
    -> TrackerResult<bool>;
}

/// The four built-in strategies in escalation order.
#[must_use]
pub fn default_strategies(settle: Duration) -> Vec<Box<dyn ActivationStrategy>> {
    vec![
        Box::new(AttachInputStrategy { settle }),
        Box::new(KeySimulationStrategy { settle }),
        Box::new(SystemApiStrategy),
        Box::new(PointerClickStrategy { settle }),
    ]
}

fn settle_for(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Input queue of `from` attached to `to` until dropped.
struct InputAttachment<'a> {
    system: &'a dyn WindowSystem,
    from: u32,
    to: u32,
    attached: bool,
}

impl<'a> InputAttachment<'a> {
    fn attach(system: &'a dyn WindowSystem, from: u32, to: u32) -> TrackerResult<Self> {
        // A thread cannot attach to itself; the queues are already shared.
        if from == to {
            return Ok(Self {
                system,
                from,
                to,
                attached: false,
            });
        }

        if !system.attach_thread_input(from, to, true)? {
            return Err(TrackerError::platform(format!(
                "failed to attach input of thread {from} to thread {to}"
            )));
        }

        Ok(Self {
            system,
            from,
            to,
            attached: true,
        })
    }
}

impl Drop for InputAttachment<'_> {
    fn drop(&mut self) {
        if !self.attached {
            return;
        }
        match self.system.attach_thread_input(self.from, self.to, false) {
            Ok(true) => {}
            Ok(false) => debug!("Detaching input of thread {} was refused", self.from),
            Err(e) => debug!("Failed to detach input of thread {}: {e}", self.from),
        }
    }
}

/// Modifier key held down until dropped.
struct HeldKey<'a> {
    system: &'a dyn WindowSystem,
    key: ModifierKey,
}

impl<'a> HeldKey<'a> {
    fn press(system: &'a dyn WindowSystem, key: ModifierKey) -> TrackerResult<Self> {
        system.key_down(key)?;
        Ok(Self { system, key })
    }
}

impl Drop for HeldKey<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.system.key_up(self.key) {
            debug!("Failed to release {:?}: {e}", self.key);
        }
    }
}

/// Pointer position restored when dropped.
struct PointerRestore<'a> {
    system: &'a dyn WindowSystem,
    x: i32,
    y: i32,
}

impl<'a> PointerRestore<'a> {
    fn save(system: &'a dyn WindowSystem) -> TrackerResult<Self> {
        let (x, y) = system.cursor_position()?;
        Ok(Self { system, x, y })
    }
}

impl Drop for PointerRestore<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.system.set_cursor_position(self.x, self.y) {
            debug!("Failed to restore pointer to ({}, {}): {e}", self.x, self.y);
        }
    }
}

/// Attaches to the target's input queue, restores and raises it, then asks
/// for the foreground. A modifier tap unlocks a second request.
#[derive(Debug, Clone)]
pub struct AttachInputStrategy {
    pub settle: Duration,
}

impl ActivationStrategy for AttachInputStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AttachInput
    }

    fn attempt(
        &self,
        system: &dyn WindowSystem,
        target: &EnumeratedWindow,
    ) -> TrackerResult<bool> {
        let window = target.handle;
        let current = system.current_thread_id()?;
        let owner = system.window_thread_id(window)?;

        let _attachment = InputAttachment::attach(system, current, owner)?;

        system.restore_window(window)?;
        system.raise_window(window)?;

        if system.request_foreground(window)? {
            return Ok(true);
        }

        drop(HeldKey::press(system, ModifierKey::Alt)?);
        settle_for(self.settle);

        system.request_foreground(window)
    }
}

/// Holds a modifier while requesting the foreground.
#[derive(Debug, Clone)]
pub struct KeySimulationStrategy {
    pub settle: Duration,
}

impl ActivationStrategy for KeySimulationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KeySimulation
    }

    fn attempt(
        &self,
        system: &dyn WindowSystem,
        target: &EnumeratedWindow,
    ) -> TrackerResult<bool> {
        let held = HeldKey::press(system, ModifierKey::Alt)?;
        settle_for(self.settle);

        let result = system.request_foreground(target.handle);
        drop(held);

        result
    }
}

/// Calls the raw foreground primitive directly.
#[derive(Debug, Clone, Copy)]
pub struct SystemApiStrategy;

impl ActivationStrategy for SystemApiStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SystemApi
    }

    fn attempt(
        &self,
        system: &dyn WindowSystem,
        target: &EnumeratedWindow,
    ) -> TrackerResult<bool> {
        system.set_foreground_raw(target.handle)
    }
}

/// Clicks the centre of the window and checks that it became the foreground.
#[derive(Debug, Clone)]
pub struct PointerClickStrategy {
    pub settle: Duration,
}

impl ActivationStrategy for PointerClickStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PointerClick
    }

    fn attempt(
        &self,
        system: &dyn WindowSystem,
        target: &EnumeratedWindow,
    ) -> TrackerResult<bool> {
        let window = target.handle;
        system.restore_window(window)?;

        // Restoring a minimized window moves it, so the enumerated rect may be stale.
        let rect = system
            .window_rect(window)
            .unwrap_or(target.bounding_rect);
        let (x, y) = rect.center();

        let _pointer = PointerRestore::save(system)?;

        system.set_cursor_position(x, y)?;
        settle_for(self.settle);
        system.click(MouseButton::Left)?;
        settle_for(self.settle);

        Ok(system.foreground_window()? == Some(window))
    }
}
