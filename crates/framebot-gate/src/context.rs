//! Per-session context threaded through every policy.
//!
//! Holds the clock, the focus gate, the injector slot and the cast lock,
//! plus the per-frame debug notes shown alongside each frame. Tests swap
//! parts of it out with the scoped `mock_*` methods.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use framebot_core::clock::{Clock, ClockOverride};
use framebot_core::error::Result;
use framebot_input::{Injector, RecordingInjector, SwappableInjector};

use crate::cast::CastLock;
use crate::focus::FocusGate;
use crate::registry::GateRegistry;

pub struct Context {
    clock: Clock,
    focus: Arc<FocusGate>,
    injector: Arc<SwappableInjector>,
    cast_lock: Arc<CastLock>,
    notes: Mutex<Vec<String>>,
}

impl Context {
    pub fn new(clock: Clock, focus: Arc<FocusGate>, injector: Arc<dyn Injector>) -> Self {
        Self {
            clock,
            focus,
            injector: Arc::new(SwappableInjector::new(injector)),
            cast_lock: Arc::new(CastLock::new()),
            notes: Mutex::new(Vec::new()),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn focus(&self) -> &Arc<FocusGate> {
        &self.focus
    }

    /// The injector slot. Policies send input through this so mocks can
    /// replace the real injector underneath them.
    pub fn injector(&self) -> &Arc<SwappableInjector> {
        &self.injector
    }

    pub fn cast_lock(&self) -> &Arc<CastLock> {
        &self.cast_lock
    }

    /// A fresh registry whose gates share this context's cast lock and
    /// require its focus gate.
    pub fn gate_registry(&self) -> GateRegistry {
        GateRegistry::new(self.cast_lock.clone()).with_focus(self.focus.clone())
    }

    /// Start a new frame: advance the clock and clear the previous frame's
    /// notes. Returns the new frame count.
    pub fn frame(&self) -> u64 {
        let frame = self.clock.advance_frame();
        self.notes.lock().expect("notes mutex poisoned").clear();
        frame
    }

    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Attach a debug note to the current frame.
    pub fn note(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(frame = self.clock.frame_count(), note = %message, "Frame note");
        self.notes.lock().expect("notes mutex poisoned").push(message);
    }

    /// Notes attached to the current frame, in order.
    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().expect("notes mutex poisoned").clone()
    }

    /// Run `f` and note how long it took in wall time.
    ///
    /// The note is added whatever `f` returns, so a failing section still
    /// shows up in the frame's notes.
    pub fn timed<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.note(format!("{} time: {:.3}", label, start.elapsed().as_secs_f64()));
        result
    }

    /// Drive the clock virtually at `fps` until the guard drops.
    pub fn mock_time(&self, fps: f64) -> Result<MockGuard> {
        let mut guard = MockGuard::empty();
        guard.clock = Some(self.clock.override_virtual(fps)?);
        Ok(guard)
    }

    /// Record input instead of sending it, and treat the target window as
    /// focused, until the guard drops.
    pub fn mock_gui(&self) -> MockGuard {
        let recorder = Arc::new(RecordingInjector::new(self.clock.clone()));
        let previous_injector = self.injector.swap(recorder.clone());
        let previous_bypass = self.focus.set_bypass(true);
        tracing::debug!("GUI mocked");
        MockGuard {
            injector: Some((self.injector.clone(), previous_injector)),
            focus: Some((self.focus.clone(), previous_bypass)),
            recorder: Some(recorder),
            clock: None,
        }
    }

    /// [`Context::mock_time`] and [`Context::mock_gui`] together.
    pub fn mock_all(&self, fps: f64) -> Result<MockGuard> {
        let mut guard = self.mock_time(fps)?;
        let gui = self.mock_gui();
        guard.take_gui(gui);
        Ok(guard)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("clock", &self.clock.mode())
            .field("frame", &self.clock.frame_count())
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

/// Scoped override returned by the `Context::mock_*` methods.
///
/// Dropping it puts back the injector and focus setting, then the clock,
/// including while unwinding from a panic.
#[must_use = "the mock ends as soon as the guard is dropped"]
pub struct MockGuard {
    injector: Option<(Arc<SwappableInjector>, Arc<dyn Injector>)>,
    focus: Option<(Arc<FocusGate>, bool)>,
    recorder: Option<Arc<RecordingInjector>>,
    clock: Option<ClockOverride>,
}

impl MockGuard {
    fn empty() -> Self {
        Self {
            injector: None,
            focus: None,
            recorder: None,
            clock: None,
        }
    }

    fn take_gui(&mut self, mut other: MockGuard) {
        self.injector = other.injector.take();
        self.focus = other.focus.take();
        self.recorder = other.recorder.take();
    }

    /// The recording injector installed by this guard, if it mocks the GUI.
    pub fn recorder(&self) -> Option<&Arc<RecordingInjector>> {
        self.recorder.as_ref()
    }
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        if let Some((slot, previous)) = self.injector.take() {
            slot.swap(previous);
        }
        if let Some((focus, previous)) = self.focus.take() {
            focus.set_bypass(previous);
        }
        // Dropping the override restores the clock.
        self.clock.take();
    }
}
