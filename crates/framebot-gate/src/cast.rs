//! Cast-time lockout shared across actions.
//!
//! A spell-like action has its own cooldown, but while any cast-gated
//! action is still casting, no other cast-gated action in the same scope
//! may start. The shared window lives in a [`CastLock`]; each action gets
//! its own [`CastGate`].

use std::sync::{Arc, Mutex, MutexGuard};

use framebot_core::clock::reached;
use framebot_core::error::{ensure_duration, FramebotError, Result};

use crate::cooldown::CooldownGate;
use crate::focus::FocusGate;
use crate::outcome::{Firing, GateOutcome, SuppressReason};

/// Cooldown used when an action does not name one.
pub const DEFAULT_SPELL_COOLDOWN: f64 = 0.1;

/// Cast time used when an action does not name one.
pub const DEFAULT_CAST_TIME: f64 = 0.0;

#[derive(Debug)]
struct CastState {
    next_allowed: f64,
    /// A cast-gated action sharing this lock is running its action.
    reserved: bool,
}

/// The shared "no cast before" instant.
#[derive(Debug)]
pub struct CastLock {
    state: Mutex<CastState>,
}

impl Default for CastLock {
    fn default() -> Self {
        Self::new()
    }
}

impl CastLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CastState {
                next_allowed: f64::NEG_INFINITY,
                reserved: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CastState> {
        self.state.lock().expect("cast lock mutex poisoned")
    }

    /// Whether a cast started earlier is still running at `now`.
    pub fn is_casting(&self, now: f64) -> bool {
        !reached(now, self.state().next_allowed)
    }

    /// Seconds until the next cast may start, 0.0 if one may start now.
    pub fn remaining(&self, now: f64) -> f64 {
        let next_allowed = self.state().next_allowed;
        if reached(now, next_allowed) {
            0.0
        } else {
            next_allowed - now
        }
    }

    /// End any running cast.
    pub fn reset(&self) {
        self.state().next_allowed = f64::NEG_INFINITY;
    }
}

/// Holds the cast slot while an action runs; released on drop.
struct CastReservation<'a> {
    lock: &'a CastLock,
}

impl CastReservation<'_> {
    fn start_cast(&self, until: f64) {
        self.lock.state().next_allowed = until;
    }
}

impl Drop for CastReservation<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().unwrap_or_else(|e| e.into_inner());
        state.reserved = false;
    }
}

/// A cooldown gate that also respects, and starts, the shared cast window.
#[derive(Debug)]
pub struct CastGate {
    inner: CooldownGate,
    cast_time: f64,
    lock: Arc<CastLock>,
}

impl CastGate {
    pub fn new(
        name: impl Into<String>,
        cooldown: f64,
        cast_time: f64,
        lock: Arc<CastLock>,
    ) -> Result<Self> {
        let inner = CooldownGate::new(name, cooldown)?;
        let cast_time = ensure_duration(&format!("{}.cast_time", inner.name()), cast_time)?;
        Ok(Self {
            inner,
            cast_time,
            lock,
        })
    }

    /// Require the target window to have focus whenever this gate fires.
    pub fn with_focus(mut self, focus: Arc<FocusGate>) -> Self {
        self.inner = self.inner.with_focus(focus);
        self
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn cooldown(&self) -> f64 {
        self.inner.cooldown()
    }

    pub fn cast_time(&self) -> f64 {
        self.cast_time
    }

    pub fn last_fire(&self) -> Option<f64> {
        self.inner.last_fire()
    }

    pub fn lock(&self) -> &Arc<CastLock> {
        &self.lock
    }

    /// Forget this action's last fire. The shared cast window is not
    /// touched; reset the [`CastLock`] for that.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Run `action` unless a cast is in progress or the cooldown has not
    /// elapsed. A fire starts a cast of `cast_time` seconds.
    ///
    /// The shared lock is not held while the action runs, but the cast slot
    /// is: a nested cast on any gate sharing the lock is suppressed as
    /// casting.
    pub fn try_cast<F, R>(&self, now: f64, action: F) -> Result<GateOutcome<R::Output>>
    where
        F: FnOnce() -> R,
        R: Firing,
    {
        self.try_cast_with(now, || Ok::<R, FramebotError>(action()))
    }

    /// Fallible form of [`CastGate::try_cast`]. An error leaves both the
    /// cooldown and the cast window unchanged.
    pub fn try_cast_with<F, R, E>(
        &self,
        now: f64,
        action: F,
    ) -> std::result::Result<GateOutcome<R::Output>, E>
    where
        F: FnOnce() -> std::result::Result<R, E>,
        R: Firing,
        E: From<FramebotError>,
    {
        let reservation = {
            let mut state = self.lock.state();
            if state.reserved || !reached(now, state.next_allowed) {
                tracing::trace!(gate = %self.name(), now, until = state.next_allowed, "Suppressed by cast");
                return Ok(GateOutcome::Suppressed(SuppressReason::Casting));
            }
            state.reserved = true;
            CastReservation {
                lock: self.lock.as_ref(),
            }
        };

        let outcome = self.inner.try_fire_with(now, action)?;
        if outcome.is_fired() {
            let until = now + self.cast_time;
            reservation.start_cast(until);
            if self.cast_time > 0.0 {
                tracing::debug!(gate = %self.name(), until, "Cast started");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framebot_core::clock::Clock;
    use std::sync::mpsc;
    use std::time::Duration;

    fn pair(cast_time: f64) -> (CastGate, CastGate, Arc<CastLock>) {
        let lock = Arc::new(CastLock::new());
        let a = CastGate::new("a", 0.0, cast_time, lock.clone()).unwrap();
        let b = CastGate::new("b", 0.0, cast_time, lock.clone()).unwrap();
        (a, b, lock)
    }

    #[test]
    fn test_cast_blocks_other_actions() {
        let (a, b, lock) = pair(0.5);
        assert!(a.try_cast(0.0, || true).unwrap().is_fired());
        assert!(lock.is_casting(0.3));
        assert_eq!(
            b.try_cast(0.3, || true).unwrap(),
            GateOutcome::Suppressed(SuppressReason::Casting)
        );
        assert!(!lock.is_casting(0.5));
        assert!(b.try_cast(0.5, || true).unwrap().is_fired());
    }

    #[test]
    fn test_casting_does_not_touch_inner_cooldown() {
        let (a, b, _) = pair(1.0);
        a.try_cast(0.0, || true).unwrap();
        b.try_cast(0.5, || true).unwrap();
        assert_eq!(b.last_fire(), None);
    }

    #[test]
    fn test_zero_cast_time_never_locks() {
        let (a, b, lock) = pair(0.0);
        assert!(a.try_cast(1.0, || true).unwrap().is_fired());
        assert!(!lock.is_casting(1.0));
        assert!(b.try_cast(1.0, || true).unwrap().is_fired());
    }

    #[test]
    fn test_cooldown_still_applies() {
        let lock = Arc::new(CastLock::new());
        let gate = CastGate::new("nova", 2.0, 0.5, lock).unwrap();
        assert!(gate.try_cast(0.0, || true).unwrap().is_fired());
        assert_eq!(
            gate.try_cast(1.0, || true).unwrap(),
            GateOutcome::Suppressed(SuppressReason::Cooldown)
        );
        assert!(gate.try_cast(2.0, || true).unwrap().is_fired());
    }

    #[test]
    fn test_decline_and_error_do_not_start_cast() {
        let (a, _, lock) = pair(1.0);
        assert_eq!(a.try_cast(0.0, || false).unwrap(), GateOutcome::Declined);
        assert!(!lock.is_casting(0.0));

        let result = a.try_cast_with(0.0, || -> Result<bool> {
            Err(FramebotError::Input("blocked".into()))
        });
        assert!(result.is_err());
        assert!(!lock.is_casting(0.0));
        assert_eq!(a.last_fire(), None);
        assert!(a.try_cast(0.0, || true).unwrap().is_fired());
    }

    #[test]
    fn test_remaining_and_reset() {
        let (a, _, lock) = pair(0.5);
        assert_eq!(lock.remaining(0.0), 0.0);
        a.try_cast(1.0, || true).unwrap();
        assert_eq!(lock.remaining(1.25), 0.25);
        lock.reset();
        assert!(!lock.is_casting(1.25));
    }

    #[test]
    fn test_rejects_invalid_cast_time() {
        let lock = Arc::new(CastLock::new());
        assert!(CastGate::new("x", 0.1, -0.5, lock.clone()).is_err());
        assert!(CastGate::new("x", 0.1, f64::INFINITY, lock).is_err());
    }

    #[test]
    fn test_default_timings() {
        let gate = CastGate::new(
            "default",
            DEFAULT_SPELL_COOLDOWN,
            DEFAULT_CAST_TIME,
            Arc::new(CastLock::default()),
        )
        .unwrap();
        assert_eq!(gate.cooldown(), 0.1);
        assert_eq!(gate.cast_time(), 0.0);
    }

    #[test]
    fn test_cast_boundary_on_virtual_clock() {
        let clock = Clock::virtual_fps(10.0).unwrap();
        let (a, b, lock) = pair(0.2);

        clock.advance_frame();
        assert!(a.try_cast(clock.now(), || true).unwrap().is_fired());
        clock.advance_frame();
        assert!(lock.is_casting(clock.now()));
        clock.advance_frame();
        assert!(!lock.is_casting(clock.now()));
        assert_eq!(lock.remaining(clock.now()), 0.0);
        assert!(b.try_cast(clock.now(), || true).unwrap().is_fired());
    }

    #[test]
    fn test_action_can_read_cast_lock() {
        let lock = Arc::new(CastLock::new());
        let gate = CastGate::new("nova", 0.0, 0.5, lock.clone()).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let outcome = gate
                .try_cast(0.0, || !lock.is_casting(0.0) && lock.remaining(0.0) == 0.0)
                .unwrap();
            let _ = tx.send((outcome, lock.is_casting(0.25)));
        });
        let (outcome, casting_after) = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("cast blocked on its own lock");
        assert_eq!(outcome, GateOutcome::Fired(()));
        assert!(casting_after);
    }

    #[test]
    fn test_nested_cast_is_suppressed() {
        let (a, b, lock) = pair(0.5);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut nested = None;
            let outcome = a
                .try_cast(0.0, || {
                    nested = Some(b.try_cast(0.0, || true).unwrap());
                    true
                })
                .unwrap();
            let _ = tx.send((outcome, nested, b.last_fire()));
        });
        let (outcome, nested, b_last_fire) = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("nested cast blocked");
        assert!(outcome.is_fired());
        assert_eq!(nested, Some(GateOutcome::Suppressed(SuppressReason::Casting)));
        assert_eq!(b_last_fire, None);
        assert!(lock.is_casting(0.25));
    }
}
