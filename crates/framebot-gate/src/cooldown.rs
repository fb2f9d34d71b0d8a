//! Minimum-interval rate limiter for a single action.

use std::sync::{Arc, Mutex, MutexGuard};

use framebot_core::clock::reached;
use framebot_core::error::{ensure_duration, FramebotError, Result};

use crate::focus::FocusGate;
use crate::outcome::{Firing, GateOutcome, SuppressReason};

#[derive(Debug, Default)]
struct FireState {
    last_fire: Option<f64>,
    /// An attempt has passed the checks and its action is running.
    in_flight: bool,
}

/// Lets an action fire at most once per `cooldown` seconds.
///
/// The cooldown starts only when the action reports success. An attempt
/// reserves the gate under its mutex, runs the action unlocked and then
/// records the result, so the action may read the gate (or fire other
/// gates) freely. While one attempt is in flight any other attempt on the
/// same gate is suppressed.
#[derive(Debug)]
pub struct CooldownGate {
    name: String,
    cooldown: f64,
    focus: Option<Arc<FocusGate>>,
    state: Mutex<FireState>,
}

/// Clears the in-flight mark when an attempt ends, including by error or
/// panic inside the action.
struct Reservation<'a> {
    state: &'a Mutex<FireState>,
}

impl Reservation<'_> {
    fn commit(&self, now: f64) {
        lock_state(self.state).last_fire = Some(now);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight = false;
    }
}

fn lock_state(state: &Mutex<FireState>) -> MutexGuard<'_, FireState> {
    state.lock().expect("cooldown mutex poisoned")
}

impl CooldownGate {
    pub fn new(name: impl Into<String>, cooldown: f64) -> Result<Self> {
        let name = name.into();
        let cooldown = ensure_duration(&format!("{}.cooldown", name), cooldown)?;
        Ok(Self {
            name,
            cooldown,
            focus: None,
            state: Mutex::new(FireState::default()),
        })
    }

    /// Require the target window to have focus whenever this gate fires.
    pub fn with_focus(mut self, focus: Arc<FocusGate>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    /// Time of the last successful fire.
    pub fn last_fire(&self) -> Option<f64> {
        lock_state(&self.state).last_fire
    }

    /// Whether the cooldown has elapsed at `now`. Does not check focus.
    pub fn is_ready(&self, now: f64) -> bool {
        self.elapsed(self.last_fire(), now)
    }

    /// Forget the last fire so the next attempt is not throttled.
    pub fn reset(&self) {
        lock_state(&self.state).last_fire = None;
    }

    /// Run `action` if the cooldown has elapsed and focus (if required) is
    /// present.
    ///
    /// `true`/`Some` from the action counts as a fire and restarts the
    /// cooldown at `now`; `false`/`None` is a decline and leaves it alone.
    /// Only a failed focus query produces an error.
    pub fn try_fire<F, R>(&self, now: f64, action: F) -> Result<GateOutcome<R::Output>>
    where
        F: FnOnce() -> R,
        R: Firing,
    {
        self.try_fire_with(now, || Ok::<R, FramebotError>(action()))
    }

    /// Like [`CooldownGate::try_fire`] for an action that can fail. The
    /// action's error is returned as is and the gate is left unchanged.
    pub fn try_fire_with<F, R, E>(
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
            let mut state = lock_state(&self.state);
            if state.in_flight || !self.elapsed(state.last_fire, now) {
                tracing::trace!(gate = %self.name, now, in_flight = state.in_flight, "Suppressed by cooldown");
                return Ok(GateOutcome::Suppressed(SuppressReason::Cooldown));
            }
            state.in_flight = true;
            Reservation { state: &self.state }
        };

        if let Some(focus) = &self.focus {
            if !focus.is_target_focused_at(now)? {
                tracing::debug!(gate = %self.name, now, "Suppressed, target window not focused");
                return Ok(GateOutcome::Suppressed(SuppressReason::Unfocused));
            }
        }

        match action()?.into_fired() {
            Some(value) => {
                reservation.commit(now);
                tracing::info!(gate = %self.name, now, "Action fired");
                Ok(GateOutcome::Fired(value))
            }
            None => {
                tracing::debug!(gate = %self.name, now, "Action declined");
                Ok(GateOutcome::Declined)
            }
        }
    }

    fn elapsed(&self, last_fire: Option<f64>, now: f64) -> bool {
        match last_fire {
            None => true,
            Some(at) => reached(now, at + self.cooldown),
        }
    }
}
