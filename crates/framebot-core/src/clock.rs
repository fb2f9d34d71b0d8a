//! Pluggable time source shared by every gate.
//!
//! Production code runs on wall-clock time; tests drive a virtual clock one
//! frame at a time so cooldown logic can be checked without sleeping. Both
//! go through the same `Clock::now()` call, and switching modes is always a
//! scoped override that restores the previous mode when its guard drops.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{FramebotError, Result};

/// Which time source a [`Clock`] is currently reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Wall-clock seconds since the UNIX epoch.
    Real,
    /// `frame_count / fps`.
    Virtual { fps: f64 },
    /// A pinned instant, independent of frames.
    Fixed(f64),
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockMode::Real => write!(f, "real"),
            ClockMode::Virtual { fps } => write!(f, "virtual@{}fps", fps),
            ClockMode::Fixed(t) => write!(f, "fixed@{}", t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockState {
    mode: ClockMode,
    frame_count: u64,
}

/// Shared, cloneable time source.
///
/// All clones observe the same mode and frame counter.
#[derive(Debug, Clone)]
pub struct Clock {
    state: Arc<Mutex<ClockState>>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}

impl Clock {
    /// A clock reading wall time.
    pub fn real() -> Self {
        Self::with_mode(ClockMode::Real)
    }

    /// A clock driven by [`Clock::advance_frame`] at the given frame rate.
    pub fn virtual_fps(fps: f64) -> Result<Self> {
        Ok(Self::with_mode(ClockMode::Virtual {
            fps: validate_fps(fps)?,
        }))
    }

    fn with_mode(mode: ClockMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                mode,
                frame_count: 0,
            })),
        }
    }

    /// Current time in seconds.
    pub fn now(&self) -> f64 {
        let state = *self.state.lock().expect("clock mutex poisoned");
        match state.mode {
            ClockMode::Real => wall_seconds(),
            ClockMode::Virtual { fps } => state.frame_count as f64 / fps,
            ClockMode::Fixed(t) => t,
        }
    }

    /// Mark one processed frame. Returns the new frame count.
    ///
    /// The counter advances in every mode; only virtual mode derives time
    /// from it.
    pub fn advance_frame(&self) -> u64 {
        let mut state = self.state.lock().expect("clock mutex poisoned");
        state.frame_count += 1;
        state.frame_count
    }

    /// Number of frames processed since the clock (or the active virtual
    /// override) started.
    pub fn frame_count(&self) -> u64 {
        self.state.lock().expect("clock mutex poisoned").frame_count
    }

    /// The active mode.
    pub fn mode(&self) -> ClockMode {
        self.state.lock().expect("clock mutex poisoned").mode
    }

    /// Switch to virtual time until the returned guard is dropped.
    ///
    /// The frame counter restarts at 0 so `now()` starts at 0.0; the
    /// previous mode and counter come back when the guard drops.
    pub fn override_virtual(&self, fps: f64) -> Result<ClockOverride> {
        let fps = validate_fps(fps)?;
        Ok(self.push(ClockState {
            mode: ClockMode::Virtual { fps },
            frame_count: 0,
        }))
    }

    /// Pin `now()` to `at` until the returned guard is dropped.
    pub fn override_fixed(&self, at: f64) -> Result<ClockOverride> {
        if !at.is_finite() {
            return Err(FramebotError::Config(format!(
                "fixed clock time must be finite, got {}",
                at
            )));
        }
        let frame_count = self.frame_count();
        Ok(self.push(ClockState {
            mode: ClockMode::Fixed(at),
            frame_count,
        }))
    }

    fn push(&self, next: ClockState) -> ClockOverride {
        let mut state = self.state.lock().expect("clock mutex poisoned");
        let previous = *state;
        *state = next;
        tracing::debug!(from = %previous.mode, to = %next.mode, "Clock override entered");
        ClockOverride {
            clock: self.clone(),
            previous,
        }
    }
}

/// Guard returned by the `Clock::override_*` methods.
///
/// Restores the exact previous mode and frame counter on drop, including
/// while unwinding from a panic.
#[must_use = "the override ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ClockOverride {
    clock: Clock,
    previous: ClockState,
}

impl Drop for ClockOverride {
    fn drop(&mut self) {
        // A poisoned lock still holds valid state; restore regardless.
        let mut state = match self.clock.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!(to = %self.previous.mode, "Clock override restored");
        *state = self.previous;
    }
}

fn validate_fps(fps: f64) -> Result<f64> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(FramebotError::Config(format!(
            "fps must be a finite number > 0, got {}",
            fps
        )));
    }
    Ok(fps)
}

fn wall_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Slack used when comparing instants, in seconds.
///
/// Frame times (`frame / fps`) and deadlines (`fire + cooldown`) are built
/// from different float operations and can disagree in the last bit.
pub const TIME_EPSILON: f64 = 1e-9;

/// Whether `now` has reached `deadline`, allowing [`TIME_EPSILON`] of
/// rounding error.
pub fn reached(now: f64, deadline: f64) -> bool {
    now + TIME_EPSILON >= deadline
}
