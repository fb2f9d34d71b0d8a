//! Result of asking a gate to fire an action.

use std::fmt;

/// Why a gate refused to run an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// The action's own cooldown has not elapsed.
    Cooldown,
    /// Another cast-gated action is still casting.
    Casting,
    /// The target window does not have focus.
    Unfocused,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::Cooldown => write!(f, "cooldown"),
            SuppressReason::Casting => write!(f, "casting"),
            SuppressReason::Unfocused => write!(f, "unfocused"),
        }
    }
}

/// What happened when a gate was asked to fire.
///
/// `Declined` and `Suppressed` are both non-fires, but they differ in who
/// said no: the action itself, or the gate before the action ran.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome<T> {
    /// The action ran and reported success.
    Fired(T),
    /// The action ran and reported nothing to do.
    Declined,
    /// The gate did not run the action.
    Suppressed(SuppressReason),
}

impl<T> GateOutcome<T> {
    pub fn is_fired(&self) -> bool {
        matches!(self, GateOutcome::Fired(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, GateOutcome::Suppressed(_))
    }

    /// The suppression reason, if the gate refused.
    pub fn suppress_reason(&self) -> Option<SuppressReason> {
        match self {
            GateOutcome::Suppressed(reason) => Some(*reason),
            _ => None,
        }
    }

    /// The action's value, if it fired.
    pub fn fired(self) -> Option<T> {
        match self {
            GateOutcome::Fired(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GateOutcome<U> {
        match self {
            GateOutcome::Fired(value) => GateOutcome::Fired(f(value)),
            GateOutcome::Declined => GateOutcome::Declined,
            GateOutcome::Suppressed(reason) => GateOutcome::Suppressed(reason),
        }
    }
}

impl<T> fmt::Display for GateOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOutcome::Fired(_) => write!(f, "fired"),
            GateOutcome::Declined => write!(f, "declined"),
            GateOutcome::Suppressed(reason) => write!(f, "suppressed ({})", reason),
        }
    }
}

/// Action return values a gate can interpret as "fired" or "declined".
///
/// `true` and `Some(_)` fire; `false` and `None` decline.
pub trait Firing {
    type Output;

    fn into_fired(self) -> Option<Self::Output>;
}

impl Firing for bool {
    type Output = ();

    fn into_fired(self) -> Option<()> {
        self.then_some(())
    }
}

impl<T> Firing for Option<T> {
    type Output = T;

    fn into_fired(self) -> Option<T> {
        self
    }
}
