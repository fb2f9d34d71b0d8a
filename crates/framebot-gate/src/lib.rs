//! Framebot Gate crate - decides whether a proposed action may fire now.
//!
//! Every per-frame "try to do X" call goes through a gate:
//! - [`CooldownGate`]: minimum interval between successful fires.
//! - [`CastGate`]: a cooldown plus a cast-time lockout shared through a
//!   [`CastLock`] by every cast-gated action in a scope.
//! - [`FocusGate`]: cached check that the game window has focus.
//!
//! Gates report a [`GateOutcome`]. Only a fired action consumes a cooldown
//! or starts a cast; declined, suppressed and failed attempts leave gate
//! state untouched.

pub mod cast;
pub mod context;
pub mod cooldown;
pub mod focus;
pub mod outcome;
pub mod registry;

pub use cast::{CastGate, CastLock, DEFAULT_CAST_TIME, DEFAULT_SPELL_COOLDOWN};
pub use context::{Context, MockGuard};
pub use cooldown::CooldownGate;
pub use focus::{FocusGate, DEFAULT_REFRESH_INTERVAL};
pub use outcome::{Firing, GateOutcome, SuppressReason};
pub use registry::GateRegistry;
