//! Gates keyed by action name.
//!
//! Config-driven rotations look their gates up by name every frame. The
//! first lookup creates the gate; later lookups must ask for the same
//! timings, so two call sites cannot silently share a gate with different
//! rules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use framebot_core::error::{FramebotError, Result};

use crate::cast::{CastGate, CastLock};
use crate::cooldown::CooldownGate;
use crate::focus::FocusGate;

#[derive(Debug, Clone)]
enum Gate {
    Throttle(Arc<CooldownGate>),
    Spell(Arc<CastGate>),
}

/// Owns one gate per action name, all sharing a cast lock and (optionally)
/// a focus gate.
#[derive(Debug)]
pub struct GateRegistry {
    cast_lock: Arc<CastLock>,
    focus: Option<Arc<FocusGate>>,
    gates: Mutex<HashMap<String, Gate>>,
}

impl GateRegistry {
    pub fn new(cast_lock: Arc<CastLock>) -> Self {
        Self {
            cast_lock,
            focus: None,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Gates created after this call require focus.
    pub fn with_focus(mut self, focus: Arc<FocusGate>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn cast_lock(&self) -> &Arc<CastLock> {
        &self.cast_lock
    }

    /// The cooldown gate for `name`, created on first use.
    pub fn throttle(&self, name: &str, cooldown: f64) -> Result<Arc<CooldownGate>> {
        let mut gates = self.gates.lock().expect("registry mutex poisoned");
        match gates.get(name) {
            Some(Gate::Throttle(gate)) => {
                if gate.cooldown() != cooldown {
                    return Err(mismatch(name, "cooldown", gate.cooldown(), cooldown));
                }
                Ok(gate.clone())
            }
            Some(Gate::Spell(_)) => Err(FramebotError::Config(format!(
                "'{}' is already registered as a cast-gated action",
                name
            ))),
            None => {
                let mut gate = CooldownGate::new(name, cooldown)?;
                if let Some(focus) = &self.focus {
                    gate = gate.with_focus(focus.clone());
                }
                let gate = Arc::new(gate);
                gates.insert(name.to_string(), Gate::Throttle(gate.clone()));
                tracing::debug!(gate = %name, cooldown, "Registered throttle");
                Ok(gate)
            }
        }
    }

    /// The cast gate for `name`, created on first use.
    pub fn spell(&self, name: &str, cooldown: f64, cast_time: f64) -> Result<Arc<CastGate>> {
        let mut gates = self.gates.lock().expect("registry mutex poisoned");
        match gates.get(name) {
            Some(Gate::Spell(gate)) => {
                if gate.cooldown() != cooldown {
                    return Err(mismatch(name, "cooldown", gate.cooldown(), cooldown));
                }
                if gate.cast_time() != cast_time {
                    return Err(mismatch(name, "cast_time", gate.cast_time(), cast_time));
                }
                Ok(gate.clone())
            }
            Some(Gate::Throttle(_)) => Err(FramebotError::Config(format!(
                "'{}' is already registered as a throttled action",
                name
            ))),
            None => {
                let mut gate = CastGate::new(name, cooldown, cast_time, self.cast_lock.clone())?;
                if let Some(focus) = &self.focus {
                    gate = gate.with_focus(focus.clone());
                }
                let gate = Arc::new(gate);
                gates.insert(name.to_string(), Gate::Spell(gate.clone()));
                tracing::debug!(gate = %name, cooldown, cast_time, "Registered spell");
                Ok(gate)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.gates.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every cooldown and the shared cast window.
    pub fn reset_all(&self) {
        let gates = self.gates.lock().expect("registry mutex poisoned");
        for gate in gates.values() {
            match gate {
                Gate::Throttle(gate) => gate.reset(),
                Gate::Spell(gate) => gate.reset(),
            }
        }
        self.cast_lock.reset();
        tracing::info!(gates = gates.len(), "All gates reset");
    }
}

fn mismatch(name: &str, field: &str, existing: f64, requested: f64) -> FramebotError {
    FramebotError::Config(format!(
        "'{}' already registered with {} {}, requested {}",
        name, field, existing, requested
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_returns_same_gate() {
        let registry = GateRegistry::new(Arc::new(CastLock::new()));
        let first = registry.throttle("flask", 1.0).unwrap();
        first.try_fire(0.0, || true).unwrap();

        let second = registry.throttle("flask", 1.0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.try_fire(0.5, || true).unwrap().is_suppressed());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parameter_mismatch_is_an_error() {
        let registry = GateRegistry::new(Arc::new(CastLock::new()));
        registry.throttle("flask", 1.0).unwrap();
        assert!(registry.throttle("flask", 2.0).is_err());

        registry.spell("nova", 0.1, 0.5).unwrap();
        assert!(registry.spell("nova", 0.1, 0.6).is_err());
        assert!(registry.throttle("nova", 0.1).is_err());
        assert!(registry.spell("flask", 1.0, 0.0).is_err());
    }

    #[test]
    fn test_spells_share_the_cast_lock() {
        let registry = GateRegistry::new(Arc::new(CastLock::new()));
        let nova = registry.spell("nova", 0.0, 0.5).unwrap();
        let bolt = registry.spell("bolt", 0.0, 0.5).unwrap();
        assert!(nova.try_cast(0.0, || true).unwrap().is_fired());
        assert!(bolt.try_cast(0.25, || true).unwrap().is_suppressed());
        assert!(registry.cast_lock().is_casting(0.25));
    }

    #[test]
    fn test_reset_all() {
        let registry = GateRegistry::new(Arc::new(CastLock::new()));
        let flask = registry.throttle("flask", 5.0).unwrap();
        let nova = registry.spell("nova", 5.0, 5.0).unwrap();
        flask.try_fire(0.0, || true).unwrap();
        nova.try_cast(0.0, || true).unwrap();

        registry.reset_all();
        assert_eq!(flask.last_fire(), None);
        assert_eq!(nova.last_fire(), None);
        assert!(!registry.cast_lock().is_casting(1.0));
        assert!(nova.try_cast(1.0, || true).unwrap().is_fired());
    }

    #[test]
    fn test_invalid_timings_are_not_registered() {
        let registry = GateRegistry::new(Arc::new(CastLock::new()));
        assert!(registry.throttle("bad", -1.0).is_err());
        assert!(registry.is_empty());
    }
}
