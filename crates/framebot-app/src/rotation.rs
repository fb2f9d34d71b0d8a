//! Config-driven action rotation.
//!
//! Each configured action becomes one gate in the context's registry:
//! actions with a cast time are cast-gated and share the cast lock, the
//! rest are plain throttles. A tick tries every action once, in config
//! order.

use std::sync::Arc;

use framebot_core::config::ActionConfig;
use framebot_core::error::Result;
use framebot_gate::{CastGate, Context, CooldownGate, GateOutcome, GateRegistry};
use framebot_input::Injector;

enum ActionGate {
    Throttle(Arc<CooldownGate>),
    Spell(Arc<CastGate>),
}

struct RotationAction {
    config: ActionConfig,
    gate: ActionGate,
}

/// What one action did on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub action: String,
    pub outcome: String,
    pub fired: bool,
}

/// The configured actions, in the order they are tried.
pub struct Rotation {
    actions: Vec<RotationAction>,
}

impl Rotation {
    pub fn from_config(actions: &[ActionConfig], registry: &GateRegistry) -> Result<Self> {
        let actions = actions
            .iter()
            .map(|config| {
                let gate = match config.cast_time_secs {
                    Some(cast_time) => ActionGate::Spell(registry.spell(
                        &config.name,
                        config.cooldown_secs,
                        cast_time,
                    )?),
                    None => ActionGate::Throttle(
                        registry.throttle(&config.name, config.cooldown_secs)?,
                    ),
                };
                Ok(RotationAction {
                    config: config.clone(),
                    gate,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(actions = actions.len(), "Rotation built");
        Ok(Self { actions })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Try every action once at the context's current time.
    ///
    /// Stops at the first collaborator error; gates already tried this tick
    /// keep their results.
    pub fn tick(&self, ctx: &Context) -> Result<Vec<ActionReport>> {
        let now = ctx.now();
        let injector = ctx.injector();
        let mut reports = Vec::with_capacity(self.actions.len());

        for action in &self.actions {
            let send = || perform(&action.config, injector.as_ref());
            let outcome: GateOutcome<()> = match &action.gate {
                ActionGate::Throttle(gate) => gate.try_fire(now, send)?,
                ActionGate::Spell(gate) => gate.try_cast(now, send)?,
            };
            if outcome.is_fired() {
                ctx.note(format!("{} fired", action.config.name));
            }
            reports.push(ActionReport {
                action: action.config.name.clone(),
                outcome: outcome.to_string(),
                fired: outcome.is_fired(),
            });
        }
        Ok(reports)
    }
}

/// Send an action's chord, then its click. `false` if anything was not sent.
fn perform(action: &ActionConfig, injector: &dyn Injector) -> bool {
    if !action.keys.is_empty() {
        let keys: Vec<&str> = action.keys.iter().map(String::as_str).collect();
        if !injector.hotkey(&keys) {
            return false;
        }
    }
    match action.click {
        Some(button) => injector.click(button, None),
        None => true,
    }
}
