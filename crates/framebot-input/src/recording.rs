//! Recording injector used in place of real input during tests and dry runs.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use framebot_core::clock::Clock;
use framebot_core::types::MouseButton;

use crate::Injector;

/// Calls kept by [`RecordingInjector::new`].
pub const DEFAULT_HISTORY: usize = 15;

/// What a recorded call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuiCallKind {
    Hotkey { keys: Vec<String> },
    Click {
        button: MouseButton,
        pos: Option<(i32, i32)>,
    },
}

/// One injector call and the clock time it happened at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuiCall {
    #[serde(flatten)]
    pub kind: GuiCallKind,
    pub at: f64,
}

impl fmt::Display for GuiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GuiCallKind::Hotkey { keys } => write!(f, "{:>8.3}s hotkey {}", self.at, keys.join("+")),
            GuiCallKind::Click { button, pos: Some((x, y)) } => {
                write!(f, "{:>8.3}s click {} at ({}, {})", self.at, button, x, y)
            }
            GuiCallKind::Click { button, pos: None } => {
                write!(f, "{:>8.3}s click {}", self.at, button)
            }
        }
    }
}

/// Injector that records calls instead of sending them.
///
/// Keeps the most recent `capacity` calls. Can be told to decline, which
/// lets tests exercise the declined-fire path.
#[derive(Debug)]
pub struct RecordingInjector {
    clock: Clock,
    capacity: usize,
    calls: Mutex<VecDeque<GuiCall>>,
    accepting: AtomicBool,
    declined: AtomicU64,
}

impl RecordingInjector {
    /// Record up to [`DEFAULT_HISTORY`] calls stamped with `clock`.
    pub fn new(clock: Clock) -> Self {
        Self::with_capacity(clock, DEFAULT_HISTORY)
    }

    pub fn with_capacity(clock: Clock, capacity: usize) -> Self {
        Self {
            clock,
            capacity: capacity.max(1),
            calls: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            accepting: AtomicBool::new(true),
            declined: AtomicU64::new(0),
        }
    }

    /// When `false`, every call is declined and not recorded.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::Relaxed);
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<GuiCall> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Number of declined calls.
    pub fn declined(&self) -> u64 {
        self.declined.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.calls.lock().expect("calls mutex poisoned").clear();
        self.declined.store(0, Ordering::Relaxed);
    }

    fn record(&self, kind: GuiCallKind) -> bool {
        if !self.accepting.load(Ordering::Relaxed) {
            self.declined.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let call = GuiCall {
            kind,
            at: self.clock.now(),
        };
        tracing::debug!(call = %call, "Recorded input");
        let mut calls = self.calls.lock().expect("calls mutex poisoned");
        if calls.len() == self.capacity {
            calls.pop_front();
        }
        calls.push_back(call);
        true
    }
}

impl Injector for RecordingInjector {
    fn hotkey(&self, keys: &[&str]) -> bool {
        self.record(GuiCallKind::Hotkey {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        })
    }

    fn click(&self, button: MouseButton, pos: Option<(i32, i32)>) -> bool {
        self.record(GuiCallKind::Click { button, pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_with_clock_time() {
        let clock = Clock::virtual_fps(10.0).unwrap();
        let injector = RecordingInjector::new(clock.clone());

        assert!(injector.hotkey(&["w"]));
        clock.advance_frame();
        assert!(injector.click(MouseButton::Right, None));

        let calls = injector.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].kind,
            GuiCallKind::Hotkey {
                keys: vec!["w".into()]
            }
        );
        assert_eq!(calls[0].at, 0.0);
        assert_eq!(calls[1].at, 0.1);
    }

    #[test]
    fn test_history_is_bounded() {
        let injector = RecordingInjector::new(Clock::virtual_fps(1.0).unwrap());
        for i in 0..20 {
            let key = i.to_string();
            injector.hotkey(&[key.as_str()]);
        }
        let calls = injector.calls();
        assert_eq!(calls.len(), DEFAULT_HISTORY);
        assert_eq!(
            calls[0].kind,
            GuiCallKind::Hotkey {
                keys: vec!["5".into()]
            }
        );
    }

    #[test]
    fn test_declines_when_not_accepting() {
        let injector = RecordingInjector::new(Clock::virtual_fps(1.0).unwrap());
        injector.set_accepting(false);
        assert!(!injector.hotkey(&["g"]));
        assert!(!injector.click(MouseButton::Left, Some((1, 2))));
        assert!(injector.calls().is_empty());
        assert_eq!(injector.declined(), 2);

        injector.set_accepting(true);
        assert!(injector.hotkey(&["g"]));
        injector.clear();
        assert!(injector.calls().is_empty());
        assert_eq!(injector.declined(), 0);
    }

    #[test]
    fn test_display_and_json() {
        let call = GuiCall {
            kind: GuiCallKind::Click {
                button: MouseButton::Left,
                pos: Some((1270, 640)),
            },
            at: 1.5,
        };
        assert_eq!(call.to_string(), "   1.500s click left at (1270, 640)");

        let json = serde_json::to_value(GuiCall {
            kind: GuiCallKind::Hotkey {
                keys: vec!["ctrl".into(), "t".into()],
            },
            at: 0.25,
        })
        .unwrap();
        assert_eq!(json["kind"], "hotkey");
        assert_eq!(json["keys"][1], "t");
        assert_eq!(json["at"], 0.25);
    }
}
