//! Injector slot whose implementation can be replaced at runtime.
//!
//! Policies hold the slot; scoped test overrides swap a recording injector
//! in and put the previous one back when they end.

use std::sync::{Arc, RwLock};

use framebot_core::types::MouseButton;

use crate::Injector;

/// Delegates to whichever injector is currently installed.
pub struct SwappableInjector {
    current: RwLock<Arc<dyn Injector>>,
}

impl SwappableInjector {
    pub fn new(initial: Arc<dyn Injector>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Install `next` and return the injector it replaced.
    pub fn swap(&self, next: Arc<dyn Injector>) -> Arc<dyn Injector> {
        let mut current = self.current.write().expect("injector lock poisoned");
        std::mem::replace(&mut *current, next)
    }

    /// The injector currently installed.
    pub fn current(&self) -> Arc<dyn Injector> {
        Arc::clone(&self.current.read().expect("injector lock poisoned"))
    }
}

impl std::fmt::Debug for SwappableInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwappableInjector").finish_non_exhaustive()
    }
}

impl Injector for SwappableInjector {
    fn hotkey(&self, keys: &[&str]) -> bool {
        // Clone out so the lock is not held while input is sent.
        self.current().hotkey(keys)
    }

    fn click(&self, button: MouseButton, pos: Option<(i32, i32)>) -> bool {
        self.current().click(button, pos)
    }
}
