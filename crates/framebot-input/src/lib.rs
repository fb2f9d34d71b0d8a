//! Framebot Input crate - synthetic input behind a narrow trait.
//!
//! The gates treat an injector's boolean result as meaningful: `false`
//! means the action was declined and must not consume a cooldown. Real
//! injection (Windows SendInput) and the recording stub used by tests are
//! interchangeable through `SwappableInjector`.

pub mod hotkey;
pub mod keys;
pub mod recording;
pub mod swap;
pub mod windows_input;

use std::sync::Arc;

use framebot_core::types::MouseButton;

pub use hotkey::HotkeyService;
pub use recording::{GuiCall, GuiCallKind, RecordingInjector, DEFAULT_HISTORY};
pub use swap::SwappableInjector;
pub use windows_input::WindowsInjector;

/// Sends synthetic key chords and mouse clicks.
pub trait Injector: Send + Sync {
    /// Press `keys` together (in order) and release them (in reverse).
    /// Returns `false` if the chord was not sent.
    fn hotkey(&self, keys: &[&str]) -> bool;

    /// Click `button`, optionally after moving the cursor to `pos`.
    /// Returns `false` if the click was not sent.
    fn click(&self, button: MouseButton, pos: Option<(i32, i32)>) -> bool;
}

impl<T: Injector + ?Sized> Injector for Arc<T> {
    fn hotkey(&self, keys: &[&str]) -> bool {
        (**self).hotkey(keys)
    }

    fn click(&self, button: MouseButton, pos: Option<(i32, i32)>) -> bool {
        (**self).click(button, pos)
    }
}
