//! Global hotkey that toggles the action rotation on and off.
//!
//! On Windows, uses the `global-hotkey` crate to register a system-wide
//! hotkey. The frame loop polls `was_pressed` once per frame.
//!
//! On non-Windows, provides a stub that never reports a press.

use framebot_core::error::FramebotError;

/// Manages a global toggle hotkey.
pub struct HotkeyService {
    key: String,
    #[cfg(target_os = "windows")]
    manager: global_hotkey::GlobalHotKeyManager,
    #[cfg(target_os = "windows")]
    hotkey: Option<global_hotkey::hotkey::HotKey>,
}

impl HotkeyService {
    /// Parse `key` (e.g. "F9", "Ctrl+Shift+D") and register it with the OS.
    #[cfg(target_os = "windows")]
    pub fn new(key: &str) -> Result<Self, FramebotError> {
        use global_hotkey::hotkey::HotKey;
        use global_hotkey::GlobalHotKeyManager;
        use std::str::FromStr;

        let manager = GlobalHotKeyManager::new().map_err(|e| {
            FramebotError::Hotkey(format!("Failed to create hotkey manager: {}", e))
        })?;

        let hotkey = HotKey::from_str(key).map_err(|e| {
            FramebotError::Hotkey(format!("Failed to parse hotkey '{}': {}", key, e))
        })?;

        manager.register(hotkey).map_err(|e| {
            FramebotError::Hotkey(format!("Failed to register hotkey '{}': {}", key, e))
        })?;

        tracing::info!(key = %key, "Global hotkey registered");

        Ok(Self {
            key: key.to_string(),
            manager,
            hotkey: Some(hotkey),
        })
    }

    /// Stub constructor for non-Windows platforms.
    #[cfg(not(target_os = "windows"))]
    pub fn new(key: &str) -> Result<Self, FramebotError> {
        tracing::warn!(key = %key, "Global hotkey is only available on Windows");
        Ok(Self {
            key: key.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if the hotkey was pressed since the last check.
    #[cfg(target_os = "windows")]
    pub fn was_pressed(&self) -> bool {
        use global_hotkey::{GlobalHotKeyEvent, HotKeyState};

        let Some(hotkey) = &self.hotkey else {
            return false;
        };
        let mut pressed = false;
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.id() == hotkey.id() && event.state() == HotKeyState::Pressed {
                pressed = true;
            }
        }
        pressed
    }

    /// Stub: always returns false on non-Windows.
    #[cfg(not(target_os = "windows"))]
    pub fn was_pressed(&self) -> bool {
        false
    }

    /// Unregister the hotkey.
    #[cfg(target_os = "windows")]
    pub fn unregister(&mut self) {
        if let Some(hotkey) = self.hotkey.take() {
            let _ = self.manager.unregister(hotkey);
            tracing::info!(key = %self.key, "Global hotkey unregistered");
        }
    }

    /// Stub unregister.
    #[cfg(not(target_os = "windows"))]
    pub fn unregister(&mut self) {}
}

#[cfg(target_os = "windows")]
impl Drop for HotkeyService {
    fn drop(&mut self) {
        self.unregister();
    }
}
