//! Key chords and mouse clicks via Windows SendInput.
//!
//! On Windows, a chord is sent as key-down events in order followed by
//! key-up events in reverse order, in a single `SendInput` batch. Clicks
//! optionally move the cursor first with `SetCursorPos`.
//!
//! On non-Windows, provides a stub that declines every call.

use framebot_core::types::MouseButton;

use crate::Injector;

/// Injects input into whichever window has focus.
///
/// This does no focus checking of its own; pair it with a focus gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsInjector;

impl WindowsInjector {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl Injector for WindowsInjector {
    fn hotkey(&self, keys: &[&str]) -> bool {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP,
        };

        let Some(codes) = crate::keys::chord(keys) else {
            tracing::warn!(keys = ?keys, "Unknown key in chord, not sending");
            return false;
        };
        if codes.is_empty() {
            return false;
        }

        let key_event = |vk: u16, flags: u32| INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let mut inputs: Vec<INPUT> = codes.iter().map(|&vk| key_event(vk, 0)).collect();
        inputs.extend(codes.iter().rev().map(|&vk| key_event(vk, KEYEVENTF_KEYUP)));

        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            tracing::warn!(sent, expected = inputs.len(), "SendInput dropped key events");
            return false;
        }
        tracing::debug!(keys = ?keys, "Hotkey sent");
        true
    }

    fn click(&self, button: MouseButton, pos: Option<(i32, i32)>) -> bool {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
            MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN,
            MOUSEEVENTF_RIGHTUP, MOUSEINPUT,
        };
        use windows_sys::Win32::UI::WindowsAndMessaging::SetCursorPos;

        if let Some((x, y)) = pos {
            if unsafe { SetCursorPos(x, y) } == 0 {
                tracing::warn!(x, y, "SetCursorPos failed");
                return false;
            }
        }

        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
        };
        let mouse_event = |flags: u32| INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        let inputs = [mouse_event(down), mouse_event(up)];

        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            tracing::warn!(sent, "SendInput dropped mouse events");
            return false;
        }
        tracing::debug!(button = %button, ?pos, "Click sent");
        true
    }
}

#[cfg(not(target_os = "windows"))]
impl Injector for WindowsInjector {
    fn hotkey(&self, keys: &[&str]) -> bool {
        tracing::warn!(keys = ?keys, "WindowsInjector: SendInput not available on this platform");
        false
    }

    fn click(&self, button: MouseButton, _pos: Option<(i32, i32)>) -> bool {
        tracing::warn!(button = %button, "WindowsInjector: SendInput not available on this platform");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_declines_on_non_windows() {
        let injector = WindowsInjector::new();
        assert!(!injector.hotkey(&["w"]));
        assert!(!injector.click(MouseButton::Right, Some((10, 10))));
    }
}
