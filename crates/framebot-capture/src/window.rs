//! Active-window query used by the focus gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use framebot_core::error::{FramebotError, Result};

/// Reports the title of the window that currently has keyboard focus.
///
/// This is the expensive call the focus gate amortizes, so implementations
/// should not cache on their own.
pub trait ActiveWindow: Send + Sync {
    /// Title of the focused window. An empty string means the query saw no
    /// titled window; an error means the query itself failed.
    fn active_window_title(&self) -> Result<String>;
}

/// Scriptable active-window source for tests.
///
/// Counts queries so callers can assert how often the real query would run.
#[derive(Debug, Default)]
pub struct MockActiveWindow {
    title: Mutex<String>,
    fail: Mutex<Option<String>>,
    queries: AtomicUsize,
}

impl MockActiveWindow {
    /// Create a mock reporting the given title.
    pub fn new(title: &str) -> Self {
        Self {
            title: Mutex::new(title.to_string()),
            ..Default::default()
        }
    }

    /// Change the reported title.
    pub fn set_title(&self, title: &str) {
        *self.title.lock().expect("title mutex poisoned") = title.to_string();
    }

    /// Make every subsequent query fail with `message`, or succeed again
    /// with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.fail.lock().expect("failure mutex poisoned") = message.map(str::to_string);
    }

    /// Number of queries answered (including failed ones).
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl ActiveWindow for MockActiveWindow {
    fn active_window_title(&self) -> Result<String> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.fail.lock().expect("failure mutex poisoned").clone() {
            return Err(FramebotError::Focus(message));
        }
        Ok(self.title.lock().expect("title mutex poisoned").clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reports_title_and_counts() {
        let window = MockActiveWindow::new("Path of Exile");
        assert_eq!(window.active_window_title().unwrap(), "Path of Exile");
        window.set_title("Terminal");
        assert_eq!(window.active_window_title().unwrap(), "Terminal");
        assert_eq!(window.queries(), 2);
    }

    #[test]
    fn test_mock_failure_toggle() {
        let window = MockActiveWindow::new("Path of Exile");
        window.set_failure(Some("xdotool missing"));
        let err = window.active_window_title().unwrap_err();
        assert!(err.to_string().contains("xdotool missing"));

        window.set_failure(None);
        assert!(window.active_window_title().is_ok());
        assert_eq!(window.queries(), 2);
    }
}
