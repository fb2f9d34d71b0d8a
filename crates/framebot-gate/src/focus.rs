//! Window-focus admission check with a cached title.
//!
//! Asking the OS for the foreground window title every frame is wasteful,
//! so the last answer is kept for `refresh_interval` seconds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use framebot_capture::ActiveWindow;
use framebot_core::clock::{reached, Clock};
use framebot_core::error::{ensure_duration, Result};

/// Seconds a sampled title stays fresh.
pub const DEFAULT_REFRESH_INTERVAL: f64 = 0.4;

#[derive(Debug, Default)]
struct FocusCache {
    title: String,
    sampled_at: Option<f64>,
}

/// Reports whether one of the allowed windows has focus.
pub struct FocusGate {
    source: Arc<dyn ActiveWindow>,
    allowed_titles: Vec<String>,
    refresh_interval: f64,
    clock: Clock,
    bypass: AtomicBool,
    cache: Mutex<FocusCache>,
}

impl FocusGate {
    pub fn new(
        source: Arc<dyn ActiveWindow>,
        allowed_titles: Vec<String>,
        refresh_interval: f64,
        clock: Clock,
    ) -> Result<Self> {
        let refresh_interval = ensure_duration("focus refresh interval", refresh_interval)?;
        Ok(Self {
            source,
            allowed_titles,
            refresh_interval,
            clock,
            bypass: AtomicBool::new(false),
            cache: Mutex::new(FocusCache::default()),
        })
    }

    pub fn allowed_titles(&self) -> &[String] {
        &self.allowed_titles
    }

    pub fn refresh_interval(&self) -> f64 {
        self.refresh_interval
    }

    /// Whether an allowed window has focus, sampled at the gate's clock.
    pub fn is_target_focused(&self) -> Result<bool> {
        self.is_target_focused_at(self.clock.now())
    }

    /// Whether an allowed window has focus, treating `now` as the current
    /// time for cache freshness.
    ///
    /// The source is queried only when the cache is stale. An empty title
    /// keeps the previous one but still counts as a sample. A failed query
    /// leaves the cache as it was.
    pub fn is_target_focused_at(&self, now: f64) -> Result<bool> {
        if self.is_bypassed() {
            return Ok(true);
        }

        let mut cache = self.cache.lock().expect("focus cache mutex poisoned");
        let stale = match cache.sampled_at {
            None => true,
            // A clock override can move time backwards; resample then too.
            Some(at) => now < at || reached(now, at + self.refresh_interval),
        };

        if stale {
            let title = self.source.active_window_title().map_err(|e| {
                tracing::warn!(error = %e, "Active window query failed");
                e
            })?;
            if !title.is_empty() && title != cache.title {
                tracing::debug!(from = %cache.title, to = %title, "Focused window changed");
                cache.title = title;
            }
            cache.sampled_at = Some(now);
        }

        Ok(self.allowed_titles.iter().any(|t| *t == cache.title))
    }

    /// The most recently sampled non-empty title.
    pub fn cached_title(&self) -> String {
        self.cache
            .lock()
            .expect("focus cache mutex poisoned")
            .title
            .clone()
    }

    /// Treat the target as always focused. Returns the previous setting.
    pub fn set_bypass(&self, bypass: bool) -> bool {
        self.bypass.swap(bypass, Ordering::SeqCst)
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for FocusGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusGate")
            .field("allowed_titles", &self.allowed_titles)
            .field("refresh_interval", &self.refresh_interval)
            .field("bypass", &self.is_bypassed())
            .finish_non_exhaustive()
    }
}
