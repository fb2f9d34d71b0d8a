//! Framebot Capture crate - screen source, active-window query, capture session
//! bookkeeping and the calibration region cache.
//!
//! Provides the CaptureService trait for per-frame screen sampling, the
//! ActiveWindow trait the focus gate queries, mocks for both, and Windows
//! implementations built on Win32 GDI.

pub mod region;
pub mod window;
pub mod windows_capture;

use std::sync::atomic::{AtomicU64, Ordering};

use framebot_core::error::FramebotError;
use framebot_core::types::{CaptureStatus, ScreenFrame};

pub use region::RegionStore;
pub use window::{ActiveWindow, MockActiveWindow};
pub use windows_capture::{WindowsActiveWindow, WindowsCaptureService};

/// Service for capturing screen frames.
///
/// Implementations provide platform-specific screen capture. The trait
/// abstracts over the capture mechanism so tests can use the mock.
pub trait CaptureService: Send + Sync {
    /// Capture the current screen frame.
    fn capture_frame(
        &self,
    ) -> impl std::future::Future<Output = Result<ScreenFrame, FramebotError>> + Send;
}

/// Mock capture service for testing.
///
/// Returns blank frames of a fixed size and counts how often it was polled.
#[derive(Debug)]
pub struct MockCaptureService {
    width: u32,
    height: u32,
    captured: AtomicU64,
}

impl MockCaptureService {
    /// Create a new mock producing 1920x1080 frames.
    pub fn new() -> Self {
        Self::with_size(1920, 1080)
    }

    /// Create a mock producing frames of the given size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            captured: AtomicU64::new(0),
        }
    }

    /// Number of frames handed out so far.
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }
}

impl Default for MockCaptureService {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureService for MockCaptureService {
    async fn capture_frame(&self) -> Result<ScreenFrame, FramebotError> {
        self.captured.fetch_add(1, Ordering::Relaxed);
        Ok(ScreenFrame::blank(self.width, self.height))
    }
}

/// Tracks the lifecycle of a capture loop.
///
/// Records whether capture is active, paused, or stopped. The session does
/// not own the loop -- that is managed by the caller.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    status: CaptureStatus,
    frames_captured: u64,
    frames_failed: u64,
}

impl CaptureSession {
    /// Create a new capture session in the Active state.
    pub fn start() -> Self {
        Self {
            status: CaptureStatus::Active,
            frames_captured: 0,
            frames_failed: 0,
        }
    }

    pub fn pause(&mut self) {
        self.status = CaptureStatus::Paused;
    }

    pub fn resume(&mut self) {
        self.status = CaptureStatus::Active;
    }

    pub fn stop(&mut self) {
        self.status = CaptureStatus::Stopped;
    }

    /// Record that a frame was captured.
    pub fn record_frame(&mut self) {
        self.frames_captured += 1;
    }

    /// Record a failed capture attempt.
    pub fn record_failure(&mut self) {
        self.frames_failed += 1;
    }

    pub fn status(&self) -> &CaptureStatus {
        &self.status
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    /// Check if the session is active (not paused or stopped).
    pub fn is_active(&self) -> bool {
        self.status == CaptureStatus::Active
    }
}
