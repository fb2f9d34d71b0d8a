use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FramebotError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Capture session operational status.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Actively capturing.
    Active,
    /// Capture paused by user.
    Paused,
    /// Capture stopped (session ended).
    Stopped,
}

/// Mouse button for synthetic clicks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
            MouseButton::Middle => write!(f, "middle"),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Axis-aligned box in image-pixel space.
///
/// Width and height are never negative; the constructors reject such boxes
/// so `overlap` is only ever computed on well-formed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRect", into = "RawRect")]
pub struct Rect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Serialize, Deserialize)]
struct RawRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl TryFrom<RawRect> for Rect {
    type Error = FramebotError;

    fn try_from(raw: RawRect) -> Result<Self> {
        Rect::new(raw.x, raw.y, raw.w, raw.h)
    }
}

impl From<Rect> for RawRect {
    fn from(r: Rect) -> Self {
        RawRect {
            x: r.x,
            y: r.y,
            w: r.w,
            h: r.h,
        }
    }
}

impl Rect {
    /// Create a box from its top-left corner and size.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(FramebotError::InvalidRect { w, h });
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a box from `(x0, y0)`–`(x1, y1)` corners, as OCR engines
    /// report text positions.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Self> {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn w(&self) -> i32 {
        self.w
    }

    pub fn h(&self) -> i32 {
        self.h
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Area of the intersection with `other`; 0 when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let x0 = (self.x as i64).max(other.x as i64);
        let y0 = (self.y as i64).max(other.y as i64);
        let x1 = (self.x as i64 + self.w as i64).min(other.x as i64 + other.w as i64);
        let y1 = (self.y as i64 + self.h as i64).min(other.y as i64 + other.h as i64);
        (x1 - x0).max(0) * (y1 - y0).max(0)
    }

    /// Intersection over union, in `[0.0, 1.0]`.
    ///
    /// Returns 0.0 for disjoint boxes and whenever either box has zero area.
    pub fn overlap(&self, other: &Rect) -> f64 {
        let a = self.area();
        let b = other.area();
        if a == 0 || b == 0 {
            return 0.0;
        }
        let inter = self.intersection_area(other);
        if inter == 0 {
            return 0.0;
        }
        let union = a + b - inter;
        inter as f64 / union as f64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.w, self.h)
    }
}

/// A single detector hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Detection {
    pub fn new(rect: Rect, confidence: f64) -> Self {
        Self {
            rect,
            confidence,
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

// =============================================================================
// Frames
// =============================================================================

/// One captured screen image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenFrame {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub monitor_id: String,
    pub width: u32,
    pub height: u32,
    /// Raw BGRA pixels, row-major, top-down. Excluded from JSON.
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl ScreenFrame {
    /// A frame with no pixel data, used by mocks and dry runs.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            monitor_id: "monitor_0".to_string(),
            width,
            height,
            pixels: Vec::new(),
        }
    }

    /// Whether the frame carries pixel data.
    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }
}
