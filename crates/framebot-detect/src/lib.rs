//! Framebot Detect crate - detector interface and hit deduplication.
//!
//! The template-matching and OCR kernels live behind the Detector trait;
//! this crate only shapes their output. `match_many` filters raw hits by
//! confidence and collapses overlapping ones into a DetectionSet.

pub mod dedup;

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use framebot_core::error::FramebotError;
use framebot_core::types::{Detection, ScreenFrame};

pub use dedup::{dedupe, DetectionSet, DEFAULT_OVERLAP_THRESHOLD};

/// Template-match score a hit must exceed to count.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// What a detector should look for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// A named template image.
    Template(String),
    /// Text to locate via OCR (case-insensitive).
    Text(String),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Template(name) => write!(f, "template:{}", name),
            Query::Text(text) => write!(f, "text:{}", text),
        }
    }
}

/// Locates templates or text in a frame.
///
/// Implementations return hits best match first. No match is an empty
/// list, not an error.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        frame: &ScreenFrame,
        query: &Query,
    ) -> impl std::future::Future<Output = Result<Vec<Detection>, FramebotError>> + Send;
}

/// Detect `query` in `frame`, keep hits scoring at least `min_confidence`,
/// and collapse overlapping hits.
pub async fn match_many<D: Detector>(
    detector: &D,
    frame: &ScreenFrame,
    query: &Query,
    min_confidence: f64,
    overlap_threshold: f64,
) -> Result<DetectionSet, FramebotError> {
    let hits = detector.detect(frame, query).await?;
    let raw = hits.len();
    let set = DetectionSet::from_candidates(
        hits.into_iter().filter(|d| d.confidence >= min_confidence),
        overlap_threshold,
    )?;
    tracing::trace!(query = %query, raw, kept = set.len(), "Detections deduplicated");
    Ok(set)
}

/// Mock detector for testing.
///
/// Returns scripted hits per query regardless of frame content; unknown
/// queries yield no hits.
#[derive(Debug, Default)]
pub struct MockDetector {
    hits: Mutex<HashMap<Query, Vec<Detection>>>,
    failing: Mutex<Option<String>>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the hits returned for `query`.
    pub fn with_hits(self, query: Query, hits: Vec<Detection>) -> Self {
        self.set_hits(query, hits);
        self
    }

    pub fn set_hits(&self, query: Query, hits: Vec<Detection>) {
        self.hits
            .lock()
            .expect("detector mutex poisoned")
            .insert(query, hits);
    }

    /// Make every call fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failing.lock().expect("detector mutex poisoned") = message.map(str::to_string);
    }
}

impl Detector for MockDetector {
    async fn detect(
        &self,
        _frame: &ScreenFrame,
        query: &Query,
    ) -> Result<Vec<Detection>, FramebotError> {
        if let Some(message) = self.failing.lock().expect("detector mutex poisoned").clone() {
            return Err(FramebotError::Detection(message));
        }
        Ok(self
            .hits
            .lock()
            .expect("detector mutex poisoned")
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}
