use thiserror::Error;

/// Top-level error type for Framebot.
///
/// Gate suppression and detection misses are *not* errors; they are regular
/// outcomes. This type covers collaborator failures (capture, focus query,
/// input injection) and invalid configuration, which is rejected when a
/// component is constructed rather than when it is used.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramebotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rectangle: {w}x{h} (width and height must be >= 0)")]
    InvalidRect { w: i32, h: i32 },

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Focus query error: {0}")]
    Focus(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for FramebotError {
    fn from(err: toml::de::Error) -> Self {
        FramebotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FramebotError {
    fn from(err: toml::ser::Error) -> Self {
        FramebotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FramebotError {
    fn from(err: serde_json::Error) -> Self {
        FramebotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Framebot operations.
pub type Result<T> = std::result::Result<T, FramebotError>;

/// Reject negative, NaN and infinite durations.
///
/// Shared by every component that takes a cooldown, cast time or refresh
/// interval so the error message reads the same everywhere.
pub fn ensure_duration(name: &str, secs: f64) -> Result<f64> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(FramebotError::Config(format!(
            "{} must be a finite number >= 0, got {}",
            name, secs
        )));
    }
    Ok(secs)
}
