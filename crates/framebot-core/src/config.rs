use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ensure_duration, FramebotError, Result};
use crate::types::MouseButton;

/// Top-level configuration for Framebot.
///
/// Loaded from `~/.framebot/config.toml` by default. Every section falls back
/// to its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FramebotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

impl FramebotConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FramebotConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration if the file exists.
    ///
    /// A missing file is `Ok(None)` so the caller can run on defaults. A
    /// file that exists but cannot be read, parsed or validated is an error.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the gates and dedupers would refuse at construction.
    pub fn validate(&self) -> Result<()> {
        if !self.capture.fps.is_finite() || self.capture.fps <= 0.0 {
            return Err(FramebotError::Config(format!(
                "capture.fps must be > 0, got {}",
                self.capture.fps
            )));
        }
        ensure_duration("focus.refresh_interval_secs", self.focus.refresh_interval_secs)?;
        ensure_unit("detection.min_confidence", self.detection.min_confidence)?;
        ensure_unit("detection.overlap_threshold", self.detection.overlap_threshold)?;

        let mut seen = std::collections::HashSet::new();
        for action in &self.actions {
            if action.name.trim().is_empty() {
                return Err(FramebotError::Config("action name must not be empty".into()));
            }
            if !seen.insert(action.name.as_str()) {
                return Err(FramebotError::Config(format!(
                    "duplicate action name '{}'",
                    action.name
                )));
            }
            if action.keys.is_empty() && action.click.is_none() {
                return Err(FramebotError::Config(format!(
                    "action '{}' needs keys or a click",
                    action.name
                )));
            }
            ensure_duration(&format!("{}.cooldown_secs", action.name), action.cooldown_secs)?;
            if let Some(cast) = action.cast_time_secs {
                ensure_duration(&format!("{}.cast_time_secs", action.name), cast)?;
            }
        }
        Ok(())
    }
}

fn ensure_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(FramebotError::Config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for calibration caches.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.framebot/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Screen sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frames processed per second.
    pub fps: f64,
    /// Monitor index to capture (0 = primary).
    pub monitor_index: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            monitor_index: 0,
        }
    }
}

/// Game window focus check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Exact window titles input may be sent to.
    pub allowed_titles: Vec<String>,
    /// Seconds between active-window queries.
    pub refresh_interval_secs: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            allowed_titles: vec!["Path of Exile".to_string()],
            refresh_interval_secs: 0.4,
        }
    }
}

/// Detector post-processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Template-match score a hit must exceed.
    pub min_confidence: f64,
    /// IoU above which a later hit duplicates an earlier one.
    pub overlap_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            overlap_threshold: 0.7,
        }
    }
}

/// Global hotkey that toggles the action rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub toggle: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle: "F9".to_string(),
        }
    }
}

/// One gated action of the rotation.
///
/// Actions with `cast_time_secs` are cast-gated and share the global cast
/// lock; the rest are plain throttles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub click: Option<MouseButton>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,
    #[serde(default)]
    pub cast_time_secs: Option<f64>,
}

fn default_cooldown_secs() -> f64 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = FramebotConfig::default();
        assert_eq!(config.general.data_dir, "~/.framebot/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.capture.fps, 60.0);
        assert_eq!(config.focus.allowed_titles, vec!["Path of Exile"]);
        assert!((config.focus.refresh_interval_secs - 0.4).abs() < f64::EPSILON);
        assert!((config.detection.overlap_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.hotkey.toggle, "F9");
        assert!(config.actions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[capture]
fps = 30.0

[focus]
allowed_titles = ["Path of Exile", "WOW - Wine desktop"]
refresh_interval_secs = 0.5

[[actions]]
name = "convocation"
keys = ["w"]
cooldown_secs = 3.0

[[actions]]
name = "summon"
click = "right"
cooldown_secs = 0.08
cast_time_secs = 0.35
"#;
        let file = create_temp_config(content);
        let config = FramebotConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.capture.fps, 30.0);
        assert_eq!(config.focus.allowed_titles.len(), 2);
        assert_eq!(config.actions.len(), 2);
        assert_eq!(config.actions[0].keys, vec!["w"]);
        assert!(config.actions[0].cast_time_secs.is_none());
        assert_eq!(config.actions[1].click, Some(MouseButton::Right));
        assert_eq!(config.actions[1].cast_time_secs, Some(0.35));
    }

    #[test]
    fn test_action_cooldown_defaults() {
        let content = r#"
[[actions]]
name = "offering"
keys = ["e"]
"#;
        let file = create_temp_config(content);
        let config = FramebotConfig::load(file.path()).unwrap();
        assert!((config.actions[0].cooldown_secs - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = FramebotConfig::load(file.path()).unwrap();
        assert_eq!(config.capture.fps, 60.0);
        assert_eq!(config.hotkey.toggle, "F9");
    }

    #[test]
    fn test_load_if_present_missing_file() {
        let loaded = FramebotConfig::load_if_present(Path::new("/nonexistent/config.toml"));
        assert!(loaded.unwrap().is_none());
        assert_eq!(FramebotConfig::default().general.data_dir, "~/.framebot/data");
    }

    #[test]
    fn test_load_if_present_fails_on_invalid_file() {
        let content = r#"
[[actions]]
name = "reaper"
keys = ["r"]
cooldown_secs = -4.0
"#;
        let file = create_temp_config(content);
        let err = FramebotConfig::load_if_present(file.path()).unwrap_err();
        assert!(matches!(err, FramebotError::Config(_)));

        let file = create_temp_config("[capture]\nfps = 30.0\n");
        let config = FramebotConfig::load_if_present(file.path()).unwrap().unwrap();
        assert_eq!(config.capture.fps, 30.0);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(FramebotConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_negative_cooldown() {
        let content = r#"
[[actions]]
name = "reaper"
keys = ["r"]
cooldown_secs = -4.0
"#;
        let file = create_temp_config(content);
        let err = FramebotConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("reaper.cooldown_secs"));
    }

    #[test]
    fn test_validate_rules() {
        let mut config = FramebotConfig::default();
        config.capture.fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = FramebotConfig::default();
        config.detection.overlap_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = FramebotConfig::default();
        config.focus.refresh_interval_secs = -0.1;
        assert!(config.validate().is_err());

        let action = ActionConfig {
            name: "tap".into(),
            keys: vec!["g".into()],
            click: None,
            cooldown_secs: 0.2,
            cast_time_secs: Some(-1.0),
        };
        let mut config = FramebotConfig::default();
        config.actions.push(action.clone());
        assert!(config.validate().is_err());

        let mut config = FramebotConfig::default();
        config.actions.push(ActionConfig {
            cast_time_secs: None,
            ..action.clone()
        });
        config.actions.push(ActionConfig {
            cast_time_secs: None,
            ..action.clone()
        });
        assert!(config.validate().unwrap_err().to_string().contains("duplicate"));

        let mut config = FramebotConfig::default();
        config.actions.push(ActionConfig {
            keys: vec![],
            cast_time_secs: None,
            ..action
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = FramebotConfig::default();
        config.actions.push(ActionConfig {
            name: "dessecrate".into(),
            keys: vec!["t".into()],
            click: None,
            cooldown_secs: 0.08,
            cast_time_secs: Some(0.4),
        });
        config.save(&path).unwrap();

        let reloaded = FramebotConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.log_level, config.general.log_level);
        assert_eq!(reloaded.actions.len(), 1);
        assert_eq!(reloaded.actions[0].cast_time_secs, Some(0.4));
    }
}
