//! Persisted screen-region calibration.
//!
//! Policies locate UI areas (a life globe's text, a buff bar) once, usually
//! via OCR, and reuse the position on later runs. Each region is one small
//! JSON file named after the region.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use framebot_core::error::{FramebotError, Result};
use framebot_core::types::Rect;

/// Directory-backed cache of named [`Rect`]s.
#[derive(Debug, Clone)]
pub struct RegionStore {
    dir: PathBuf,
}

impl RegionStore {
    /// Open (and create if needed) a region store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cached position of `name`, or `None` if it was never calibrated or
    /// the file is unreadable.
    pub fn load(&self, name: &str) -> Option<Rect> {
        let path = self.path_for(name).ok()?;
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(rect) => Some(rect),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable region file");
                None
            }
        }
    }

    /// Persist the position of `name`, replacing any previous value.
    pub fn save(&self, name: &str, rect: Rect) -> Result<()> {
        let path = self.path_for(name)?;
        std::fs::write(&path, serde_json::to_string(&rect)?)?;
        info!(region = name, rect = %rect, "Region calibrated");
        Ok(())
    }

    /// Forget the position of `name`. Missing regions are not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(FramebotError::Config(format!(
                "invalid region name '{}'",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path().join("regions")).unwrap();
        let rect = Rect::from_corners(130, 1083, 264, 1119).unwrap();

        assert!(store.load("life").is_none());
        store.save("life", rect).unwrap();
        assert_eq!(store.load("life"), Some(rect));

        // A second store on the same directory sees the calibration.
        let reopened = RegionStore::open(store.dir()).unwrap();
        assert_eq!(reopened.load("life"), Some(rect));
    }

    #[test]
    fn test_corrupt_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("mana.json"), "not json").unwrap();
        assert!(store.load("mana").is_none());

        std::fs::write(dir.path().join("bad.json"), r#"{"x":0,"y":0,"w":-5,"h":1}"#).unwrap();
        assert!(store.load("bad").is_none());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        store.save("life", Rect::new(0, 0, 10, 10).unwrap()).unwrap();
        store.remove("life").unwrap();
        assert!(store.load("life").is_none());
        store.remove("life").unwrap();
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::open(dir.path()).unwrap();
        let rect = Rect::new(0, 0, 1, 1).unwrap();
        assert!(store.save("../escape", rect).is_err());
        assert!(store.save("", rect).is_err());
        assert!(store.load("a/b").is_none());
    }
}
