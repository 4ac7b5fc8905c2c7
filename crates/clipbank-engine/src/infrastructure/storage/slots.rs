//! Slot file: the persisted slot bank as `bincode` at `<data dir>/slots.bin`.
//!
//! Writes go to `slots.bin.tmp` first and are renamed over the real file,
//! so a crash mid-write leaves the previous bank intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clipbank_core::PersistedSlots;
use tracing::debug;

use crate::application::persist::{PersistenceError, SlotPersistence};

const SLOT_FILE: &str = "slots.bin";
const TEMP_SUFFIX: &str = "tmp";

/// [`SlotPersistence`] backed by a file.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    path: PathBuf,
}

impl FileSlotStore {
    /// A store keeping `slots.bin` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SLOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SlotPersistence for FileSlotStore {
    fn load(&self) -> Result<Option<PersistedSlots>, PersistenceError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let slots = bincode::deserialize(&bytes).map_err(|e| PersistenceError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(slots))
    }

    fn save(&self, slots: &PersistedSlots) -> Result<(), PersistenceError> {
        let bytes = bincode::serialize(slots).map_err(|e| PersistenceError::Encode(e.to_string()))?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension(format!("bin.{TEMP_SUFFIX}"));
        std::fs::write(&tmp, &bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "slot file written");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use clipbank_core::{ClipboardContent, SlotManager, SlotSettings};
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("clipbank_slots_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_first_run_loads_nothing() {
        let store = FileSlotStore::in_dir(&temp_dir());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_saved_bank_loads_back_with_locks_and_cursor() {
        // Arrange
        let dir = temp_dir();
        let store = FileSlotStore::in_dir(&dir);
        let mut slots = SlotManager::new(SlotSettings::default());
        slots.capture_to_slot(1, ClipboardContent::html("<i>x</i>", Some("x".into()))).unwrap();
        slots.toggle_lock(1).unwrap();
        slots.capture_to_temp(ClipboardContent::text("temp"), Some("a.exe".into()));
        slots.set_active(6).unwrap();
        let snapshot = slots.snapshot();

        // Act
        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap();

        // Assert
        assert_eq!(loaded, Some(snapshot));
        assert!(!store.path().with_extension("bin.tmp").exists(), "temp file renamed away");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_garbage_file_is_reported_corrupt() {
        // Arrange
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileSlotStore::in_dir(&dir);
        std::fs::write(store.path(), [0xFF; 3]).unwrap();

        // Act
        let result = store.load();

        // Assert
        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }
}
