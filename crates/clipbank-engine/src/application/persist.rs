//! Debounced slot persistence.
//!
//! Every slot change marks the store dirty; the write happens only once no
//! further change arrived for the debounce window, so a burst of copies costs
//! one disk write.  Shutdown forces a final [`DebouncedPersister::flush`].
//!
//! Time is passed in explicitly (`now: Instant`) so the debounce logic is
//! tested without sleeping.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clipbank_core::{PersistedSlots, SlotManager};
use thiserror::Error;
use tracing::{debug, warn};

/// Default quiet period before dirty slots are written.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Error type for the slot store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The stored file exists but cannot be decoded.
    #[error("corrupt slot file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("cannot encode slots: {0}")]
    Encode(String),
}

/// Where slots are stored between runs.
#[cfg_attr(test, mockall::automock)]
pub trait SlotPersistence: Send {
    /// The previously saved slots, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store exists but cannot be read.
    fn load(&self) -> Result<Option<PersistedSlots>, PersistenceError>;

    /// Replaces the stored slots.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write failed.
    fn save(&self, slots: &PersistedSlots) -> Result<(), PersistenceError>;
}

/// Coalesces slot changes into occasional writes.
pub struct DebouncedPersister {
    sink: Box<dyn SlotPersistence>,
    debounce: Duration,
    /// Time of the most recent unsaved change.
    dirty_since: Option<Instant>,
}

impl DebouncedPersister {
    pub fn new(sink: Box<dyn SlotPersistence>, debounce: Duration) -> Self {
        Self {
            sink,
            debounce,
            dirty_since: None,
        }
    }

    /// Loads the stored slots, treating an unreadable store as empty.
    pub fn load(&self) -> Option<PersistedSlots> {
        match self.sink.load() {
            Ok(slots) => slots,
            Err(e) => {
                warn!(error = %e, "stored slots could not be loaded; starting empty");
                None
            }
        }
    }

    /// Records a change at `now`, restarting the debounce window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Writes if the last change is at least one debounce window old.
    /// Returns `true` if a write succeeded.
    pub fn flush_if_due(&mut self, now: Instant, slots: &SlotManager) -> bool {
        match self.dirty_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => self.flush(slots),
            _ => false,
        }
    }

    /// Writes now if anything changed.  Returns `true` if a write succeeded.
    ///
    /// A failed write keeps the store dirty so the next tick retries.
    pub fn flush(&mut self, slots: &SlotManager) -> bool {
        if self.dirty_since.is_none() {
            return false;
        }
        match self.sink.save(&slots.snapshot()) {
            Ok(()) => {
                debug!("slots persisted");
                self.dirty_since = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "persisting slots failed");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
