//! In-memory clipboard for tests and headless runs.
//!
//! Holds one value per format (see [`Representations`]) plus an owner name
//! and a sequence number, the three things the engine reads from the real
//! clipboard.  Every simulated copy and every [`ClipboardAccess::write`]
//! bumps the sequence number like Windows does.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::path::PathBuf;

use clipbank_core::{ClipboardContent, ImageData};

use super::Representations;
use crate::application::clipboard_bridge::{ClipboardAccess, ClipboardError, ClipboardReader};

/// A mock clipboard that records writes.
#[derive(Default)]
pub struct MockClipboard {
    current: Mutex<Representations>,
    owner: Mutex<Option<String>>,
    writes: Mutex<Vec<ClipboardContent>>,
    sequence: AtomicU32,
    busy: AtomicBool,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates `app` copying `content`.
    pub fn copy_from_app(&self, content: &ClipboardContent, app: &str) {
        self.publish(Representations::of(content), Some(app.to_string()));
    }

    /// Simulates an application publishing an arbitrary set of formats.
    pub fn publish(&self, reps: Representations, owner: Option<String>) {
        *lock(&self.current) = reps;
        *lock(&self.owner) = owner;
        self.sequence.fetch_add(1, Ordering::SeqCst);
    }

    /// Empties the clipboard.
    pub fn clear(&self) {
        self.publish(Representations::default(), None);
    }

    /// While busy, every open or write fails with [`ClipboardError::Busy`].
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Everything written through [`ClipboardAccess::write`], in order.
    pub fn writes(&self) -> Vec<ClipboardContent> {
        lock(&self.writes).clone()
    }

    /// The formats currently on the clipboard.
    pub fn current(&self) -> Representations {
        lock(&self.current).clone()
    }
}

impl ClipboardAccess for MockClipboard {
    fn open_reader(&self) -> Result<Box<dyn ClipboardReader + '_>, ClipboardError> {
        if self.busy.load(Ordering::SeqCst) {
            return Err(ClipboardError::Busy);
        }
        Ok(Box::new(MockReader(self.current())))
    }

    fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
        if self.busy.load(Ordering::SeqCst) {
            return Err(ClipboardError::Busy);
        }
        lock(&self.writes).push(content.clone());
        self.publish(Representations::of(content), None);
        Ok(())
    }

    fn owner_process(&self) -> Option<String> {
        lock(&self.owner).clone()
    }

    fn sequence_number(&self) -> u32 {
        self.sequence.load(Ordering::SeqCst)
    }
}

/// Snapshot of the mock clipboard taken when it was opened.
struct MockReader(Representations);

impl ClipboardReader for MockReader {
    fn file_list(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        Ok(self.0.files.clone())
    }

    fn image(&self) -> Result<Option<ImageData>, ClipboardError> {
        Ok(self.0.image.clone())
    }

    fn html(&self) -> Result<Option<String>, ClipboardError> {
        Ok(self.0.html.clone())
    }

    fn rtf(&self) -> Result<Option<Vec<u8>>, ClipboardError> {
        Ok(self.0.rtf.clone())
    }

    fn text(&self) -> Result<Option<String>, ClipboardError> {
        Ok(self.0.text.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
