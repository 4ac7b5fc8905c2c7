//! Numbered slots and the temp slot.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::content::ClipboardContent;

/// The observable state of a numbered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Occupied,
    /// Locked slots may be empty: locking reserves a slot as well as
    /// protecting its content.
    Locked,
}

/// One numbered storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Position in the bank, `0..N`.
    pub index: usize,
    pub content: ClipboardContent,
    /// When `content` was last written; `None` while empty.
    pub timestamp: Option<SystemTime>,
    /// User-assigned label shown in menus.
    pub label: Option<String>,
    /// A locked slot only changes through explicit unlock or clear.
    pub locked: bool,
}

impl Slot {
    /// An unlocked, unlabelled, empty slot.
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            content: ClipboardContent::empty(),
            timestamp: None,
            label: None,
            locked: false,
        }
    }

    pub fn state(&self) -> SlotState {
        if self.locked {
            SlotState::Locked
        } else if self.content.is_empty() {
            SlotState::Empty
        } else {
            SlotState::Occupied
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replaces the content and stamps the write time.
    pub(crate) fn fill(&mut self, content: ClipboardContent, now: SystemTime) {
        self.content = content;
        self.timestamp = Some(now);
    }

    /// Drops content and timestamp; label and lock are kept.
    pub(crate) fn clear(&mut self) {
        self.content = ClipboardContent::empty();
        self.timestamp = None;
    }
}

/// The index-less slot holding the most recent untargeted capture.
///
/// Always present, never locked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempSlot {
    pub content: ClipboardContent,
    pub timestamp: Option<SystemTime>,
    /// Executable name of the application that owned the clipboard when the
    /// content was captured, if it could be determined.
    pub source_app: Option<String>,
}

impl TempSlot {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
