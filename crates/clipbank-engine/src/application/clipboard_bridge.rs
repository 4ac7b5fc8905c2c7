//! The clipboard bridge: what to do when the OS clipboard changes.
//!
//! # Routing (for beginners)
//!
//! A clipboard change can come from three places:
//!
//! 1. **A targeted copy.**  The user pressed Ctrl+Alt+N.  The engine calls
//!    [`ClipboardBridge::set_pending_target`] *before* sending the synthetic
//!    Ctrl+C, so when the resulting change arrives the marker is already
//!    set.  The content goes to slot N and the marker is consumed.
//! 2. **A normal copy.**  Anything else the user copies.  No marker is set,
//!    so the content goes to the temp slot (and is promoted right away if
//!    auto-promote is on).
//! 3. **Our own paste.**  The paste engine writes to the clipboard and then
//!    sends Ctrl+V.  It raises the [`SuppressionFlag`] first and, once the
//!    write is done, records the clipboard sequence number it produced.  The
//!    bridge ignores every change while the flag is up, and any change
//!    handled while the clipboard still carries that sequence number.  The
//!    second check matters when the dispatch loop only gets to the change
//!    after the flag was lowered again.
//!
//! The marker is taken exactly once per change, even when reading the
//! clipboard fails.  Hotkeys and clipboard changes are handled on the same
//! dispatch thread, so "set marker, then send Ctrl+C" always happens before
//! the change it causes is processed.
//!
//! Ctrl+C with nothing selected changes nothing, and its marker would wait
//! for whatever the user copies next.  The marker therefore remembers the
//! sequence number it was set at; [`ClipboardBridge::expire_stale_target`]
//! drops it once [`DEFAULT_COPY_TIMEOUT`] has passed without the clipboard
//! moving.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clipbank_core::{ClipboardContent, ContentKind, ImageData, PromoteOutcome, SlotManager};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::detect::detect_content;

/// How long a targeted copy may go without a clipboard change.
pub const DEFAULT_COPY_TIMEOUT: Duration = Duration::from_millis(500);

/// Error type for clipboard access.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Another process has the clipboard open.
    #[error("clipboard is held by another process")]
    Busy,
    /// A format was present but its bytes could not be decoded.
    #[error("malformed clipboard data: {0}")]
    Format(String),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Read access to an open clipboard, one method per format.
///
/// Each method returns `Ok(None)` if the format is not on the clipboard.
pub trait ClipboardReader {
    fn file_list(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError>;
    fn image(&self) -> Result<Option<ImageData>, ClipboardError>;
    /// The HTML fragment, without the CF_HTML header.
    fn html(&self) -> Result<Option<String>, ClipboardError>;
    fn rtf(&self) -> Result<Option<Vec<u8>>, ClipboardError>;
    fn text(&self) -> Result<Option<String>, ClipboardError>;
}

/// The OS clipboard.
pub trait ClipboardAccess: Send + Sync {
    /// Opens the clipboard for reading.  It stays open until the reader is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Busy`] if another process holds it.
    fn open_reader(&self) -> Result<Box<dyn ClipboardReader + '_>, ClipboardError>;

    /// Replaces the clipboard with every representation of `content`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Busy`] if another process holds it.
    fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError>;

    /// Executable name of the process that owns the clipboard, if known.
    fn owner_process(&self) -> Option<String>;

    /// A counter the OS bumps on every clipboard change.
    fn sequence_number(&self) -> u32;
}

/// Marks `own_write` as holding a sequence number.
const OWN_WRITE_RECORDED: u64 = 1 << 32;

/// Shared "ignore clipboard changes" state.
///
/// Cloning gives another handle to the same state: the bridge reads it on
/// the dispatch thread while the paste worker updates it.
#[derive(Debug, Clone, Default)]
pub struct SuppressionFlag {
    raised: Arc<AtomicBool>,
    /// Sequence number of our last clipboard write, tagged with
    /// [`OWN_WRITE_RECORDED`]; 0 before the first write.
    own_write: Arc<AtomicU64>,
}

impl SuppressionFlag {
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn lower(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Remembers that the clipboard at `sequence` holds our own write.
    pub fn record_own_write(&self, sequence: u32) {
        self.own_write
            .store(OWN_WRITE_RECORDED | u64::from(sequence), Ordering::SeqCst);
    }

    /// Whether the clipboard at `sequence` still holds our own write.
    pub fn is_own_write(&self, sequence: u32) -> bool {
        self.own_write.load(Ordering::SeqCst) == OWN_WRITE_RECORDED | u64::from(sequence)
    }
}

/// A targeted copy waiting for its clipboard change.
#[derive(Debug, Clone, Copy)]
struct PendingTarget {
    index: usize,
    /// Clipboard sequence number when the marker was set.
    sequence: u32,
    set_at: Instant,
}

/// Where a capture was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRoute {
    Temp,
    Slot(usize),
}

/// What [`ClipboardBridge::on_clipboard_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The change was our own paste; it was ignored.
    Suppressed,
    /// The clipboard could not be read; nothing changed.
    Unavailable,
    /// No detector recognised the content; nothing changed.
    NothingDetected,
    Captured {
        route: CaptureRoute,
        kind: ContentKind,
        /// Result of the auto-promotion, if one ran.
        promoted: Option<PromoteOutcome>,
    },
    /// The target slot is locked or does not exist; the content was dropped.
    Dropped { index: usize },
}

/// Owns the pending-target marker and the suppression flag.
pub struct ClipboardBridge {
    clipboard: Arc<dyn ClipboardAccess>,
    pending_target: Option<PendingTarget>,
    suppression: SuppressionFlag,
}

impl ClipboardBridge {
    pub fn new(clipboard: Arc<dyn ClipboardAccess>) -> Self {
        Self {
            clipboard,
            pending_target: None,
            suppression: SuppressionFlag::default(),
        }
    }

    /// Another handle to the suppression flag, for the paste engine.
    pub fn suppression(&self) -> SuppressionFlag {
        self.suppression.clone()
    }

    /// Marks the next clipboard change as a targeted copy into `index`.
    pub fn set_pending_target(&mut self, index: usize) {
        self.pending_target = Some(PendingTarget {
            index,
            sequence: self.clipboard.sequence_number(),
            set_at: Instant::now(),
        });
    }

    /// Drops the marker, e.g. when the synthetic copy could not be sent.
    pub fn clear_pending_target(&mut self) {
        self.pending_target = None;
    }

    pub fn pending_target(&self) -> Option<usize> {
        self.pending_target.map(|p| p.index)
    }

    /// Drops a marker whose Ctrl+C changed nothing within `timeout`.
    ///
    /// A marker stays while the clipboard has moved since it was set: its
    /// change is then already waiting in the event queue.  Returns the slot
    /// index of a dropped marker.
    pub fn expire_stale_target(&mut self, now: Instant, timeout: Duration) -> Option<usize> {
        let pending = self.pending_target?;
        if self.clipboard.sequence_number() != pending.sequence {
            return None;
        }
        if now.saturating_duration_since(pending.set_at) < timeout {
            return None;
        }
        self.pending_target = None;
        debug!(index = pending.index, "targeted copy produced no clipboard change; marker dropped");
        Some(pending.index)
    }

    /// Handles one clipboard-change notification.
    pub fn on_clipboard_changed(&mut self, slots: &mut SlotManager) -> CaptureOutcome {
        if self.suppression.is_raised() {
            trace!("clipboard change suppressed");
            return CaptureOutcome::Suppressed;
        }
        if self.suppression.is_own_write(self.clipboard.sequence_number()) {
            trace!("clipboard still holds our own paste");
            return CaptureOutcome::Suppressed;
        }

        let route = match self.pending_target.take() {
            Some(pending) => CaptureRoute::Slot(pending.index),
            None => CaptureRoute::Temp,
        };

        let content = match self.read_content() {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, ?route, "clipboard read failed; capture abandoned");
                return CaptureOutcome::Unavailable;
            }
        };
        if content.is_empty() {
            debug!(?route, "clipboard content not recognised");
            return CaptureOutcome::NothingDetected;
        }
        let kind = content.kind();

        match route {
            CaptureRoute::Slot(index) => match slots.capture_to_slot(index, content) {
                Ok(true) => {
                    debug!(index, %kind, "targeted copy captured");
                    CaptureOutcome::Captured {
                        route,
                        kind,
                        promoted: None,
                    }
                }
                Ok(false) => {
                    debug!(index, "slot locked; targeted copy dropped");
                    CaptureOutcome::Dropped { index }
                }
                Err(e) => {
                    warn!(error = %e, "targeted copy dropped");
                    CaptureOutcome::Dropped { index }
                }
            },
            CaptureRoute::Temp => {
                let source = self.clipboard.owner_process();
                slots.capture_to_temp(content, source.clone());
                let auto_promote = slots.settings().auto_promote;
                let promoted = auto_promote.then(|| slots.promote_temp(source.as_deref()));
                debug!(%kind, source = ?source, ?promoted, "normal copy captured");
                CaptureOutcome::Captured {
                    route,
                    kind,
                    promoted,
                }
            }
        }
    }

    fn read_content(&self) -> Result<ClipboardContent, ClipboardError> {
        let reader = self.clipboard.open_reader()?;
        detect_content(reader.as_ref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
