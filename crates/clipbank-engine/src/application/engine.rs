//! The engine dispatcher.
//!
//! Everything that changes slot state arrives as an [`EngineEvent`] and is
//! handled by [`Engine::handle`], one event at a time, on a single task.
//! That serialisation is what makes the targeted-copy marker safe: the
//! marker is set and Ctrl+C is sent inside one `handle` call, so the
//! clipboard change it causes is always handled afterwards.
//!
//! ```text
//!  hotkey thread ──┐
//!  clipboard poll ─┼──► mpsc ──► Engine::handle ──► SlotManager
//!  cleanup ticker ─┤                  │                 │ SlotChange
//!  Ctrl-C ─────────┘                  ▼                 ▼
//!                               PasteEngine      DebouncedPersister
//! ```

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clipbank_core::{ClipboardContent, SlotChange, SlotManager, SlotSettings};
use tracing::{debug, info, warn};

use super::clipboard_bridge::{
    CaptureOutcome, ClipboardAccess, ClipboardBridge, DEFAULT_COPY_TIMEOUT,
};
use super::inject::InputInjector;
use super::paste_engine::{PasteEngine, PasteExecutor, DEFAULT_PASTE_GRACE};
use super::persist::{DebouncedPersister, SlotPersistence, DEFAULT_PERSIST_DEBOUNCE};
use super::sequencer::{ModifierSequencer, DEFAULT_SETTLE_DELAY};

/// A user command bound to a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Copy the selection straight into slot `i`.
    CopyToSlot(usize),
    /// Copy the selection into the temp slot.
    Copy,
    PasteSlot(usize),
    PasteActive,
    PasteTemp,
    PromoteTemp,
    CycleNext,
    CyclePrevious,
    ToggleLock(usize),
    ClearSlot(usize),
    ClearAllUnlocked,
}

/// Inbound message for [`Engine::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Hotkey(HotkeyAction),
    /// The OS clipboard changed; the payload is re-read on handling.
    ClipboardChanged,
    /// Periodic stuck-modifier sweep, stale-marker expiry and persistence check.
    CleanupTick,
    Shutdown,
}

/// Delays the engine runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimings {
    pub settle_delay: Duration,
    pub paste_grace: Duration,
    pub persist_debounce: Duration,
    /// How long a targeted copy may wait for its clipboard change.
    pub copy_timeout: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            paste_grace: DEFAULT_PASTE_GRACE,
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
            copy_timeout: DEFAULT_COPY_TIMEOUT,
        }
    }
}

/// Owns the slot store and every component that acts on it.
pub struct Engine {
    slots: SlotManager,
    changes: Receiver<SlotChange>,
    bridge: ClipboardBridge,
    sequencer: Arc<ModifierSequencer>,
    paste: PasteEngine,
    persister: DebouncedPersister,
    copy_timeout: Duration,
    stopped: bool,
}

impl Engine {
    /// Restores persisted slots and starts the paste worker.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the paste worker thread could not be spawned.
    pub fn new(
        settings: SlotSettings,
        timings: EngineTimings,
        injector: Arc<dyn InputInjector>,
        clipboard: Arc<dyn ClipboardAccess>,
        store: Box<dyn SlotPersistence>,
    ) -> std::io::Result<Self> {
        let persister = DebouncedPersister::new(store, timings.persist_debounce);
        let mut slots = match persister.load() {
            Some(persisted) => {
                info!(stored = persisted.slots.len(), "restoring slots");
                SlotManager::restore(settings, persisted)
            }
            None => SlotManager::new(settings),
        };
        let changes = slots.subscribe();

        let bridge = ClipboardBridge::new(Arc::clone(&clipboard));
        let sequencer = Arc::new(ModifierSequencer::new(injector, timings.settle_delay));
        let executor = PasteExecutor::new(
            Arc::clone(&sequencer),
            clipboard,
            bridge.suppression(),
            timings.paste_grace,
        );
        let paste = PasteEngine::start(executor)?;

        Ok(Self {
            slots,
            changes,
            bridge,
            sequencer,
            paste,
            persister,
            copy_timeout: timings.copy_timeout,
            stopped: false,
        })
    }

    /// Handles one event.  Returns `false` once the engine has shut down.
    pub fn handle(&mut self, event: EngineEvent) -> bool {
        if self.stopped {
            return false;
        }
        match event {
            EngineEvent::Hotkey(action) => self.on_hotkey(action),
            EngineEvent::ClipboardChanged => self.on_clipboard_changed(),
            EngineEvent::CleanupTick => self.on_cleanup_tick(),
            EngineEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        self.drain_changes();
        true
    }

    pub fn slots(&self) -> &SlotManager {
        &self.slots
    }

    pub fn bridge(&self) -> &ClipboardBridge {
        &self.bridge
    }

    /// A receiver of every future slot change, for a UI layer.
    pub fn subscribe(&mut self) -> Receiver<SlotChange> {
        self.slots.subscribe()
    }

    // ── Event handlers ────────────────────────────────────────────────────────

    fn on_hotkey(&mut self, action: HotkeyAction) {
        debug!(?action, "hotkey");
        match action {
            HotkeyAction::CopyToSlot(index) => self.copy_to_slot(index),
            HotkeyAction::Copy => {
                if let Err(e) = self.sequencer.copy() {
                    warn!(error = %e, "synthetic copy failed");
                }
            }
            HotkeyAction::PasteSlot(index) => {
                let content = self.slots.get_slot(index).map(|s| s.content.clone());
                self.paste(content);
            }
            HotkeyAction::PasteActive => {
                let index = self.slots.active_slot_index();
                let content = self.slots.get_slot(index).map(|s| s.content.clone());
                self.paste(content);
            }
            HotkeyAction::PasteTemp => {
                let content = self.slots.temp_slot().content.clone();
                self.paste(Some(content));
            }
            HotkeyAction::PromoteTemp => {
                let outcome = self.slots.promote_temp(None);
                debug!(?outcome, "manual promotion");
            }
            HotkeyAction::CycleNext => self.slots.cycle_active(1),
            HotkeyAction::CyclePrevious => self.slots.cycle_active(-1),
            HotkeyAction::ToggleLock(index) => match self.slots.toggle_lock(index) {
                Ok(locked) => debug!(index, locked, "lock toggled"),
                Err(e) => warn!(error = %e, "toggle lock ignored"),
            },
            HotkeyAction::ClearSlot(index) => {
                if let Err(e) = self.slots.clear_slot(index) {
                    warn!(error = %e, "clear ignored");
                }
            }
            HotkeyAction::ClearAllUnlocked => {
                let cleared = self.slots.clear_all_unlocked();
                debug!(cleared, "cleared unlocked slots");
            }
        }
    }

    fn copy_to_slot(&mut self, index: usize) {
        if index >= self.slots.slot_count() {
            warn!(index, count = self.slots.slot_count(), "targeted copy to missing slot ignored");
            return;
        }
        // The marker must be in place before the change Ctrl+C causes.
        self.bridge.set_pending_target(index);
        if let Err(e) = self.sequencer.copy() {
            warn!(index, error = %e, "synthetic copy failed; target cleared");
            self.bridge.clear_pending_target();
        }
    }

    fn paste(&self, content: Option<ClipboardContent>) {
        let Some(content) = content else {
            warn!("paste from missing slot ignored");
            return;
        };
        match self.paste.paste_from_slot(&content) {
            Ok(outcome) => debug!(?outcome, "paste dispatched"),
            Err(e) => warn!(error = %e, "paste failed"),
        }
    }

    fn on_clipboard_changed(&mut self) {
        match self.bridge.on_clipboard_changed(&mut self.slots) {
            CaptureOutcome::Captured { route, kind, promoted } => {
                info!(?route, %kind, ?promoted, "clipboard captured");
            }
            outcome => debug!(?outcome, "clipboard change not captured"),
        }
    }

    fn on_cleanup_tick(&mut self) {
        if let Err(e) = self.sequencer.cleanup_stuck_modifiers() {
            warn!(error = %e, "stuck-modifier cleanup failed");
        }
        let now = Instant::now();
        if let Some(index) = self.bridge.expire_stale_target(now, self.copy_timeout) {
            info!(index, "nothing was copied for the slot");
        }
        self.drain_changes();
        self.persister.flush_if_due(now, &self.slots);
    }

    fn shutdown(&mut self) {
        info!("engine shutting down");
        self.stopped = true;
        if let Err(e) = self.sequencer.release_all_modifiers() {
            warn!(error = %e, "releasing modifiers at shutdown failed");
        }
        self.paste.shutdown();
        self.drain_changes();
        self.persister.flush(&self.slots);
    }

    fn drain_changes(&mut self) {
        let mut changed = false;
        while let Ok(change) = self.changes.try_recv() {
            debug!(reason = ?change.reason, index = ?change.affected_index, "slot change");
            changed = true;
        }
        if changed {
            self.persister.mark_dirty(Instant::now());
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
