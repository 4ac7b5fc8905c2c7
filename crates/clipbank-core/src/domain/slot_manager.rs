//! The slot store state machine.
//!
//! The [`SlotManager`] owns the N numbered slots, the temp slot, the
//! active-slot cursor and the round-robin position.  Every mutation goes
//! through one of its transitions, and every transition that changes
//! something raises a [`SlotChange`] notification for the UI and the
//! debounced persistence layer.
//!
//! # Slot states (for beginners)
//!
//! ```text
//!            capture / promote            toggle_lock
//!   Empty  ─────────────────────►  Occupied  ◄──────────►  Locked
//!     ▲                               │                       │
//!     └──────── clear_slot ───────────┴──────── clear_slot ───┘
//! ```
//!
//! A locked slot ignores captures and promotions.  Only `toggle_lock`
//! (unlock) and `clear_slot` touch it.  The temp slot has no lock.
//!
//! # Threading
//!
//! All transitions are synchronous, in-memory and never block.  The manager
//! is mutated only from the engine's single dispatch thread, so it holds no
//! internal locks.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::content::ClipboardContent;
use super::settings::{FillMode, SlotSettings};
use super::slot::{Slot, TempSlot};

/// Errors raised by explicit slot operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The slot index is outside `0..count`.
    #[error("slot index {index} out of range (bank has {count} slots)")]
    OutOfRange { index: usize, count: usize },
}

/// Why a [`SlotChange`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeReason {
    /// Targeted copy landed in a numbered slot.
    Captured,
    /// Normal copy landed in the temp slot.
    CapturedToTemp,
    /// The temp slot was promoted into a numbered slot.
    Promoted,
    /// A single slot was cleared.
    Cleared,
    /// Every unlocked slot was cleared.
    ClearedAll,
    LockToggled,
    LabelChanged,
    /// The active-slot cursor moved.
    ActiveChanged,
    /// The whole bank was replaced (startup restore or slot-count change).
    Restored,
}

/// Change notification consumed by the UI and the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChange {
    pub reason: ChangeReason,
    /// The numbered slot affected, if the change concerns exactly one.
    pub affected_index: Option<usize>,
}

/// Result of [`SlotManager::promote_temp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// The temp content was written to `index`.
    Promoted { index: usize },
    /// Slot `index` already holds the temp content; nothing was written.
    Duplicate { index: usize },
    /// Nothing to promote.
    TempEmpty,
    /// Round robin found no unlocked slot; the temp slot keeps its content.
    AllLocked,
    /// Fixed mode and the active slot is locked.
    TargetLocked { index: usize },
    /// The capture came from a sticky application and stays in the temp slot.
    StickyApp,
}

/// Everything the persistence sink stores and returns on startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSlots {
    pub slots: Vec<Slot>,
    pub temp: TempSlot,
    pub active: usize,
    pub last_filled: Option<usize>,
}

/// The slot store and its routing policy.
pub struct SlotManager {
    settings: SlotSettings,
    slots: Vec<Slot>,
    temp: TempSlot,
    /// Active-slot cursor; always `< slots.len()`.
    active: usize,
    /// Last slot filled by a promotion; round robin continues after it.
    last_filled: Option<usize>,
    subscribers: Vec<Sender<SlotChange>>,
}

impl SlotManager {
    /// Creates a bank of empty slots sized from `settings`.
    pub fn new(settings: SlotSettings) -> Self {
        let count = settings.effective_slot_count();
        Self {
            settings,
            slots: (0..count).map(Slot::empty).collect(),
            temp: TempSlot::default(),
            active: 0,
            last_filled: None,
            subscribers: Vec::new(),
        }
    }

    /// Creates a bank from previously persisted state.
    ///
    /// The persisted list is resized to the configured slot count: extra
    /// slots are dropped, missing ones are empty.  Indices are rewritten to
    /// match positions, and the cursors are clamped into range.
    pub fn restore(settings: SlotSettings, persisted: PersistedSlots) -> Self {
        let mut manager = Self::new(settings);
        manager.load(persisted);
        manager
    }

    /// Registers a new change-notification subscriber.
    ///
    /// Dropped receivers are pruned on the next notification.
    pub fn subscribe(&mut self) -> Receiver<SlotChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn settings(&self) -> &SlotSettings {
        &self.settings
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn get_slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn get_all_slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn active_slot_index(&self) -> usize {
        self.active
    }

    pub fn temp_slot(&self) -> &TempSlot {
        &self.temp
    }

    pub fn last_filled(&self) -> Option<usize> {
        self.last_filled
    }

    /// Full copy of the bank for the persistence sink.
    pub fn snapshot(&self) -> PersistedSlots {
        PersistedSlots {
            slots: self.slots.clone(),
            temp: self.temp.clone(),
            active: self.active,
            last_filled: self.last_filled,
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Stores a normal copy in the temp slot.
    ///
    /// The temp slot is never locked, so this always succeeds unless
    /// `content` is empty (a detection miss), which leaves everything as is.
    /// Returns `true` if the temp slot changed.
    pub fn capture_to_temp(&mut self, content: ClipboardContent, source_app: Option<String>) -> bool {
        if content.is_empty() {
            debug!("empty capture ignored");
            return false;
        }
        trace!(kind = %content.kind(), source = ?source_app, "capture to temp");
        self.temp = TempSlot {
            content,
            timestamp: Some(SystemTime::now()),
            source_app,
        };
        self.notify(ChangeReason::CapturedToTemp, None);
        true
    }

    /// Stores a targeted copy in slot `index`.
    ///
    /// A locked slot silently drops the capture.  Returns `Ok(true)` if the
    /// slot changed.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn capture_to_slot(&mut self, index: usize, content: ClipboardContent) -> Result<bool, SlotError> {
        self.check_index(index)?;
        if content.is_empty() {
            debug!(index, "empty capture ignored");
            return Ok(false);
        }
        let slot = &mut self.slots[index];
        if slot.locked {
            debug!(index, "slot locked; targeted capture dropped");
            return Ok(false);
        }
        slot.fill(content, SystemTime::now());
        self.notify(ChangeReason::Captured, Some(index));
        Ok(true)
    }

    /// Moves the temp content into a numbered slot under the fill mode.
    ///
    /// `source_app` is the application the temp content was copied from.
    /// Automatic promotion passes it so sticky applications keep their
    /// copies in the temp slot; manual promotion passes `None`.
    pub fn promote_temp(&mut self, source_app: Option<&str>) -> PromoteOutcome {
        if self.temp.is_empty() {
            return PromoteOutcome::TempEmpty;
        }
        if let Some(app) = source_app {
            if self.settings.is_sticky(app) {
                debug!(app, "sticky application; promotion skipped");
                return PromoteOutcome::StickyApp;
            }
        }

        let outcome = match self.settings.fill_mode {
            FillMode::RoundRobin => self.promote_round_robin(),
            FillMode::Fixed => self.promote_fixed(),
        };
        debug!(?outcome, "promote temp");
        outcome
    }

    /// Moves the active cursor by `delta`, wrapping at both ends.
    ///
    /// Locked slots are not skipped: the cursor is only a pointer.
    pub fn cycle_active(&mut self, delta: isize) {
        let n = self.slots.len() as isize;
        let next = (self.active as isize + delta).rem_euclid(n) as usize;
        if next != self.active {
            self.active = next;
            self.notify(ChangeReason::ActiveChanged, Some(next));
        }
    }

    /// Points the active cursor at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn set_active(&mut self, index: usize) -> Result<(), SlotError> {
        self.check_index(index)?;
        if index != self.active {
            self.active = index;
            self.notify(ChangeReason::ActiveChanged, Some(index));
        }
        Ok(())
    }

    /// Flips the lock flag of slot `index` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, SlotError> {
        self.check_index(index)?;
        let slot = &mut self.slots[index];
        slot.locked = !slot.locked;
        let locked = slot.locked;
        self.notify(ChangeReason::LockToggled, Some(index));
        Ok(locked)
    }

    /// Empties slot `index` and releases its lock.  The label is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn clear_slot(&mut self, index: usize) -> Result<(), SlotError> {
        self.check_index(index)?;
        let slot = &mut self.slots[index];
        slot.clear();
        slot.locked = false;
        self.notify(ChangeReason::Cleared, Some(index));
        Ok(())
    }

    /// Empties every unlocked slot.  Locked slots and the temp slot are untouched.
    ///
    /// Returns the number of slots that held content.  Nothing is
    /// notified when that number is zero.
    pub fn clear_all_unlocked(&mut self) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut().filter(|s| !s.locked && !s.is_empty()) {
            slot.clear();
            cleared += 1;
        }
        if cleared > 0 {
            self.notify(ChangeReason::ClearedAll, None);
        }
        cleared
    }

    /// Sets or removes the label of slot `index`.  Allowed on locked slots.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn set_label(&mut self, index: usize, label: Option<String>) -> Result<(), SlotError> {
        self.check_index(index)?;
        let label = label.filter(|l| !l.trim().is_empty());
        self.slots[index].label = label;
        self.notify(ChangeReason::LabelChanged, Some(index));
        Ok(())
    }

    /// Applies new settings, resizing the bank if the slot count changed.
    pub fn reconfigure(&mut self, settings: SlotSettings) {
        let resized = settings.effective_slot_count() != self.slots.len();
        let snapshot = self.snapshot();
        self.settings = settings;
        if resized {
            self.load(snapshot);
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn promote_round_robin(&mut self) -> PromoteOutcome {
        let n = self.slots.len();
        let start = self.last_filled.map(|i| (i + 1) % n).unwrap_or(0);
        let target = match (0..n).map(|k| (start + k) % n).find(|&i| !self.slots[i].locked) {
            Some(i) => i,
            None => return PromoteOutcome::AllLocked,
        };

        // Same content either at the target or in the slot filled last (the
        // same item promoted twice in a row): skip the write, but still move
        // the cursor so the next promotion tests a different slot.
        let duplicate_of = if self.slots[target].content.same_content(&self.temp.content) {
            Some(target)
        } else {
            self.last_filled
                .filter(|&i| i < n && self.slots[i].content.same_content(&self.temp.content))
        };

        self.last_filled = Some(target);
        let moved = self.active != target;
        self.active = target;

        if let Some(index) = duplicate_of {
            if moved {
                self.notify(ChangeReason::ActiveChanged, Some(target));
            }
            return PromoteOutcome::Duplicate { index };
        }

        self.write_promotion(target);
        PromoteOutcome::Promoted { index: target }
    }

    fn promote_fixed(&mut self) -> PromoteOutcome {
        let target = self.active;
        if self.slots[target].locked {
            return PromoteOutcome::TargetLocked { index: target };
        }
        if self.slots[target].content.same_content(&self.temp.content) {
            return PromoteOutcome::Duplicate { index: target };
        }
        self.last_filled = Some(target);
        self.write_promotion(target);
        PromoteOutcome::Promoted { index: target }
    }

    fn write_promotion(&mut self, target: usize) {
        let content = self.temp.content.clone();
        self.slots[target].fill(content, SystemTime::now());
        self.notify(ChangeReason::Promoted, Some(target));
    }

    /// Replaces the bank with `persisted`, fitted to the configured count.
    fn load(&mut self, persisted: PersistedSlots) {
        let count = self.settings.effective_slot_count();
        let mut slots: Vec<Slot> = persisted.slots.into_iter().take(count).collect();
        while slots.len() < count {
            slots.push(Slot::empty(slots.len()));
        }
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.index = i;
        }

        self.slots = slots;
        self.temp = persisted.temp;
        self.active = persisted.active.min(count - 1);
        self.last_filled = persisted.last_filled.filter(|&i| i < count);
        self.notify(ChangeReason::Restored, None);
    }

    fn check_index(&self, index: usize) -> Result<(), SlotError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(SlotError::OutOfRange {
                index,
                count: self.slots.len(),
            })
        }
    }

    fn notify(&mut self, reason: ChangeReason, affected_index: Option<usize>) {
        let change = SlotChange {
            reason,
            affected_index,
        };
        trace!(?change, "slot change");
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
