//! # clipbank-core
//!
//! Shared domain library for ClipBank: the clipboard content model, the
//! numbered slot store with its promotion policy, and the keyboard modifier
//! types the input sequencer works with.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or file I/O.
//! Everything here can be unit-tested on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! ClipBank keeps a fixed bank of numbered *slots* plus one *temp slot*.
//! Every ordinary copy lands in the temp slot; a hotkey can instead copy
//! straight into slot N, or *promote* the temp slot into the next numbered
//! slot.  Another hotkey pastes a slot back into the focused application.
//!
//! - **`domain`** – Pure business rules.  The most important piece is the
//!   [`SlotManager`]: the state machine that owns every slot, the lock flags,
//!   the active-slot cursor and duplicate suppression.
//!
//! - **`keymap`** – Windows virtual-key constants and the modifier key
//!   families (generic + left/right variants) that must be released before
//!   synthetic input is sent.

pub mod domain;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `clipbank_core::SlotManager` instead of the full module path.
pub use domain::content::{ClipboardContent, ContentHash, ContentKind, ImageData, Payload};
pub use domain::modifiers::{KeyCode, KeyEvent, Modifier, ModifierState};
pub use domain::settings::{FillMode, SlotSettings};
pub use domain::slot::{Slot, SlotState, TempSlot};
pub use domain::slot_manager::{
    ChangeReason, PersistedSlots, PromoteOutcome, SlotChange, SlotError, SlotManager,
};
