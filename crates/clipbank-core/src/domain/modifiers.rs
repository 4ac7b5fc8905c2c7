//! Modifier key snapshots and synthetic key events.
//!
//! # Physical vs. logical state (for beginners)
//!
//! The OS answers "is Ctrl down?" in two different ways:
//!
//! - **Physical** – what the keyboard hardware reports right now.  Synthetic
//!   input never changes it.
//! - **Logical** – what the OS input-state table believes.  Every synthetic
//!   key event updates it, so after our own `SendInput` calls it can claim a
//!   key is held that nobody is pressing (a *stuck* modifier).
//!
//! A [`ModifierState`] is a plain value; whether it holds a physical or a
//! logical reading is decided by whoever filled it in.

use serde::{Deserialize, Serialize};

use crate::keymap::windows_vk::{
    VK_CONTROL, VK_LCONTROL, VK_LMENU, VK_LSHIFT, VK_MENU, VK_RCONTROL, VK_RMENU, VK_RSHIFT,
    VK_SHIFT,
};

/// One of the three modifiers the sequencer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
}

impl Modifier {
    /// All managed modifiers, in the order they are released and restored.
    pub const ALL: [Modifier; 3] = [Modifier::Ctrl, Modifier::Shift, Modifier::Alt];

    /// The generic virtual key (`VK_CONTROL`, `VK_SHIFT`, `VK_MENU`).
    pub fn generic_vk(self) -> u8 {
        match self {
            Modifier::Ctrl => VK_CONTROL,
            Modifier::Shift => VK_SHIFT,
            Modifier::Alt => VK_MENU,
        }
    }

    /// The generic key followed by its left and right variants.
    pub fn family(self) -> [u8; 3] {
        match self {
            Modifier::Ctrl => [VK_CONTROL, VK_LCONTROL, VK_RCONTROL],
            Modifier::Shift => [VK_SHIFT, VK_LSHIFT, VK_RSHIFT],
            Modifier::Alt => [VK_MENU, VK_LMENU, VK_RMENU],
        }
    }
}

/// Which of Ctrl / Shift / Alt are down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ModifierState {
    /// No modifier held.
    pub const NONE: ModifierState = ModifierState {
        ctrl: false,
        shift: false,
        alt: false,
    };

    /// Returns whether `modifier` is marked as down.
    pub fn is_held(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Shift => self.shift,
            Modifier::Alt => self.alt,
        }
    }

    /// Marks `modifier` as down or up.
    pub fn set(&mut self, modifier: Modifier, down: bool) {
        match modifier {
            Modifier::Ctrl => self.ctrl = down,
            Modifier::Shift => self.shift = down,
            Modifier::Alt => self.alt = down,
        }
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, modifier: Modifier, down: bool) -> Self {
        self.set(modifier, down);
        self
    }

    /// Iterates over the modifiers that are down, in [`Modifier::ALL`] order.
    pub fn held(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.is_held(*m))
    }

    /// Returns `true` if at least one modifier is down.
    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt
    }
}

/// What a synthetic key event presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A virtual key code (layout-dependent meaning, used for shortcuts).
    Virtual(u8),
    /// A UTF-16 code unit typed directly, bypassing the keyboard layout.
    Unicode(u16),
}

/// A single synthetic key transition.
///
/// Order within a batch is significant and is preserved end-to-end through
/// injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub is_key_up: bool,
}

impl KeyEvent {
    /// Virtual-key press.
    pub fn down(vk: u8) -> Self {
        Self {
            key: KeyCode::Virtual(vk),
            is_key_up: false,
        }
    }

    /// Virtual-key release.
    pub fn up(vk: u8) -> Self {
        Self {
            key: KeyCode::Virtual(vk),
            is_key_up: true,
        }
    }

    /// Unicode code-unit press.
    pub fn unicode_down(unit: u16) -> Self {
        Self {
            key: KeyCode::Unicode(unit),
            is_key_up: false,
        }
    }

    /// Unicode code-unit release.
    pub fn unicode_up(unit: u16) -> Self {
        Self {
            key: KeyCode::Unicode(unit),
            is_key_up: true,
        }
    }

    /// Returns the virtual key, or `None` for Unicode events.
    pub fn virtual_key(&self) -> Option<u8> {
        match self.key {
            KeyCode::Virtual(vk) => Some(vk),
            KeyCode::Unicode(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
