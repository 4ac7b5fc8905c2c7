//! Global hotkeys.
//!
//! On Windows, [`windows::WindowsHotkeySource`] registers each binding with
//! `RegisterHotKey` on a dedicated message-loop thread and forwards
//! `WM_HOTKEY` as [`EngineEvent::Hotkey`].  Tests and headless runs use
//! [`mock::MockHotkeySource`], which fires bindings on demand.
//!
//! # Default bindings
//!
//! | Chord                      | Action                 |
//! |----------------------------|------------------------|
//! | Ctrl+Alt+`1`..`0`          | copy into slot 1..10   |
//! | Ctrl+Shift+`1`..`0`        | paste slot 1..10       |
//! | Ctrl+Alt+Shift+`1`..`0`    | toggle lock 1..10      |
//! | Ctrl+Alt+C                 | copy into temp         |
//! | Ctrl+Alt+V                 | paste active slot      |
//! | Ctrl+Alt+T                 | paste temp             |
//! | Ctrl+Alt+P                 | promote temp           |
//! | Ctrl+Alt+Right / Left      | cycle active slot      |
//! | Ctrl+Alt+Shift+Backspace   | clear unlocked slots   |
//!
//! Slots past the tenth have no digit key and are reachable only through
//! the active-slot cursor.

use std::fmt;

use clipbank_core::keymap::windows_vk::{VK_BACK, VK_LEFT, VK_P, VK_RIGHT, VK_T};
use clipbank_core::keymap::{slot_digit_vk, VK_C, VK_V};
use clipbank_core::ModifierState;
use tokio::sync::mpsc::UnboundedSender;

use crate::application::engine::{EngineEvent, HotkeyAction};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for hotkey registration.
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey source already started")]
    AlreadyStarted,
    #[error("no hotkey could be registered")]
    NothingRegistered,
    #[error("hotkey thread failed: {0}")]
    Thread(String),
}

/// One chord and the action it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub modifiers: ModifierState,
    pub vk: u8,
    pub action: HotkeyAction,
}

impl HotkeyBinding {
    pub fn new(modifiers: ModifierState, vk: u8, action: HotkeyAction) -> Self {
        Self {
            modifiers,
            vk,
            action,
        }
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        match self.vk {
            VK_LEFT => f.write_str("Left"),
            VK_RIGHT => f.write_str("Right"),
            VK_BACK => f.write_str("Backspace"),
            vk if vk.is_ascii_digit() || vk.is_ascii_uppercase() => write!(f, "{}", vk as char),
            vk => write!(f, "VK 0x{vk:02X}"),
        }
    }
}

/// Produces hotkey events for the engine.
pub trait HotkeySource: Send {
    /// Starts delivering [`EngineEvent::Hotkey`] into `events`.
    fn start(&self, events: UnboundedSender<EngineEvent>) -> Result<(), HotkeyError>;
    /// Stops delivering events and releases every registration.
    fn stop(&self);
}

const CTRL_ALT: ModifierState = ModifierState {
    ctrl: true,
    shift: false,
    alt: true,
};
const CTRL_SHIFT: ModifierState = ModifierState {
    ctrl: true,
    shift: true,
    alt: false,
};
const CTRL_ALT_SHIFT: ModifierState = ModifierState {
    ctrl: true,
    shift: true,
    alt: true,
};

/// The built-in chord table for a bank of `slot_count` slots.
pub fn default_bindings(slot_count: usize) -> Vec<HotkeyBinding> {
    let mut bindings = Vec::new();
    for index in 0..slot_count {
        let Some(digit) = slot_digit_vk(index) else {
            break;
        };
        bindings.push(HotkeyBinding::new(CTRL_ALT, digit, HotkeyAction::CopyToSlot(index)));
        bindings.push(HotkeyBinding::new(CTRL_SHIFT, digit, HotkeyAction::PasteSlot(index)));
        bindings.push(HotkeyBinding::new(CTRL_ALT_SHIFT, digit, HotkeyAction::ToggleLock(index)));
    }
    bindings.extend([
        HotkeyBinding::new(CTRL_ALT, VK_C, HotkeyAction::Copy),
        HotkeyBinding::new(CTRL_ALT, VK_V, HotkeyAction::PasteActive),
        HotkeyBinding::new(CTRL_ALT, VK_T, HotkeyAction::PasteTemp),
        HotkeyBinding::new(CTRL_ALT, VK_P, HotkeyAction::PromoteTemp),
        HotkeyBinding::new(CTRL_ALT, VK_RIGHT, HotkeyAction::CycleNext),
        HotkeyBinding::new(CTRL_ALT, VK_LEFT, HotkeyAction::CyclePrevious),
        HotkeyBinding::new(CTRL_ALT_SHIFT, VK_BACK, HotkeyAction::ClearAllUnlocked),
    ]);
    bindings
}
