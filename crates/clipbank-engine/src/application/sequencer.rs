//! Modifier-safe key sequencing.
//!
//! Hotkeys are themselves held modifier combinations (Ctrl+Alt+1, ...).  If
//! the engine sent Ctrl+C while the user still physically held Alt, the
//! focused application would see Ctrl+Alt+C.  Every synthetic action
//! therefore runs the same protocol:
//!
//! ```text
//!  1. snapshot   which of Ctrl/Shift/Alt the hardware reports as held
//!  2. clear      key-up for every modifier code (generic + left + right), one batch
//!  3. settle     short sleep so the OS processes the release
//!  4. act        the Ctrl+C / Ctrl+V / text batch
//!  5. restore    key-down for exactly the modifiers held in step 1, one batch
//! ```
//!
//! Step 5 restores the *physical* snapshot, never the logical one: logical
//! state is influenced by synthetic input and would carry drift forward.
//!
//! Injection failures are returned but never retried.  Resending half a batch
//! could duplicate key transitions; [`ModifierSequencer::cleanup_stuck_modifiers`],
//! run on a timer, repairs whatever a failed batch leaves behind.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clipbank_core::keymap::{VK_C, VK_RETURN, VK_V};
use clipbank_core::keymap::windows_vk::VK_CONTROL;
use clipbank_core::{KeyEvent, Modifier, ModifierState};
use tracing::{debug, trace};

use super::inject::{InjectionError, InputInjector};

/// Default settle delay between the modifier release and the action.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(15);

/// Runs synthetic key sequences without disturbing held modifiers.
pub struct ModifierSequencer {
    injector: Arc<dyn InputInjector>,
    settle_delay: Duration,
}

impl ModifierSequencer {
    pub fn new(injector: Arc<dyn InputInjector>, settle_delay: Duration) -> Self {
        Self {
            injector,
            settle_delay,
        }
    }

    /// Modifiers the keyboard hardware reports as held.
    pub fn physical_modifiers(&self) -> ModifierState {
        self.read_modifiers(|vk| self.injector.is_key_physically_down(vk))
    }

    /// Modifiers the OS input-state table believes are held.
    pub fn logical_modifiers(&self) -> ModifierState {
        self.read_modifiers(|vk| self.injector.is_key_logically_down(vk))
    }

    /// Sends Ctrl+C to the focused window.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if any batch of the sequence failed.
    pub fn copy(&self) -> Result<(), InjectionError> {
        self.run_guarded(&shortcut(VK_C))
    }

    /// Sends Ctrl+V to the focused window.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if any batch of the sequence failed.
    pub fn paste(&self) -> Result<(), InjectionError> {
        self.run_guarded(&shortcut(VK_V))
    }

    /// Types `text` into the focused window as Unicode key events.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if any batch of the sequence failed.
    pub fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        let batch = text_key_events(text);
        if batch.is_empty() {
            return Ok(());
        }
        self.run_guarded(&batch)
    }

    /// Sends a key-up for every modifier code, held or not, as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the batch was not fully accepted.
    pub fn release_all_modifiers(&self) -> Result<(), InjectionError> {
        let batch: Vec<KeyEvent> = all_modifier_vks().map(KeyEvent::up).collect();
        self.injector.send_batch(&batch)
    }

    /// Releases every modifier code that is logically down but not
    /// physically down.  Returns how many key-ups were sent.
    ///
    /// Idempotent: with nothing stuck it sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the release batch was not fully accepted.
    pub fn cleanup_stuck_modifiers(&self) -> Result<usize, InjectionError> {
        let stuck: Vec<KeyEvent> = all_modifier_vks()
            .filter(|&vk| {
                self.injector.is_key_logically_down(vk) && !self.injector.is_key_physically_down(vk)
            })
            .map(KeyEvent::up)
            .collect();
        if stuck.is_empty() {
            return Ok(0);
        }
        debug!(count = stuck.len(), "releasing stuck modifiers");
        self.injector.send_batch(&stuck)?;
        Ok(stuck.len())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn run_guarded(&self, batch: &[KeyEvent]) -> Result<(), InjectionError> {
        let held = self.physical_modifiers();
        trace!(?held, events = batch.len(), "guarded sequence");

        let action = self.release_all_modifiers().and_then(|()| {
            thread::sleep(self.settle_delay);
            self.injector.send_batch(batch)
        });
        // Restore even after a failed action so the user's held keys come back.
        let restore = self.restore(held);
        action.and(restore)
    }

    fn restore(&self, held: ModifierState) -> Result<(), InjectionError> {
        let batch: Vec<KeyEvent> = held
            .held()
            .map(|m| KeyEvent::down(m.generic_vk()))
            .collect();
        if batch.is_empty() {
            return Ok(());
        }
        self.injector.send_batch(&batch)
    }

    fn read_modifiers(&self, is_down: impl Fn(u8) -> bool) -> ModifierState {
        let mut state = ModifierState::NONE;
        for m in Modifier::ALL {
            state.set(m, m.family().into_iter().any(&is_down));
        }
        state
    }
}

/// Ctrl + `vk` as press/press/release/release.
pub fn shortcut(vk: u8) -> [KeyEvent; 4] {
    [
        KeyEvent::down(VK_CONTROL),
        KeyEvent::down(vk),
        KeyEvent::up(vk),
        KeyEvent::up(VK_CONTROL),
    ]
}

/// One down/up pair per UTF-16 code unit; `\n` and `\r\n` become Enter.
pub fn text_key_events(text: &str) -> Vec<KeyEvent> {
    let mut events = Vec::with_capacity(text.len() * 2);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => continue,
            '\r' | '\n' => {
                events.push(KeyEvent::down(VK_RETURN));
                events.push(KeyEvent::up(VK_RETURN));
            }
            _ => {
                let mut buf = [0u16; 2];
                for &unit in c.encode_utf16(&mut buf).iter() {
                    events.push(KeyEvent::unicode_down(unit));
                    events.push(KeyEvent::unicode_up(unit));
                }
            }
        }
    }
    events
}

fn all_modifier_vks() -> impl Iterator<Item = u8> {
    Modifier::ALL.into_iter().flat_map(Modifier::family)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
