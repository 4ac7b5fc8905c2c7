//! Mock hotkey source for tests and headless runs.
//!
//! [`MockHotkeySource::press`] looks the chord up in its bindings and sends
//! the matching event, as if the user had pressed it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use clipbank_core::ModifierState;
use tokio::sync::mpsc::UnboundedSender;

use super::{HotkeyBinding, HotkeyError, HotkeySource};
use crate::application::engine::EngineEvent;

/// A [`HotkeySource`] driven by test code.
pub struct MockHotkeySource {
    bindings: Vec<HotkeyBinding>,
    sender: Mutex<Option<UnboundedSender<EngineEvent>>>,
}

impl MockHotkeySource {
    pub fn new(bindings: Vec<HotkeyBinding>) -> Self {
        Self {
            bindings,
            sender: Mutex::new(None),
        }
    }

    /// Simulates the chord `modifiers`+`vk`.  Returns `true` if a binding
    /// matched and the event was delivered.
    pub fn press(&self, modifiers: ModifierState, vk: u8) -> bool {
        let Some(binding) = self
            .bindings
            .iter()
            .find(|b| b.modifiers == modifiers && b.vk == vk)
        else {
            return false;
        };
        match lock(&self.sender).as_ref() {
            Some(tx) => tx.send(EngineEvent::Hotkey(binding.action)).is_ok(),
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.sender).is_some()
    }
}

impl HotkeySource for MockHotkeySource {
    fn start(&self, events: UnboundedSender<EngineEvent>) -> Result<(), HotkeyError> {
        let mut sender = lock(&self.sender);
        if sender.is_some() {
            return Err(HotkeyError::AlreadyStarted);
        }
        *sender = Some(events);
        Ok(())
    }

    fn stop(&self) {
        lock(&self.sender).take();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
