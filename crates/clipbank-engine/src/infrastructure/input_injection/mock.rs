//! Mock input injector for unit testing and headless runs.
//!
//! # Why a mock injector?
//!
//! The real injector calls `SendInput`, which:
//!
//! - Requires an interactive desktop session.
//! - Actually presses keys on the test machine.
//! - Cannot be observed directly from Rust test code.
//!
//! `MockInputInjector` records every batch instead and keeps two simulated
//! key-state tables, *physical* and *logical*, so the sequencer's
//! snapshot/clear/restore protocol can be checked end to end.
//!
//! - Hardware presses (`press_physical`) update both tables.
//! - Injected batches update only the logical table.
//! - Querying a generic modifier code (`VK_CONTROL`) also reports `true`
//!   when one of its sided codes is down, like `GetAsyncKeyState` does.
//!
//! # Failure injection
//!
//! `set_should_fail(true)` makes every batch fail; `fail_batch_number(n)`
//! fails only the n-th call (1-based).  Failed batches are not recorded and
//! do not touch the logical table.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use clipbank_core::keymap::VK_RETURN;
use clipbank_core::{KeyCode, KeyEvent, Modifier};

use crate::application::inject::{InjectionError, InputInjector};

/// A mock injector that records batches without performing OS calls.
#[derive(Default)]
pub struct MockInputInjector {
    batches: Mutex<Vec<Vec<KeyEvent>>>,
    physical: Mutex<HashSet<u8>>,
    logical: Mutex<HashSet<u8>>,
    calls: AtomicUsize,
    /// 1-based call number that fails; 0 = none.
    fail_on: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successfully sent batch, in order.
    pub fn batches(&self) -> Vec<Vec<KeyEvent>> {
        lock(&self.batches).clone()
    }

    /// Forgets recorded batches (key-state tables are kept).
    pub fn clear_batches(&self) {
        lock(&self.batches).clear();
    }

    /// The text typed through Unicode events, with Enter as `\n`.
    ///
    /// Modifier and shortcut events are ignored.
    pub fn typed_text(&self) -> String {
        let units: Vec<u16> = lock(&self.batches)
            .iter()
            .flatten()
            .filter(|e| !e.is_key_up)
            .filter_map(|e| match e.key {
                KeyCode::Unicode(unit) => Some(unit),
                KeyCode::Virtual(VK_RETURN) => Some(u16::from(b'\n')),
                KeyCode::Virtual(_) => None,
            })
            .collect();
        String::from_utf16_lossy(&units)
    }

    /// Simulates the user pressing `vk` on the keyboard.
    pub fn press_physical(&self, vk: u8) {
        lock(&self.physical).insert(vk);
        lock(&self.logical).insert(vk);
    }

    /// Simulates the user releasing `vk` on the keyboard.
    pub fn release_physical(&self, vk: u8) {
        lock(&self.physical).remove(&vk);
        lock(&self.logical).remove(&vk);
    }

    /// Forces the logical table entry for `vk`, as foreign synthetic input would.
    pub fn set_logical(&self, vk: u8, down: bool) {
        let mut logical = lock(&self.logical);
        if down {
            logical.insert(vk);
        } else {
            logical.remove(&vk);
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Makes the `n`-th `send_batch` call (1-based, counted from creation) fail.
    pub fn fail_batch_number(&self, n: usize) {
        self.fail_on.store(n, Ordering::SeqCst);
    }
}

impl InputInjector for MockInputInjector {
    fn send_batch(&self, events: &[KeyEvent]) -> Result<(), InjectionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.should_fail.load(Ordering::SeqCst) || self.fail_on.load(Ordering::SeqCst) == call {
            return Err(InjectionError::Partial {
                sent: 0,
                expected: events.len(),
            });
        }
        if events.is_empty() {
            return Ok(());
        }

        {
            let mut logical = lock(&self.logical);
            for event in events {
                if let Some(vk) = event.virtual_key() {
                    if event.is_key_up {
                        logical.remove(&vk);
                    } else {
                        logical.insert(vk);
                    }
                }
            }
        }
        lock(&self.batches).push(events.to_vec());
        Ok(())
    }

    fn is_key_physically_down(&self, vk: u8) -> bool {
        is_down(&lock(&self.physical), vk)
    }

    fn is_key_logically_down(&self, vk: u8) -> bool {
        is_down(&lock(&self.logical), vk)
    }
}

/// A generic modifier code reads as down when any code of its family is down.
fn is_down(table: &HashSet<u8>, vk: u8) -> bool {
    if table.contains(&vk) {
        return true;
    }
    Modifier::ALL
        .into_iter()
        .find(|m| m.generic_vk() == vk)
        .map(|m| m.family().iter().any(|code| table.contains(code)))
        .unwrap_or(false)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
