//! Windows input injection via the SendInput API.
//!
//! A whole [`KeyEvent`] batch becomes one `INPUT` array and one `SendInput`
//! call, which Windows inserts into the input stream without interleaving
//! other keyboard or mouse input.
//!
//! Key state comes from two different APIs:
//! - `GetAsyncKeyState` – the hardware state at the time of the call.
//! - `GetKeyState` – the thread's input-state table, which synthetic input
//!   updates too.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use clipbank_core::keymap::windows_vk::is_extended;
use clipbank_core::{KeyCode, KeyEvent};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

use crate::application::inject::{InjectionError, InputInjector};

/// Windows implementation of [`InputInjector`] using SendInput.
pub struct WindowsInputInjector;

impl WindowsInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsInputInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for WindowsInputInjector {
    fn send_batch(&self, events: &[KeyEvent]) -> Result<(), InjectionError> {
        if events.is_empty() {
            return Ok(());
        }
        let inputs: Vec<INPUT> = events.iter().map(to_input).collect();

        // SAFETY: `inputs` is a valid, fully initialised INPUT slice on the heap
        // and the size argument matches the element type.
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) } as usize;

        if sent == inputs.len() {
            Ok(())
        } else {
            Err(InjectionError::Partial {
                sent,
                expected: inputs.len(),
            })
        }
    }

    fn is_key_physically_down(&self, vk: u8) -> bool {
        // SAFETY: GetAsyncKeyState has no preconditions.
        let state = unsafe { GetAsyncKeyState(i32::from(vk)) };
        // Most significant bit set = key is down.
        state < 0
    }

    fn is_key_logically_down(&self, vk: u8) -> bool {
        // SAFETY: GetKeyState has no preconditions.
        let state = unsafe { GetKeyState(i32::from(vk)) };
        state < 0
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn to_input(event: &KeyEvent) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if event.is_key_up {
        flags |= KEYEVENTF_KEYUP;
    }

    let (vk, scan) = match event.key {
        KeyCode::Virtual(vk) => {
            if is_extended(vk) {
                flags |= KEYEVENTF_EXTENDEDKEY;
            }
            (VIRTUAL_KEY(u16::from(vk)), 0)
        }
        KeyCode::Unicode(unit) => {
            // With KEYEVENTF_UNICODE the code unit travels in wScan and wVk must be 0.
            flags |= KEYEVENTF_UNICODE;
            (VIRTUAL_KEY(0), unit)
        }
    };

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}
