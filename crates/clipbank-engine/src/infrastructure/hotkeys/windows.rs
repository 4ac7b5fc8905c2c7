//! Windows global hotkeys via `RegisterHotKey`.
//!
//! Hotkeys registered with a null window are posted as `WM_HOTKEY` to the
//! registering thread's queue, so registration and the `GetMessageW` loop
//! both live on the `clipbank-hotkeys` thread.  `stop` posts `WM_QUIT` to
//! that thread; the loop exits and unregisters everything.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::thread;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
    MOD_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{GetMessageW, PostThreadMessageW, MSG, WM_HOTKEY, WM_QUIT};

use super::{HotkeyBinding, HotkeyError, HotkeySource};
use crate::application::engine::EngineEvent;

/// Windows implementation of [`HotkeySource`].
pub struct WindowsHotkeySource {
    bindings: Vec<HotkeyBinding>,
    /// Id of the message-loop thread; 0 while not running.
    thread_id: AtomicU32,
}

impl WindowsHotkeySource {
    pub fn new(bindings: Vec<HotkeyBinding>) -> Self {
        Self {
            bindings,
            thread_id: AtomicU32::new(0),
        }
    }
}

impl HotkeySource for WindowsHotkeySource {
    fn start(&self, events: UnboundedSender<EngineEvent>) -> Result<(), HotkeyError> {
        if self.thread_id.load(Ordering::SeqCst) != 0 {
            return Err(HotkeyError::AlreadyStarted);
        }
        let bindings = self.bindings.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<(u32, usize)>();

        thread::Builder::new()
            .name("clipbank-hotkeys".to_string())
            .spawn(move || run_hotkey_loop(&bindings, &events, &ready_tx))
            .map_err(|e| HotkeyError::Thread(e.to_string()))?;

        let (thread_id, registered) = ready_rx
            .recv()
            .map_err(|_| HotkeyError::Thread("hotkey thread exited during start".to_string()))?;
        if registered == 0 {
            // SAFETY: posting to a thread id has no memory-safety preconditions.
            let _ = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
            return Err(HotkeyError::NothingRegistered);
        }
        self.thread_id.store(thread_id, Ordering::SeqCst);
        info!(registered, total = self.bindings.len(), "hotkeys registered");
        Ok(())
    }

    fn stop(&self) {
        let thread_id = self.thread_id.swap(0, Ordering::SeqCst);
        if thread_id == 0 {
            return;
        }
        // SAFETY: posting to a thread id has no memory-safety preconditions.
        if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            warn!(error = %e, "could not stop hotkey thread");
        }
    }
}

/// Body of the `clipbank-hotkeys` thread.
fn run_hotkey_loop(
    bindings: &[HotkeyBinding],
    events: &UnboundedSender<EngineEvent>,
    ready: &mpsc::Sender<(u32, usize)>,
) {
    // Hotkey ids are 1-based positions in `bindings`.
    let mut registered = Vec::new();
    for (position, binding) in bindings.iter().enumerate() {
        let id = position as i32 + 1;
        // SAFETY: a null window posts WM_HOTKEY to this thread's queue.
        match unsafe { RegisterHotKey(None, id, to_hot_key_modifiers(binding), u32::from(binding.vk)) } {
            Ok(()) => registered.push(id),
            Err(e) => warn!(%binding, error = %e, "hotkey unavailable (already taken?)"),
        }
    }

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    if ready.send((thread_id, registered.len())).is_err() || registered.is_empty() {
        unregister(&registered);
        return;
    }

    let mut msg = MSG::default();
    // SAFETY: standard Win32 GetMessage loop on the thread that owns the queue.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            if msg.message != WM_HOTKEY {
                continue;
            }
            let Some(binding) = (msg.wParam.0 as usize).checked_sub(1).and_then(|i| bindings.get(i)) else {
                continue;
            };
            debug!(%binding, "hotkey pressed");
            if events.send(EngineEvent::Hotkey(binding.action)).is_err() {
                break;
            }
        }
    }
    unregister(&registered);
}

fn unregister(ids: &[i32]) {
    for &id in ids {
        // SAFETY: `id` was registered by this thread with a null window.
        let _ = unsafe { UnregisterHotKey(None, id) };
    }
}

fn to_hot_key_modifiers(binding: &HotkeyBinding) -> HOT_KEY_MODIFIERS {
    let mut mods = MOD_NOREPEAT;
    if binding.modifiers.ctrl {
        mods |= MOD_CONTROL;
    }
    if binding.modifiers.alt {
        mods |= MOD_ALT;
    }
    if binding.modifiers.shift {
        mods |= MOD_SHIFT;
    }
    mods
}
