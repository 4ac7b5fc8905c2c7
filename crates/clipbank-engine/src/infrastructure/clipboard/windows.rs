//! Windows clipboard adapter.
//!
//! Opening the clipboard is process-global and exclusive, so it is wrapped
//! in [`OpenClipboardGuard`] which closes it on drop.  The reader keeps the
//! guard alive for as long as detection runs.
//!
//! Every format is read by copying its global-memory block into a `Vec<u8>`
//! and decoding it with the helpers in [`super::formats`].
//!
//! `EmptyClipboard` hands clipboard ownership to the window the clipboard
//! was opened with, and `SetClipboardData` is only supported when that
//! window is real.  Writes therefore open the clipboard with a message-only
//! window created on the `clipbank-clipboard` thread, which also pumps the
//! messages the system sends to the clipboard owner.  Reads need no owner.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use clipbank_core::{ClipboardContent, ImageData};
use tracing::{debug, warn};
use windows::core::{w, PWSTR};
use windows::Win32::Foundation::{CloseHandle, GlobalFree, HANDLE, HGLOBAL, HWND, LPARAM, WPARAM};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, GetClipboardOwner,
    GetClipboardSequenceNumber, IsClipboardFormatAvailable, OpenClipboard,
    RegisterClipboardFormatW, SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE};
use windows::Win32::System::Threading::{
    GetCurrentThreadId, OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, DispatchMessageW, GetMessageW, GetWindowThreadProcessId,
    PostThreadMessageW, HWND_MESSAGE, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_QUIT,
};

use super::formats::{decode_cf_html, decode_hdrop, dib_dimensions, encode_cf_html, encode_hdrop};
use super::Representations;
use crate::application::clipboard_bridge::{ClipboardAccess, ClipboardError, ClipboardReader};

// Predefined clipboard formats (winuser.h).
const CF_DIB: u32 = 8;
const CF_UNICODETEXT: u32 = 13;
const CF_HDROP: u32 = 15;

/// Registered format ids, resolved once at construction.
#[derive(Debug, Clone, Copy)]
struct Formats {
    html: u32,
    rtf: u32,
}

/// Windows implementation of [`ClipboardAccess`].
pub struct WindowsClipboard {
    formats: Formats,
    owner: OwnerWindow,
}

impl WindowsClipboard {
    /// Registers the "HTML Format" and "Rich Text Format" clipboard formats
    /// and creates the owner window.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Platform`] if a registration fails or the
    /// owner window cannot be created.
    pub fn new() -> Result<Self, ClipboardError> {
        // SAFETY: both arguments are static NUL-terminated wide strings.
        let html = unsafe { RegisterClipboardFormatW(w!("HTML Format")) };
        let rtf = unsafe { RegisterClipboardFormatW(w!("Rich Text Format")) };
        if html == 0 || rtf == 0 {
            return Err(ClipboardError::Platform(
                "RegisterClipboardFormatW failed".to_string(),
            ));
        }
        Ok(Self {
            formats: Formats { html, rtf },
            owner: OwnerWindow::spawn()?,
        })
    }

    fn set_representations(&self, reps: &Representations) -> Result<(), ClipboardError> {
        if let Some(text) = &reps.text {
            let mut units: Vec<u16> = text.encode_utf16().collect();
            units.push(0);
            let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
            set_global(CF_UNICODETEXT, &bytes)?;
        }
        if let Some(html) = &reps.html {
            let mut bytes = encode_cf_html(html).into_bytes();
            bytes.push(0);
            set_global(self.formats.html, &bytes)?;
        }
        if let Some(rtf) = &reps.rtf {
            let mut bytes = rtf.clone();
            bytes.push(0);
            set_global(self.formats.rtf, &bytes)?;
        }
        if let Some(image) = &reps.image {
            set_global(CF_DIB, &image.dib)?;
        }
        if let Some(files) = &reps.files {
            set_global(CF_HDROP, &encode_hdrop(files))?;
        }
        Ok(())
    }
}

impl ClipboardAccess for WindowsClipboard {
    fn open_reader(&self) -> Result<Box<dyn ClipboardReader + '_>, ClipboardError> {
        let guard = OpenClipboardGuard::open(None)?;
        Ok(Box::new(WindowsReader {
            _guard: guard,
            formats: self.formats,
        }))
    }

    fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
        let _guard = OpenClipboardGuard::open(Some(self.owner.hwnd()))?;
        // SAFETY: the clipboard is open on this thread with our owner window.
        unsafe { EmptyClipboard() }.map_err(|e| ClipboardError::Platform(e.to_string()))?;
        self.set_representations(&Representations::of(content))
    }

    fn owner_process(&self) -> Option<String> {
        // SAFETY: GetClipboardOwner has no preconditions; a null window means no owner.
        let hwnd = unsafe { GetClipboardOwner() }.ok()?;
        if hwnd.is_invalid() {
            return None;
        }
        let mut pid = 0u32;
        // SAFETY: `pid` outlives the call.
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };
        if pid == 0 {
            return None;
        }
        process_image_name(pid)
    }

    fn sequence_number(&self) -> u32 {
        // SAFETY: GetClipboardSequenceNumber has no preconditions.
        unsafe { GetClipboardSequenceNumber() }
    }
}

// ── Open clipboard ────────────────────────────────────────────────────────────

/// Holds the clipboard open; closes it on drop.
struct OpenClipboardGuard;

impl OpenClipboardGuard {
    fn open(owner: Option<HWND>) -> Result<Self, ClipboardError> {
        // SAFETY: `owner` is either `None` or the live owner window.
        unsafe { OpenClipboard(owner) }.map_err(|e| {
            debug!(error = %e, "OpenClipboard failed");
            ClipboardError::Busy
        })?;
        Ok(Self)
    }
}

impl Drop for OpenClipboardGuard {
    fn drop(&mut self) {
        // SAFETY: only constructed after a successful OpenClipboard.
        if let Err(e) = unsafe { CloseClipboard() } {
            warn!(error = %e, "CloseClipboard failed");
        }
    }
}

// ── Owner window ──────────────────────────────────────────────────────────────

/// Message-only window that owns the clipboard after our writes.
struct OwnerWindow {
    /// Raw `HWND`; the window belongs to the `clipbank-clipboard` thread.
    hwnd: isize,
    thread_id: u32,
}

impl OwnerWindow {
    fn spawn() -> Result<Self, ClipboardError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, isize), String>>();
        thread::Builder::new()
            .name("clipbank-clipboard".to_string())
            .spawn(move || run_owner_window(&ready_tx))
            .map_err(|e| ClipboardError::Platform(e.to_string()))?;

        let (thread_id, hwnd) = ready_rx
            .recv()
            .map_err(|_| ClipboardError::Platform("clipboard owner thread exited during start".to_string()))?
            .map_err(ClipboardError::Platform)?;
        debug!(thread_id, "clipboard owner window created");
        Ok(Self { hwnd, thread_id })
    }

    fn hwnd(&self) -> HWND {
        HWND(self.hwnd as *mut c_void)
    }
}

impl Drop for OwnerWindow {
    fn drop(&mut self) {
        // SAFETY: posting to a thread id has no memory-safety preconditions.
        if let Err(e) = unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            warn!(error = %e, "could not stop clipboard owner thread");
        }
    }
}

/// Body of the `clipbank-clipboard` thread.
fn run_owner_window(ready: &mpsc::Sender<Result<(u32, isize), String>>) {
    // SAFETY: "STATIC" is a system class; HWND_MESSAGE makes the window
    // message-only, so it is never shown and receives no broadcasts.
    let created = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            w!("STATIC"),
            w!("ClipBank clipboard owner"),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            Some(HWND_MESSAGE),
            None,
            None,
            None,
        )
    };
    let hwnd = match created {
        Ok(hwnd) => hwnd,
        Err(e) => {
            let _ = ready.send(Err(format!("CreateWindowExW failed: {e}")));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    if ready.send(Ok((thread_id, hwnd.0 as isize))).is_ok() {
        let mut msg = MSG::default();
        // SAFETY: standard Win32 message loop on the thread that owns `hwnd`.
        unsafe {
            while GetMessageW(&mut msg, None, 0, 0).as_bool() {
                DispatchMessageW(&msg);
            }
        }
    }
    // SAFETY: `hwnd` was created on this thread and is destroyed once.
    if let Err(e) = unsafe { DestroyWindow(hwnd) } {
        warn!(error = %e, "DestroyWindow failed");
    }
}

struct WindowsReader {
    _guard: OpenClipboardGuard,
    formats: Formats,
}

impl ClipboardReader for WindowsReader {
    fn file_list(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        read_global(CF_HDROP)?
            .map(|bytes| decode_hdrop(&bytes).map_err(ClipboardError::Format))
            .transpose()
    }

    fn image(&self) -> Result<Option<ImageData>, ClipboardError> {
        let Some(dib) = read_global(CF_DIB)? else {
            return Ok(None);
        };
        let (width, height) = dib_dimensions(&dib)
            .ok_or_else(|| ClipboardError::Format("unrecognised DIB header".to_string()))?;
        Ok(Some(ImageData { width, height, dib }))
    }

    fn html(&self) -> Result<Option<String>, ClipboardError> {
        let Some(bytes) = read_global(self.formats.html)? else {
            return Ok(None);
        };
        let raw = String::from_utf8_lossy(until_nul(&bytes));
        decode_cf_html(&raw)
            .map(Some)
            .ok_or_else(|| ClipboardError::Format("CF_HTML without a fragment".to_string()))
    }

    fn rtf(&self) -> Result<Option<Vec<u8>>, ClipboardError> {
        Ok(read_global(self.formats.rtf)?.map(|bytes| until_nul(&bytes).to_vec()))
    }

    fn text(&self) -> Result<Option<String>, ClipboardError> {
        Ok(read_global(CF_UNICODETEXT)?.map(|bytes| {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .take_while(|&u| u != 0)
                .collect();
            String::from_utf16_lossy(&units)
        }))
    }
}

// ── Global memory ─────────────────────────────────────────────────────────────

/// Copies the block behind `format` out of the open clipboard.
fn read_global(format: u32) -> Result<Option<Vec<u8>>, ClipboardError> {
    // SAFETY: the clipboard is open (callers hold an OpenClipboardGuard).
    if unsafe { IsClipboardFormatAvailable(format) }.is_err() {
        return Ok(None);
    }
    // SAFETY: as above; the returned handle is owned by the clipboard.
    let handle = unsafe { GetClipboardData(format) }
        .map_err(|e| ClipboardError::Platform(e.to_string()))?;
    let hglobal = HGLOBAL(handle.0);

    // SAFETY: `hglobal` is a valid global-memory handle owned by the clipboard
    // and stays valid while the clipboard is open.  GlobalSize bounds the copy.
    unsafe {
        let ptr = GlobalLock(hglobal) as *const u8;
        if ptr.is_null() {
            return Err(ClipboardError::Platform("GlobalLock failed".to_string()));
        }
        let len = GlobalSize(hglobal);
        let bytes = std::slice::from_raw_parts(ptr, len).to_vec();
        let _ = GlobalUnlock(hglobal);
        Ok(Some(bytes))
    }
}

/// Allocates a movable block holding `bytes` and hands it to the clipboard.
fn set_global(format: u32, bytes: &[u8]) -> Result<(), ClipboardError> {
    let platform = |e: windows::core::Error| ClipboardError::Platform(e.to_string());

    // SAFETY: GlobalAlloc has no preconditions.
    let hglobal = unsafe { GlobalAlloc(GMEM_MOVEABLE, bytes.len().max(1)) }.map_err(platform)?;

    // SAFETY: `hglobal` was just allocated with at least `bytes.len()` bytes.
    unsafe {
        let ptr = GlobalLock(hglobal) as *mut u8;
        if ptr.is_null() {
            let _ = GlobalFree(Some(hglobal));
            return Err(ClipboardError::Platform("GlobalLock failed".to_string()));
        }
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        let _ = GlobalUnlock(hglobal);
    }

    // SAFETY: the clipboard is open; on success the system owns the block.
    if let Err(e) = unsafe { SetClipboardData(format, Some(HANDLE(hglobal.0))) } {
        // SAFETY: ownership was not transferred, so the block is still ours.
        let _ = unsafe { GlobalFree(Some(hglobal)) };
        return Err(platform(e));
    }
    Ok(())
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

// ── Owner process ─────────────────────────────────────────────────────────────

/// Executable file name of process `pid`, e.g. `"notepad.exe"`.
fn process_image_name(pid: u32) -> Option<String> {
    // SAFETY: OpenProcess has no preconditions; the handle is closed below.
    let process: HANDLE = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;

    let mut buf = [0u16; 1024];
    let mut len = buf.len() as u32;
    // SAFETY: `buf` and `len` describe a writable buffer that outlives the call.
    let result = unsafe {
        QueryFullProcessImageNameW(process, PROCESS_NAME_WIN32, PWSTR(buf.as_mut_ptr()), &mut len)
    };
    // SAFETY: `process` is a handle we opened.
    let _ = unsafe { CloseHandle(process) };
    result.ok()?;

    let full = String::from_utf16_lossy(&buf[..len as usize]);
    Path::new(&full)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
