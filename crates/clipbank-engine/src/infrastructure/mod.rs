//! Infrastructure layer for the ClipBank engine.
//!
//! Contains OS-facing adapters: synthetic input, the clipboard, global
//! hotkeys and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `clipbank_core`, but MUST NOT be imported by the `application` or domain
//! layers outside of tests.
//!
//! # Sub-modules
//!
//! - **`input_injection`** – `SendInput`/`GetAsyncKeyState` implementation of
//!   `InputInjector`, plus a recording `MockInputInjector`.
//!
//! - **`clipboard`** – Win32 clipboard implementation of `ClipboardAccess`,
//!   the CF_HTML / CF_HDROP / DIB byte layouts, a `MockClipboard`, and the
//!   sequence-number watcher that turns clipboard changes into engine events.
//!
//! - **`hotkeys`** – `RegisterHotKey` message loop and the default binding table.
//!
//! - **`storage`** – TOML settings file and the bincode slot file.

pub mod clipboard;
pub mod hotkeys;
pub mod input_injection;
pub mod storage;
