//! Application layer of the ClipBank engine.
//!
//! # What is the "application" layer? (for beginners)
//!
//! This layer sits between the pure slot rules in `clipbank_core` and the
//! OS adapters in `infrastructure`.  Everything here talks to the OS only
//! through traits ("ports"), so the whole copy/paste pipeline runs in tests
//! against recording mocks.
//!
//! # Sub-modules
//!
//! - **`inject`**          – The atomic input injector port.
//! - **`sequencer`**       – Modifier-safe Ctrl+C / Ctrl+V and the stuck-modifier sweep.
//! - **`detect`**          – The fixed-priority chain of clipboard content detectors.
//! - **`clipboard_bridge`** – Reacts to clipboard changes: suppression,
//!   detection and temp-vs-slot routing.
//! - **`paste_engine`**    – Direct text injection or clipboard-transport paste
//!   on a background worker.
//! - **`persist`**         – Persistence port and the debounced writer.
//! - **`engine`**          – The single dispatch function for every inbound event.

pub mod clipboard_bridge;
pub mod detect;
pub mod engine;
pub mod inject;
pub mod paste_engine;
pub mod persist;
pub mod sequencer;
