//! Storage infrastructure: the settings file and the slot file.
//!
//! - `settings` reads `settings.toml` from the platform config directory and
//!   falls back to defaults on first run.
//! - `slots` implements the `SlotPersistence` port with a `bincode` file in
//!   the data directory.

pub mod settings;
pub mod slots;
