//! Domain entities for ClipBank.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application: here, where a captured
//!   clipboard item is allowed to land and when it must be dropped.
//! - Has **no** imports from OS APIs, clipboard libraries, or file systems.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (the engine's application and infrastructure layers)
//! depends on the domain, but the domain never depends on them.

/// Typed clipboard payloads and their content-equality hash.
pub mod content;

/// Modifier key snapshot and synthetic key events.
pub mod modifiers;

/// Slot-related settings (count, fill mode, auto-promote, sticky apps).
pub mod settings;

/// A single numbered slot and the temp slot.
pub mod slot;

/// The slot store state machine.
///
/// See [`slot_manager::SlotManager`] for the main type.
pub mod slot_manager;
