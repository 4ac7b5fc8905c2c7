//! Virtual-key tables used when synthesising keyboard input.
//!
//! ClipBank only ever synthesises a handful of keys: the three modifier
//! families, `C`, `V` and `Enter`.  Everything else it types goes through
//! Unicode key events, so no layout-dependent translation is needed.  The
//! remaining constants name the keys of the default hotkey bindings.

pub mod windows_vk;

pub use windows_vk::{slot_digit_vk, VK_C, VK_RETURN, VK_V};
