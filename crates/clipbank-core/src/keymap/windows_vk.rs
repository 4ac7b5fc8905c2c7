//! Windows Virtual Key (VK) codes for the keys ClipBank synthesises.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # Generic vs. sided modifier codes (for beginners)
//!
//! Windows tracks each modifier under three codes: a *generic* one
//! (`VK_CONTROL = 0x11`) and two *sided* ones (`VK_LCONTROL = 0xA2`,
//! `VK_RCONTROL = 0xA3`).  A physical key press updates both the sided and
//! the generic entry of the OS key-state table.  Synthetic input, however,
//! can leave the table with a sided entry still "down" after the generic one
//! was released.  Releasing a modifier reliably therefore means sending a
//! key-up for all three codes of its family.

/// `VK_SHIFT` – either Shift key.
pub const VK_SHIFT: u8 = 0x10;
/// `VK_CONTROL` – either Ctrl key.
pub const VK_CONTROL: u8 = 0x11;
/// `VK_MENU` – either Alt key.
pub const VK_MENU: u8 = 0x12;
/// `VK_LSHIFT`
pub const VK_LSHIFT: u8 = 0xA0;
/// `VK_RSHIFT`
pub const VK_RSHIFT: u8 = 0xA1;
/// `VK_LCONTROL`
pub const VK_LCONTROL: u8 = 0xA2;
/// `VK_RCONTROL`
pub const VK_RCONTROL: u8 = 0xA3;
/// `VK_LMENU` – left Alt.
pub const VK_LMENU: u8 = 0xA4;
/// `VK_RMENU` – right Alt (AltGr on many layouts).
pub const VK_RMENU: u8 = 0xA5;

/// `VK_RETURN`
pub const VK_RETURN: u8 = 0x0D;
/// The `C` key (`VK_C` is the ASCII code of the letter).
pub const VK_C: u8 = 0x43;
/// The `V` key.
pub const VK_V: u8 = 0x56;
/// The `P` key.
pub const VK_P: u8 = 0x50;
/// The `T` key.
pub const VK_T: u8 = 0x54;

// Keys that only appear in hotkey bindings.
pub const VK_LEFT: u8 = 0x25;
pub const VK_RIGHT: u8 = 0x27;
/// Backspace.
pub const VK_BACK: u8 = 0x08;
/// `0` on the main keyboard row; `1`..`9` follow.
pub const VK_0: u8 = 0x30;

/// The top-row digit key for a slot index: slot 0 is `1`, slot 8 is `9`,
/// slot 9 is `0`.  Slots past the tenth have no digit key.
pub fn slot_digit_vk(index: usize) -> Option<u8> {
    match index {
        0..=8 => Some(VK_0 + 1 + index as u8),
        9 => Some(VK_0),
        _ => None,
    }
}

/// Sided virtual keys that Windows flags as *extended* in `KEYBDINPUT`.
///
/// Right Ctrl and right Alt live on the extended part of the scan-code set;
/// sending them without `KEYEVENTF_EXTENDEDKEY` produces the left-hand key.
pub const EXTENDED_VKS: &[u8] = &[VK_RCONTROL, VK_RMENU];

/// Returns `true` if `vk` must be sent with the extended-key flag.
pub fn is_extended(vk: u8) -> bool {
    EXTENDED_VKS.contains(&vk)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
