//! Slot-related settings consumed by the [`SlotManager`](super::slot_manager::SlotManager).
//!
//! These are plain value types.  Loading them from disk is the engine's job
//! (see `clipbank_engine::infrastructure::storage::settings`).

use serde::{Deserialize, Serialize};

/// Smallest allowed slot bank.
pub const MIN_SLOT_COUNT: usize = 1;
/// Largest allowed slot bank.
pub const MAX_SLOT_COUNT: usize = 50;
/// Slot bank size used when nothing is configured.
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// How a promotion picks its target slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Advance from the last-filled slot, skipping locked slots.
    #[default]
    RoundRobin,
    /// Always target the active-slot cursor.
    Fixed,
}

/// Settings that shape slot routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSettings {
    /// Number of numbered slots (clamped to `MIN_SLOT_COUNT..=MAX_SLOT_COUNT`).
    #[serde(default = "default_slot_count")]
    pub slot_count: usize,
    /// Promotion target policy.
    #[serde(default)]
    pub fill_mode: FillMode,
    /// Promote every normal copy out of the temp slot immediately.
    #[serde(default)]
    pub auto_promote: bool,
    /// Executable names (e.g. `"KeePass.exe"`) whose copies are never
    /// auto-promoted.  Compared case-insensitively.
    #[serde(default)]
    pub sticky_apps: Vec<String>,
}

fn default_slot_count() -> usize {
    DEFAULT_SLOT_COUNT
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            fill_mode: FillMode::RoundRobin,
            auto_promote: false,
            sticky_apps: Vec::new(),
        }
    }
}

impl SlotSettings {
    /// The configured slot count, clamped into the supported range.
    pub fn effective_slot_count(&self) -> usize {
        self.slot_count.clamp(MIN_SLOT_COUNT, MAX_SLOT_COUNT)
    }

    /// Returns `true` if `app` names one of the sticky applications.
    ///
    /// Only the file name is compared, so a full image path matches too.
    pub fn is_sticky(&self, app: &str) -> bool {
        let name = app.rsplit(|c: char| c == '\\' || c == '/').next().unwrap_or(app);
        self.sticky_apps
            .iter()
            .any(|sticky| sticky.eq_ignore_ascii_case(name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
