//! End-to-end tests of the engine dispatcher against the mock adapters.
//!
//! Each test plays the part of the OS: it feeds [`EngineEvent`]s the way the
//! hotkey thread and clipboard watcher would, and answers the engine's
//! synthetic Ctrl+C by putting content on the [`MockClipboard`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clipbank_core::keymap::windows_vk::{VK_LMENU, VK_LSHIFT, VK_MENU};
use clipbank_core::keymap::VK_C;
use clipbank_core::{ClipboardContent, ContentKind, FillMode, KeyEvent, SlotSettings};
use clipbank_engine::application::engine::{Engine, EngineEvent, EngineTimings, HotkeyAction};
use clipbank_engine::application::persist::SlotPersistence;
use clipbank_engine::application::sequencer::shortcut;
use clipbank_engine::infrastructure::clipboard::mock::MockClipboard;
use clipbank_engine::infrastructure::input_injection::mock::MockInputInjector;
use clipbank_engine::infrastructure::storage::slots::FileSlotStore;
use uuid::Uuid;

struct Harness {
    injector: Arc<MockInputInjector>,
    clipboard: Arc<MockClipboard>,
    engine: Engine,
}

impl Harness {
    fn new(settings: SlotSettings, paste_grace: Duration, store: Box<dyn SlotPersistence>) -> Self {
        let injector = Arc::new(MockInputInjector::new());
        let clipboard = Arc::new(MockClipboard::new());
        let timings = EngineTimings {
            settle_delay: Duration::ZERO,
            paste_grace,
            persist_debounce: Duration::from_secs(3600),
            copy_timeout: Duration::ZERO,
        };
        let engine = Engine::new(settings, timings, injector.clone(), clipboard.clone(), store)
            .expect("engine starts");
        Self {
            injector,
            clipboard,
            engine,
        }
    }

    fn with_temp_store(settings: SlotSettings) -> (Self, PathBuf) {
        let dir = scratch_dir();
        let harness = Self::new(settings, Duration::ZERO, Box::new(FileSlotStore::in_dir(&dir)));
        (harness, dir)
    }

    fn hotkey(&mut self, action: HotkeyAction) {
        assert!(self.engine.handle(EngineEvent::Hotkey(action)));
    }

    /// An application copies `content`; the watcher reports it.
    fn app_copies(&mut self, content: ClipboardContent, app: &str) {
        self.clipboard.copy_from_app(&content, app);
        assert!(self.engine.handle(EngineEvent::ClipboardChanged));
    }

    fn slot_text(&self, index: usize) -> Option<String> {
        self.engine
            .slots()
            .get_slot(index)
            .and_then(|s| s.content.plain_text())
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("clipbank_it_{}", Uuid::new_v4()))
}

// ── Targeted copy ─────────────────────────────────────────────────────────────

#[test]
fn test_targeted_copy_lands_in_slot_and_next_copy_in_temp() {
    // Arrange
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());

    // Act – Ctrl+Alt+4: marker for slot 3, then the app answers the Ctrl+C
    h.hotkey(HotkeyAction::CopyToSlot(3));
    h.app_copies(ClipboardContent::text("invoice #42"), "excel.exe");
    h.app_copies(ClipboardContent::text("unrelated"), "chrome.exe");

    // Assert
    assert_eq!(h.slot_text(3).as_deref(), Some("invoice #42"));
    assert_eq!(h.engine.slots().temp_slot().content, ClipboardContent::text("unrelated"));
    assert_eq!(h.engine.bridge().pending_target(), None);
    assert!(h.injector.batches().contains(&shortcut(VK_C).to_vec()));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_copy_of_empty_selection_does_not_capture_next_unrelated_copy() {
    // Arrange – Ctrl+Alt+4 while nothing is selected: the clipboard never changes
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.hotkey(HotkeyAction::CopyToSlot(3));

    // Act
    assert!(h.engine.handle(EngineEvent::CleanupTick));
    h.app_copies(ClipboardContent::text("unrelated"), "chrome.exe");

    // Assert
    assert!(h.engine.slots().get_slot(3).unwrap().is_empty());
    assert_eq!(h.engine.slots().temp_slot().content, ClipboardContent::text("unrelated"));
    assert_eq!(h.engine.bridge().pending_target(), None);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_slow_targeted_copy_survives_cleanup_tick() {
    // Arrange – the app answered Ctrl+C but the change is still queued
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.hotkey(HotkeyAction::CopyToSlot(5));
    h.clipboard.copy_from_app(&ClipboardContent::text("late"), "excel.exe");

    // Act
    assert!(h.engine.handle(EngineEvent::CleanupTick));
    assert!(h.engine.handle(EngineEvent::ClipboardChanged));

    // Assert
    assert_eq!(h.slot_text(5).as_deref(), Some("late"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_copy_with_alt_held_releases_and_restores_alt() {
    // Arrange – the user still holds Alt from Ctrl+Alt+C
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.injector.press_physical(VK_LMENU);

    // Act
    h.hotkey(HotkeyAction::Copy);

    // Assert – release everything, Ctrl+C, Alt back down
    let batches = h.injector.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 9);
    assert!(batches[0].iter().all(|e| e.is_key_up));
    assert_eq!(batches[1], shortcut(VK_C).to_vec());
    assert_eq!(batches[2], vec![KeyEvent::down(VK_MENU)]);
    assert!(h.engine.slots().temp_slot().is_empty(), "nothing copied yet");
    std::fs::remove_dir_all(&dir).ok();
}

// ── Paste ─────────────────────────────────────────────────────────────────────

#[test]
fn test_text_slot_is_typed_and_clipboard_left_alone() {
    // Arrange
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.hotkey(HotkeyAction::CopyToSlot(0));
    h.app_copies(ClipboardContent::text("Dear team,\r\nthanks"), "outlook.exe");
    let user_clipboard = ClipboardContent::text("something else");
    h.app_copies(user_clipboard.clone(), "notepad.exe");
    h.injector.clear_batches();

    // Act
    h.hotkey(HotkeyAction::PasteSlot(0));

    // Assert
    assert_eq!(h.injector.typed_text(), "Dear team,\nthanks");
    assert!(h.clipboard.writes().is_empty());
    assert_eq!(h.clipboard.current().text.as_deref(), Some("something else"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_rich_paste_goes_through_clipboard_and_is_not_recaptured() {
    // Arrange – a long grace window so the change is handled while suppressed
    let dir = scratch_dir();
    let mut h = Harness::new(
        SlotSettings::default(),
        Duration::from_millis(500),
        Box::new(FileSlotStore::in_dir(&dir)),
    );
    let html = ClipboardContent::html("<b>bold</b>", Some("bold".to_string()));
    h.hotkey(HotkeyAction::CopyToSlot(1));
    h.app_copies(html.clone(), "chrome.exe");
    let temp_before = h.engine.slots().temp_slot().clone();

    // Act
    h.hotkey(HotkeyAction::PasteSlot(1));
    let deadline = Instant::now() + Duration::from_secs(2);
    while h.clipboard.writes().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    h.engine.handle(EngineEvent::ClipboardChanged);

    // Assert
    assert_eq!(h.clipboard.writes(), vec![html]);
    assert_eq!(h.engine.slots().temp_slot(), &temp_before, "own paste must not be captured");
    h.engine.handle(EngineEvent::Shutdown);
    assert!(h
        .injector
        .batches()
        .iter()
        .any(|b| b.contains(&KeyEvent::down(clipbank_core::keymap::VK_V))));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_own_paste_handled_late_is_not_recaptured_or_promoted() {
    // Arrange – auto-promote on, default grace, an HTML and a text slot
    let dir = scratch_dir();
    let mut h = Harness::new(
        SlotSettings {
            auto_promote: true,
            ..SlotSettings::default()
        },
        Duration::from_millis(100),
        Box::new(FileSlotStore::in_dir(&dir)),
    );
    h.hotkey(HotkeyAction::CopyToSlot(1));
    h.app_copies(ClipboardContent::html("<b>rich</b>", Some("rich".to_string())), "chrome.exe");
    h.hotkey(HotkeyAction::CopyToSlot(2));
    h.app_copies(ClipboardContent::text("plain"), "notepad.exe");
    let temp_before = h.engine.slots().temp_slot().clone();

    // Act – the HTML paste runs on the worker; the text paste waits for it to
    // finish its grace delay, so the change is handled after suppression ends
    h.hotkey(HotkeyAction::PasteSlot(1));
    let deadline = Instant::now() + Duration::from_secs(2);
    while h.clipboard.writes().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    h.hotkey(HotkeyAction::PasteSlot(2));
    assert!(h.engine.handle(EngineEvent::ClipboardChanged));

    // Assert
    assert_eq!(h.engine.slots().temp_slot(), &temp_before);
    assert!(h.engine.slots().get_slot(0).unwrap().is_empty(), "nothing auto-promoted");
    assert_eq!(h.injector.typed_text(), "plain");
    h.engine.handle(EngineEvent::Shutdown);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_paste_temp_and_paste_active_follow_the_cursor() {
    // Arrange
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.hotkey(HotkeyAction::CopyToSlot(1));
    h.app_copies(ClipboardContent::text("second"), "a.exe");
    h.app_copies(ClipboardContent::text("temp"), "a.exe");
    h.injector.clear_batches();

    // Act
    h.hotkey(HotkeyAction::CycleNext);
    h.hotkey(HotkeyAction::PasteActive);
    h.hotkey(HotkeyAction::PasteTemp);

    // Assert
    assert_eq!(h.engine.slots().active_slot_index(), 1);
    assert_eq!(h.injector.typed_text(), "secondtemp");
    std::fs::remove_dir_all(&dir).ok();
}

// ── Promotion ─────────────────────────────────────────────────────────────────

#[test]
fn test_auto_promote_skips_locked_slot() {
    // Arrange – round robin, slot 1 locked
    let (mut h, dir) = Harness::with_temp_store(SlotSettings {
        slot_count: 3,
        auto_promote: true,
        ..SlotSettings::default()
    });
    h.hotkey(HotkeyAction::ToggleLock(1));

    // Act
    h.app_copies(ClipboardContent::text("a"), "x.exe");
    h.app_copies(ClipboardContent::text("b"), "x.exe");
    h.app_copies(ClipboardContent::text("c"), "x.exe");

    // Assert
    assert_eq!(h.slot_text(0).as_deref(), Some("c"), "wrapped past the end");
    assert!(h.engine.slots().get_slot(1).unwrap().is_empty());
    assert_eq!(h.slot_text(2).as_deref(), Some("b"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_manual_promote_in_fixed_mode_targets_cursor() {
    let (mut h, dir) = Harness::with_temp_store(SlotSettings {
        fill_mode: FillMode::Fixed,
        ..SlotSettings::default()
    });
    h.app_copies(ClipboardContent::image(4, 4, vec![7; 64]), "paint.exe");

    h.hotkey(HotkeyAction::CyclePrevious);
    h.hotkey(HotkeyAction::PromoteTemp);

    let last = h.engine.slots().get_slot(9).unwrap();
    assert_eq!(last.content.kind(), ContentKind::Image);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_clear_all_keeps_locked_slots() {
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    for (index, text) in [(0, "keep"), (1, "drop")] {
        h.hotkey(HotkeyAction::CopyToSlot(index));
        h.app_copies(ClipboardContent::text(text), "a.exe");
    }
    h.hotkey(HotkeyAction::ToggleLock(0));

    h.hotkey(HotkeyAction::ClearAllUnlocked);

    assert_eq!(h.slot_text(0).as_deref(), Some("keep"));
    assert!(h.engine.slots().get_slot(1).unwrap().is_empty());
    std::fs::remove_dir_all(&dir).ok();
}

// ── Cleanup and shutdown ──────────────────────────────────────────────────────

#[test]
fn test_cleanup_tick_releases_stuck_shift() {
    // Arrange – some other tool left Shift logically down
    let (mut h, dir) = Harness::with_temp_store(SlotSettings::default());
    h.injector.set_logical(VK_LSHIFT, true);

    // Act
    assert!(h.engine.handle(EngineEvent::CleanupTick));

    // Assert
    assert!(h
        .injector
        .batches()
        .iter()
        .any(|b| b.contains(&KeyEvent::up(VK_LSHIFT))));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_slots_survive_restart() {
    // Arrange – first session fills and locks slot 2
    let dir = scratch_dir();
    {
        let mut first = Harness::new(
            SlotSettings::default(),
            Duration::ZERO,
            Box::new(FileSlotStore::in_dir(&dir)),
        );
        first.hotkey(HotkeyAction::CopyToSlot(2));
        first.app_copies(ClipboardContent::text("signature"), "outlook.exe");
        first.hotkey(HotkeyAction::ToggleLock(2));
        assert!(!first.engine.handle(EngineEvent::Shutdown));
    }

    // Act – second session with a smaller bank
    let second = Harness::new(
        SlotSettings {
            slot_count: 5,
            ..SlotSettings::default()
        },
        Duration::ZERO,
        Box::new(FileSlotStore::in_dir(&dir)),
    );

    // Assert
    let slot = second.engine.slots().get_slot(2).expect("slot kept");
    assert!(slot.locked);
    assert_eq!(slot.content, ClipboardContent::text("signature"));
    assert_eq!(second.engine.slots().slot_count(), 5);
    std::fs::remove_dir_all(&dir).ok();
}
