//! ClipBank entry point.
//!
//! Loads settings, wires the platform adapters into the [`Engine`] and runs
//! the dispatch loop until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load settings.toml, init tracing
//!  └─ Engine::new()            -- restores slots.bin, starts the paste worker
//!  └─ event sources → one unbounded channel
//!       ├─ clipboard watcher   (Tokio task, polls the sequence number)
//!       ├─ hotkey thread       (RegisterHotKey message loop)
//!       └─ Ctrl-C handler      (sends Shutdown)
//!  └─ dispatch loop            -- Engine::handle, plus the cleanup ticker
//! ```
//!
//! `Engine::handle` blocks (settle delays, waiting for the paste worker), so
//! the dispatch loop runs it under `block_in_place`; this needs the
//! multi-threaded runtime `#[tokio::main]` provides.
//!
//! Without a Windows desktop (other platforms, or `--headless`) the same loop
//! runs against the in-memory mock adapters.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clipbank_engine::application::clipboard_bridge::ClipboardAccess;
use clipbank_engine::application::engine::{Engine, EngineEvent};
use clipbank_engine::application::inject::InputInjector;
use clipbank_engine::infrastructure::clipboard::mock::MockClipboard;
use clipbank_engine::infrastructure::clipboard::{spawn_clipboard_watcher, CLIPBOARD_POLL_INTERVAL};
use clipbank_engine::infrastructure::hotkeys::mock::MockHotkeySource;
use clipbank_engine::infrastructure::hotkeys::{default_bindings, HotkeyBinding, HotkeySource};
use clipbank_engine::infrastructure::input_injection::mock::MockInputInjector;
use clipbank_engine::infrastructure::storage::settings::{
    config_dir, default_settings_path, load_settings,
};
use clipbank_engine::infrastructure::storage::slots::FileSlotStore;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// ClipBank: numbered clipboard slots driven by global hotkeys.
#[derive(Debug, Parser)]
#[command(name = "clipbank", about = "Multi-slot clipboard manager", version)]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, env = "CLIPBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for `slots.bin`.  Defaults to the settings directory.
    #[arg(long, env = "CLIPBANK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter (e.g. `debug`).  Overrides the settings file; `RUST_LOG`
    /// overrides both.
    #[arg(long)]
    log_level: Option<String>,

    /// Run against in-memory adapters instead of the Windows desktop.
    #[arg(long)]
    headless: bool,
}

/// The OS-facing half of the engine.
struct Adapters {
    injector: Arc<dyn InputInjector>,
    clipboard: Arc<dyn ClipboardAccess>,
    hotkeys: Box<dyn HotkeySource>,
}

fn mock_adapters(bindings: Vec<HotkeyBinding>) -> Adapters {
    Adapters {
        injector: Arc::new(MockInputInjector::new()),
        clipboard: Arc::new(MockClipboard::new()),
        hotkeys: Box::new(MockHotkeySource::new(bindings)),
    }
}

#[cfg(target_os = "windows")]
fn windows_adapters(bindings: Vec<HotkeyBinding>) -> anyhow::Result<Adapters> {
    use clipbank_engine::infrastructure::clipboard::windows::WindowsClipboard;
    use clipbank_engine::infrastructure::hotkeys::windows::WindowsHotkeySource;
    use clipbank_engine::infrastructure::input_injection::windows::WindowsInputInjector;

    Ok(Adapters {
        injector: Arc::new(WindowsInputInjector::new()),
        clipboard: Arc::new(WindowsClipboard::new().context("clipboard unavailable")?),
        hotkeys: Box::new(WindowsHotkeySource::new(bindings)),
    })
}

fn platform_adapters(headless: bool, bindings: Vec<HotkeyBinding>) -> anyhow::Result<Adapters> {
    #[cfg(target_os = "windows")]
    if !headless {
        return windows_adapters(bindings);
    }
    info!(headless, "using in-memory adapters");
    Ok(mock_adapters(bindings))
}

// ── Dispatch loop ─────────────────────────────────────────────────────────────

/// Feeds events and cleanup ticks to `engine` until it shuts down.
///
/// A closed channel counts as a shutdown.
async fn run_dispatch_loop(
    engine: &mut Engine,
    rx: &mut UnboundedReceiver<EngineEvent>,
    cleanup_interval: Duration,
) {
    let mut cleanup = tokio::time::interval(cleanup_interval);
    loop {
        let event = tokio::select! {
            received = rx.recv() => received.unwrap_or(EngineEvent::Shutdown),
            _ = cleanup.tick() => EngineEvent::CleanupTick,
        };
        if !tokio::task::block_in_place(|| engine.handle(event)) {
            break;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = match cli.config.clone() {
        Some(path) => path,
        None => default_settings_path().context("pass --config to locate settings")?,
    };
    let settings = load_settings(&settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;

    // RUST_LOG wins, then --log-level, then the settings file.
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(settings = %settings_path.display(), "ClipBank starting");

    let data_dir = match cli.data_dir.clone() {
        Some(dir) => dir,
        None => config_dir().context("pass --data-dir to choose where slots are stored")?,
    };
    let store = FileSlotStore::in_dir(&data_dir);
    info!(slots = %store.path().display(), "slot file");

    let bindings = default_bindings(settings.slots.effective_slot_count());
    let adapters = platform_adapters(cli.headless, bindings)?;

    let mut engine = Engine::new(
        settings.slots.clone(),
        settings.general.timings(),
        Arc::clone(&adapters.injector),
        Arc::clone(&adapters.clipboard),
        Box::new(store),
    )
    .context("starting engine")?;

    // ── Event sources ─────────────────────────────────────────────────────────
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<EngineEvent>();

    let watcher = spawn_clipboard_watcher(
        Arc::clone(&adapters.clipboard),
        tx.clone(),
        CLIPBOARD_POLL_INTERVAL,
    );

    if let Err(e) = adapters.hotkeys.start(tx.clone()) {
        warn!(error = %e, "hotkeys unavailable; only clipboard capture is active");
    }

    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(EngineEvent::Shutdown);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    info!("ClipBank ready.  Press Ctrl-C to exit.");

    run_dispatch_loop(&mut engine, &mut rx, settings.general.cleanup_interval()).await;

    adapters.hotkeys.stop();
    watcher.abort();
    info!("ClipBank stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
