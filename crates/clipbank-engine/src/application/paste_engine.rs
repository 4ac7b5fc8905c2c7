//! Pasting a slot back into the focused application.
//!
//! Two transports:
//!
//! - **Text** is typed as Unicode key events.  The clipboard is never
//!   touched, so whatever the user has copied stays there and no capture is
//!   triggered.  This runs inline on the dispatch thread.
//! - **Everything else** (rich text, HTML, images, file lists) has no typing
//!   equivalent and goes through the clipboard: raise suppression, write the
//!   content, record the sequence number of the write, send Ctrl+V, wait the
//!   grace delay, lower suppression.  These
//!   jobs run on the `clipbank-paste` worker thread so the dispatch loop
//!   never sleeps through the grace delay.
//!
//! The worker receives an owned copy of the content in each [`PasteJob`] and
//! never sees the slot store.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clipbank_core::{ClipboardContent, ContentKind, Payload};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::clipboard_bridge::{ClipboardAccess, ClipboardError, SuppressionFlag};
use super::inject::InjectionError;
use super::sequencer::ModifierSequencer;

/// Default delay between the synthetic Ctrl+V and lowering suppression.
pub const DEFAULT_PASTE_GRACE: Duration = Duration::from_millis(100);

/// Error type for paste operations.
#[derive(Debug, Error)]
pub enum PasteError {
    /// The clipboard could not be written; the paste was abandoned.
    #[error("clipboard write failed: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("input injection failed: {0}")]
    Injection(#[from] InjectionError),
    #[error("paste worker has stopped")]
    WorkerStopped,
}

/// What [`PasteEngine::paste_from_slot`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The slot was empty.
    NothingToPaste,
    /// Plain text was typed directly.
    Typed,
    /// A clipboard-transport paste was handed to the worker.
    Queued { kind: ContentKind },
}

/// A clipboard-transport paste waiting for the worker.
#[derive(Debug)]
pub struct PasteJob {
    pub content: ClipboardContent,
}

/// Performs one paste.  Shared by the dispatch thread and the worker.
pub struct PasteExecutor {
    sequencer: Arc<ModifierSequencer>,
    clipboard: Arc<dyn ClipboardAccess>,
    suppression: SuppressionFlag,
    grace: Duration,
    /// Serialises key sequences from the two threads.
    busy: Mutex<()>,
}

impl PasteExecutor {
    pub fn new(
        sequencer: Arc<ModifierSequencer>,
        clipboard: Arc<dyn ClipboardAccess>,
        suppression: SuppressionFlag,
        grace: Duration,
    ) -> Self {
        Self {
            sequencer,
            clipboard,
            suppression,
            grace,
            busy: Mutex::new(()),
        }
    }

    /// Pastes `content` with the transport its kind requires.
    ///
    /// # Errors
    ///
    /// - [`PasteError::Clipboard`] if the clipboard write failed.  Nothing
    ///   was sent and suppression is already lowered.
    /// - [`PasteError::Injection`] if a key batch failed.
    pub fn execute(&self, content: &ClipboardContent) -> Result<(), PasteError> {
        let _busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        match content.payload() {
            Payload::Empty => Ok(()),
            Payload::Text(text) => {
                self.sequencer.type_text(text)?;
                Ok(())
            }
            _ => self.paste_via_clipboard(content),
        }
    }

    fn paste_via_clipboard(&self, content: &ClipboardContent) -> Result<(), PasteError> {
        self.suppression.raise();
        if let Err(e) = self.clipboard.write(content) {
            self.suppression.lower();
            return Err(e.into());
        }
        self.suppression
            .record_own_write(self.clipboard.sequence_number());
        let pasted = self.sequencer.paste();
        // Our own clipboard change may be reported after Ctrl+V went out.
        thread::sleep(self.grace);
        self.suppression.lower();
        pasted.map_err(PasteError::from)
    }
}

/// Front door for pastes: types text inline and queues the rest.
pub struct PasteEngine {
    executor: Arc<PasteExecutor>,
    jobs: Option<Sender<PasteJob>>,
    worker: Option<JoinHandle<()>>,
}

impl PasteEngine {
    /// Spawns the `clipbank-paste` worker thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread could not be spawned.
    pub fn start(executor: PasteExecutor) -> std::io::Result<Self> {
        let executor = Arc::new(executor);
        let (tx, rx) = mpsc::channel::<PasteJob>();
        let worker_executor = Arc::clone(&executor);
        let worker = thread::Builder::new()
            .name("clipbank-paste".to_string())
            .spawn(move || {
                for job in rx {
                    let kind = job.content.kind();
                    match worker_executor.execute(&job.content) {
                        Ok(()) => debug!(%kind, "paste completed"),
                        Err(PasteError::Clipboard(e)) => {
                            warn!(%kind, error = %e, "clipboard unavailable; paste abandoned")
                        }
                        Err(e) => warn!(%kind, error = %e, "paste failed"),
                    }
                }
                debug!("paste worker exiting");
            })?;
        info!("paste worker started");
        Ok(Self {
            executor,
            jobs: Some(tx),
            worker: Some(worker),
        })
    }

    /// Pastes a snapshot of a slot's content.
    ///
    /// # Errors
    ///
    /// - [`PasteError::Injection`] if typing text failed.
    /// - [`PasteError::WorkerStopped`] after [`shutdown`](Self::shutdown).
    pub fn paste_from_slot(&self, content: &ClipboardContent) -> Result<PasteOutcome, PasteError> {
        match content.kind() {
            ContentKind::Empty => Ok(PasteOutcome::NothingToPaste),
            ContentKind::Text => {
                self.executor.execute(content)?;
                Ok(PasteOutcome::Typed)
            }
            kind => {
                let jobs = self.jobs.as_ref().ok_or(PasteError::WorkerStopped)?;
                jobs.send(PasteJob {
                    content: content.clone(),
                })
                .map_err(|_| PasteError::WorkerStopped)?;
                Ok(PasteOutcome::Queued { kind })
            }
        }
    }

    /// Stops accepting jobs, lets the queued ones finish and joins the worker.
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("paste worker panicked");
            }
        }
    }
}

impl Drop for PasteEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use clipbank_core::keymap::VK_V;
    use clipbank_core::KeyEvent;

    use super::*;
    use crate::application::clipboard_bridge::ClipboardReader;
    use crate::infrastructure::clipboard::mock::MockClipboard;
    use crate::infrastructure::input_injection::mock::MockInputInjector;

    struct Fixture {
        injector: Arc<MockInputInjector>,
        clipboard: Arc<MockClipboard>,
        suppression: SuppressionFlag,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                injector: Arc::new(MockInputInjector::new()),
                clipboard: Arc::new(MockClipboard::new()),
                suppression: SuppressionFlag::default(),
            }
        }

        fn executor(&self) -> PasteExecutor {
            self.executor_with(self.clipboard.clone())
        }

        fn executor_with(&self, clipboard: Arc<dyn ClipboardAccess>) -> PasteExecutor {
            let sequencer = Arc::new(ModifierSequencer::new(self.injector.clone(), Duration::ZERO));
            PasteExecutor::new(sequencer, clipboard, self.suppression.clone(), Duration::ZERO)
        }

        fn sent_ctrl_v(&self) -> bool {
            self.injector
                .batches()
                .iter()
                .any(|b| b.contains(&KeyEvent::down(VK_V)))
        }
    }

    /// Records whether suppression was up when the clipboard was written.
    struct WatchingClipboard {
        inner: MockClipboard,
        suppression: SuppressionFlag,
        raised_during_write: AtomicBool,
    }

    impl ClipboardAccess for WatchingClipboard {
        fn open_reader(&self) -> Result<Box<dyn ClipboardReader + '_>, ClipboardError> {
            self.inner.open_reader()
        }
        fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
            self.raised_during_write
                .store(self.suppression.is_raised(), Ordering::SeqCst);
            self.inner.write(content)
        }
        fn owner_process(&self) -> Option<String> {
            None
        }
        fn sequence_number(&self) -> u32 {
            self.inner.sequence_number()
        }
    }

    #[test]
    fn test_text_is_typed_without_touching_clipboard() {
        // Arrange
        let fx = Fixture::new();
        let engine = PasteEngine::start(fx.executor()).unwrap();

        // Act
        let outcome = engine.paste_from_slot(&ClipboardContent::text("hi\nthere")).unwrap();

        // Assert
        assert_eq!(outcome, PasteOutcome::Typed);
        assert_eq!(fx.injector.typed_text(), "hi\nthere");
        assert!(fx.clipboard.writes().is_empty());
        assert!(!fx.sent_ctrl_v());
    }

    #[test]
    fn test_html_is_written_then_pasted_with_ctrl_v() {
        // Arrange
        let fx = Fixture::new();
        let content = ClipboardContent::html("<b>x</b>", Some("x".to_string()));

        // Act
        fx.executor().execute(&content).unwrap();

        // Assert
        assert_eq!(fx.clipboard.writes(), vec![content]);
        assert_eq!(fx.clipboard.current().text.as_deref(), Some("x"));
        assert!(fx.sent_ctrl_v());
        assert!(!fx.suppression.is_raised());
    }

    #[test]
    fn test_suppression_is_raised_while_writing() {
        // Arrange
        let fx = Fixture::new();
        let watching = Arc::new(WatchingClipboard {
            inner: MockClipboard::new(),
            suppression: fx.suppression.clone(),
            raised_during_write: AtomicBool::new(false),
        });

        // Act
        fx.executor_with(watching.clone())
            .execute(&ClipboardContent::image(1, 1, vec![1, 2, 3, 4]))
            .unwrap();

        // Assert
        assert!(watching.raised_during_write.load(Ordering::SeqCst));
        assert!(!fx.suppression.is_raised());
    }

    #[test]
    fn test_clipboard_paste_records_its_own_sequence_number() {
        // Arrange
        let fx = Fixture::new();

        // Act
        fx.executor()
            .execute(&ClipboardContent::html("<i>y</i>", None))
            .unwrap();

        // Assert
        assert!(fx.suppression.is_own_write(fx.clipboard.sequence_number()));
        fx.clipboard.copy_from_app(&ClipboardContent::text("later"), "a.exe");
        assert!(!fx.suppression.is_own_write(fx.clipboard.sequence_number()));
    }

    #[test]
    fn test_busy_clipboard_abandons_paste() {
        // Arrange
        let fx = Fixture::new();
        fx.clipboard.set_busy(true);

        // Act
        let result = fx
            .executor()
            .execute(&ClipboardContent::file_list(vec!["C:\\a.txt".into()]));

        // Assert
        assert!(matches!(result, Err(PasteError::Clipboard(ClipboardError::Busy))));
        assert!(!fx.sent_ctrl_v(), "no Ctrl+V without a successful write");
        assert!(!fx.suppression.is_raised());
    }

    #[test]
    fn test_failed_ctrl_v_still_lowers_suppression() {
        let fx = Fixture::new();
        fx.injector.set_should_fail(true);

        let result = fx.executor().execute(&ClipboardContent::rich_text(b"{\\rtf1 x}".to_vec(), None));

        assert!(matches!(result, Err(PasteError::Injection(_))));
        assert!(!fx.suppression.is_raised());
    }

    #[test]
    fn test_empty_slot_is_nothing_to_paste() {
        let fx = Fixture::new();
        let engine = PasteEngine::start(fx.executor()).unwrap();
        assert_eq!(
            engine.paste_from_slot(&ClipboardContent::empty()).unwrap(),
            PasteOutcome::NothingToPaste
        );
        assert!(fx.injector.batches().is_empty());
    }

    #[test]
    fn test_worker_runs_queued_jobs_before_shutdown_returns() {
        // Arrange
        let fx = Fixture::new();
        let mut engine = PasteEngine::start(fx.executor()).unwrap();
        let image = ClipboardContent::image(2, 1, vec![9; 8]);

        // Act
        let outcome = engine.paste_from_slot(&image).unwrap();
        engine.shutdown();

        // Assert
        assert_eq!(outcome, PasteOutcome::Queued { kind: ContentKind::Image });
        assert_eq!(fx.clipboard.writes(), vec![image]);
        assert!(fx.sent_ctrl_v());
    }

    #[test]
    fn test_paste_after_shutdown_reports_stopped_worker() {
        let fx = Fixture::new();
        let mut engine = PasteEngine::start(fx.executor()).unwrap();
        engine.shutdown();

        let result = engine.paste_from_slot(&ClipboardContent::image(1, 1, vec![0; 4]));

        assert!(matches!(result, Err(PasteError::WorkerStopped)));
    }
}
