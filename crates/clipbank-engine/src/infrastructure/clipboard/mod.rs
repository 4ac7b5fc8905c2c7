//! Clipboard infrastructure.
//!
//! On Windows, [`windows::WindowsClipboard`] implements `ClipboardAccess`
//! with the Win32 clipboard API.  [`mock::MockClipboard`] is an in-memory
//! stand-in for tests and headless runs.
//!
//! Change notification is done by polling the clipboard sequence number
//! ([`spawn_clipboard_watcher`]), which needs no window and turns every
//! change, ours included, into one `EngineEvent::ClipboardChanged`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clipbank_core::{ClipboardContent, ImageData, Payload};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::application::clipboard_bridge::ClipboardAccess;
use crate::application::engine::EngineEvent;

pub mod formats;
pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// How often the watcher compares sequence numbers.
pub const CLIPBOARD_POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Every format a content is published in, one field per clipboard format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Representations {
    pub files: Option<Vec<PathBuf>>,
    pub image: Option<ImageData>,
    pub html: Option<String>,
    pub rtf: Option<Vec<u8>>,
    /// Plain text, or the plain-text fallback of a richer content.
    pub text: Option<String>,
}

impl Representations {
    /// The formats written to the clipboard when pasting `content`.
    ///
    /// Richer formats are always accompanied by their plain-text fallback
    /// so that text-only targets still get something.
    pub fn of(content: &ClipboardContent) -> Self {
        let mut reps = Representations {
            text: content.plain_text(),
            ..Representations::default()
        };
        match content.payload() {
            Payload::Empty | Payload::Text(_) => {}
            Payload::RichText { rtf, .. } => reps.rtf = Some(rtf.clone()),
            Payload::Html { html, .. } => reps.html = Some(html.clone()),
            Payload::Image(img) => reps.image = Some(img.clone()),
            Payload::FileList(paths) => reps.files = Some(paths.clone()),
        }
        reps
    }
}

/// Polls the clipboard sequence number and sends `ClipboardChanged` on change.
///
/// The task ends when the receiving side of `events` is dropped.
pub fn spawn_clipboard_watcher(
    clipboard: Arc<dyn ClipboardAccess>,
    events: UnboundedSender<EngineEvent>,
    poll: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = clipboard.sequence_number();
        let mut ticker = tokio::time::interval(poll);
        loop {
            ticker.tick().await;
            let current = clipboard.sequence_number();
            if current == last {
                continue;
            }
            trace!(last, current, "clipboard sequence changed");
            last = current;
            if events.send(EngineEvent::ClipboardChanged).is_err() {
                break;
            }
        }
    })
}
