//! The atomic input injector port.
//!
//! The platform implementations live in
//! `infrastructure::input_injection`; the sequencer and the paste engine only
//! see this trait.

use clipbank_core::KeyEvent;
use thiserror::Error;

/// Error type for synthetic input injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The OS accepted only part of the batch.
    #[error("partial injection: {sent} of {expected} events sent")]
    Partial { sent: usize, expected: usize },
    #[error("platform error: {0}")]
    Platform(String),
}

/// Sends synthetic key input and reads key state.
///
/// Implementations must be callable from the dispatch thread and the paste
/// worker at the same time.
pub trait InputInjector: Send + Sync {
    /// Submits `events` to the OS in one call, in order.
    ///
    /// No other input source can interleave with the batch.  An empty batch
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the OS did not accept the whole batch.
    fn send_batch(&self, events: &[KeyEvent]) -> Result<(), InjectionError>;

    /// Whether the keyboard hardware reports `vk` as held right now.
    fn is_key_physically_down(&self, vk: u8) -> bool;

    /// Whether the OS input-state table believes `vk` is held.
    ///
    /// This reflects synthetic input too and can disagree with
    /// [`is_key_physically_down`](Self::is_key_physically_down).
    fn is_key_logically_down(&self, vk: u8) -> bool;
}
