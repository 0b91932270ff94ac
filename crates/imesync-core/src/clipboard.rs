#![forbid(unsafe_code)]

//! Clipboard collaborator.
//!
//! The clipboard is a process-wide resource shared by every editable field.
//! Reads and writes are single atomic steps: the last write wins and is
//! visible to the next read.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Content currently held by a clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipData {
    /// Plain text.
    Text(String),
    /// Anything that is not plain text (an image, a URI list, ...).
    Other {
        /// MIME type of the content.
        mime: String,
    },
}

impl ClipData {
    /// Plain-text view of the content, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Other { .. } => None,
        }
    }
}

/// Access to a shared clipboard.
pub trait Clipboard: Send + Sync {
    /// Current primary clip, if any.
    fn read(&self) -> Option<ClipData>;

    /// Replace the primary clip with plain text.
    fn write_text(&self, text: &str);

    /// Current primary clip as plain text.
    ///
    /// Returns `None` when the clipboard is empty or holds non-text content.
    fn read_text(&self) -> Option<String> {
        match self.read()? {
            ClipData::Text(text) => Some(text),
            ClipData::Other { .. } => None,
        }
    }
}

/// In-memory clipboard.
///
/// Cloning yields another handle onto the same clip, so several adapters in
/// one process observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    inner: Arc<Mutex<MemoryClipState>>,
}

#[derive(Debug, Default)]
struct MemoryClipState {
    clip: Option<ClipData>,
    writes: usize,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clipboard holding `text`.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set(ClipData::Text(text.into()));
        clipboard
    }

    /// Replace the clip with arbitrary content.
    pub fn set(&self, clip: ClipData) {
        let mut state = self.lock();
        state.clip = Some(clip);
        state.writes += 1;
    }

    /// Remove the current clip.
    pub fn clear(&self) {
        self.lock().clip = None;
    }

    /// Number of writes since creation.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryClipState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> Option<ClipData> {
        self.lock().clip.clone()
    }

    fn write_text(&self, text: &str) {
        tracing::trace!(target: "imesync.clipboard", len = text.len(), "clipboard write");
        self.set(ClipData::Text(text.to_owned()));
    }
}

impl<C: Clipboard + ?Sized> Clipboard for Arc<C> {
    fn read(&self) -> Option<ClipData> {
        (**self).read()
    }

    fn write_text(&self, text: &str) {
        (**self).write_text(text);
    }
}
