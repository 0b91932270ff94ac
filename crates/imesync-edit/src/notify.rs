#![forbid(unsafe_code)]

//! Notification channel from a field's text state to the input method.
//!
//! Two independent channels exist:
//!
//! - **text state**: the full text, selection and composition after a
//!   content or selection change. Suppressed during batch edits.
//! - **suppression state**: fired when a batch edit opens or closes.

use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Text, selection and composition of a field at one point in time.
///
/// Selection offsets are normalized so `selection_start <= selection_end`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextStateUpdate {
    /// Full text of the field.
    pub text: String,
    /// Lower selection bound (grapheme index).
    pub selection_start: usize,
    /// Upper selection bound (grapheme index).
    pub selection_end: usize,
    /// Active composition range, if any.
    pub composition: Option<Range<usize>>,
}

impl TextStateUpdate {
    /// Start of the composition, if composing.
    #[must_use]
    pub fn composition_start(&self) -> Option<usize> {
        self.composition.as_ref().map(|r| r.start)
    }

    /// End of the composition, if composing.
    #[must_use]
    pub fn composition_end(&self) -> Option<usize> {
        self.composition.as_ref().map(|r| r.end)
    }

    /// Whether the selection is a caret.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.selection_start == self.selection_end
    }
}

/// Receiver of text state notifications.
///
/// Observers are shared between successive fields, so methods take `&self`.
pub trait TextStateObserver: Send + Sync {
    /// Text, selection or composition changed outside a batch edit.
    fn on_text_state_changed(&self, update: &TextStateUpdate);

    /// A batch edit opened (`true`) or closed (`false`).
    fn on_suppression_state_changed(&self, ignoring: bool);
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl TextStateObserver for NullObserver {
    fn on_text_state_changed(&self, _update: &TextStateUpdate) {}

    fn on_suppression_state_changed(&self, _ignoring: bool) {}
}

/// A notification seen by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "channel", rename_all = "snake_case"))]
pub enum Notification {
    /// Text state channel.
    TextState(TextStateUpdate),
    /// Suppression state channel.
    Suppression {
        /// New suppression state.
        ignoring: bool,
    },
}

/// Observer that keeps every notification for later inspection.
///
/// Cloning yields another handle onto the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications in delivery order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Text state notifications in delivery order.
    #[must_use]
    pub fn text_updates(&self) -> Vec<TextStateUpdate> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notification::TextState(update) => Some(update.clone()),
                Notification::Suppression { .. } => None,
            })
            .collect()
    }

    /// Suppression state changes in delivery order.
    #[must_use]
    pub fn suppression_changes(&self) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Suppression { ignoring } => Some(*ignoring),
                Notification::TextState(_) => None,
            })
            .collect()
    }

    /// Number of text state notifications.
    #[must_use]
    pub fn text_update_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|n| matches!(n, Notification::TextState(_)))
            .count()
    }

    /// Most recent text state notification.
    #[must_use]
    pub fn last_text_update(&self) -> Option<TextStateUpdate> {
        self.lock().iter().rev().find_map(|n| match n {
            Notification::TextState(update) => Some(update.clone()),
            Notification::Suppression { .. } => None,
        })
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextStateObserver for RecordingObserver {
    fn on_text_state_changed(&self, update: &TextStateUpdate) {
        self.lock().push(Notification::TextState(update.clone()));
    }

    fn on_suppression_state_changed(&self, ignoring: bool) {
        self.lock().push(Notification::Suppression { ignoring });
    }
}
