#![forbid(unsafe_code)]

//! Text edit state of one focused field.
//!
//! [`TextEditState`] owns the text, the selection (anchor and extent, so a
//! reversed selection survives) and the composition range of a single
//! editable element. Every content or selection change produces exactly one
//! text state notification, unless a batch edit is open, in which case the
//! state still changes but the notification is dropped.
//!
//! All offsets are grapheme-cluster indices and are clamped to
//! `[0, len(text)]`; callers never see an error from an edit.
//!
//! # State machine
//!
//! Two orthogonal flags:
//!
//! ```text
//! normal ──begin_batch_edit──► batch ──end_batch_edit──► normal
//!
//! no-composition ──apply_composition(commit=false)──► composing
//! composing      ──apply_composition(commit=false)──► composing
//! composing      ──apply_composition(commit=true)───► no-composition
//! ```

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use imesync_core::clipboard::Clipboard;
use imesync_core::event::TextInputType;
use unicode_segmentation::UnicodeSegmentation;

use crate::notify::{TextStateObserver, TextStateUpdate};

/// Text, selection and composition of one editable field.
pub struct TextEditState {
    text: String,
    /// Selection start as given by the caller.
    anchor: usize,
    /// Selection end as given by the caller; this is the caret.
    extent: usize,
    composition: Option<Range<usize>>,
    input_type: TextInputType,
    sanitize_single_line: bool,
    ignoring_updates: bool,
    update_counter: u64,
    revision: u64,
    clipboard: Arc<dyn Clipboard>,
    observer: Arc<dyn TextStateObserver>,
}

impl fmt::Debug for TextEditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEditState")
            .field("text", &self.text)
            .field("anchor", &self.anchor)
            .field("extent", &self.extent)
            .field("composition", &self.composition)
            .field("input_type", &self.input_type)
            .field("ignoring_updates", &self.ignoring_updates)
            .field("update_counter", &self.update_counter)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl TextEditState {
    /// Create an empty state for a plain text field.
    pub fn new(clipboard: Arc<dyn Clipboard>, observer: Arc<dyn TextStateObserver>) -> Self {
        Self {
            text: String::new(),
            anchor: 0,
            extent: 0,
            composition: None,
            input_type: TextInputType::Text,
            sanitize_single_line: true,
            ignoring_updates: false,
            update_counter: 0,
            revision: 0,
            clipboard,
            observer,
        }
    }

    // --- Builder methods ---

    /// Set the kind of field (builder).
    #[must_use]
    pub fn with_input_type(mut self, input_type: TextInputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Set whether single-line fields sanitize inserted text (builder).
    #[must_use]
    pub fn with_sanitize_single_line(mut self, sanitize: bool) -> Self {
        self.sanitize_single_line = sanitize;
        self
    }

    /// Set the initial text with the caret at its end (builder).
    ///
    /// Does not notify.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        let len = self.grapheme_count();
        self.anchor = len;
        self.extent = len;
        self.composition = None;
        self
    }

    // --- Accessors ---

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in graphemes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grapheme_count()
    }

    /// Whether the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Normalized selection `(start, end)` with `start <= end`.
    #[must_use]
    pub fn selection(&self) -> (usize, usize) {
        if self.anchor <= self.extent {
            (self.anchor, self.extent)
        } else {
            (self.extent, self.anchor)
        }
    }

    /// Selection as given by the caller: `(anchor, extent)`.
    #[must_use]
    pub fn selection_anchor_extent(&self) -> (usize, usize) {
        (self.anchor, self.extent)
    }

    /// Caret position (the selection extent).
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.extent
    }

    /// Selected text (empty for a caret).
    #[must_use]
    pub fn selected_text(&self) -> &str {
        let (start, end) = self.selection();
        let byte_start = self.grapheme_byte_offset(start);
        let byte_end = self.grapheme_byte_offset(end);
        &self.text[byte_start..byte_end]
    }

    /// Active composition range.
    #[must_use]
    pub fn composition(&self) -> Option<Range<usize>> {
        self.composition.clone()
    }

    /// Whether a composition is active.
    #[inline]
    #[must_use]
    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    /// Whether text state notifications are currently suppressed.
    #[inline]
    #[must_use]
    pub fn is_ignoring_updates(&self) -> bool {
        self.ignoring_updates
    }

    /// Number of text state notifications delivered to the observer.
    #[inline]
    #[must_use]
    pub fn update_counter(&self) -> u64 {
        self.update_counter
    }

    /// Number of state changes, delivered or suppressed.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Kind of field.
    #[inline]
    #[must_use]
    pub fn input_type(&self) -> TextInputType {
        self.input_type
    }

    /// Current state as a notification payload.
    #[must_use]
    pub fn snapshot(&self) -> TextStateUpdate {
        let (selection_start, selection_end) = self.selection();
        TextStateUpdate {
            text: self.text.clone(),
            selection_start,
            selection_end,
            composition: self.composition.clone(),
        }
    }

    // --- Composition ---

    /// Replace the text with the latest composition.
    ///
    /// The caret collapses after the new text. The composition covers the
    /// whole text unless `commit` is set, which finalizes it.
    /// `new_cursor_position` is recorded in traces only.
    pub fn apply_composition(&mut self, text: &str, new_cursor_position: i32, commit: bool) {
        let clean = self.sanitize(text);
        self.text = clean.into_owned();
        let len = self.grapheme_count();
        self.anchor = len;
        self.extent = len;
        self.composition = if commit { None } else { Some(0..len) };

        tracing::trace!(
            target: "imesync.edit",
            new_cursor_position,
            commit,
            "composition applied"
        );
        self.changed(if commit { "ime_commit" } else { "ime_update" });
    }

    // --- Selection ---

    /// Move the selection. Offsets are clamped; `start > end` is kept as a
    /// reversed selection. The composition is left untouched.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.grapheme_count();
        self.anchor = start.min(len);
        self.extent = end.min(len);
        self.changed("set_selection");
    }

    /// Select the whole text.
    pub fn select_all(&mut self) {
        self.anchor = 0;
        self.extent = self.grapheme_count();
        self.changed("select_all");
    }

    /// Drop the selection together with the selected text.
    ///
    /// The caret collapses where the selection started, so a full-text
    /// selection leaves an empty field.
    pub fn unselect(&mut self) {
        let (start, end) = self.selection();
        self.delete_range(start, end);
        self.changed("unselect");
    }

    // --- Clipboard ---

    /// Copy the selection to the clipboard.
    ///
    /// Returns `false` (and leaves the clipboard alone) for an empty
    /// selection. Never notifies.
    pub fn copy(&self) -> bool {
        let selected = self.selected_text();
        if selected.is_empty() {
            return false;
        }
        self.clipboard.write_text(selected);
        self.trace_edit("copy");
        true
    }

    /// Move the selection to the clipboard.
    ///
    /// Returns `false` for an empty selection.
    pub fn cut(&mut self) -> bool {
        let (start, end) = self.selection();
        if start == end {
            return false;
        }
        self.clipboard.write_text(self.selected_text());
        self.delete_range(start, end);
        self.changed("cut");
        true
    }

    /// Replace the selection with the clipboard text.
    ///
    /// Returns `false` when the clipboard holds no text.
    pub fn paste(&mut self) -> bool {
        let Some(content) = self.clipboard.read_text() else {
            tracing::debug!(target: "imesync.edit", "paste ignored: no text on clipboard");
            return false;
        };
        let clean = self.sanitize(&content);
        if clean.is_empty() {
            return false;
        }

        let (start, end) = self.selection();
        let byte_start = self.grapheme_byte_offset(start);
        let byte_end = self.grapheme_byte_offset(end);
        let count_before = self.grapheme_count() - (end - start);
        self.text.replace_range(byte_start..byte_end, &clean);

        let inserted = self.grapheme_count().saturating_sub(count_before);
        let caret = (start + inserted).min(self.grapheme_count());
        self.anchor = caret;
        self.extent = caret;
        self.composition = None;
        self.changed("paste");
        true
    }

    // --- Batch edits ---

    /// Open a batch edit. Returns `false` if one is already open.
    pub fn begin_batch_edit(&mut self) -> bool {
        if self.ignoring_updates {
            return false;
        }
        self.ignoring_updates = true;
        self.observer.on_suppression_state_changed(true);
        tracing::debug!(target: "imesync.edit", "batch edit opened");
        true
    }

    /// Close the batch edit. Returns `false` if none is open.
    ///
    /// Notifications suppressed during the batch are not replayed.
    pub fn end_batch_edit(&mut self) -> bool {
        if !self.ignoring_updates {
            return false;
        }
        self.ignoring_updates = false;
        self.observer.on_suppression_state_changed(false);
        tracing::debug!(target: "imesync.edit", "batch edit closed");
        true
    }

    /// Drop the field, closing an open batch edit first so the observer
    /// leaves the suppressed state.
    pub fn release(mut self) {
        if self.end_batch_edit() {
            tracing::debug!(target: "imesync.edit", "batch edit closed on release");
        }
    }

    /// Clear the field: empty text, caret at 0, no composition.
    pub fn reset(&mut self) {
        self.text.clear();
        self.anchor = 0;
        self.extent = 0;
        self.composition = None;
        self.changed("reset");
    }

    // --- Internal helpers ---

    fn changed(&mut self, operation: &'static str) {
        self.revision += 1;
        self.trace_edit(operation);
        if self.ignoring_updates {
            tracing::trace!(target: "imesync.edit", operation, "notification suppressed");
            return;
        }
        self.update_counter += 1;
        self.observer.on_text_state_changed(&self.snapshot());
    }

    fn trace_edit(&self, operation: &'static str) {
        let _span = tracing::debug_span!(
            "ime.edit",
            operation,
            cursor_position = self.extent,
            grapheme_count = self.grapheme_count(),
            has_selection = self.anchor != self.extent,
            composing = self.composition.is_some()
        )
        .entered();
    }

    /// Remove `[start, end)` and collapse the caret at `start`.
    ///
    /// Direct edits finalize any composition.
    fn delete_range(&mut self, start: usize, end: usize) {
        if start < end {
            let byte_start = self.grapheme_byte_offset(start);
            let byte_end = self.grapheme_byte_offset(end);
            self.text.drain(byte_start..byte_end);
            self.composition = None;
        }
        self.anchor = start;
        self.extent = start;
    }

    fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.sanitize_single_line || !self.input_type.is_single_line() {
            return Cow::Borrowed(text);
        }
        if !text.chars().any(char::is_control) {
            return Cow::Borrowed(text);
        }
        // Map line breaks/tabs to spaces, filter other control chars
        Cow::Owned(
            text.chars()
                .map(|c| {
                    if c == '\n' || c == '\r' || c == '\t' {
                        ' '
                    } else {
                        c
                    }
                })
                .filter(|c| !c.is_control())
                .collect(),
        )
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn grapheme_byte_offset(&self, grapheme_idx: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}
