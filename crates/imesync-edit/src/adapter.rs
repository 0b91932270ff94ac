#![forbid(unsafe_code)]

//! IME adapter.
//!
//! [`ImeAdapter`] sits between an input method and the focused element. It
//! owns at most one [`TextEditState`] (created when an editable element gains
//! focus, dropped when it loses it), queues composition updates, tracks soft
//! keyboard visibility, and dispatches [`InputEvent`]s.
//!
//! # Keyboard visibility
//!
//! | Trigger | Keyboard |
//! |---------|----------|
//! | Focus on an editable element by user gesture | shown |
//! | Programmatic focus on an editable element | unchanged (shown if configured) |
//! | Focus on a non-editable element, blur | hidden |
//! | `show_ime_if_needed` with an editable element focused | shown |
//! | Submitting editor action (`Go`, `Search`, `Send`, `Done`) | hidden |
//! | `unselect` | hidden (configurable) |

use std::collections::VecDeque;
use std::sync::Arc;

use imesync_core::clipboard::Clipboard;
use imesync_core::event::{CompositionEvent, EditorAction, FocusCause, InputEvent, TextInputType};

use crate::config::AdapterConfig;
use crate::keyboard::InputMethodManager;
use crate::notify::TextStateObserver;
use crate::state::TextEditState;

/// Counters kept by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterStats {
    /// Composition updates applied to a field.
    pub compositions_applied: u64,
    /// Composition updates dropped because no editable field was focused.
    pub compositions_dropped: u64,
    /// Composition updates evicted by the queue bound.
    pub queue_overflows: u64,
}

/// Bridge between an input method and the focused editable element.
pub struct ImeAdapter {
    config: AdapterConfig,
    clipboard: Arc<dyn Clipboard>,
    observer: Arc<dyn TextStateObserver>,
    keyboard: Arc<dyn InputMethodManager>,
    field: Option<TextEditState>,
    focused_type: TextInputType,
    composition_queue: VecDeque<CompositionEvent>,
    show_without_hide_outstanding: bool,
    stats: AdapterStats,
}

impl std::fmt::Debug for ImeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImeAdapter")
            .field("config", &self.config)
            .field("field", &self.field)
            .field("focused_type", &self.focused_type)
            .field("queued", &self.composition_queue.len())
            .field("keyboard_shown", &self.show_without_hide_outstanding)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ImeAdapter {
    /// Create an adapter with the default configuration and nothing focused.
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        observer: Arc<dyn TextStateObserver>,
        keyboard: Arc<dyn InputMethodManager>,
    ) -> Self {
        Self {
            config: AdapterConfig::default(),
            clipboard,
            observer,
            keyboard,
            field: None,
            focused_type: TextInputType::None,
            composition_queue: VecDeque::new(),
            show_without_hide_outstanding: false,
            stats: AdapterStats::default(),
        }
    }

    /// Set the configuration (builder).
    #[must_use]
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    // --- Accessors ---

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Text state of the focused editable element.
    #[must_use]
    pub fn text_state(&self) -> Option<&TextEditState> {
        self.field.as_ref()
    }

    /// Kind of the focused element.
    #[must_use]
    pub fn focused_input_type(&self) -> TextInputType {
        self.focused_type
    }

    /// Whether a show request is outstanding without a matching hide.
    #[must_use]
    pub fn is_keyboard_shown(&self) -> bool {
        self.show_without_hide_outstanding
    }

    /// Composition updates waiting to be applied.
    #[must_use]
    pub fn queued_compositions(&self) -> usize {
        self.composition_queue.len()
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> AdapterStats {
        self.stats
    }

    // --- Focus ---

    /// An element gained focus.
    ///
    /// Any previous field state is released. Editable elements get a fresh,
    /// empty state; non-editable ones hide the keyboard.
    pub fn focus(&mut self, input_type: TextInputType, cause: FocusCause) {
        self.release_field();
        self.composition_queue.clear();
        self.focused_type = input_type;

        if !input_type.is_editable() {
            tracing::debug!(target: "imesync.adapter", ?input_type, "focus on non-editable element");
            self.hide_keyboard();
            return;
        }

        self.field = Some(
            TextEditState::new(Arc::clone(&self.clipboard), Arc::clone(&self.observer))
                .with_input_type(input_type)
                .with_sanitize_single_line(self.config.sanitize_single_line),
        );
        self.keyboard.restart_input();
        tracing::debug!(target: "imesync.adapter", ?input_type, ?cause, "editable field focused");

        if cause == FocusCause::UserGesture || self.config.show_keyboard_on_focus {
            self.show_keyboard();
        }
    }

    /// The focused element lost focus.
    pub fn blur(&mut self) {
        self.release_field();
        self.composition_queue.clear();
        self.focused_type = TextInputType::None;
        self.hide_keyboard();
    }

    /// Show the keyboard if an editable element is focused.
    ///
    /// Returns `true` if a show request was made.
    pub fn show_ime_if_needed(&mut self) -> bool {
        if self.field.is_none() {
            return false;
        }
        self.show_keyboard();
        true
    }

    // --- Composition queue ---

    /// Append a composition update without applying it.
    pub fn queue_composition(&mut self, update: CompositionEvent) {
        if self.composition_queue.len() >= self.config.max_queued_compositions {
            self.composition_queue.pop_front();
            self.stats.queue_overflows += 1;
            tracing::warn!(
                target: "imesync.adapter",
                max = self.config.max_queued_compositions,
                "composition queue overflow, oldest update dropped"
            );
        }
        self.composition_queue.push_back(update);
    }

    /// Apply every queued composition update in order.
    ///
    /// Returns the number applied. Without an editable field the queue is
    /// discarded.
    pub fn flush_composition_queue(&mut self) -> usize {
        let Some(field) = self.field.as_mut() else {
            let dropped = self.composition_queue.len();
            if dropped > 0 {
                self.composition_queue.clear();
                self.stats.compositions_dropped += dropped as u64;
                tracing::debug!(
                    target: "imesync.adapter",
                    dropped,
                    "composition updates dropped: no editable field"
                );
            }
            return 0;
        };

        let mut applied = 0;
        while let Some(update) = self.composition_queue.pop_front() {
            field.apply_composition(&update.text, update.new_cursor_position, update.commit);
            applied += 1;
        }
        self.stats.compositions_applied += applied as u64;
        applied
    }

    /// Queue a composition update and apply the queue.
    ///
    /// Returns `true` if at least one update reached a field.
    pub fn check_composition_queue_and_apply(
        &mut self,
        text: &str,
        new_cursor_position: i32,
        commit: bool,
    ) -> bool {
        self.queue_composition(CompositionEvent::new(text, new_cursor_position, commit));
        self.flush_composition_queue() > 0
    }

    // --- Editing commands ---

    /// Move the selection of the focused field.
    pub fn set_editable_selection_offsets(&mut self, start: usize, end: usize) -> bool {
        self.with_field(|field| {
            field.set_selection(start, end);
            true
        })
    }

    /// Copy the selection to the clipboard.
    pub fn copy(&mut self) -> bool {
        self.with_field(|field| field.copy())
    }

    /// Cut the selection to the clipboard.
    pub fn cut(&mut self) -> bool {
        self.with_field(TextEditState::cut)
    }

    /// Paste the clipboard text over the selection.
    pub fn paste(&mut self) -> bool {
        self.with_field(TextEditState::paste)
    }

    /// Select the whole field.
    pub fn select_all(&mut self) -> bool {
        self.with_field(|field| {
            field.select_all();
            true
        })
    }

    /// Drop the selection with its content.
    pub fn unselect(&mut self) -> bool {
        let changed = self.with_field(|field| {
            field.unselect();
            true
        });
        if changed && self.config.hide_keyboard_on_unselect {
            self.hide_keyboard();
        }
        changed
    }

    /// Open a batch edit on the focused field.
    pub fn begin_batch_edit(&mut self) -> bool {
        self.with_field(TextEditState::begin_batch_edit)
    }

    /// Close the batch edit on the focused field.
    pub fn end_batch_edit(&mut self) -> bool {
        self.with_field(TextEditState::end_batch_edit)
    }

    /// Perform an editor action.
    ///
    /// Submitting actions clear the field, release it and hide the keyboard.
    /// An open batch edit is closed first so the reset is delivered. Other
    /// actions are not handled here and return `false`.
    pub fn perform_editor_action(&mut self, action: EditorAction) -> bool {
        if !action.submits() {
            tracing::debug!(target: "imesync.adapter", ?action, "editor action not handled");
            return false;
        }
        let Some(mut field) = self.field.take() else {
            return false;
        };
        field.end_batch_edit();
        field.reset();
        field.release();
        self.composition_queue.clear();
        self.focused_type = TextInputType::None;
        self.hide_keyboard();
        tracing::debug!(target: "imesync.adapter", ?action, "field submitted");
        true
    }

    // --- Event handling ---

    /// Handle an input event.
    ///
    /// Returns `true` if the event was acted upon.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let _span = tracing::debug_span!(
            "ime.event",
            operation = event.operation_name(),
            focused = self.field.is_some()
        )
        .entered();

        match event {
            InputEvent::Composition(update) => {
                self.check_composition_queue_and_apply(
                    &update.text,
                    update.new_cursor_position,
                    update.commit,
                )
            }
            InputEvent::SetSelection { start, end } => {
                self.set_editable_selection_offsets(*start, *end)
            }
            InputEvent::Cut => self.cut(),
            InputEvent::Copy => self.copy(),
            InputEvent::Paste => self.paste(),
            InputEvent::SelectAll => self.select_all(),
            InputEvent::Unselect => self.unselect(),
            InputEvent::BeginBatchEdit => self.begin_batch_edit(),
            InputEvent::EndBatchEdit => self.end_batch_edit(),
            InputEvent::EditorAction { action } => self.perform_editor_action(*action),
            InputEvent::Focus { input_type, cause } => {
                self.focus(*input_type, *cause);
                true
            }
            InputEvent::Blur => {
                self.blur();
                true
            }
        }
    }

    // --- Internal helpers ---

    fn release_field(&mut self) {
        if let Some(field) = self.field.take() {
            field.release();
        }
    }

    fn with_field(&mut self, f: impl FnOnce(&mut TextEditState) -> bool) -> bool {
        match self.field.as_mut() {
            Some(field) => f(field),
            None => {
                tracing::trace!(target: "imesync.adapter", "command ignored: no editable field");
                false
            }
        }
    }

    fn show_keyboard(&mut self) {
        self.show_without_hide_outstanding = true;
        self.keyboard.show_soft_input();
        tracing::debug!(target: "imesync.adapter", "keyboard show requested");
    }

    fn hide_keyboard(&mut self) {
        if !self.show_without_hide_outstanding {
            return;
        }
        self.show_without_hide_outstanding = false;
        self.keyboard.hide_soft_input();
        tracing::debug!(target: "imesync.adapter", "keyboard hide requested");
    }
}
