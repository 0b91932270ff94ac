#![forbid(unsafe_code)]

//! In-memory IME session.
//!
//! [`ImeSession`] wires an [`ImeAdapter`] to recording collaborators (a
//! [`MemoryClipboard`], a [`RecordingObserver`], a [`SoftKeyboard`]) and logs
//! every dispatched event together with the notifications it produced, so the
//! run can be written out as a transcript and replayed later.

use std::sync::Arc;

use imesync_core::clipboard::{Clipboard, MemoryClipboard};
use imesync_core::event::{CompositionEvent, FocusCause, InputEvent, TextInputType};
use imesync_edit::{
    AdapterConfig, ImeAdapter, Notification, RecordingObserver, SoftKeyboard, TextEditState,
    TextStateUpdate,
};

use crate::transcript::{SessionStep, Transcript};

/// An adapter driven by test code, with every collaborator observable.
#[derive(Debug)]
pub struct ImeSession {
    name: String,
    adapter: ImeAdapter,
    clipboard: MemoryClipboard,
    observer: RecordingObserver,
    keyboard: SoftKeyboard,
    steps: Vec<SessionStep>,
    delivered: usize,
}

impl ImeSession {
    /// Create a session with the default adapter configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, AdapterConfig::default())
    }

    /// Create a session with a custom adapter configuration.
    pub fn with_config(name: impl Into<String>, config: AdapterConfig) -> Self {
        Self::with_clipboard(name, config, MemoryClipboard::new())
    }

    /// Create a session sharing an existing clipboard.
    pub fn with_clipboard(
        name: impl Into<String>,
        config: AdapterConfig,
        clipboard: MemoryClipboard,
    ) -> Self {
        let observer = RecordingObserver::new();
        let keyboard = SoftKeyboard::new();
        let adapter = ImeAdapter::new(
            Arc::new(clipboard.clone()),
            Arc::new(observer.clone()),
            Arc::new(keyboard.clone()),
        )
        .with_config(config);
        Self {
            name: name.into(),
            adapter,
            clipboard,
            observer,
            keyboard,
            steps: Vec::new(),
            delivered: 0,
        }
    }

    // --- Driving ---

    /// Dispatch one event and log it with the notifications it produced.
    pub fn dispatch(&mut self, event: InputEvent) -> bool {
        let handled = self.adapter.handle_event(&event);
        let notifications = self.observer.notifications();
        let produced = notifications
            .get(self.delivered..)
            .map(<[Notification]>::to_vec)
            .unwrap_or_default();
        self.delivered = notifications.len();
        tracing::trace!(
            target: "imesync.harness",
            session = %self.name,
            operation = event.operation_name(),
            handled,
            notifications = produced.len(),
            "session step"
        );
        self.steps.push(SessionStep::Input {
            event,
            handled,
            notifications: produced,
        });
        handled
    }

    /// Dispatch a sequence of events.
    pub fn dispatch_all(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            self.dispatch(event);
        }
    }

    /// Focus an element the way a user tap does.
    pub fn click(&mut self, input_type: TextInputType) -> bool {
        self.dispatch(InputEvent::Focus {
            input_type,
            cause: FocusCause::UserGesture,
        })
    }

    /// Focus an element from script, without a user gesture.
    pub fn focus_node(&mut self, input_type: TextInputType) -> bool {
        self.dispatch(InputEvent::Focus {
            input_type,
            cause: FocusCause::Programmatic,
        })
    }

    /// Deliver a composition update.
    pub fn compose(&mut self, text: &str, commit: bool) -> bool {
        self.dispatch(InputEvent::Composition(CompositionEvent::new(text, 1, commit)))
    }

    /// Request the keyboard for the focused element, logged with its result.
    pub fn show_ime_if_needed(&mut self) -> bool {
        let shown = self.adapter.show_ime_if_needed();
        self.steps.push(SessionStep::ShowImeIfNeeded { shown });
        shown
    }

    /// Put plain text on the clipboard.
    pub fn set_clipboard_text(&mut self, text: &str) {
        self.clipboard.write_text(text);
        self.steps.push(SessionStep::SetClipboard {
            text: text.to_owned(),
        });
    }

    // --- Inspection ---

    /// Session name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The adapter under test.
    #[must_use]
    pub fn adapter(&self) -> &ImeAdapter {
        &self.adapter
    }

    /// Text state of the focused element.
    #[must_use]
    pub fn text_state(&self) -> Option<&TextEditState> {
        self.adapter.text_state()
    }

    /// Snapshot of the focused element, if editable.
    #[must_use]
    pub fn snapshot(&self) -> Option<TextStateUpdate> {
        self.adapter.text_state().map(TextEditState::snapshot)
    }

    /// Clipboard handle.
    #[must_use]
    pub fn clipboard(&self) -> &MemoryClipboard {
        &self.clipboard
    }

    /// Current clipboard text.
    #[must_use]
    pub fn clipboard_text(&self) -> Option<String> {
        self.clipboard.read_text()
    }

    /// Observer handle.
    #[must_use]
    pub fn observer(&self) -> &RecordingObserver {
        &self.observer
    }

    /// Keyboard handle.
    #[must_use]
    pub fn keyboard(&self) -> &SoftKeyboard {
        &self.keyboard
    }

    /// Whether the adapter believes the keyboard is shown.
    #[must_use]
    pub fn is_keyboard_shown(&self) -> bool {
        self.adapter.is_keyboard_shown()
    }

    /// Every notification delivered so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.observer.notifications()
    }

    /// Logged steps.
    #[must_use]
    pub fn steps(&self) -> &[SessionStep] {
        &self.steps
    }

    /// Build a transcript of everything dispatched so far.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        Transcript::new(
            self.name.clone(),
            self.adapter.config().clone(),
            self.steps.clone(),
        )
    }
}
