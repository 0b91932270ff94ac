#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! This module defines the events an input method (or a test driving one)
//! delivers to the adapter. All events derive `Clone`, `PartialEq`, and `Eq`
//! for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Offsets are grapheme-cluster indices, never byte offsets
//! - `CompositionEvent::new_cursor_position` follows the platform convention
//!   (`1` = caret after the composed text) and is carried for tracing only
//! - Events are serializable behind the `serde` feature so sessions can be
//!   recorded and replayed

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Canonical input event.
///
/// This enum represents everything the adapter can receive from an input
/// method or from the embedding application on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum InputEvent {
    /// Composition (preedit) update from the IME.
    Composition(CompositionEvent),

    /// Move the selection. `start` may exceed `end` for a reversed selection.
    SetSelection {
        /// Anchor offset.
        start: usize,
        /// Extent offset.
        end: usize,
    },

    /// Cut the selection to the clipboard.
    Cut,

    /// Copy the selection to the clipboard.
    Copy,

    /// Paste plain text from the clipboard.
    Paste,

    /// Select the whole field.
    SelectAll,

    /// Drop the selection together with its content.
    Unselect,

    /// The IME opened a batch edit.
    BeginBatchEdit,

    /// The IME closed a batch edit.
    EndBatchEdit,

    /// The IME performed an editor action (the "Go"/"Done" key).
    EditorAction {
        /// Requested action.
        action: EditorAction,
    },

    /// An element gained focus.
    Focus {
        /// Kind of element that gained focus.
        input_type: TextInputType,
        /// What caused the focus change.
        cause: FocusCause,
    },

    /// The focused element lost focus.
    Blur,
}

impl InputEvent {
    /// Short stable name of the event, used in tracing spans.
    #[must_use]
    pub const fn operation_name(&self) -> &'static str {
        match self {
            Self::Composition(c) if c.commit => "ime_commit",
            Self::Composition(_) => "ime_update",
            Self::SetSelection { .. } => "set_selection",
            Self::Cut => "cut",
            Self::Copy => "copy",
            Self::Paste => "paste",
            Self::SelectAll => "select_all",
            Self::Unselect => "unselect",
            Self::BeginBatchEdit => "begin_batch_edit",
            Self::EndBatchEdit => "end_batch_edit",
            Self::EditorAction { .. } => "editor_action",
            Self::Focus { .. } => "focus",
            Self::Blur => "blur",
        }
    }
}

/// A composition update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompositionEvent {
    /// Latest composed text.
    pub text: String,

    /// Platform caret hint relative to the composed text.
    pub new_cursor_position: i32,

    /// True when the composition is finalized.
    pub commit: bool,
}

impl CompositionEvent {
    /// Create a composition update.
    #[must_use]
    pub fn new(text: impl Into<String>, new_cursor_position: i32, commit: bool) -> Self {
        Self {
            text: text.into(),
            new_cursor_position,
            commit,
        }
    }

    /// An in-progress update with the caret after the text.
    #[must_use]
    pub fn update(text: impl Into<String>) -> Self {
        Self::new(text, 1, false)
    }

    /// A committing update with the caret after the text.
    #[must_use]
    pub fn commit(text: impl Into<String>) -> Self {
        Self::new(text, 1, true)
    }
}

/// Kind of the focused element, as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TextInputType {
    /// Not editable (buttons, radio inputs, plain content).
    #[default]
    None,
    /// `<input type=text>`.
    Text,
    /// `<input type=password>`.
    Password,
    /// `<input type=search>`.
    Search,
    /// `<input type=email>`.
    Email,
    /// `<input type=number>`.
    Number,
    /// `<input type=tel>`.
    Telephone,
    /// `<input type=url>`.
    Url,
    /// `<textarea>`.
    TextArea,
    /// A `contenteditable` region.
    ContentEditable,
}

impl TextInputType {
    /// Whether the element accepts text input at all.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether the element holds a single line of text.
    #[must_use]
    pub const fn is_single_line(self) -> bool {
        !matches!(self, Self::TextArea | Self::ContentEditable)
    }
}

/// Editor action requested by the IME's action key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EditorAction {
    /// No specific action.
    #[default]
    Unspecified,
    /// Navigate to the field's target.
    Go,
    /// Run a search.
    Search,
    /// Send the content.
    Send,
    /// Move to the next field.
    Next,
    /// Move to the previous field.
    Previous,
    /// Finish editing.
    Done,
}

impl EditorAction {
    /// Whether the action submits the field's form.
    #[must_use]
    pub const fn submits(self) -> bool {
        matches!(self, Self::Go | Self::Search | Self::Send | Self::Done)
    }
}

/// What caused a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FocusCause {
    /// A tap or click by the user.
    UserGesture,
    /// Script-driven focus without a user gesture.
    #[default]
    Programmatic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_constructors() {
        let update = CompositionEvent::update("he");
        assert_eq!(update.text, "he");
        assert_eq!(update.new_cursor_position, 1);
        assert!(!update.commit);

        let commit = CompositionEvent::commit("hel");
        assert!(commit.commit);
    }

    #[test]
    fn operation_names_distinguish_commit() {
        let update = InputEvent::Composition(CompositionEvent::update("h"));
        let commit = InputEvent::Composition(CompositionEvent::commit("h"));
        assert_eq!(update.operation_name(), "ime_update");
        assert_eq!(commit.operation_name(), "ime_commit");
        assert_eq!(InputEvent::Paste.operation_name(), "paste");
    }

    #[test]
    fn input_type_editability() {
        assert!(!TextInputType::None.is_editable());
        assert!(TextInputType::Text.is_editable());
        assert!(TextInputType::Password.is_single_line());
        assert!(!TextInputType::TextArea.is_single_line());
        assert_eq!(TextInputType::default(), TextInputType::None);
    }

    #[test]
    fn submitting_actions() {
        assert!(EditorAction::Go.submits());
        assert!(EditorAction::Done.submits());
        assert!(!EditorAction::Next.submits());
        assert!(!EditorAction::Unspecified.submits());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn events_serialize_with_kind_tag() {
        let event = InputEvent::SetSelection { start: 2, end: 5 };
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"kind":"set_selection","start":2,"end":5}"#);
        let back: InputEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
