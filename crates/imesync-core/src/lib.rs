#![forbid(unsafe_code)]

//! Core: input events, text input types, the clipboard, and logging.
//!
//! # Role in imesync
//! `imesync-core` is the input layer. It owns the normalized event types an
//! input method delivers, the description of the focused element, and the
//! clipboard collaborator shared by every field.
//!
//! # How it fits in the system
//! `imesync-edit` consumes [`event::InputEvent`] values and drives the
//! per-field text state. `imesync-harness` records and replays the same
//! events (with the `serde` feature) to check determinism.

pub mod clipboard;
pub mod event;
pub mod logging;

pub use clipboard::{ClipData, Clipboard, MemoryClipboard};
pub use event::{CompositionEvent, EditorAction, FocusCause, InputEvent, TextInputType};
