#![forbid(unsafe_code)]

//! Edit: per-field text state and the IME adapter.
//!
//! # Role in imesync
//! `imesync-edit` keeps the platform input method and the focused element in
//! agreement about text, selection and composition.
//!
//! # Primary responsibilities
//! - **TextEditState**: text, selection and composition of one field, with
//!   batch-edit notification suppression.
//! - **ImeAdapter**: focus lifecycle, composition queue, keyboard visibility,
//!   event dispatch.
//! - **Collaborators**: [`TextStateObserver`] for outgoing notifications and
//!   [`InputMethodManager`] for the soft keyboard. The clipboard lives in
//!   `imesync-core`.

pub mod adapter;
pub mod config;
pub mod keyboard;
pub mod notify;
pub mod state;

pub use adapter::{AdapterStats, ImeAdapter};
pub use config::{AdapterConfig, ConfigError};
pub use keyboard::{InputMethodManager, KeyboardStats, SoftKeyboard};
pub use notify::{
    Notification, NullObserver, RecordingObserver, TextStateObserver, TextStateUpdate,
};
pub use state::TextEditState;
