#![forbid(unsafe_code)]

//! Soft keyboard collaborator.
//!
//! The adapter never talks to a platform input method directly. It asks an
//! [`InputMethodManager`] to show, hide or restart input, and keeps its own
//! "show requested without a matching hide" bookkeeping.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Requests to the platform input method.
pub trait InputMethodManager: Send + Sync {
    /// Ask for the soft keyboard to be shown.
    fn show_soft_input(&self);

    /// Ask for the soft keyboard to be hidden.
    ///
    /// Returns `true` if the keyboard was showing.
    fn hide_soft_input(&self) -> bool;

    /// The focused element changed; the input connection must be rebuilt.
    fn restart_input(&self);

    /// Whether an input connection is currently active.
    fn is_active(&self) -> bool;
}

/// Counters kept by [`SoftKeyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardStats {
    /// Calls to `show_soft_input`.
    pub shows: usize,
    /// Calls to `hide_soft_input`.
    pub hides: usize,
    /// Calls to `restart_input`.
    pub restarts: usize,
}

#[derive(Debug, Default)]
struct KeyboardState {
    visible: bool,
    stats: KeyboardStats,
}

/// In-memory soft keyboard.
///
/// Cloning yields another handle onto the same keyboard.
#[derive(Debug, Clone, Default)]
pub struct SoftKeyboard {
    inner: Arc<Mutex<KeyboardState>>,
}

impl SoftKeyboard {
    /// Create a hidden keyboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the keyboard is on screen.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    /// Call counters.
    #[must_use]
    pub fn stats(&self) -> KeyboardStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, KeyboardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputMethodManager for SoftKeyboard {
    fn show_soft_input(&self) {
        let mut state = self.lock();
        state.visible = true;
        state.stats.shows += 1;
    }

    fn hide_soft_input(&self) -> bool {
        let mut state = self.lock();
        state.stats.hides += 1;
        std::mem::replace(&mut state.visible, false)
    }

    fn restart_input(&self) {
        self.lock().stats.restarts += 1;
    }

    fn is_active(&self) -> bool {
        self.lock().visible
    }
}
