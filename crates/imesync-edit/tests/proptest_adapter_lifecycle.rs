//! Property-based lifecycle tests for `ImeAdapter`.
//!
//! 1. The observer's suppression view always matches the focused field.
//! 2. Suppression changes strictly alternate, starting with `true`.
//! 3. A submitting editor action always ends on an empty text update.

use std::sync::Arc;

use imesync_core::clipboard::MemoryClipboard;
use imesync_core::event::{CompositionEvent, EditorAction, FocusCause, InputEvent, TextInputType};
use imesync_edit::{ImeAdapter, RecordingObserver, SoftKeyboard, TextStateUpdate};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn event() -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        4 => ("[a-z]{0,6}", any::<bool>())
            .prop_map(|(t, commit)| InputEvent::Composition(CompositionEvent::new(t, 1, commit))),
        1 => (0usize..8, 0usize..8).prop_map(|(start, end)| InputEvent::SetSelection { start, end }),
        1 => Just(InputEvent::Cut),
        1 => Just(InputEvent::Paste),
        1 => Just(InputEvent::Unselect),
        3 => Just(InputEvent::BeginBatchEdit),
        1 => Just(InputEvent::EndBatchEdit),
        1 => prop_oneof![Just(EditorAction::Go), Just(EditorAction::Next)]
            .prop_map(|action| InputEvent::EditorAction { action }),
        2 => prop_oneof![Just(TextInputType::Text), Just(TextInputType::None)]
            .prop_map(|input_type| InputEvent::Focus {
                input_type,
                cause: FocusCause::UserGesture,
            }),
        2 => Just(InputEvent::Blur),
    ]
}

fn adapter() -> (ImeAdapter, RecordingObserver) {
    let observer = RecordingObserver::new();
    let adapter = ImeAdapter::new(
        Arc::new(MemoryClipboard::new()),
        Arc::new(observer.clone()),
        Arc::new(SoftKeyboard::new()),
    );
    (adapter, observer)
}

fn observer_suppressed(observer: &RecordingObserver) -> bool {
    observer.suppression_changes().last().copied().unwrap_or(false)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Suppression view
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observer_suppression_matches_field(events in proptest::collection::vec(event(), 0..40)) {
        let (mut adapter, observer) = adapter();
        adapter.handle_event(&InputEvent::Focus {
            input_type: TextInputType::Text,
            cause: FocusCause::UserGesture,
        });
        for event in &events {
            adapter.handle_event(event);
            let field_suppressed = adapter
                .text_state()
                .is_some_and(|state| state.is_ignoring_updates());
            prop_assert_eq!(
                observer_suppressed(&observer),
                field_suppressed,
                "after {:?}",
                event
            );
        }
    }

    #[test]
    fn suppression_changes_alternate(events in proptest::collection::vec(event(), 0..40)) {
        let (mut adapter, observer) = adapter();
        for event in &events {
            adapter.handle_event(event);
        }
        for (idx, ignoring) in observer.suppression_changes().into_iter().enumerate() {
            prop_assert_eq!(ignoring, idx % 2 == 0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Submit
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn go_always_delivers_reset(events in proptest::collection::vec(event(), 0..30)) {
        let (mut adapter, observer) = adapter();
        adapter.handle_event(&InputEvent::Focus {
            input_type: TextInputType::Text,
            cause: FocusCause::UserGesture,
        });
        for event in &events {
            adapter.handle_event(event);
        }
        if adapter.text_state().is_some() {
            prop_assert!(adapter.perform_editor_action(EditorAction::Go));
            prop_assert_eq!(observer.last_text_update(), Some(TextStateUpdate::default()));
            prop_assert!(!observer_suppressed(&observer));
        }
    }
}
