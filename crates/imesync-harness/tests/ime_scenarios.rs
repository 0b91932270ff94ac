//! End-to-end input method scenarios driven through `ImeSession`.
//!
//! Each test starts with a text field focused by a tap, then checks the
//! field state, the notification stream, the clipboard and the keyboard, and
//! finally replays its own transcript.

use imesync_core::event::{EditorAction, InputEvent, TextInputType};
use imesync_edit::{Notification, TextEditState, TextStateUpdate};
use imesync_harness::{ImeSession, TranscriptReader, replay};
use tracing::{Level, info};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

fn focused_text_field(name: &str) -> ImeSession {
    init_tracing();
    let mut session = ImeSession::new(name);
    session.click(TextInputType::Text);
    let state = session.snapshot().expect("editable field");
    assert_eq!(state, TextStateUpdate::default());
    assert!(session.is_keyboard_shown());
    session
}

/// Field text, selection and composition (start, end), `None` for no composition.
fn assert_field(
    session: &ImeSession,
    text: &str,
    selection: (usize, usize),
    composition: Option<(usize, usize)>,
) {
    let state = session.text_state().expect("editable field");
    assert_eq!(state.text(), text);
    assert_eq!(state.selection(), selection);
    assert_eq!(state.composition().map(|r| (r.start, r.end)), composition);
}

fn assert_replays_clean(session: &ImeSession) {
    let jsonl = session.transcript().to_jsonl().expect("render transcript");
    let transcript = TranscriptReader::from_bytes(jsonl.as_bytes()).expect("parse transcript");
    let report = replay(&transcript);
    assert!(report.is_clean(), "replay diverged: {report:?}");
}

#[test]
fn keyboard_dismissed_after_go() {
    let mut session = focused_text_field("go");
    session.compose("hello", false);
    assert_field(&session, "hello", (5, 5), Some((0, 5)));

    info!("performing go");
    assert!(session.dispatch(InputEvent::EditorAction {
        action: EditorAction::Go,
    }));

    let last = session.observer().last_text_update().expect("reset update");
    assert_eq!(last.text, "");
    assert_eq!((last.selection_start, last.selection_end), (0, 0));
    assert_eq!(last.composition, None);
    assert!(!session.is_keyboard_shown());
    assert!(!session.keyboard().is_visible());
    assert_replays_clean(&session);
}

#[test]
fn text_updates_while_composing() {
    let mut session = focused_text_field("composing");

    session.compose("h", false);
    assert_field(&session, "h", (1, 1), Some((0, 1)));
    session.compose("he", false);
    assert_field(&session, "he", (2, 2), Some((0, 2)));
    session.compose("hel", false);
    assert_field(&session, "hel", (3, 3), Some((0, 3)));
    session.compose("hel", true);
    assert_field(&session, "hel", (3, 3), None);

    let texts: Vec<String> = session
        .observer()
        .text_updates()
        .into_iter()
        .map(|u| u.text)
        .collect();
    assert_eq!(texts, vec!["h", "he", "hel", "hel"]);
    assert_replays_clean(&session);
}

#[test]
fn copy_selection() {
    let mut session = focused_text_field("copy");
    session.compose("hello", true);
    assert_field(&session, "hello", (5, 5), None);

    session.dispatch(InputEvent::SetSelection { start: 2, end: 5 });
    assert_field(&session, "hello", (2, 5), None);

    let before = session.notifications().len();
    assert!(session.dispatch(InputEvent::Copy));
    assert_eq!(session.clipboard_text().as_deref(), Some("llo"));
    assert_eq!(session.notifications().len(), before);
    assert_field(&session, "hello", (2, 5), None);
    assert_replays_clean(&session);
}

#[test]
fn cut_selection() {
    let mut session = focused_text_field("cut");
    session.compose("snarful", true);
    assert_field(&session, "snarful", (7, 7), None);

    session.dispatch(InputEvent::SetSelection { start: 1, end: 5 });
    assert_field(&session, "snarful", (1, 5), None);

    assert!(session.dispatch(InputEvent::Cut));
    assert_field(&session, "sul", (1, 1), None);
    assert_eq!(session.clipboard_text().as_deref(), Some("narf"));
    assert_replays_clean(&session);
}

#[test]
fn paste_replaces_selection_and_inserts_at_caret() {
    let mut session = focused_text_field("paste");
    session.set_clipboard_text("blarg");

    assert!(session.dispatch(InputEvent::Paste));
    assert_field(&session, "blarg", (5, 5), None);

    session.dispatch(InputEvent::SetSelection { start: 3, end: 5 });
    assert_field(&session, "blarg", (3, 5), None);

    let before = session.observer().text_update_count();
    assert!(session.dispatch(InputEvent::Paste));
    assert_field(&session, "blablarg", (8, 8), None);
    assert_eq!(session.observer().text_update_count(), before + 1);

    assert!(session.dispatch(InputEvent::Paste));
    assert_field(&session, "blablargblarg", (13, 13), None);
    assert_replays_clean(&session);
}

#[test]
fn select_all_then_unselect_all() {
    let mut session = focused_text_field("select_all");
    session.compose("hello", true);
    assert_field(&session, "hello", (5, 5), None);

    session.dispatch(InputEvent::SelectAll);
    assert_field(&session, "hello", (0, 5), None);

    session.dispatch(InputEvent::Unselect);
    assert_field(&session, "", (0, 0), None);
    assert!(!session.is_keyboard_shown());
    assert_replays_clean(&session);
}

#[test]
fn updates_ignored_during_batch_edits() {
    let mut session = focused_text_field("batch");
    assert!(session.dispatch(InputEvent::BeginBatchEdit));
    assert!(session.text_state().is_some_and(TextEditState::is_ignoring_updates));

    session.compose("h", false);
    assert_field(&session, "h", (1, 1), Some((0, 1)));
    session.compose("he", false);
    assert_field(&session, "he", (2, 2), Some((0, 2)));
    session.compose("hel", false);
    assert_field(&session, "hel", (3, 3), Some((0, 3)));

    let state = session.text_state().expect("field");
    assert_eq!(state.update_counter(), 0);
    assert_eq!(state.revision(), 3);
    assert!(state.is_ignoring_updates());
    assert_eq!(session.observer().text_update_count(), 0);

    assert!(session.dispatch(InputEvent::EndBatchEdit));
    assert_eq!(session.observer().suppression_changes(), vec![true, false]);
    assert_eq!(
        session.notifications(),
        vec![
            Notification::Suppression { ignoring: true },
            Notification::Suppression { ignoring: false },
        ]
    );
    assert_replays_clean(&session);
}

#[test]
fn show_ime_if_needed_only_for_editable_focus() {
    init_tracing();
    let mut session = ImeSession::new("show_ime");

    session.focus_node(TextInputType::None);
    assert!(!session.is_keyboard_shown());
    assert!(!session.show_ime_if_needed());
    assert!(!session.is_keyboard_shown());

    session.focus_node(TextInputType::Text);
    assert!(!session.is_keyboard_shown());
    assert!(session.show_ime_if_needed());
    assert!(session.is_keyboard_shown());
    assert!(session.keyboard().is_visible());
    assert_replays_clean(&session);
}

#[test]
fn commands_after_blur_are_ignored() {
    let mut session = focused_text_field("blur");
    session.compose("hello", true);
    session.dispatch(InputEvent::Blur);
    assert!(session.text_state().is_none());
    assert!(!session.is_keyboard_shown());

    let before = session.notifications().len();
    assert!(!session.compose("late", false));
    assert!(!session.dispatch(InputEvent::SelectAll));
    assert_eq!(session.notifications().len(), before);
    assert_eq!(session.adapter().stats().compositions_dropped, 1);
    assert_replays_clean(&session);
}

#[test]
fn blur_during_batch_edit_ends_suppression() {
    let mut session = focused_text_field("blur_batch");
    session.dispatch(InputEvent::BeginBatchEdit);
    session.compose("hi", false);
    session.dispatch(InputEvent::Blur);
    assert_eq!(session.observer().suppression_changes(), vec![true, false]);

    session.click(TextInputType::Text);
    let state = session.text_state().expect("editable field");
    assert!(!state.is_ignoring_updates());
    session.compose("ok", true);
    assert_eq!(
        session.observer().last_text_update().map(|u| u.text),
        Some("ok".to_owned())
    );
    assert_replays_clean(&session);
}

#[test]
fn go_during_batch_edit_delivers_reset() {
    let mut session = focused_text_field("go_batch");
    session.compose("hello", false);
    session.dispatch(InputEvent::BeginBatchEdit);
    assert!(session.dispatch(InputEvent::EditorAction {
        action: EditorAction::Go,
    }));

    assert_eq!(
        session.observer().last_text_update(),
        Some(TextStateUpdate::default())
    );
    assert_eq!(session.observer().suppression_changes(), vec![true, false]);
    assert!(session.text_state().is_none());
    assert!(!session.is_keyboard_shown());
    assert_replays_clean(&session);
}

#[test]
fn single_line_field_flattens_line_breaks() {
    let mut session = focused_text_field("single_line");
    session.set_clipboard_text("one\ntwo\tthree");
    session.dispatch(InputEvent::Paste);
    assert_field(&session, "one two three", (13, 13), None);

    let mut area = ImeSession::new("text_area");
    area.click(TextInputType::TextArea);
    area.set_clipboard_text("one\ntwo");
    area.dispatch(InputEvent::Paste);
    assert_eq!(area.text_state().map(TextEditState::text), Some("one\ntwo"));
}
