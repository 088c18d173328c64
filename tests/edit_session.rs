// Edit lifecycle tests: open, type, commit/revert and teardown of the
// overlay editor, driven through simulated key events.

use blocktext::events::FieldChange;
use blocktext::overlay::{Key, KeyEvent, INVALID_INPUT_CLASS};
use blocktext::platform::UserAgent;
use blocktext::prompt::{CannedPrompt, CHANGE_VALUE_TITLE};
use blocktext::{
    Block, EditorState, Field, FieldTextArea, SourceBlock, Validation, Validator, Workspace,
};
use std::cell::RefCell;
use std::rc::Rc;

struct Fixture {
    ws: Rc<Workspace>,
    block: Rc<Block>,
    field: Rc<FieldTextArea>,
    events: Rc<RefCell<Vec<FieldChange>>>,
}

fn fixture(text: &str, rtl: bool, validator: Option<Validator>) -> Fixture {
    let ws = Rc::new(Workspace::default());
    let block = Block::new("block-1", ws.clone(), rtl);
    let field = FieldTextArea::new("TEXT", text, validator);
    block.append_field(field.clone());
    block.render();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    ws.events().subscribe(move |e| sink.borrow_mut().push(e.clone()));

    Fixture {
        ws,
        block,
        field,
        events,
    }
}

/// Replace the overlay content and release a key, as a user typing would.
fn type_text(field: &FieldTextArea, value: &str) {
    let input = field.editor_input().expect("editor should be open");
    input.set_value(value);
    input.dispatch(&KeyEvent::key_press(Key::Other(0)));
    input.dispatch(&KeyEvent::key_up(Key::Other(0)));
}

fn press_escape(field: &FieldTextArea) {
    let input = field.editor_input().expect("editor should be open");
    input.dispatch(&KeyEvent::key_up(Key::Escape));
}

fn uppercase() -> Validator {
    Rc::new(|s: &str| Validation::Replace(s.to_uppercase()))
}

fn reject_digits() -> Validator {
    Rc::new(|s: &str| {
        if s.chars().any(|c| c.is_ascii_digit()) {
            Validation::Reject
        } else {
            Validation::Accept
        }
    })
}

#[test]
fn test_single_line_reads_back() {
    for text in ["x", "hello world", "  padded  ", "ünïcödé"] {
        let f = fixture("", false, None);
        f.field.set_text(Some(text));
        let rendered = f.field.rendered_text();
        assert_eq!(rendered.line_count(), 1);
        assert_eq!(rendered.lines()[0].text, text);
    }
}

#[test]
fn test_line_count_follows_newlines() {
    let f = fixture("", false, None);
    for text in ["a\nb", "a\n\nb\n", "\n", "1\n2\n3\n4\n5"] {
        f.field.set_text(Some(text));
        let rendered = f.field.rendered_text();
        assert_eq!(rendered.line_count(), text.matches('\n').count() + 1);
        for (i, line) in rendered.lines().iter().enumerate() {
            assert_eq!(line.y, 2.0 + 20.0 * i as f64);
        }
    }
}

#[test]
fn test_set_text_fires_once() {
    let f = fixture("start", false, None);
    f.field.set_text(Some("next"));
    f.field.set_text(Some("next"));

    let events = f.events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_id, "block-1");
    assert_eq!(events[0].element, "field");
    assert_eq!(events[0].name, "TEXT");
    assert_eq!(events[0].old_value, "start");
    assert_eq!(events[0].new_value, "next");
}

#[test]
fn test_empty_to_empty_is_noop() {
    let f = fixture("", false, None);
    f.field.set_text(Some(""));
    assert!(f.events.borrow().is_empty());
    assert_eq!(f.field.text(), "");
}

#[test]
fn test_disabled_events_are_not_fired() {
    let f = fixture("a", false, None);
    f.ws.events().disable();
    f.field.set_text(Some("b"));
    f.ws.events().enable();
    assert!(f.events.borrow().is_empty());
    assert_eq!(f.field.text(), "b");
}

#[test]
fn test_rtl_text_is_mirrored() {
    let f = fixture("", true, None);
    f.field.set_text(Some("abc"));
    assert_eq!(f.field.text(), "abc\u{200F}");
    assert_eq!(f.field.rendered_text().lines()[0].text, "abc\u{200F}");

    f.field.set_text(Some("abc"));
    assert_eq!(f.events.borrow().len(), 1);
}

#[test]
fn test_typing_then_commit() {
    let f = fixture("hello", false, None);
    f.field.show_editor(false);
    type_text(&f.field, "hello\nworld");

    // The block follows every keystroke, before any commit.
    assert_eq!(f.field.text(), "hello\nworld");
    assert!(f.ws.layout_requests() > 0);

    f.ws.widget_div().hide();
    assert_eq!(f.field.text(), "hello\nworld");
    assert_eq!(f.field.rendered_text().line_count(), 2);
    assert_eq!(f.field.editor_state(), EditorState::Closed);
    assert!(!f.field.is_editor_open());
}

#[test]
fn test_commit_applies_validator_replacement() {
    let f = fixture("abc", false, Some(uppercase()));
    f.field.show_editor(false);
    type_text(&f.field, "shout");
    f.ws.widget_div().hide();
    assert_eq!(f.field.text(), "SHOUT");
}

#[test]
fn test_commit_of_rejected_text_reverts() {
    let f = fixture("abc", false, Some(reject_digits()));
    f.field.show_editor(false);
    type_text(&f.field, "abc123");

    // Rejected text is still shown while editing.
    assert_eq!(f.field.text(), "abc123");
    assert!(f.field.editor_input().unwrap().has_class(INVALID_INPUT_CLASS));

    f.ws.widget_div().hide();
    assert_eq!(f.field.text(), "abc");
    let last = f.events.borrow().last().cloned().unwrap();
    assert_eq!(last.old_value, "abc123");
    assert_eq!(last.new_value, "abc");
}

#[test]
fn test_held_key_tracks_text_live() {
    let f = fixture("hello", true, Some(reject_digits()));
    f.field.show_editor(false);
    let input = f.field.editor_input().unwrap();
    assert_eq!(input.value(), "hello");

    // Only key-press events, as a held key produces before its release.
    input.set_value("he1");
    input.dispatch(&KeyEvent::key_press(Key::Char('1')));
    assert_eq!(f.field.text(), "he1\u{200F}");
    assert!(input.has_class(INVALID_INPUT_CLASS));
    assert!(f.ws.layout_requests() > 0);

    f.ws.widget_div().hide();
    assert_eq!(f.field.text(), "hello\u{200F}");
}

#[test]
fn test_escape_reverts_and_closes() {
    let f = fixture("before", false, Some(uppercase()));
    f.field.show_editor(false);
    let input = f.field.editor_input().unwrap();
    type_text(&f.field, "after");
    assert_eq!(f.field.text(), "after");

    press_escape(&f.field);
    assert_eq!(input.value(), "before");
    // Cancelling skips the validator, which would have upper-cased it.
    assert_eq!(f.field.text(), "before");
    assert!(!f.ws.widget_div().is_visible());
    assert_eq!(f.field.editor_state(), EditorState::Closed);
}

#[test]
fn test_teardown_leaves_no_listeners() {
    let f = fixture("text", false, None);
    let listeners_before = f.ws.listener_count();
    f.field.show_editor(false);
    let input = f.field.editor_input().unwrap();
    assert_eq!(input.binding_count(), 2);
    assert_eq!(f.ws.listener_count(), listeners_before + 1);

    f.ws.widget_div().hide();
    assert_eq!(input.binding_count(), 0);
    assert_eq!(f.ws.listener_count(), listeners_before);

    // Events reaching the stale input or the workspace change nothing.
    let events_before = f.events.borrow().len();
    let layouts_before = f.ws.layout_requests();
    input.set_value("ghost");
    input.dispatch(&KeyEvent::key_up(Key::Char('t')));
    input.dispatch(&KeyEvent::key_press(Key::Char('t')));
    f.ws.set_scale(4.0);
    assert_eq!(f.field.text(), "text");
    assert_eq!(f.events.borrow().len(), events_before);
    assert_eq!(f.ws.layout_requests(), layouts_before);
    assert_eq!(f.ws.widget_div().style().width, None);
}

#[test]
fn test_repeated_sessions_do_not_accumulate_listeners() {
    let f = fixture("text", false, None);
    for i in 0..5 {
        f.field.show_editor(false);
        type_text(&f.field, &format!("text {i}"));
        f.ws.widget_div().hide();
    }
    assert_eq!(f.ws.listener_count(), 0);
    assert_eq!(f.field.text(), "text 4");
}

#[test]
fn test_opening_another_field_commits_the_first() {
    let f = fixture("one", false, None);
    let second = FieldTextArea::new("OTHER", "two", None);
    f.block.append_field(second.clone());

    f.field.show_editor(false);
    type_text(&f.field, "uno");
    second.show_editor(false);

    assert_eq!(f.field.text(), "uno");
    assert!(!f.field.is_editor_open());
    assert!(second.is_editor_open());
    assert_eq!(f.ws.widget_div().owner(), Some(second.owner_id()));
    assert_eq!(f.ws.listener_count(), 1);
}

#[test]
fn test_reopening_same_field_restarts_session() {
    let f = fixture("one", false, None);
    f.field.show_editor(false);
    type_text(&f.field, "two");
    f.field.show_editor(false);

    let input = f.field.editor_input().unwrap();
    assert_eq!(input.default_value(), "two");
    assert_eq!(input.binding_count(), 2);
    assert_eq!(f.ws.listener_count(), 1);
}

#[test]
fn test_block_dispose_closes_editor() {
    let f = fixture("one", false, None);
    f.field.show_editor(false);
    type_text(&f.field, "kept");

    f.block.dispose();
    assert!(!f.ws.widget_div().is_visible());
    assert_eq!(f.ws.listener_count(), 0);
    assert_eq!(f.field.text(), "kept");
    assert!(f.block.field("TEXT").is_none());
}

#[test]
fn test_unrelated_dispose_keeps_editor_open() {
    let f = fixture("one", false, None);
    let other = FieldTextArea::new("OTHER", "two", None);
    f.block.append_field(other.clone());
    f.field.show_editor(false);

    other.dispose();
    assert!(f.field.is_editor_open());
}

#[test]
fn test_commit_rerenders_block_and_clears_group() {
    let f = fixture("one", false, None);
    f.ws.events().set_group(Some("typing"));
    f.field.show_editor(false);
    type_text(&f.field, "two");

    let renders = f.block.render_count();
    f.ws.widget_div().hide();
    assert_eq!(f.block.render_count(), renders + 1);
    assert_eq!(f.ws.events().group(), None);
    assert_eq!(f.events.borrow()[0].group.as_deref(), Some("typing"));
}

#[test]
fn test_detached_field_has_no_editor() {
    let ws = Workspace::default();
    let field = FieldTextArea::new("TEXT", "alone", None);
    field.show_editor(false);
    assert!(!field.is_editor_open());
    assert!(!ws.widget_div().is_visible());
}

#[test]
fn test_touch_platform_uses_prompt() {
    let f = fixture("old", false, Some(uppercase()));
    f.ws.set_user_agent(UserAgent {
        mobile: true,
        ..Default::default()
    });
    let prompt = Rc::new(CannedPrompt::new());
    prompt.push_answer(Some("new"));
    f.ws.set_prompt(prompt.clone());

    f.field.show_editor(false);
    assert!(!f.ws.widget_div().is_visible());
    assert_eq!(f.field.text(), "NEW");
    assert_eq!(
        prompt.asked(),
        vec![(CHANGE_VALUE_TITLE.to_string(), "old".to_string())]
    );
}

#[test]
fn test_cancelled_prompt_changes_nothing() {
    let f = fixture("old", false, None);
    f.ws.set_user_agent(UserAgent {
        ipad: true,
        ..Default::default()
    });
    let prompt = Rc::new(CannedPrompt::new());
    prompt.push_answer(None);
    f.ws.set_prompt(prompt);

    f.field.show_editor(false);
    assert_eq!(f.field.text(), "old");
    assert!(f.events.borrow().is_empty());
}

#[test]
fn test_quiet_open_on_touch_platform_stays_inline() {
    let f = fixture("old", false, None);
    f.ws.set_user_agent(UserAgent {
        android: true,
        ..Default::default()
    });
    f.field.show_editor(true);
    assert!(f.field.is_editor_open());
    assert!(!f.field.editor_input().unwrap().is_focused());
}
