// Multi-line editable text field.
//
// The field renders its text as one SVG line per `\n`-separated line. While
// it is being edited, an `EditorInput` in the workspace's overlay sits on top
// of the text; every keystroke is mirrored into the field so the block
// re-renders live, and closing the overlay commits or reverts the edit.
//
//   Closed -> Opening -> Editing -> Closing -> Closed
//
// Opening builds the input, validates and sizes it once and binds handlers.
// Each keystroke runs `on_editor_input` and stays in Editing. Closing is
// reached through the overlay's dispose callback, fired by Escape, by another
// field taking the overlay, or by the host hiding it. Escape restores the
// value the editor opened with; any other close commits through the validator.

use crate::block::{Rect, SourceBlock};
use crate::config::DEFAULT_FONT_SIZE;
use crate::draw_context::DrawContext;
use crate::events::FieldChange;
use crate::field::{Field, FieldSize, Validator};
use crate::overlay::{
    BindingId, DisposeCallback, EditorInput, INVALID_INPUT_CLASS, KeyEvent, KeyEventKind,
    OwnerId,
};
use crate::render::{
    FIELD_BACKGROUND, RenderedText, TEXT_COLOR, draw_focus_frame, mirror_rtl, strip_rtl_mark,
};
use crate::workspace::{ListenerId, Workspace};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Mouse cursor shown over the field.
pub const CURSOR: &str = "text";

/// Font index handed to the drawing backend (Helvetica).
const FONT: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Opening,
    Editing,
    Closing,
}

struct EventBindings {
    key_up: BindingId,
    key_press: BindingId,
    workspace_change: ListenerId,
}

/// Handles owned by an open editor.
struct EditSession {
    input: Rc<EditorInput>,
    workspace: Rc<Workspace>,
    bindings: Option<EventBindings>,
    /// Set by Escape: the close restores the original value unvalidated.
    cancelled: bool,
}

pub struct FieldTextArea {
    id: OwnerId,
    name: String,
    text: RefCell<String>,
    rendered: RefCell<RenderedText>,
    size: Cell<FieldSize>,
    visible: Cell<bool>,
    spellcheck: Cell<bool>,
    validator: RefCell<Option<Validator>>,
    on_finish_editing: RefCell<Option<Rc<dyn Fn(&str)>>>,
    source_block: RefCell<Option<Weak<dyn SourceBlock>>>,
    session: RefCell<Option<EditSession>>,
    state: Cell<EditorState>,
    this: Weak<FieldTextArea>,
}

impl FieldTextArea {
    pub fn new(name: &str, text: &str, validator: Option<Validator>) -> Rc<Self> {
        let field = Rc::new_cyclic(|this| FieldTextArea {
            id: OwnerId::next(),
            name: name.to_string(),
            text: RefCell::new(String::new()),
            rendered: RefCell::new(RenderedText::layout("")),
            size: Cell::new(FieldSize::default()),
            visible: Cell::new(true),
            spellcheck: Cell::new(true),
            validator: RefCell::new(validator),
            on_finish_editing: RefCell::new(None),
            source_block: RefCell::new(None),
            session: RefCell::new(None),
            state: Cell::new(EditorState::Closed),
            this: this.clone(),
        });
        field.set_text(Some(text));
        field
    }

    /// A new detached field with the same text, validator and spellcheck setting.
    pub fn clone_field(&self) -> Rc<Self> {
        let text = self.text();
        let clone = FieldTextArea::new(
            &self.name,
            strip_rtl_mark(&text),
            self.validator.borrow().clone(),
        );
        clone.set_spellcheck(self.spellcheck.get());
        clone
    }

    pub fn owner_id(&self) -> OwnerId {
        self.id
    }

    pub fn set_validator(&self, validator: Option<Validator>) {
        *self.validator.borrow_mut() = validator;
    }

    /// Called with the committed text whenever a close validates.
    pub fn set_on_finish_editing(&self, f: impl Fn(&str) + 'static) {
        *self.on_finish_editing.borrow_mut() = Some(Rc::new(f));
    }

    pub fn set_spellcheck(&self, check: bool) {
        self.spellcheck.set(check);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
        self.invalidate_width();
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn editor_state(&self) -> EditorState {
        self.state.get()
    }

    pub fn is_editor_open(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// The overlay input of the open editor.
    pub fn editor_input(&self) -> Option<Rc<EditorInput>> {
        self.session.borrow().as_ref().map(|s| s.input.clone())
    }

    pub fn rendered_text(&self) -> RenderedText {
        self.rendered.borrow().clone()
    }

    /// Width cached by the last measurement; 0 when stale.
    pub fn cached_width(&self) -> f64 {
        self.size.get().width
    }

    /// Point size of the text at zoom 1.0.
    pub fn font_size(&self) -> f64 {
        self.workspace()
            .map(|ws| ws.config().font_size)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Measure and paint the field with its top-left corner at (`x`, `y`).
    pub fn render(&self, ctx: &mut dyn DrawContext, x: i32, y: i32) {
        let rendered = self.rendered.borrow();
        if !self.visible.get() {
            self.size.set(FieldSize::new(0.0, rendered.height()));
            return;
        }
        let font_size = self.font_size().round() as u8;
        let width = rendered.measured_width(ctx, FONT, font_size);
        let height = rendered.height();
        self.size.set(FieldSize::new(width, height));

        let (w, h) = (width.round() as i32, height.round() as i32);
        ctx.set_color(FIELD_BACKGROUND);
        ctx.draw_rect_filled(x, y, w, h);
        if ctx.has_focus() {
            draw_focus_frame(ctx, x, y, w, h);
        }
        ctx.set_color(TEXT_COLOR);
        rendered.draw(ctx, x, y, FONT, font_size);
    }

    /// The field's text as an SVG `<text>` element.
    pub fn svg_markup(&self) -> String {
        let size = self.size();
        self.rendered.borrow().to_svg(size)
    }

    /// Ask for a new value through the workspace's modal prompt.
    pub fn show_prompt_editor(&self) {
        let Some(ws) = self.workspace() else {
            log::warn!("prompt editor requested for detached field {}", self.name);
            return;
        };
        let Some(prompt) = ws.prompt() else {
            log::warn!("no prompt installed, editing {} inline", self.name);
            self.show_inline_editor(false);
            return;
        };

        let this = self.this.clone();
        let text = self.text();
        let title = ws.config().prompt_title.clone();
        prompt.prompt(
            &title,
            strip_rtl_mark(&text),
            Box::new(move |answer| {
                let Some(field) = this.upgrade() else {
                    return;
                };
                let answer = match answer {
                    Some(value) if field.source_block().is_some() => field.call_validator(&value),
                    other => other,
                };
                field.set_value(answer.as_deref());
            }),
        );
    }

    /// Open the overlay editor on top of the field.
    /// A `quiet` editor is neither focused nor selected.
    pub fn show_inline_editor(&self, quiet: bool) {
        let Some(block) = self.source_block() else {
            log::warn!("inline editor requested for detached field {}", self.name);
            return;
        };
        let ws = block.workspace();
        let div = ws.widget_div().clone();

        div.show(self.id, block.is_rtl(), self.widget_dispose());
        self.state.set(EditorState::Opening);

        let input = Rc::new(EditorInput::new());
        let font_size = self.font_size() * ws.scale();
        div.set_font_size(font_size);
        input.set_font_size(font_size);
        input.set_spellcheck(self.spellcheck.get());
        div.attach_input(input.clone());

        let text = self.text();
        let text = strip_rtl_mark(&text);
        input.set_value(text);
        input.set_default_value(text);
        input.set_last_observed(None);

        *self.session.borrow_mut() = Some(EditSession {
            input: input.clone(),
            workspace: ws.clone(),
            bindings: None,
            cancelled: false,
        });

        self.validate();
        self.resize_editor();
        if !quiet {
            input.focus();
            input.select();
        }

        let bindings = self.bind_events(&input, &ws);
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.bindings = Some(bindings);
        }
        self.state.set(EditorState::Editing);
        log::debug!("editor opened for field {} of block {}", self.name, block.id());
    }

    fn bind_events(&self, input: &EditorInput, ws: &Workspace) -> EventBindings {
        // Key up catches the final value, key press repeats while a key is held.
        let on_key = |this: Weak<FieldTextArea>| {
            move |event: &KeyEvent| {
                if let Some(field) = this.upgrade() {
                    field.on_editor_input(event);
                }
            }
        };
        let key_up = input.bind(KeyEventKind::KeyUp, on_key(self.this.clone()));
        let key_press = input.bind(KeyEventKind::KeyPress, on_key(self.this.clone()));

        let this = self.this.clone();
        let workspace_change = ws.add_change_listener(move |_| {
            if let Some(field) = this.upgrade() {
                field.resize_editor();
            }
        });

        EventBindings {
            key_up,
            key_press,
            workspace_change,
        }
    }

    fn unbind_events(&self, input: &EditorInput, bindings: EventBindings, ws: &Workspace) {
        input.unbind(bindings.key_up);
        input.unbind(bindings.key_press);
        ws.remove_change_listener(bindings.workspace_change);
    }

    /// Keystroke handler of the open editor.
    pub fn on_editor_input(&self, event: &KeyEvent) {
        let Some(input) = self.editor_input() else {
            return;
        };
        let Some(ws) = self.session_workspace() else {
            return;
        };

        if event.is_escape() {
            let original = input.default_value();
            input.set_value(&original);
            if let Some(session) = self.session.borrow_mut().as_mut() {
                session.cancelled = true;
            }
            self.set_text(Some(&original));
            log::debug!("edit of field {} cancelled", self.name);
            ws.widget_div().hide();
        } else {
            let text = input.value();
            if input.last_observed().as_deref() != Some(text.as_str()) {
                input.set_last_observed(Some(text.clone()));
                self.set_text(Some(&text));
                self.validate();
            } else if ws.user_agent().webkit {
                // Caret moved without an edit; WebKit only repaints the
                // caret when the block renders.
                if let Some(block) = self.source_block() {
                    block.render();
                }
            }
            self.resize_editor();
        }
        ws.resize_svg();
    }

    /// Mark the overlay invalid when the validator rejects its content.
    pub fn validate(&self) {
        let Some(input) = self.editor_input() else {
            return;
        };
        let valid = self.source_block().is_none() || self.call_validator(&input.value()).is_some();
        if valid {
            input.remove_class(INVALID_INPUT_CLASS);
        } else {
            input.add_class(INVALID_INPUT_CLASS);
        }
    }

    /// Fit the overlay to the field's current on-screen box.
    pub fn resize_editor(&self) {
        let Some(ws) = self.session_workspace() else {
            return;
        };
        let Some(block) = self.source_block() else {
            return;
        };
        let div = ws.widget_div();
        let bbox = self.scaled_bbox(block.as_ref(), &ws);
        div.set_size(bbox.width, bbox.height);

        // In RTL the left edge moves while the right edge stays put.
        let mut x = if div.is_rtl() {
            bbox.right() - div.offset_width()
        } else {
            bbox.left
        };
        let mut y = bbox.top + 1.0;

        let ua = ws.user_agent();
        if ua.gecko && div.has_top() {
            // Gecko reports the border one pixel off once the overlay has moved.
            x -= 1.0;
            y -= 1.0;
        }
        if ua.webkit {
            y -= 3.0;
        }
        div.set_position(x, y);
        log::trace!(
            "editor for {} at ({x}, {y}) size {}x{}",
            self.name,
            bbox.width,
            bbox.height
        );
    }

    /// Closure run by the overlay when it is torn down.
    fn widget_dispose(&self) -> DisposeCallback {
        let this = self.this.clone();
        Box::new(move || {
            if let Some(field) = this.upgrade() {
                field.close_editor();
            }
        })
    }

    fn close_editor(&self) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        self.state.set(EditorState::Closing);

        let text = if session.cancelled {
            session.input.default_value()
        } else {
            self.resolve_edit(&session.input)
        };
        self.set_text(Some(&text));
        if let Some(block) = self.source_block() {
            if block.is_rendered() {
                block.render();
            }
        }

        let ws = session.workspace;
        if let Some(bindings) = session.bindings {
            self.unbind_events(&session.input, bindings, &ws);
        }
        ws.events().set_group(None);
        ws.widget_div().reset_style();

        self.state.set(EditorState::Closed);
        log::debug!("editor closed for field {}", self.name);
    }

    /// The value to commit: the validated overlay value, or the value the
    /// editor opened with when the validator rejects it.
    fn resolve_edit(&self, input: &EditorInput) -> String {
        let text = input.value();
        if self.source_block().is_none() {
            return text;
        }
        match self.call_validator(&text) {
            None => {
                log::debug!("rejected edit of {} reverted", self.name);
                input.default_value()
            }
            Some(validated) => {
                let on_finish = self.on_finish_editing.borrow().clone();
                if let Some(on_finish) = on_finish {
                    on_finish(&validated);
                }
                validated
            }
        }
    }

    fn scaled_bbox(&self, block: &dyn SourceBlock, ws: &Workspace) -> Rect {
        let origin = block.field_screen_origin(&self.name);
        let size = self.size();
        let scale = ws.scale();
        Rect {
            left: origin.x,
            top: origin.y,
            width: size.width * scale,
            height: size.height * scale,
        }
    }

    fn call_validator(&self, text: &str) -> Option<String> {
        let validator = self.validator.borrow().clone();
        match validator {
            Some(validator) => validator(text).resolve(text),
            None => Some(text.to_string()),
        }
    }

    /// The block hosting this field, if it is attached and still alive.
    pub fn source_block(&self) -> Option<Rc<dyn SourceBlock>> {
        self.source_block.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn workspace(&self) -> Option<Rc<Workspace>> {
        self.source_block().map(|block| block.workspace())
    }

    fn session_workspace(&self) -> Option<Rc<Workspace>> {
        self.session.borrow().as_ref().map(|s| s.workspace.clone())
    }

    fn is_rtl(&self) -> bool {
        self.source_block().is_some_and(|block| block.is_rtl())
    }

    fn invalidate_width(&self) {
        let mut size = self.size.get();
        size.width = 0.0;
        self.size.set(size);
    }
}

impl Field for FieldTextArea {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn set_source_block(&self, block: Weak<dyn SourceBlock>) {
        *self.source_block.borrow_mut() = Some(block);

        // Text set before attaching was laid out without knowing the direction.
        if self.is_rtl() {
            let mirrored = mirror_rtl(&self.text.borrow());
            *self.rendered.borrow_mut() = RenderedText::layout(&mirrored);
            *self.text.borrow_mut() = mirrored;
            self.invalidate_width();
        }
    }

    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn set_text(&self, text: Option<&str>) {
        let Some(text) = text else {
            return;
        };
        let new_text = if self.is_rtl() {
            mirror_rtl(text)
        } else {
            text.to_string()
        };

        let old_text = {
            let mut current = self.text.borrow_mut();
            if *current == new_text {
                return;
            }
            std::mem::replace(&mut *current, new_text.clone())
        };

        *self.rendered.borrow_mut() = RenderedText::layout(&new_text);
        self.invalidate_width();

        if let Some(block) = self.source_block() {
            let ws = block.workspace();
            let events = ws.events();
            if events.is_enabled() {
                events.fire(FieldChange::new(&block.id(), &self.name, &old_text, &new_text));
            }
        }
    }

    fn set_value(&self, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        // A rejected value is still displayed; validation only decides
        // what gets committed when an editor closes.
        let validated = if self.source_block().is_some() {
            self.call_validator(value)
        } else {
            None
        };
        self.set_text(Some(validated.as_deref().unwrap_or(value)));
    }

    fn size(&self) -> FieldSize {
        let rendered = self.rendered.borrow();
        let mut size = self.size.get();
        size.height = rendered.height();
        if !self.visible.get() {
            size.width = 0.0;
        } else if size.width == 0.0 {
            size.width = rendered.estimated_width(self.font_size());
            self.size.set(size);
        }
        size
    }

    fn show_editor(&self, quiet: bool) {
        let Some(ws) = self.workspace() else {
            log::warn!("editor requested for detached field {}", self.name);
            return;
        };
        if !quiet && ws.user_agent().needs_prompt_editor() {
            self.show_prompt_editor();
        } else {
            self.show_inline_editor(quiet);
        }
    }

    fn dispose(&self) {
        let ws = self.session_workspace().or_else(|| self.workspace());
        if let Some(ws) = ws {
            ws.widget_div().hide_if_owner(self.id);
        }
        *self.source_block.borrow_mut() = None;
    }
}
