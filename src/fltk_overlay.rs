// FLTK backend: paints fields through fltk::draw and mirrors the overlay
// container onto a native MultilineInput.

use crate::draw_context::DrawContext;
use crate::overlay::{EditorInput, INVALID_INPUT_CLASS, Key, KeyEvent, KeyEventKind, WidgetDiv};
use crate::textarea::{CURSOR, FieldTextArea};
use crate::workspace::Workspace;
use crate::Field;
use fltk::{draw as fltk_draw, enums::*, prelude::*};
use std::cell::Cell;
use std::rc::Rc;

/// FLTK implementation of DrawContext. Coordinates are scaled about an
/// origin so fields follow the workspace zoom.
pub struct FltkDrawContext {
    has_focus: bool,
    origin: (i32, i32),
    scale: f64,
}

impl FltkDrawContext {
    pub fn new(has_focus: bool) -> Self {
        FltkDrawContext {
            has_focus,
            origin: (0, 0),
            scale: 1.0,
        }
    }

    pub fn with_transform(mut self, origin: (i32, i32), scale: f64) -> Self {
        self.origin = origin;
        self.scale = scale;
        self
    }

    fn map(&self, x: i32, y: i32) -> (i32, i32) {
        let (ox, oy) = self.origin;
        (
            ox + ((x - ox) as f64 * self.scale).round() as i32,
            oy + ((y - oy) as f64 * self.scale).round() as i32,
        )
    }

    fn apply_font(&self, font: u8, size: u8) {
        let size = (size as f64 * self.scale).round().max(1.0) as i32;
        fltk_draw::set_font(Font::by_index(font as usize), size);
    }
}

impl DrawContext for FltkDrawContext {
    fn set_color(&mut self, color: u32) {
        let r = ((color >> 24) & 0xFF) as u8;
        let g = ((color >> 16) & 0xFF) as u8;
        let b = ((color >> 8) & 0xFF) as u8;
        fltk_draw::set_draw_color(Color::from_rgb(r, g, b));
    }

    fn set_font(&mut self, font: u8, size: u8) {
        self.apply_font(font, size);
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        let (x, y) = self.map(x, y);
        fltk_draw::draw_text2(text, x, y, 0, 0, Align::Left);
    }

    fn draw_rect_filled(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let (x, y) = self.map(x, y);
        let w = (w as f64 * self.scale).round() as i32;
        let h = (h as f64 * self.scale).round() as i32;
        fltk_draw::draw_rectf(x, y, w, h);
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        fltk_draw::draw_line(x1, y1, x2, y2);
    }

    // Measurements are reported in unscaled units.
    fn text_width(&mut self, text: &str, font: u8, size: u8) -> f64 {
        self.apply_font(font, size);
        fltk_draw::width(text) as f64 / self.scale
    }

    fn text_height(&self, font: u8, size: u8) -> i32 {
        self.apply_font(font, size);
        (fltk_draw::height() as f64 / self.scale).round() as i32
    }

    fn has_focus(&self) -> bool {
        self.has_focus
    }
}

fn map_key(key: fltk::enums::Key) -> Key {
    match key {
        fltk::enums::Key::Escape => Key::Escape,
        fltk::enums::Key::Enter | fltk::enums::Key::KPEnter => Key::Enter,
        fltk::enums::Key::Tab => Key::Tab,
        fltk::enums::Key::Left => Key::Left,
        fltk::enums::Key::Right => Key::Right,
        fltk::enums::Key::Up => Key::Up,
        fltk::enums::Key::Down => Key::Down,
        other => match fltk::app::event_text().chars().next() {
            Some(c) if !c.is_control() => Key::Char(c),
            _ => Key::Other(other.bits() as u32),
        },
    }
}

/// Native input shown while a field is being edited. Follows the position,
/// size, font and visibility of a workspace's `WidgetDiv`.
#[derive(Clone)]
pub struct FltkOverlay {
    input: fltk::input::MultilineInput,
    div: Rc<WidgetDiv>,
    // Address of the EditorInput last copied into the widget.
    loaded: Rc<Cell<usize>>,
}

impl FltkOverlay {
    /// Create the overlay inside the currently open group.
    pub fn new(div: Rc<WidgetDiv>) -> Self {
        let mut input = fltk::input::MultilineInput::new(0, 0, 10, 10, None);
        input.set_frame(FrameType::BorderBox);
        input.set_text_font(Font::Helvetica);
        input.hide();
        // The callback runs once the widget has applied an edit, including
        // each repeat while a key is held.
        input.set_trigger(CallbackTrigger::Changed);

        let overlay = FltkOverlay {
            input: input.clone(),
            div,
            loaded: Rc::new(Cell::new(0)),
        };

        input.set_callback({
            let mut overlay = overlay.clone();
            move |w| {
                let key = map_key(fltk::app::event_key());
                overlay.forward(w, KeyEventKind::KeyPress, key);
                overlay.sync();
            }
        });

        input.handle({
            let mut overlay = overlay.clone();
            move |w, event| {
                let handled = match event {
                    Event::KeyDown if fltk::app::event_key() == fltk::enums::Key::Escape => {
                        overlay.forward(w, KeyEventKind::KeyPress, Key::Escape);
                        true
                    }
                    Event::KeyUp => {
                        let key = map_key(fltk::app::event_key());
                        overlay.forward(w, KeyEventKind::KeyUp, key);
                        false
                    }
                    Event::Unfocus => {
                        overlay.div.hide();
                        false
                    }
                    _ => false,
                };
                overlay.sync();
                handled
            }
        });

        overlay
    }

    fn forward(&self, w: &fltk::input::MultilineInput, kind: KeyEventKind, key: Key) {
        let Some(input) = self.div.input() else {
            return;
        };
        input.set_value(&w.value());
        log::trace!("forwarding {:?} {:?} to overlay input", kind, key);
        input.dispatch(&KeyEvent { kind, key });
    }

    /// Copy the container state onto the native widget.
    pub fn sync(&mut self) {
        let Some(input) = self.div.input().filter(|_| self.div.is_visible()) else {
            self.loaded.set(0);
            if self.input.visible() {
                self.input.hide();
            }
            return;
        };

        let style = self.div.style();
        let (x, y) = (style.left.unwrap_or(0.0), style.top.unwrap_or(0.0));
        let (w, h) = (style.width.unwrap_or(0.0), style.height.unwrap_or(0.0));
        self.input
            .resize(x.round() as i32, y.round() as i32, w.ceil() as i32, h.ceil() as i32);
        if let Some(points) = style.font_size {
            self.input.set_text_size(points.round() as i32);
        }
        self.input.set_text_color(if input.has_class(INVALID_INPUT_CLASS) {
            Color::from_rgb(0xcc, 0x00, 0x00)
        } else {
            Color::Black
        });

        let key = Rc::as_ptr(&input) as usize;
        if self.loaded.get() != key {
            self.loaded.set(key);
            self.load(&input);
        }
        if let Some(mut parent) = self.input.parent() {
            parent.redraw();
        }
    }

    fn load(&mut self, input: &EditorInput) {
        let value = input.value();
        self.input.set_value(&value);
        self.input.show();
        if input.is_focused() {
            self.input.take_focus().ok();
        }
        if input.is_selected() {
            self.input.set_position(0).ok();
            self.input.set_mark(value.len() as i32).ok();
        }
    }
}

/// Frame that paints `field` at its on-screen origin, plus the overlay
/// input stacked above it. Clicking the frame opens the editor.
pub fn create_field_widget(
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    field: Rc<FieldTextArea>,
    workspace: Rc<Workspace>,
) -> (fltk::frame::Frame, FltkOverlay) {
    let mut frame = fltk::frame::Frame::new(x, y, w, h, None);
    let overlay = FltkOverlay::new(workspace.widget_div().clone());
    frame.set_frame(FrameType::FlatBox);
    frame.set_color(Color::White);

    frame.draw({
        let field = field.clone();
        move |f| {
            fltk_draw::set_draw_color(f.color());
            fltk_draw::draw_rectf(f.x(), f.y(), f.w(), f.h());

            let origin = block_origin(&field);
            let scale = workspace.scale();
            let origin = (f.x() + origin.0 as i32, f.y() + origin.1 as i32);
            let mut ctx = FltkDrawContext::new(field.is_editor_open()).with_transform(origin, scale);
            field.render(&mut ctx, origin.0, origin.1);
        }
    });

    frame.handle({
        let mut overlay = overlay.clone();
        move |f, event| match event {
            Event::Push => {
                field.show_editor(false);
                overlay.sync();
                f.redraw();
                true
            }
            Event::Enter => {
                fltk_draw::set_cursor(native_cursor(CURSOR));
                true
            }
            Event::Leave => {
                fltk_draw::set_cursor(Cursor::Default);
                true
            }
            _ => false,
        }
    });

    (frame, overlay)
}

fn native_cursor(name: &str) -> Cursor {
    match name {
        "text" => Cursor::Insert,
        "pointer" => Cursor::Hand,
        _ => Cursor::Default,
    }
}

fn block_origin(field: &FieldTextArea) -> (f64, f64) {
    match field.source_block() {
        Some(block) => {
            let p = block.field_screen_origin(&field.name());
            (p.x, p.y)
        }
        None => (0.0, 0.0),
    }
}
