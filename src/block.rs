// Host block model: the owner of fields.

use crate::field::Field;
use crate::workspace::Workspace;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Horizontal inset of a field inside its block.
pub const FIELD_INSET_X: f64 = 8.0;
/// Vertical inset of the first field inside its block.
pub const FIELD_INSET_Y: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned box in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// What a field needs from the block it belongs to.
pub trait SourceBlock {
    fn id(&self) -> String;
    fn is_rtl(&self) -> bool;
    fn is_rendered(&self) -> bool;
    /// Re-render the block, picking up the current size of its fields.
    fn render(&self);
    fn workspace(&self) -> Rc<Workspace>;
    /// Top-left corner of the named field in screen pixels.
    fn field_screen_origin(&self, field_name: &str) -> Point;
}

/// A block laying out its fields in a single column.
pub struct Block {
    id: String,
    rtl: bool,
    workspace: Rc<Workspace>,
    position: Cell<Point>,
    rendered: Cell<bool>,
    render_count: Cell<u32>,
    fields: RefCell<Vec<Rc<dyn Field>>>,
}

impl Block {
    pub fn new(id: &str, workspace: Rc<Workspace>, rtl: bool) -> Rc<Self> {
        Rc::new(Block {
            id: id.to_string(),
            rtl,
            workspace,
            position: Cell::new(Point::default()),
            rendered: Cell::new(false),
            render_count: Cell::new(0),
            fields: RefCell::new(Vec::new()),
        })
    }

    /// Attach a field; it starts validating and firing change events.
    pub fn append_field(self: &Rc<Self>, field: Rc<dyn Field>) {
        let owner: Rc<dyn SourceBlock> = self.clone();
        let owner: Weak<dyn SourceBlock> = Rc::downgrade(&owner);
        field.set_source_block(owner);
        self.fields.borrow_mut().push(field);
    }

    pub fn field(&self, name: &str) -> Option<Rc<dyn Field>> {
        self.fields
            .borrow()
            .iter()
            .find(|f| f.name() == name)
            .cloned()
    }

    /// Position of the block in workspace units.
    pub fn position(&self) -> Point {
        self.position.get()
    }

    pub fn move_to(&self, position: Point) {
        self.position.set(position);
    }

    pub fn render_count(&self) -> u32 {
        self.render_count.get()
    }

    /// Dispose every field (closing an open editor) and detach them.
    pub fn dispose(&self) {
        let fields: Vec<Rc<dyn Field>> = self.fields.borrow_mut().drain(..).collect();
        for field in fields {
            field.dispose();
        }
        self.rendered.set(false);
        log::debug!("block {} disposed", self.id);
    }
}

impl SourceBlock for Block {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_rtl(&self) -> bool {
        self.rtl
    }

    fn is_rendered(&self) -> bool {
        self.rendered.get()
    }

    fn render(&self) {
        self.rendered.set(true);
        self.render_count.set(self.render_count.get() + 1);
    }

    fn workspace(&self) -> Rc<Workspace> {
        self.workspace.clone()
    }

    fn field_screen_origin(&self, field_name: &str) -> Point {
        let mut offset_y = FIELD_INSET_Y;
        for field in self.fields.borrow().iter() {
            if field.name() == field_name {
                break;
            }
            offset_y += field.size().height;
        }

        let scale = self.workspace.scale();
        let (scroll_x, scroll_y) = self.workspace.scroll();
        let position = self.position.get();
        Point::new(
            (position.x + FIELD_INSET_X) * scale + scroll_x,
            (position.y + offset_y) * scale + scroll_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_right_edge() {
        let r = Rect {
            left: 10.0,
            top: 20.0,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(r.right(), 40.0);
    }

    #[test]
    fn test_render_marks_rendered() {
        let block = Block::new("b1", Rc::new(Workspace::default()), false);
        assert!(!block.is_rendered());
        block.render();
        assert!(block.is_rendered());
        assert_eq!(block.render_count(), 1);
    }

    #[test]
    fn test_field_origin_follows_scale_and_scroll() {
        let ws = Rc::new(Workspace::default());
        let block = Block::new("b1", ws.clone(), false);
        block.move_to(Point::new(100.0, 50.0));
        assert_eq!(
            block.field_screen_origin("TEXT"),
            Point::new(108.0, 55.0)
        );
        ws.set_scale(2.0);
        ws.scroll_to(-10.0, 4.0);
        assert_eq!(
            block.field_screen_origin("TEXT"),
            Point::new(206.0, 114.0)
        );
    }
}
