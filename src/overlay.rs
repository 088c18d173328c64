// Overlay container and the input element shown inside it while a field is
// being edited.
//
// There is exactly one `WidgetDiv` per workspace. Whoever calls `show` owns it
// until `hide` runs that owner's dispose callback; showing for a new owner
// hides the previous one first, so at most one edit session is ever open.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// CSS class of the overlay input element.
pub const INPUT_CLASS: &str = "blocklyHtmlInput";
/// CSS class marking overlay content the validator rejects.
pub const INVALID_INPUT_CLASS: &str = "blocklyInvalidInput";

/// Identity of an overlay owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        OwnerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Runs once when the overlay is torn down.
pub type DisposeCallback = Box<dyn FnOnce()>;

/// Pixel geometry and font of the overlay container. `None` means automatic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayStyle {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Font size in points.
    pub font_size: Option<f64>,
}

pub struct WidgetDiv {
    owner: Cell<Option<OwnerId>>,
    rtl: Cell<bool>,
    dispose: RefCell<Option<DisposeCallback>>,
    style: RefCell<OverlayStyle>,
    content: RefCell<Option<Rc<EditorInput>>>,
}

impl WidgetDiv {
    pub fn new() -> Self {
        WidgetDiv {
            owner: Cell::new(None),
            rtl: Cell::new(false),
            dispose: RefCell::new(None),
            style: RefCell::new(OverlayStyle::default()),
            content: RefCell::new(None),
        }
    }

    /// Take the overlay for `owner`, closing whatever session held it.
    pub fn show(&self, owner: OwnerId, rtl: bool, dispose: DisposeCallback) {
        self.hide();
        self.owner.set(Some(owner));
        self.rtl.set(rtl);
        *self.dispose.borrow_mut() = Some(dispose);
        log::debug!("overlay shown for {:?} (rtl: {})", owner, rtl);
    }

    /// Close the overlay, running the owner's dispose callback.
    pub fn hide(&self) {
        let Some(owner) = self.owner.take() else {
            return;
        };
        let dispose = self.dispose.borrow_mut().take();
        if let Some(dispose) = dispose {
            dispose();
        }
        self.content.borrow_mut().take();
        log::debug!("overlay hidden for {:?}", owner);
    }

    pub fn hide_if_owner(&self, owner: OwnerId) {
        if self.owner.get() == Some(owner) {
            self.hide();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.owner.get().is_some()
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner.get()
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl.get()
    }

    pub fn attach_input(&self, input: Rc<EditorInput>) {
        *self.content.borrow_mut() = Some(input);
    }

    pub fn input(&self) -> Option<Rc<EditorInput>> {
        self.content.borrow().clone()
    }

    pub fn style(&self) -> OverlayStyle {
        self.style.borrow().clone()
    }

    pub fn set_size(&self, width: f64, height: f64) {
        let mut style = self.style.borrow_mut();
        style.width = Some(width);
        style.height = Some(height);
    }

    pub fn set_position(&self, left: f64, top: f64) {
        let mut style = self.style.borrow_mut();
        style.left = Some(left);
        style.top = Some(top);
    }

    pub fn set_font_size(&self, points: f64) {
        self.style.borrow_mut().font_size = Some(points);
    }

    /// Laid-out width of the container; 0 while automatic.
    pub fn offset_width(&self) -> f64 {
        self.style.borrow().width.unwrap_or(0.0)
    }

    /// Whether a vertical position has been applied since the last reset.
    pub fn has_top(&self) -> bool {
        self.style.borrow().top.is_some()
    }

    /// Drop the size and font overrides of the last session.
    pub fn reset_style(&self) {
        let mut style = self.style.borrow_mut();
        style.width = None;
        style.height = None;
        style.font_size = None;
    }
}

impl Default for WidgetDiv {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    KeyPress,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Char(char),
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub key: Key,
}

impl KeyEvent {
    pub fn key_up(key: Key) -> Self {
        KeyEvent {
            kind: KeyEventKind::KeyUp,
            key,
        }
    }

    pub fn key_press(key: Key) -> Self {
        KeyEvent {
            kind: KeyEventKind::KeyPress,
            key,
        }
    }

    pub fn is_escape(&self) -> bool {
        self.key == Key::Escape
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

type KeyHandler = Rc<dyn Fn(&KeyEvent)>;

/// The text input living inside the overlay for the length of one session.
pub struct EditorInput {
    value: RefCell<String>,
    default_value: RefCell<String>,
    last_observed: RefCell<Option<String>>,
    classes: RefCell<Vec<&'static str>>,
    focused: Cell<bool>,
    selected: Cell<bool>,
    spellcheck: Cell<bool>,
    font_size: Cell<f64>,
    bindings: RefCell<Vec<(BindingId, KeyEventKind, KeyHandler)>>,
    next_binding: Cell<u64>,
}

impl EditorInput {
    pub fn new() -> Self {
        EditorInput {
            value: RefCell::new(String::new()),
            default_value: RefCell::new(String::new()),
            last_observed: RefCell::new(None),
            classes: RefCell::new(vec![INPUT_CLASS]),
            focused: Cell::new(false),
            selected: Cell::new(false),
            spellcheck: Cell::new(true),
            font_size: Cell::new(0.0),
            bindings: RefCell::new(Vec::new()),
            next_binding: Cell::new(0),
        }
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
        self.selected.set(false);
    }

    /// Value the input was opened with; Escape and failed validation return to it.
    pub fn default_value(&self) -> String {
        self.default_value.borrow().clone()
    }

    pub fn set_default_value(&self, value: &str) {
        *self.default_value.borrow_mut() = value.to_string();
    }

    /// Value seen by the last keystroke handler; `None` before the first one.
    pub fn last_observed(&self) -> Option<String> {
        self.last_observed.borrow().clone()
    }

    pub fn set_last_observed(&self, value: Option<String>) {
        *self.last_observed.borrow_mut() = value;
    }

    pub fn add_class(&self, class: &'static str) {
        let mut classes = self.classes.borrow_mut();
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    pub fn remove_class(&self, class: &'static str) {
        self.classes.borrow_mut().retain(|c| *c != class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| *c == class)
    }

    pub fn focus(&self) {
        self.focused.set(true);
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    /// Select the whole value.
    pub fn select(&self) {
        self.selected.set(true);
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn set_spellcheck(&self, check: bool) {
        self.spellcheck.set(check);
    }

    pub fn spellcheck(&self) -> bool {
        self.spellcheck.get()
    }

    pub fn set_font_size(&self, size_pt: f64) {
        self.font_size.set(size_pt);
    }

    pub fn font_size(&self) -> f64 {
        self.font_size.get()
    }

    pub fn bind(&self, kind: KeyEventKind, handler: impl Fn(&KeyEvent) + 'static) -> BindingId {
        let id = BindingId(self.next_binding.get());
        self.next_binding.set(id.0 + 1);
        self.bindings.borrow_mut().push((id, kind, Rc::new(handler)));
        id
    }

    pub fn unbind(&self, id: BindingId) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        let before = bindings.len();
        bindings.retain(|(bid, _, _)| *bid != id);
        bindings.len() != before
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Deliver a key event to the handlers bound for its kind.
    pub fn dispatch(&self, event: &KeyEvent) {
        // Handlers may unbind themselves while running.
        let handlers: Vec<KeyHandler> = self
            .bindings
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }
}

impl Default for EditorInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_replaces_previous_owner() {
        let div = WidgetDiv::new();
        let closed = Rc::new(Cell::new(0));
        let (a, b) = (OwnerId::next(), OwnerId::next());

        let c = closed.clone();
        div.show(a, false, Box::new(move || c.set(c.get() + 1)));
        let c = closed.clone();
        div.show(b, true, Box::new(move || c.set(c.get() + 10)));

        assert_eq!(closed.get(), 1);
        assert_eq!(div.owner(), Some(b));
        assert!(div.is_rtl());

        div.hide_if_owner(a);
        assert!(div.is_visible());
        div.hide_if_owner(b);
        assert!(!div.is_visible());
        assert_eq!(closed.get(), 11);
    }

    #[test]
    fn test_hide_twice_disposes_once() {
        let div = WidgetDiv::new();
        let closed = Rc::new(Cell::new(0));
        let c = closed.clone();
        div.show(OwnerId::next(), false, Box::new(move || c.set(c.get() + 1)));
        div.hide();
        div.hide();
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_reset_style_keeps_position() {
        let div = WidgetDiv::new();
        div.set_size(100.0, 40.0);
        div.set_position(5.0, 6.0);
        div.set_font_size(11.0);
        assert_eq!(div.offset_width(), 100.0);
        div.reset_style();
        let style = div.style();
        assert_eq!(style.width, None);
        assert_eq!(style.font_size, None);
        assert_eq!(style.left, Some(5.0));
        assert!(div.has_top());
    }

    #[test]
    fn test_dispatch_by_kind() {
        let input = EditorInput::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let up = input.bind(KeyEventKind::KeyUp, move |_| h.set(h.get() + 1));

        input.dispatch(&KeyEvent::key_press(Key::Char('a')));
        assert_eq!(hits.get(), 0);
        input.dispatch(&KeyEvent::key_up(Key::Char('a')));
        assert_eq!(hits.get(), 1);

        assert!(input.unbind(up));
        input.dispatch(&KeyEvent::key_up(Key::Char('a')));
        assert_eq!(hits.get(), 1);
        assert_eq!(input.binding_count(), 0);
    }

    #[test]
    fn test_classes() {
        let input = EditorInput::new();
        assert!(input.has_class(INPUT_CLASS));
        input.add_class(INVALID_INPUT_CLASS);
        input.add_class(INVALID_INPUT_CLASS);
        assert!(input.has_class(INVALID_INPUT_CLASS));
        input.remove_class(INVALID_INPUT_CLASS);
        assert!(!input.has_class(INVALID_INPUT_CLASS));
    }
}
