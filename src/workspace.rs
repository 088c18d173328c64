// The view that owns blocks: zoom, scrolling, change notifications and the
// services fields use while editing.

use crate::config::FieldConfig;
use crate::events::EventBus;
use crate::overlay::WidgetDiv;
use crate::platform::UserAgent;
use crate::prompt::Prompt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A change of the view geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkspaceChange {
    Scale(f64),
    Scroll { x: f64, y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeListener = Rc<dyn Fn(&WorkspaceChange)>;

pub struct Workspace {
    scale: Cell<f64>,
    scroll: Cell<(f64, f64)>,
    listeners: RefCell<Vec<(ListenerId, ChangeListener)>>,
    next_listener: Cell<u64>,
    layout_requests: Cell<u64>,
    layout_hook: RefCell<Option<Rc<dyn Fn()>>>,
    events: Rc<EventBus>,
    widget_div: Rc<WidgetDiv>,
    prompt: RefCell<Option<Rc<dyn Prompt>>>,
    user_agent: Cell<UserAgent>,
    config: FieldConfig,
}

impl Workspace {
    pub fn new(config: FieldConfig) -> Self {
        Workspace {
            scale: Cell::new(1.0),
            scroll: Cell::new((0.0, 0.0)),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            layout_requests: Cell::new(0),
            layout_hook: RefCell::new(None),
            events: Rc::new(EventBus::new()),
            widget_div: Rc::new(WidgetDiv::new()),
            prompt: RefCell::new(None),
            user_agent: Cell::new(config.user_agent()),
            config,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn set_scale(&self, scale: f64) {
        if scale == self.scale.get() {
            return;
        }
        self.scale.set(scale);
        self.fire_change(&WorkspaceChange::Scale(scale));
    }

    /// Scroll offset in screen pixels.
    pub fn scroll(&self) -> (f64, f64) {
        self.scroll.get()
    }

    pub fn scroll_to(&self, x: f64, y: f64) {
        self.scroll.set((x, y));
        self.fire_change(&WorkspaceChange::Scroll { x, y });
    }

    pub fn add_change_listener(&self, f: impl Fn(&WorkspaceChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn fire_change(&self, change: &WorkspaceChange) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for f in listeners {
            f(change);
        }
    }

    /// Ask the host to re-layout the view after block content changed size.
    pub fn resize_svg(&self) {
        self.layout_requests.set(self.layout_requests.get() + 1);
        let hook = self.layout_hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn layout_requests(&self) -> u64 {
        self.layout_requests.get()
    }

    pub fn set_layout_hook(&self, hook: impl Fn() + 'static) {
        *self.layout_hook.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn events(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn widget_div(&self) -> &Rc<WidgetDiv> {
        &self.widget_div
    }

    pub fn set_prompt(&self, prompt: Rc<dyn Prompt>) {
        *self.prompt.borrow_mut() = Some(prompt);
    }

    pub fn prompt(&self) -> Option<Rc<dyn Prompt>> {
        self.prompt.borrow().clone()
    }

    pub fn user_agent(&self) -> UserAgent {
        self.user_agent.get()
    }

    pub fn set_user_agent(&self, user_agent: UserAgent) {
        self.user_agent.set(user_agent);
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}
