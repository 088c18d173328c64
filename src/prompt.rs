// Modal text prompt used instead of the inline overlay on touch platforms.

use std::cell::RefCell;
use std::collections::VecDeque;

pub const CHANGE_VALUE_TITLE: &str = "Change value:";

/// Callback receiving the prompt answer, `None` when the user cancelled.
pub type PromptCallback = Box<dyn FnOnce(Option<String>)>;

pub trait Prompt {
    /// Ask for a value. The callback may run before or after this returns.
    fn prompt(&self, title: &str, default_value: &str, callback: PromptCallback);
}

/// Prompt answering from a queue of scripted responses. An empty queue
/// answers with the default value.
#[derive(Default)]
pub struct CannedPrompt {
    answers: RefCell<VecDeque<Option<String>>>,
    asked: RefCell<Vec<(String, String)>>,
}

impl CannedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_answer(&self, answer: Option<&str>) {
        self.answers
            .borrow_mut()
            .push_back(answer.map(str::to_string));
    }

    /// (title, default) pairs of every prompt shown so far.
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.borrow().clone()
    }
}

impl Prompt for CannedPrompt {
    fn prompt(&self, title: &str, default_value: &str, callback: PromptCallback) {
        self.asked
            .borrow_mut()
            .push((title.to_string(), default_value.to_string()));
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Some(default_value.to_string()));
        callback(answer);
    }
}
