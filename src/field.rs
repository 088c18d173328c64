// Base capability shared by every editable field that lives inside a block.

use crate::block::SourceBlock;
use std::rc::{Rc, Weak};

/// Non-breaking space used in place of empty text so a field never collapses.
pub const NBSP: &str = "\u{00A0}";

/// Right-to-left mark appended to text shown in an RTL layout.
pub const RTL_MARK: char = '\u{200F}';

/// Rendered size of a field in unscaled workspace units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldSize {
    pub width: f64,
    pub height: f64,
}

impl FieldSize {
    pub fn new(width: f64, height: f64) -> Self {
        FieldSize { width, height }
    }
}

/// Verdict returned by a field validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Keep the candidate as typed.
    Accept,
    /// Use this text instead of the candidate.
    Replace(String),
    /// The candidate is invalid. It is still displayed but never committed.
    Reject,
}

impl Validation {
    /// Resolve the verdict against the candidate it was computed for.
    /// Returns `None` when the candidate was rejected.
    pub fn resolve(self, candidate: &str) -> Option<String> {
        match self {
            Validation::Accept => Some(candidate.to_string()),
            Validation::Replace(text) => Some(text),
            Validation::Reject => None,
        }
    }
}

/// Caller-supplied function constraining or transforming candidate text.
pub type Validator = Rc<dyn Fn(&str) -> Validation>;

/// The polymorphic field interface a block talks to.
///
/// `None` passed to `set_text`/`set_value` is a no-op, mirroring a host that
/// hands over a missing value.
pub trait Field {
    fn name(&self) -> String;
    /// Attach the field to the block that owns it.
    fn set_source_block(&self, block: Weak<dyn SourceBlock>);
    fn text(&self) -> String;
    fn set_text(&self, text: Option<&str>);
    fn set_value(&self, value: Option<&str>);
    fn size(&self) -> FieldSize;
    fn show_editor(&self, quiet: bool);
    fn dispose(&self);
}
