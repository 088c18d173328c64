// Library exports for blocktext

pub mod block;
pub mod config;
pub mod draw_context;
pub mod error;
pub mod events;
pub mod field;
#[cfg(feature = "gui")]
pub mod fltk_overlay;
pub mod overlay;
pub mod platform;
pub mod prompt;
pub mod render;
pub mod textarea;
pub mod workspace;

pub use block::{Block, SourceBlock};
pub use field::{Field, Validation, Validator};
pub use textarea::{EditorState, FieldTextArea};
pub use workspace::Workspace;
