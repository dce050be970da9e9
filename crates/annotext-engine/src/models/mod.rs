pub mod mark;
pub mod node;
pub mod thread;

pub use mark::{CommentAttrs, Mark, MarkKind, MarkSet};
pub use node::{Element, Node, NodeKind, TextRun};
pub use thread::Thread;
