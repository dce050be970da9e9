//! Shared builders for unit tests

use crate::models::{Mark, MarkSet, Node};

pub(crate) fn marks(list: &[Mark]) -> MarkSet {
    list.iter().cloned().collect()
}

/// Text run carrying a single comment mark
pub(crate) fn commented(text: &str, id: &str, note: &str) -> Node {
    Node::text(text, marks(&[Mark::comment(id, note)]))
}

pub(crate) fn paragraph(text: &str) -> Node {
    Node::paragraph(vec![Node::plain(text)])
}
