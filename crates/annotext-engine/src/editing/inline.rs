//! Operations on the inline content of a single textblock.
//!
//! Offsets are local to the textblock: offset 0 is the start of its content.

use std::ops::Range;

use crate::models::{Mark, MarkKind, MarkSet, Node, TextRun};

/// Byte index of the `chars`-th character in `text`
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Make sure a node boundary exists at `offset`.
///
/// Returns the index of the first node starting at or after `offset`.
pub(crate) fn split_at(content: &mut Vec<Node>, offset: usize) -> usize {
    let mut acc = 0;
    for index in 0..content.len() {
        if acc == offset {
            return index;
        }
        let size = content[index].size();
        if offset < acc + size {
            // Only text runs are wider than one position, so this is a text split
            if let Node::Text(run) = &mut content[index] {
                let at = byte_index(&run.text, offset - acc);
                let tail = run.text.split_off(at);
                let marks = run.marks.clone();
                content.insert(index + 1, Node::Text(TextRun::new(tail, marks)));
            }
            return index + 1;
        }
        acc += size;
    }
    content.len()
}

/// Split the content at `offset`, returning everything after it
pub(crate) fn split_off(content: &mut Vec<Node>, offset: usize) -> Vec<Node> {
    let index = split_at(content, offset);
    let tail = content.split_off(index);
    normalize(content);
    tail
}

pub(crate) fn insert_text(content: &mut Vec<Node>, offset: usize, text: &str, marks: &MarkSet) {
    if text.is_empty() {
        return;
    }
    let index = split_at(content, offset);
    content.insert(index, Node::text(text, marks.clone()));
    normalize(content);
}

pub(crate) fn delete(content: &mut Vec<Node>, range: Range<usize>) {
    if range.is_empty() {
        return;
    }
    let start = split_at(content, range.start);
    let end = split_at(content, range.end);
    content.drain(start..end);
    normalize(content);
}

/// Apply `f` to the marks of every text run covering `range`
fn update_marks(content: &mut Vec<Node>, range: Range<usize>, mut f: impl FnMut(&mut MarkSet)) {
    if range.is_empty() {
        return;
    }
    let start = split_at(content, range.start);
    let end = split_at(content, range.end);
    for node in content[start..end].iter_mut() {
        if let Node::Text(run) = node {
            f(&mut run.marks);
        }
    }
    normalize(content);
}

pub(crate) fn add_mark(content: &mut Vec<Node>, range: Range<usize>, mark: &Mark) {
    update_marks(content, range, |marks| {
        marks.insert(mark.clone());
    });
}

pub(crate) fn remove_mark(content: &mut Vec<Node>, range: Range<usize>, kind: MarkKind) {
    update_marks(content, range, |marks| {
        marks.remove_kind(kind);
    });
}

/// Drop empty text runs and merge neighbours with equal marks
pub(crate) fn normalize(content: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(content.len());
    for node in content.drain(..) {
        match node {
            Node::Text(run) if run.is_empty() => {}
            Node::Text(run) => match merged.last_mut() {
                Some(Node::Text(prev)) if prev.marks == run.marks => prev.text.push_str(&run.text),
                _ => merged.push(Node::Text(run)),
            },
            other => merged.push(other),
        }
    }
    *content = merged;
}

/// Marks inherited by text inserted at `offset`.
///
/// Inside a run the run's marks apply. At a run boundary the node before
/// wins (the node after at the start of the block) and non-inclusive marks
/// survive only when the other side carries the same mark.
pub(crate) fn marks_at(content: &[Node], offset: usize) -> MarkSet {
    let mut acc = 0;
    let mut before: Option<&Node> = None;
    let mut after: Option<&Node> = None;
    for node in content {
        let size = node.size();
        if acc < offset && offset < acc + size {
            return node.marks().cloned().unwrap_or_default();
        }
        if acc + size == offset {
            before = Some(node);
        }
        if acc == offset {
            after = Some(node);
            break;
        }
        acc += size;
    }

    let (main, other) = match (before, after) {
        (Some(before), after) => (before, after),
        (None, Some(after)) => (after, None),
        (None, None) => return MarkSet::new(),
    };
    let other_marks = other.and_then(Node::marks);
    let mut marks = main.marks().cloned().unwrap_or_default();
    marks.retain(|mark| mark.kind().inclusive() || other_marks.is_some_and(|o| o.contains(mark)));
    marks
}
