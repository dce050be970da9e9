//! Comment range resolution.
//!
//! Comment ranges are never stored. They are recomputed from the text runs
//! on every call, since edits can move, split or merge them arbitrarily.

use std::ops::Range;

use indexmap::IndexSet;
use serde::Serialize;

use crate::editing::Document;
use crate::editing::document::InlineSpan;

/// Maximal contiguous span carrying one comment id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRange {
    pub id: String,
    /// First marked position (inclusive)
    pub from: usize,
    /// One past the last marked position
    pub to: usize,
    pub text: String,
}

impl CommentRange {
    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }
}

fn comment_id<'a>(span: &InlineSpan<'a>) -> Option<&'a str> {
    span.marks.comment().map(|attrs| attrs.id.as_str())
}

/// Grow the span at `index` left and right across touching spans with `id`
fn expand(spans: &[InlineSpan<'_>], index: usize, id: &str) -> CommentRange {
    let same = |span: &InlineSpan<'_>| comment_id(span) == Some(id);

    let mut first = index;
    while first > 0 && spans[first - 1].to == spans[first].from && same(&spans[first - 1]) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < spans.len() && spans[last].to == spans[last + 1].from && same(&spans[last + 1])
    {
        last += 1;
    }

    CommentRange {
        id: id.to_string(),
        from: spans[first].from,
        to: spans[last].to,
        text: spans[first]
            .marks
            .comment()
            .map(|attrs| attrs.text.clone())
            .unwrap_or_default(),
    }
}

impl Document {
    /// Full extent of the comment on the character at `pos`.
    ///
    /// `None` when that character carries no comment.
    pub fn comment_range_at(&self, pos: usize) -> Option<CommentRange> {
        let spans = self.inline_spans();
        let index = spans
            .iter()
            .position(|span| span.from <= pos && pos < span.to)?;
        let id = comment_id(&spans[index])?;
        Some(expand(&spans, index, id))
    }

    /// Extent of the first span carrying `id`.
    ///
    /// When an edit left the id in several disjoint spans only the first one
    /// is returned.
    pub fn comment_range_for_id(&self, id: &str) -> Option<CommentRange> {
        let spans = self.inline_spans();
        let index = spans.iter().position(|span| comment_id(span) == Some(id))?;
        Some(expand(&spans, index, id))
    }

    /// Comment on the character after `pos`, else the one before it
    pub fn comment_range_near(&self, pos: usize) -> Option<CommentRange> {
        self.comment_range_at(pos)
            .or_else(|| pos.checked_sub(1).and_then(|pos| self.comment_range_at(pos)))
    }

    /// Every comment span, ascending by `from`.
    ///
    /// A span made of several text runs is reported once.
    pub fn comment_ranges(&self) -> Vec<CommentRange> {
        let spans = self.inline_spans();
        let mut ranges = Vec::new();
        let mut index = 0;
        while index < spans.len() {
            let Some(id) = comment_id(&spans[index]) else {
                index += 1;
                continue;
            };
            let range = expand(&spans, index, id);
            while index < spans.len() && spans[index].to <= range.to {
                index += 1;
            }
            ranges.push(range);
        }
        ranges
    }

    /// Distinct comment ids in document order
    pub fn comment_ids(&self) -> IndexSet<String> {
        self.inline_spans()
            .iter()
            .filter_map(comment_id)
            .map(str::to_string)
            .collect()
    }
}

/// First range starting after `from`, wrapping around to the first
pub fn next_comment(ranges: &[CommentRange], from: usize) -> Option<&CommentRange> {
    ranges
        .iter()
        .find(|range| range.from > from)
        .or_else(|| ranges.first())
}

/// Range before the first one starting at or after `from`, wrapping to the last
pub fn prev_comment(ranges: &[CommentRange], from: usize) -> Option<&CommentRange> {
    if ranges.is_empty() {
        return None;
    }
    let index = ranges
        .iter()
        .position(|range| range.from >= from)
        .unwrap_or(ranges.len());
    ranges.get((index + ranges.len() - 1) % ranges.len())
}
