use std::ops::Range;

use crate::editing::{Patch, Step, Transaction, inline};
use crate::models::{Element, Mark, MarkKind, MarkSet, Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("position {pos} is outside the document (size {size})")]
    OutOfBounds { pos: usize, size: usize },
    #[error("invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    #[error("position {0} is not inside a textblock")]
    NotInTextblock(usize),
    #[error("range {start}..{end} crosses container boundaries")]
    CrossesContainers { start: usize, end: usize },
    #[error("{0} is not a textblock type")]
    NotATextblockType(&'static str),
    #[error("{0} marks need attributes and cannot be toggled")]
    MarkNeedsAttributes(&'static str),
}

/// A text run located in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InlineSpan<'a> {
    pub from: usize,
    pub to: usize,
    pub text: &'a str,
    pub marks: &'a MarkSet,
    /// Ordinal of the textblock holding the run
    pub block: usize,
}

/// A textblock located in the document
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextblockInfo {
    /// Child indices from the document root down to the textblock
    pub path: Vec<usize>,
    /// Positions of the block content, excluding its boundary tokens
    pub content: Range<usize>,
}

/// A position resolved to the textblock containing it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedPos {
    pub block: TextblockInfo,
    /// Offset into the block content
    pub offset: usize,
}

/// The editable document: a tree of blocks whose leaves are marked text runs.
///
/// Positions count one per character, plus one for the opening and one for
/// the closing token of every non-leaf element below the root. In
/// `<p>Hello</p>` the text spans `1..6`.
///
/// Edits are expressed as a [`Transaction`] of [`Step`]s and applied
/// atomically by [`Document::apply`]: either every step succeeds or the
/// document is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) blocks: Vec<Node>,
    /// Current selection as document positions
    pub(crate) selection: Range<usize>,
    /// Incremented on every change to the content
    pub(crate) version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    /// Create a document from top-level blocks.
    ///
    /// An empty block list yields a single empty paragraph.
    pub fn new(blocks: Vec<Node>) -> Self {
        let blocks = if blocks.is_empty() {
            vec![Node::paragraph(Vec::new())]
        } else {
            blocks
        };
        let mut doc = Self {
            blocks,
            selection: 0..0,
            version: 0,
        };
        // Cursor at the start of the first textblock
        if let Some(first) = doc.textblocks().first() {
            doc.selection = first.content.start..first.content.start;
        }
        doc
    }

    /// One paragraph per line of `text`
    pub fn from_text(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    Node::paragraph(Vec::new())
                } else {
                    Node::paragraph(vec![Node::plain(line)])
                }
            })
            .collect();
        Self::new(blocks)
    }

    pub fn blocks(&self) -> &[Node] {
        &self.blocks
    }

    /// Total number of positions in the document
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Node::size).sum()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Set the selection, clamped to the document
    pub fn set_selection(&mut self, selection: Range<usize>) {
        self.selection = self.clamp(selection);
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let size = self.content_size();
        let start = range.start.min(size);
        let end = range.end.min(size).max(start);
        start..end
    }

    /// Text of every textblock, separated by newlines
    pub fn text_content(&self) -> String {
        self.text_between(0..self.content_size())
    }

    /// Text inside `range`, with a newline between textblocks
    pub fn text_between(&self, range: Range<usize>) -> String {
        let spans = self.inline_spans();
        let mut out = String::new();
        let mut last_block = None;
        for (ordinal, block) in self.textblocks().iter().enumerate() {
            if block.content.end < range.start || block.content.start > range.end {
                continue;
            }
            if last_block.is_some() {
                out.push('\n');
            }
            last_block = Some(ordinal);
            for span in spans.iter().filter(|span| span.block == ordinal) {
                let from = span.from.max(range.start);
                let to = span.to.min(range.end);
                if from < to {
                    out.extend(span.text.chars().skip(from - span.from).take(to - from));
                }
            }
        }
        out
    }

    /// Every text run with its position, in document order
    pub(crate) fn inline_spans(&self) -> Vec<InlineSpan<'_>> {
        let mut out = Vec::new();
        let mut block = 0;
        collect_spans(&self.blocks, 0, &mut block, &mut out);
        out
    }

    /// Every textblock with its content range, in document order
    pub(crate) fn textblocks(&self) -> Vec<TextblockInfo> {
        let mut out = Vec::new();
        collect_textblocks(&self.blocks, 0, &mut Vec::new(), &mut out);
        out
    }

    /// Find the textblock whose content contains `pos` (end inclusive)
    pub(crate) fn resolve(&self, pos: usize) -> Result<ResolvedPos, EditError> {
        let size = self.content_size();
        if pos > size {
            return Err(EditError::OutOfBounds { pos, size });
        }
        self.textblocks()
            .into_iter()
            .find(|block| block.content.start <= pos && pos <= block.content.end)
            .map(|block| ResolvedPos {
                offset: pos - block.content.start,
                block,
            })
            .ok_or(EditError::NotInTextblock(pos))
    }

    pub(crate) fn element(&self, path: &[usize]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        let mut element = self.blocks.get(*first)?.as_element()?;
        for index in rest {
            element = element.content.get(*index)?.as_element()?;
        }
        Some(element)
    }

    fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let (first, rest) = path.split_first()?;
        let mut element = self.blocks.get_mut(*first)?.as_element_mut()?;
        for index in rest {
            element = element.content.get_mut(*index)?.as_element_mut()?;
        }
        Some(element)
    }

    /// Child list of the element at `parent`, or the top-level blocks
    fn children_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Node>> {
        if parent.is_empty() {
            Some(&mut self.blocks)
        } else {
            self.element_mut(parent).map(|element| &mut element.content)
        }
    }

    /// Marks that text typed at `pos` would carry
    pub fn marks_at(&self, pos: usize) -> Result<MarkSet, EditError> {
        let resolved = self.resolve(pos)?;
        let element = self
            .element(&resolved.block.path)
            .ok_or(EditError::NotInTextblock(pos))?;
        Ok(inline::marks_at(&element.content, resolved.offset))
    }

    /// Whether every character in `range` carries exactly `mark`.
    ///
    /// False for ranges without any text.
    pub fn range_has_mark(&self, range: Range<usize>, mark: &Mark) -> bool {
        if range.is_empty() {
            return false;
        }
        let mut spans = self
            .inline_spans()
            .into_iter()
            .filter(|span| span.from < range.end && range.start < span.to)
            .peekable();
        spans.peek().is_some() && spans.all(|span| span.marks.contains(mark))
    }

    /// Whether any character in `range` carries a mark of `kind`
    pub fn range_has_kind(&self, range: Range<usize>, kind: MarkKind) -> bool {
        !range.is_empty()
            && self
                .inline_spans()
                .iter()
                .filter(|span| span.from < range.end && range.start < span.to)
                .any(|span| span.marks.has_kind(kind))
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        if range.start > range.end {
            return Err(EditError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        let size = self.content_size();
        if range.end > size {
            return Err(EditError::OutOfBounds {
                pos: range.end,
                size,
            });
        }
        Ok(())
    }

    /// Apply a transaction atomically.
    ///
    /// The steps run against a copy which replaces the document only when
    /// all of them succeed, so a failing step leaves no partial change.
    pub fn apply(&mut self, tr: &Transaction) -> Result<Patch, EditError> {
        let mut next = self.clone();
        let mut changed: Vec<Range<usize>> = Vec::new();

        for step in tr.steps() {
            next.apply_step(step)?;
            for range in &mut changed {
                *range = step.map(range.start)..step.map(range.end);
            }
            changed.push(step.changed_range());
        }

        let selection = tr
            .selection()
            .unwrap_or_else(|| tr.map(self.selection.start)..tr.map(self.selection.end));
        next.selection = next.clamp(selection);
        if tr.doc_changed() {
            next.version += 1;
        }

        log::debug!(
            "applied {} step(s), version {} -> {}",
            tr.steps().len(),
            self.version,
            next.version
        );
        *self = next;

        Ok(Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        })
    }

    fn apply_step(&mut self, step: &Step) -> Result<(), EditError> {
        match step {
            Step::ReplaceText { range, text, marks } => self.replace_text(range, text, marks),
            Step::AddMark { range, mark } => {
                self.check_range(range)?;
                self.update_textblocks(range, |content, local| {
                    inline::add_mark(content, local, mark)
                });
                Ok(())
            }
            Step::RemoveMark { range, kind } => {
                self.check_range(range)?;
                self.update_textblocks(range, |content, local| {
                    inline::remove_mark(content, local, *kind)
                });
                Ok(())
            }
            Step::SplitBlock { at } => self.split_block(*at),
            Step::SetBlockType { range, kind } => self.set_block_type(range, kind),
        }
    }

    /// Run `f` on the part of every textblock that overlaps `range`
    fn update_textblocks(
        &mut self,
        range: &Range<usize>,
        mut f: impl FnMut(&mut Vec<Node>, Range<usize>),
    ) {
        for block in self.textblocks() {
            let start = range.start.max(block.content.start);
            let end = range.end.min(block.content.end);
            if start >= end {
                continue;
            }
            if let Some(element) = self.element_mut(&block.path) {
                let base = block.content.start;
                f(&mut element.content, start - base..end - base);
            }
        }
    }

    fn replace_text(
        &mut self,
        range: &Range<usize>,
        text: &str,
        marks: &MarkSet,
    ) -> Result<(), EditError> {
        self.check_range(range)?;
        let from = self.resolve(range.start)?;
        let to = self.resolve(range.end)?;

        if from.block.path == to.block.path {
            let element = self
                .element_mut(&from.block.path)
                .ok_or(EditError::NotInTextblock(range.start))?;
            inline::delete(&mut element.content, from.offset..to.offset);
            inline::insert_text(&mut element.content, from.offset, text, marks);
            return Ok(());
        }

        // Joining two textblocks is only possible when they are siblings
        let crosses = EditError::CrossesContainers {
            start: range.start,
            end: range.end,
        };
        let (Some((first, from_parent)), Some((last, to_parent))) =
            (from.block.path.split_last(), to.block.path.split_last())
        else {
            return Err(crosses);
        };
        if from_parent != to_parent {
            return Err(crosses);
        }
        let (first, last) = (*first, *last);
        let siblings = self.children_mut(from_parent).ok_or(crosses.clone())?;

        let tail = match siblings.get_mut(last).and_then(Node::as_element_mut) {
            Some(element) => inline::split_off(&mut element.content, to.offset),
            None => return Err(crosses),
        };
        siblings.drain(first + 1..=last);
        let element = siblings
            .get_mut(first)
            .and_then(Node::as_element_mut)
            .ok_or(crosses)?;
        inline::split_off(&mut element.content, from.offset);
        element.content.extend(tail);
        inline::normalize(&mut element.content);
        inline::insert_text(&mut element.content, from.offset, text, marks);
        Ok(())
    }

    fn split_block(&mut self, at: usize) -> Result<(), EditError> {
        let resolved = self.resolve(at)?;
        let Some((index, parent)) = resolved.block.path.split_last() else {
            return Err(EditError::NotInTextblock(at));
        };
        let index = *index;
        let siblings = self
            .children_mut(parent)
            .ok_or(EditError::NotInTextblock(at))?;
        let element = siblings
            .get_mut(index)
            .and_then(Node::as_element_mut)
            .ok_or(EditError::NotInTextblock(at))?;

        let tail = inline::split_off(&mut element.content, resolved.offset);
        // A heading split at its end continues as a paragraph
        let kind = match element.kind {
            NodeKind::Heading { .. } if tail.is_empty() => NodeKind::Paragraph,
            ref kind => kind.clone(),
        };
        siblings.insert(index + 1, Node::element(kind, tail));
        Ok(())
    }

    fn set_block_type(&mut self, range: &Range<usize>, kind: &NodeKind) -> Result<(), EditError> {
        if !kind.is_textblock() {
            return Err(EditError::NotATextblockType(kind.type_name()));
        }
        self.check_range(range)?;
        for block in self.textblocks() {
            if block.content.start <= range.end && range.start <= block.content.end {
                if let Some(element) = self.element_mut(&block.path) {
                    element.kind = kind.clone();
                }
            }
        }
        Ok(())
    }
}

fn collect_spans<'a>(
    nodes: &'a [Node],
    start: usize,
    block: &mut usize,
    out: &mut Vec<InlineSpan<'a>>,
) {
    let mut pos = start;
    for node in nodes {
        match node {
            Node::Text(run) => {
                let len = run.len();
                out.push(InlineSpan {
                    from: pos,
                    to: pos + len,
                    text: &run.text,
                    marks: &run.marks,
                    block: block.saturating_sub(1),
                });
            }
            Node::Element(element) if element.kind.is_textblock() => {
                *block += 1;
                collect_spans(&element.content, pos + 1, block, out);
            }
            Node::Element(element) if !element.kind.is_leaf() => {
                collect_spans(&element.content, pos + 1, block, out);
            }
            Node::Element(_) => {}
        }
        pos += node.size();
    }
}

fn collect_textblocks(
    nodes: &[Node],
    start: usize,
    path: &mut Vec<usize>,
    out: &mut Vec<TextblockInfo>,
) {
    let mut pos = start;
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Element(element) = node {
            path.push(index);
            if element.kind.is_textblock() {
                out.push(TextblockInfo {
                    path: path.clone(),
                    content: pos + 1..pos + 1 + element.content_size(),
                });
            } else if !element.kind.is_leaf() {
                collect_textblocks(&element.content, pos + 1, path, out);
            }
            path.pop();
        }
        pos += node.size();
    }
}
