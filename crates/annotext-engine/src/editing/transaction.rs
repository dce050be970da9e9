use std::ops::Range;

use crate::models::{Mark, MarkKind, MarkSet, NodeKind};

/// Elementary change primitive.
///
/// Positions refer to the document as left by the previous step of the
/// same transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `range` with `text` carrying `marks`. Covers insertion
    /// (empty range), deletion (empty text) and replacement.
    ReplaceText {
        range: Range<usize>,
        text: String,
        marks: MarkSet,
    },
    /// Set `mark` on every character in `range`, replacing marks of the same kind
    AddMark { range: Range<usize>, mark: Mark },
    /// Remove marks of `kind` from every character in `range`
    RemoveMark { range: Range<usize>, kind: MarkKind },
    /// Split the textblock containing `at` in two
    SplitBlock { at: usize },
    /// Change the type of every textblock touching `range`
    SetBlockType { range: Range<usize>, kind: NodeKind },
}

/// Structural classification of a [`Step`], used by the mode guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Text inserted, deleted or replaced
    Content,
    /// Block structure changed
    Structure,
    AddMark(MarkKind),
    RemoveMark(MarkKind),
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::ReplaceText { .. } => StepKind::Content,
            Step::AddMark { mark, .. } => StepKind::AddMark(mark.kind()),
            Step::RemoveMark { kind, .. } => StepKind::RemoveMark(*kind),
            Step::SplitBlock { .. } | Step::SetBlockType { .. } => StepKind::Structure,
        }
    }

    /// Map a position in the document before this step to the document after it
    pub fn map(&self, pos: usize) -> usize {
        match self {
            Step::ReplaceText { range, text, .. } => {
                let inserted = text.chars().count();
                if pos < range.start {
                    pos
                } else if pos >= range.end {
                    pos - range.len() + inserted
                } else {
                    range.start + inserted
                }
            }
            Step::SplitBlock { at } if pos >= *at => pos + 2,
            _ => pos,
        }
    }

    /// Range touched by this step, in the document after it
    pub fn changed_range(&self) -> Range<usize> {
        match self {
            Step::ReplaceText { range, text, .. } => {
                range.start..range.start + text.chars().count()
            }
            Step::AddMark { range, .. }
            | Step::RemoveMark { range, .. }
            | Step::SetBlockType { range, .. } => range.clone(),
            Step::SplitBlock { at } => *at..*at + 2,
        }
    }
}

/// An ordered group of steps applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Range<usize>>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style step append
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn with_selection(mut self, selection: Range<usize>) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Explicit selection to set after the steps, if any
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Whether applying this transaction changes the document
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Map a position through every step
    pub fn map(&self, pos: usize) -> usize {
        self.steps.iter().fold(pos, |pos, step| step.map(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 3)] // before the edit
    #[case(5, 8)] // at the insertion point
    #[case(9, 12)] // after the edit
    fn test_insert_maps_positions(#[case] pos: usize, #[case] expected: usize) {
        let step = Step::ReplaceText {
            range: 5..5,
            text: "abc".to_string(),
            marks: MarkSet::new(),
        };
        assert_eq!(step.map(pos), expected);
    }

    #[rstest]
    #[case(2, 2)]
    #[case(6, 4)] // inside the deleted range collapses to its start
    #[case(10, 6)]
    fn test_delete_maps_positions(#[case] pos: usize, #[case] expected: usize) {
        let step = Step::ReplaceText {
            range: 4..8,
            text: String::new(),
            marks: MarkSet::new(),
        };
        assert_eq!(step.map(pos), expected);
    }

    #[test]
    fn test_mark_steps_do_not_move_positions() {
        let step = Step::AddMark {
            range: 1..6,
            mark: Mark::Bold,
        };
        assert_eq!(step.map(4), 4);
        assert_eq!(step.kind(), StepKind::AddMark(MarkKind::Bold));
    }

    #[test]
    fn test_split_block_shifts_by_two() {
        let step = Step::SplitBlock { at: 4 };
        assert_eq!(step.map(3), 3);
        assert_eq!(step.map(4), 6);
        assert_eq!(step.kind(), StepKind::Structure);
    }

    #[test]
    fn test_empty_transaction_does_not_change_doc() {
        let tr = Transaction::new().with_selection(1..3);
        assert!(!tr.doc_changed());
        assert_eq!(tr.selection(), Some(1..3));
    }
}
