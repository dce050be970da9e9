use std::ops::Range;

use crate::editing::{Document, EditError, Patch, Step, Transaction};
use crate::models::{Mark, MarkKind, MarkSet, NodeKind};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    SplitBlock {
        at: usize,
    },
    SetBlockType {
        range: Range<usize>,
        kind: NodeKind,
    },
    /// Add an attribute-less mark, or remove it if the whole range has it
    ToggleMark {
        range: Range<usize>,
        kind: MarkKind,
    },
    SetMark {
        range: Range<usize>,
        mark: Mark,
    },
    /// Attach a comment over `range`
    SetComment {
        range: Range<usize>,
        id: String,
        text: String,
    },
    /// Detach every comment in `range`, whatever its id
    UnsetComment {
        range: Range<usize>,
    },
    UnsetAllMarks {
        range: Range<usize>,
    },
}

/// Compile a command into a transaction.
///
/// Steps that would change nothing are left out, so commands such as
/// attaching over an empty range compile to an empty transaction.
pub fn compile_command(doc: &Document, cmd: &Cmd) -> Result<Transaction, EditError> {
    let tr = Transaction::new();
    match cmd {
        Cmd::InsertText { at, text } => {
            if text.is_empty() {
                return Ok(tr);
            }
            let marks = doc.marks_at(*at)?;
            let caret = at + text.chars().count();
            Ok(tr
                .step(Step::ReplaceText {
                    range: *at..*at,
                    text: text.clone(),
                    marks,
                })
                .with_selection(caret..caret))
        }
        Cmd::DeleteRange { range } => {
            if range.is_empty() {
                return Ok(tr);
            }
            Ok(tr
                .step(Step::ReplaceText {
                    range: range.clone(),
                    text: String::new(),
                    marks: MarkSet::new(),
                })
                .with_selection(range.start..range.start))
        }
        Cmd::ReplaceRange { range, text } => {
            if range.is_empty() && text.is_empty() {
                return Ok(tr);
            }
            let marks = doc.marks_at(range.start)?;
            let caret = range.start + text.chars().count();
            Ok(tr
                .step(Step::ReplaceText {
                    range: range.clone(),
                    text: text.clone(),
                    marks,
                })
                .with_selection(caret..caret))
        }
        Cmd::SplitBlock { at } => {
            doc.resolve(*at)?;
            Ok(tr
                .step(Step::SplitBlock { at: *at })
                .with_selection(at + 2..at + 2))
        }
        Cmd::SetBlockType { range, kind } => {
            if !kind.is_textblock() {
                return Err(EditError::NotATextblockType(kind.type_name()));
            }
            Ok(tr.step(Step::SetBlockType {
                range: range.clone(),
                kind: kind.clone(),
            }))
        }
        Cmd::ToggleMark { range, kind } => {
            let mark = kind
                .plain_mark()
                .ok_or(EditError::MarkNeedsAttributes(kind.type_name()))?;
            if range.is_empty() {
                return Ok(tr);
            }
            if doc.range_has_mark(range.clone(), &mark) {
                Ok(tr.step(Step::RemoveMark {
                    range: range.clone(),
                    kind: *kind,
                }))
            } else {
                Ok(tr.step(Step::AddMark {
                    range: range.clone(),
                    mark,
                }))
            }
        }
        Cmd::SetMark { range, mark } => Ok(set_mark(doc, tr, range, mark.clone())),
        Cmd::SetComment { range, id, text } => {
            Ok(set_mark(doc, tr, range, Mark::comment(id.clone(), text.clone())))
        }
        Cmd::UnsetComment { range } => Ok(unset_kinds(doc, tr, range, &[MarkKind::Comment])),
        Cmd::UnsetAllMarks { range } => Ok(unset_kinds(doc, tr, range, &MarkKind::ALL)),
    }
}

fn set_mark(doc: &Document, tr: Transaction, range: &Range<usize>, mark: Mark) -> Transaction {
    if range.is_empty() || doc.range_has_mark(range.clone(), &mark) {
        return tr;
    }
    tr.step(Step::AddMark {
        range: range.clone(),
        mark,
    })
}

fn unset_kinds(
    doc: &Document,
    mut tr: Transaction,
    range: &Range<usize>,
    kinds: &[MarkKind],
) -> Transaction {
    for kind in kinds {
        if doc.range_has_kind(range.clone(), *kind) {
            tr.push(Step::RemoveMark {
                range: range.clone(),
                kind: *kind,
            });
        }
    }
    tr
}

impl Document {
    /// Compile and apply a command without any mode checks
    pub fn apply_cmd(&mut self, cmd: &Cmd) -> Result<Patch, EditError> {
        let tr = compile_command(self, cmd)?;
        self.apply(&tr)
    }
}
