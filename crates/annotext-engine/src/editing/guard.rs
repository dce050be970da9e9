use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editing::{StepKind, Transaction};
use crate::models::MarkKind;

/// Application mode deciding which edits are allowed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Students edit text freely but cannot add comments
    #[default]
    StudentInput,
    /// Read-only
    StudentView,
    /// Teachers may only add or remove comments
    TeacherComment,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::StudentInput, Mode::StudentView, Mode::TeacherComment];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::StudentInput => "student_input",
            Mode::StudentView => "student_view",
            Mode::TeacherComment => "teacher_comment",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected student_input, student_view or teacher_comment)")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// Why the guard refused a transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("the document is read-only in {0} mode")]
    ReadOnly(Mode),
    #[error("step {index} is not a comment change")]
    NotACommentChange { index: usize },
    #[error("step {index} adds a comment")]
    CommentAddition { index: usize },
}

/// Decide whether `tr` may be applied in `mode`.
///
/// Pure: looks only at the step kinds, never at the document. A
/// transaction that leaves the document untouched passes in every mode.
/// A single offending step rejects the whole transaction.
pub fn filter_transaction(mode: Mode, tr: &Transaction) -> Result<(), Rejection> {
    if !tr.doc_changed() {
        return Ok(());
    }

    let kinds = tr.steps().iter().map(|step| step.kind()).enumerate();
    match mode {
        Mode::StudentView => Err(Rejection::ReadOnly(mode)),
        Mode::TeacherComment => {
            for (index, kind) in kinds {
                match kind {
                    StepKind::AddMark(MarkKind::Comment) | StepKind::RemoveMark(MarkKind::Comment) => {}
                    _ => return Err(Rejection::NotACommentChange { index }),
                }
            }
            Ok(())
        }
        Mode::StudentInput => {
            for (index, kind) in kinds {
                if kind == StepKind::AddMark(MarkKind::Comment) {
                    return Err(Rejection::CommentAddition { index });
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Step;
    use crate::models::{Mark, MarkSet};
    use rstest::rstest;

    fn add_comment() -> Step {
        Step::AddMark {
            range: 1..3,
            mark: Mark::comment("c1", "note"),
        }
    }

    fn remove_comment() -> Step {
        Step::RemoveMark {
            range: 1..3,
            kind: MarkKind::Comment,
        }
    }

    fn add_bold() -> Step {
        Step::AddMark {
            range: 1..3,
            mark: Mark::Bold,
        }
    }

    fn type_text() -> Step {
        Step::ReplaceText {
            range: 2..2,
            text: "x".to_string(),
            marks: MarkSet::new(),
        }
    }

    fn tr(steps: Vec<Step>) -> Transaction {
        steps.into_iter().fold(Transaction::new(), Transaction::step)
    }

    #[rstest]
    #[case::view_rejects_text(Mode::StudentView, vec![type_text()], false)]
    #[case::view_rejects_comment(Mode::StudentView, vec![add_comment()], false)]
    #[case::view_rejects_removal(Mode::StudentView, vec![remove_comment()], false)]
    #[case::teacher_adds(Mode::TeacherComment, vec![add_comment()], true)]
    #[case::teacher_removes(Mode::TeacherComment, vec![remove_comment()], true)]
    #[case::teacher_both(Mode::TeacherComment, vec![remove_comment(), add_comment()], true)]
    #[case::teacher_types(Mode::TeacherComment, vec![type_text()], false)]
    #[case::teacher_bold(Mode::TeacherComment, vec![add_bold()], false)]
    #[case::teacher_mixed(Mode::TeacherComment, vec![add_comment(), type_text()], false)]
    #[case::student_types(Mode::StudentInput, vec![type_text()], true)]
    #[case::student_bold(Mode::StudentInput, vec![add_bold()], true)]
    #[case::student_removes(Mode::StudentInput, vec![remove_comment()], true)]
    #[case::student_adds(Mode::StudentInput, vec![add_comment()], false)]
    #[case::student_mixed(Mode::StudentInput, vec![type_text(), add_comment()], false)]
    fn test_filter(#[case] mode: Mode, #[case] steps: Vec<Step>, #[case] allowed: bool) {
        assert_eq!(filter_transaction(mode, &tr(steps)).is_ok(), allowed);
    }

    #[rstest]
    fn test_selection_only_change_passes_every_mode(
        #[values(Mode::StudentInput, Mode::StudentView, Mode::TeacherComment)] mode: Mode,
    ) {
        let tr = Transaction::new().with_selection(2..4);
        assert_eq!(filter_transaction(mode, &tr), Ok(()));
    }

    #[test]
    fn test_rejection_names_offending_step() {
        let tr = tr(vec![add_comment(), add_bold()]);
        assert_eq!(
            filter_transaction(Mode::TeacherComment, &tr),
            Err(Rejection::NotACommentChange { index: 1 })
        );
    }

    #[rstest]
    #[case("student_input", Mode::StudentInput)]
    #[case("student-view", Mode::StudentView)]
    #[case(" Teacher_Comment ", Mode::TeacherComment)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>(), Ok(expected));
    }

    #[test]
    fn test_parse_unknown_mode() {
        assert!("admin".parse::<Mode>().is_err());
        assert_eq!(Mode::TeacherComment.to_string(), "teacher_comment");
    }
}
