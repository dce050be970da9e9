use annotext_engine::{
    Cmd, Dispatch, Document, EditorSession, Mark, MarkKind, MemoryStorage, Mode, Node, NodeKind,
    Rejection, Step, Transaction, filter_transaction,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn open(mode: Mode) -> EditorSession {
    let doc = Document::from_text("Hello world\nSecond line");
    EditorSession::open(MemoryStorage::with_document(doc.to_json()), mode).unwrap()
}

/// `[c1]Hello` followed by ` world`
fn open_commented(mode: Mode) -> EditorSession {
    let doc = Document::new(vec![Node::paragraph(vec![
        Node::text("Hello", [Mark::comment("c1", "note")].into_iter().collect()),
        Node::plain(" world"),
    ])]);
    EditorSession::open(MemoryStorage::with_document(doc.to_json()), mode).unwrap()
}

fn spans(session: &EditorSession) -> Vec<(usize, usize, String)> {
    session
        .comment_ranges()
        .into_iter()
        .map(|r| (r.from, r.to, r.id))
        .collect()
}

fn edits() -> Vec<Cmd> {
    vec![
        Cmd::InsertText {
            at: 3,
            text: "x".into(),
        },
        Cmd::DeleteRange { range: 2..5 },
        Cmd::ReplaceRange {
            range: 1..6,
            text: "Howdy".into(),
        },
        Cmd::SplitBlock { at: 6 },
        Cmd::SetBlockType {
            range: 1..1,
            kind: NodeKind::Heading { level: 1 },
        },
        Cmd::ToggleMark {
            range: 1..6,
            kind: MarkKind::Bold,
        },
        Cmd::SetComment {
            range: 1..6,
            id: "c1".into(),
            text: "note".into(),
        },
    ]
}

#[test]
fn student_view_leaves_document_untouched() {
    let mut session = open(Mode::StudentView);
    let before = session.document().to_json();

    for cmd in edits() {
        let outcome = session.dispatch(&cmd).unwrap();
        assert_eq!(
            outcome,
            Dispatch::Rejected(Rejection::ReadOnly(Mode::StudentView)),
            "{cmd:?}"
        );
    }

    assert_eq!(session.document().to_json(), before);
    assert_eq!(session.storage().document(), &before);
    assert_eq!(session.document().version(), 0);
}

#[test]
fn teacher_typing_is_rejected() {
    let mut session = open(Mode::TeacherComment);

    let outcome = session
        .dispatch(&Cmd::InsertText {
            at: 1,
            text: "x".into(),
        })
        .unwrap();

    assert_eq!(
        outcome,
        Dispatch::Rejected(Rejection::NotACommentChange { index: 0 })
    );
    assert_eq!(session.document().text_content(), "Hello world\nSecond line");
}

#[test]
fn teacher_typing_inside_a_comment_is_rejected() {
    let mut session = open_commented(Mode::TeacherComment);

    let outcome = session
        .dispatch(&Cmd::InsertText {
            at: 3,
            text: "x".into(),
        })
        .unwrap();

    assert_eq!(
        outcome,
        Dispatch::Rejected(Rejection::NotACommentChange { index: 0 })
    );
    assert_eq!(session.document().text_content(), "Hello world");
    assert_eq!(spans(&session), vec![(1, 6, "c1".to_string())]);
    assert_eq!(session.document().version(), 0);
}

#[test]
fn teacher_comment_bundled_with_typing_is_not_applied() {
    let mut session = open(Mode::TeacherComment);
    let tr = Transaction::new()
        .step(Step::AddMark {
            range: 1..6,
            mark: Mark::comment("c1", "note"),
        })
        .step(Step::ReplaceText {
            range: 6..6,
            text: "!".into(),
            marks: Default::default(),
        });

    let outcome = session.dispatch_transaction(&tr).unwrap();

    assert_eq!(
        outcome,
        Dispatch::Rejected(Rejection::NotACommentChange { index: 1 })
    );
    assert!(session.comment_ranges().is_empty());
    assert_eq!(session.document().text_content(), "Hello world\nSecond line");
    assert!(session.threads().unwrap().is_empty());
}

#[test]
fn teacher_can_only_change_comments() {
    let mut session = open(Mode::TeacherComment);

    let applied: Vec<bool> = edits()
        .iter()
        .map(|cmd| session.dispatch(cmd).unwrap().is_applied())
        .collect();

    assert_eq!(applied, vec![false, false, false, false, false, false, true]);
    assert_eq!(session.comment_count(), 1);
}

#[test]
fn student_can_edit_but_not_comment() {
    let mut session = open(Mode::StudentInput);

    let outcome = session
        .dispatch(&Cmd::SetComment {
            range: 1..6,
            id: "c1".into(),
            text: "self-review".into(),
        })
        .unwrap();
    assert_eq!(
        outcome,
        Dispatch::Rejected(Rejection::CommentAddition { index: 0 })
    );

    let outcome = session
        .dispatch(&Cmd::ToggleMark {
            range: 1..6,
            kind: MarkKind::Italic,
        })
        .unwrap();
    assert!(outcome.is_applied());
    assert!(session.document().range_has_mark(1..6, &Mark::Italic));
}

#[rstest]
fn selection_changes_pass_in_every_mode(
    #[values(Mode::StudentInput, Mode::StudentView, Mode::TeacherComment)] mode: Mode,
) {
    let mut session = open(mode);

    let outcome = session
        .dispatch_transaction(&Transaction::new().with_selection(2..4))
        .unwrap();

    assert_eq!(outcome, Dispatch::Unchanged);
    assert_eq!(session.selection(), 2..4);
}

#[test]
fn one_bad_step_rejects_the_whole_transaction() {
    let tr = Transaction::new()
        .step(Step::RemoveMark {
            range: 1..6,
            kind: MarkKind::Comment,
        })
        .step(Step::ReplaceText {
            range: 1..1,
            text: "x".into(),
            marks: Default::default(),
        });

    assert_eq!(
        filter_transaction(Mode::TeacherComment, &tr),
        Err(Rejection::NotACommentChange { index: 1 })
    );
    assert_eq!(filter_transaction(Mode::StudentInput, &tr), Ok(()));
}
