use annotext_engine::{
    Cmd, Dispatch, Document, EditorSession, Mark, MemoryStorage, Mode, Node, Storage, Thread,
};
use pretty_assertions::assert_eq;

fn open(text: &str, mode: Mode) -> EditorSession {
    let doc = Document::from_text(text);
    EditorSession::open(MemoryStorage::with_document(doc.to_json()), mode).unwrap()
}

fn spans(session: &EditorSession) -> Vec<(usize, usize, String)> {
    session
        .comment_ranges()
        .into_iter()
        .map(|r| (r.from, r.to, r.id))
        .collect()
}

#[test]
fn teacher_comments_then_student_edits_around_it() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(1..6);
    let outcome = session.add_comment_with_id("c1", "Greeting?").unwrap();
    assert!(outcome.is_applied());
    assert_eq!(spans(&session), vec![(1, 6, "c1".to_string())]);

    session.set_mode(Mode::StudentInput);

    // Typing right after the comment does not grow it
    let outcome = session
        .dispatch(&Cmd::InsertText {
            at: 6,
            text: "!".into(),
        })
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(session.document().text_content(), "Hello! world");
    assert_eq!(spans(&session), vec![(1, 6, "c1".to_string())]);

    // Typing before it shifts it
    session
        .dispatch(&Cmd::InsertText {
            at: 1,
            text: ">> ".into(),
        })
        .unwrap();
    assert_eq!(spans(&session), vec![(4, 9, "c1".to_string())]);

    // Typing inside it extends it
    session
        .dispatch(&Cmd::InsertText {
            at: 6,
            text: "-".into(),
        })
        .unwrap();
    assert_eq!(session.document().text_content(), ">> He-llo! world");
    assert_eq!(spans(&session), vec![(4, 10, "c1".to_string())]);
}

#[test]
fn deleting_commented_text_drops_its_thread() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(7..12);
    session.add_comment_with_id("w", "Who?").unwrap();
    session.set_mode(Mode::StudentInput);

    session
        .dispatch(&Cmd::DeleteRange { range: 6..12 })
        .unwrap();

    assert_eq!(session.document().text_content(), "Hello");
    assert_eq!(session.comment_count(), 0);
    assert!(session.threads().unwrap().is_empty());
}

#[test]
fn resolve_removes_mark_and_thread_but_keeps_text() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(1..6);
    session.add_comment_with_id("a", "first").unwrap();
    session.set_selection(7..12);
    session.add_comment_with_id("b", "second").unwrap();

    let outcome = session.resolve_comment("a").unwrap();

    assert!(outcome.is_applied());
    assert_eq!(session.document().text_content(), "Hello world");
    assert_eq!(spans(&session), vec![(7, 12, "b".to_string())]);
    assert_eq!(session.threads().unwrap(), vec![Thread::new("b", "second")]);
}

#[test]
fn delete_key_inside_comment_removes_whole_comment() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(1..6);
    session.add_comment_with_id("c1", "note").unwrap();
    session.set_mode(Mode::StudentInput);
    session.set_selection(3..3);

    let removed = session.delete_comment_at_cursor().unwrap().unwrap();

    assert_eq!((removed.from, removed.to), (1, 6));
    assert_eq!(session.document().text_content(), "Hello world");
    assert_eq!(session.comment_count(), 0);
    assert!(session.threads().unwrap().is_empty());
}

#[test]
fn navigation_wraps_in_every_mode() {
    let mut session = open("one two three", Mode::TeacherComment);
    for (id, range) in [("a", 1..4), ("b", 5..8), ("c", 9..14)] {
        session.set_selection(range);
        session.add_comment_with_id(id, id).unwrap();
    }
    session.set_mode(Mode::StudentView);
    session.set_selection(6..6);

    assert_eq!(session.next_comment().unwrap().id, "c");
    assert_eq!(session.next_comment().unwrap().id, "a");
    assert_eq!(session.prev_comment().unwrap().id, "c");
    assert_eq!(session.selection(), 9..14);
}

#[test]
fn reopening_keeps_comments_and_threads() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(1..6);
    let id = session.add_comment("Greeting?").unwrap().unwrap();

    let storage = session.close();
    let saved = storage.load_document().unwrap();
    let reopened = EditorSession::open(storage, Mode::StudentView).unwrap();

    assert_eq!(saved.node_type, "doc");
    assert_eq!(spans(&reopened), vec![(1, 6, id.clone())]);
    assert_eq!(reopened.threads().unwrap(), vec![Thread::new(id, "Greeting?")]);
}

#[test]
fn split_comment_fragments_share_an_id() {
    let mut session = open("Hello world", Mode::TeacherComment);
    session.set_selection(1..12);
    session.add_comment_with_id("c1", "all").unwrap();
    session.set_mode(Mode::StudentInput);

    // Splitting the block leaves one fragment in each paragraph
    let outcome = session.dispatch(&Cmd::SplitBlock { at: 6 }).unwrap();
    assert!(matches!(outcome, Dispatch::Applied(_)));

    let ranges = session.comment_ranges();
    assert_eq!(ranges.len(), 2);
    assert!(ranges.iter().all(|r| r.id == "c1"));
    assert_eq!(session.comment_count(), 1);
    assert_eq!(
        session.document().comment_range_for_id("c1").map(|r| r.range()),
        Some(1..6)
    );
    assert_eq!(
        session.document().blocks()[1],
        Node::paragraph(vec![Node::text(
            " world",
            [Mark::comment("c1", "all")].into_iter().collect()
        )])
    );
}
