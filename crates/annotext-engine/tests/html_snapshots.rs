use annotext_engine::Document;
use pretty_assertions::assert_eq;

#[test]
fn fixture_commented_paragraphs() {
    assert_fixture("commented_paragraphs");
}

#[test]
fn fixture_nested_blocks() {
    assert_fixture("nested_blocks");
}

fn load(name: &str) -> Document {
    let json = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.json",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    Document::from_json_str(&json).unwrap()
}

fn assert_fixture(name: &str) {
    let doc = load(name);
    let html = doc.to_html();

    // Whatever is rendered must parse back to the same tree
    let reparsed = Document::from_html(&html);
    assert_eq!(reparsed.blocks(), doc.blocks());

    insta::assert_snapshot!(name, html);
}

#[test]
fn comment_positions_survive_html() {
    let doc = load("commented_paragraphs");
    let ranges: Vec<_> = doc
        .comment_ranges()
        .into_iter()
        .map(|r| (r.id, r.from, r.to, r.text))
        .collect();

    assert_eq!(
        ranges,
        vec![
            ("c1".to_string(), 15, 27, "Which prices?".to_string()),
            ("c2".to_string(), 54, 59, String::new()),
        ]
    );

    let reparsed = Document::from_html(&doc.to_html());
    assert_eq!(reparsed.comment_ranges(), doc.comment_ranges());
}
