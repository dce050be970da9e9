// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use annotext_engine::{Document, Mark, MarkSet, Node};

/// Paragraphs of prose where every `every`th word carries a comment
#[allow(dead_code)]
pub fn generate_commented_document(paragraphs: usize, every: usize) -> Document {
    let mut blocks = Vec::with_capacity(paragraphs);
    let mut next_id = 0;

    for p in 0..paragraphs {
        let mut content = Vec::new();
        for w in 0..20 {
            let word = format!("word{w} ");
            if (p * 20 + w) % every.max(1) == 0 {
                let marks: MarkSet = [Mark::comment(format!("c{next_id}"), "Check this")]
                    .into_iter()
                    .collect();
                content.push(Node::text(word, marks));
                next_id += 1;
            } else {
                content.push(Node::plain(word));
            }
        }
        blocks.push(Node::paragraph(content));
    }

    Document::new(blocks)
}

/// Content position in the middle of the document
#[allow(dead_code)]
pub fn middle(doc: &Document) -> usize {
    let size = doc.content_size();
    // Step back to the nearest textblock content
    (1..=size / 2)
        .rev()
        .find(|pos| doc.marks_at(*pos).is_ok())
        .unwrap_or(1)
}
