//! HTML rendering and parsing.
//!
//! Rendering emits one tag per block and keeps mark tags open across
//! adjacent runs sharing them. Parsing is lenient: unknown wrappers are
//! transparent, stray text is wrapped in a paragraph, unclosed tags are
//! closed at the end, a `<` that does not open a tag is kept as text, and
//! only element names and attributes are inspected.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::comment::{COMMENT_CLASS, COMMENT_ID_ATTR, COMMENT_TEXT_ATTR};
use crate::editing::{Document, inline};
use crate::models::{Mark, MarkSet, Node, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "col", "embed", "img", "input", "link", "meta", "param", "source", "track",
    "wbr",
];

const BOUNDARY_ELEMENTS: &[&str] = &[
    "article", "aside", "body", "div", "footer", "header", "html", "main", "nav", "section",
];

const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style", "template", "title"];

impl Document {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            write_block(&mut out, block);
        }
        out
    }

    /// Parse an HTML fragment or page into a document
    pub fn from_html(html: &str) -> Self {
        parse_html(html)
    }
}

fn write_block(out: &mut String, node: &Node) {
    let Node::Element(element) = node else {
        write_inline(out, std::slice::from_ref(node));
        return;
    };
    match &element.kind {
        NodeKind::Paragraph => {
            out.push_str("<p>");
            write_inline(out, &element.content);
            out.push_str("</p>");
        }
        NodeKind::Heading { level } => {
            out.push_str(&format!("<h{level}>"));
            write_inline(out, &element.content);
            out.push_str(&format!("</h{level}>"));
        }
        NodeKind::CodeBlock { language } => {
            match language {
                Some(language) => out.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    encode_double_quoted_attribute(language)
                )),
                None => out.push_str("<pre><code>"),
            }
            write_inline(out, &element.content);
            out.push_str("</code></pre>");
        }
        NodeKind::HorizontalRule => out.push_str("<hr />"),
        NodeKind::HardBreak => out.push_str("<br />"),
        container => {
            let tag = match container {
                NodeKind::Blockquote => "blockquote",
                NodeKind::BulletList => "ul",
                NodeKind::OrderedList { .. } => "ol",
                _ => "li",
            };
            match container {
                NodeKind::OrderedList { start } if *start != 1 => {
                    out.push_str(&format!("<ol start=\"{start}\">"))
                }
                _ => out.push_str(&format!("<{tag}>")),
            }
            for child in &element.content {
                write_block(out, child);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

/// Write inline content, closing only the marks that end at each run boundary
fn write_inline(out: &mut String, content: &[Node]) {
    let mut open: Vec<&Mark> = Vec::new();
    for node in content {
        let marks: Vec<&Mark> = node.marks().map(|m| m.iter().collect()).unwrap_or_default();
        let keep = open
            .iter()
            .zip(&marks)
            .take_while(|(a, b)| a == b)
            .count();
        for mark in open.drain(keep..).rev() {
            close_mark(out, mark);
        }
        for mark in &marks[keep..] {
            open_mark(out, mark);
            open.push(*mark);
        }
        match node {
            Node::Text(run) => out.push_str(&encode_text(&run.text)),
            Node::Element(_) => out.push_str("<br />"),
        }
    }
    for mark in open.into_iter().rev() {
        close_mark(out, mark);
    }
}

fn open_mark(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Bold => out.push_str("<strong>"),
        Mark::Code => out.push_str("<code>"),
        Mark::Italic => out.push_str("<em>"),
        Mark::Strike => out.push_str("<s>"),
        Mark::Underline => out.push_str("<u>"),
        Mark::Link { href, target } => {
            out.push_str(&format!("<a href=\"{}\"", encode_double_quoted_attribute(href)));
            if let Some(target) = target {
                out.push_str(&format!(
                    " target=\"{}\"",
                    encode_double_quoted_attribute(target)
                ));
            }
            out.push('>');
        }
        Mark::Comment(attrs) => out.push_str(&format!(
            "<span {COMMENT_ID_ATTR}=\"{}\" {COMMENT_TEXT_ATTR}=\"{}\" class=\"{COMMENT_CLASS}\">",
            encode_double_quoted_attribute(&attrs.id),
            encode_double_quoted_attribute(&attrs.text),
        )),
    }
}

fn close_mark(out: &mut String, mark: &Mark) {
    out.push_str(match mark {
        Mark::Bold => "</strong>",
        Mark::Code => "</code>",
        Mark::Italic => "</em>",
        Mark::Strike => "</s>",
        Mark::Underline => "</u>",
        Mark::Link { .. } => "</a>",
        Mark::Comment(_) => "</span>",
    });
}

/// Parse HTML into a document.
///
/// Never fails. Elements carrying `data-comment-id` become comment marks;
/// an empty id drops the mark. Input the tokenizer cannot read past (an
/// unterminated comment, say) ends the parse and keeps what came before.
pub fn parse_html(html: &str) -> Document {
    let mut parser = HtmlParser::default();
    parser.feed(html);
    parser.finish()
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn attributes(start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = tag_name(attr.key.as_ref());
            let value = decode_html_entities(&String::from_utf8_lossy(&attr.value)).into_owned();
            (key, value)
        })
        .collect()
}

fn block_kind(name: &str, attr: impl Fn(&str) -> Option<String>) -> Option<NodeKind> {
    let kind = match name {
        "p" => NodeKind::Paragraph,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => NodeKind::Heading {
            level: name[1..].parse().unwrap_or(1),
        },
        "blockquote" => NodeKind::Blockquote,
        "ul" => NodeKind::BulletList,
        "ol" => NodeKind::OrderedList {
            start: attr("start")
                .and_then(|start| start.trim().parse().ok())
                .unwrap_or(1),
        },
        "li" => NodeKind::ListItem,
        "pre" => NodeKind::CodeBlock { language: None },
        _ => return None,
    };
    Some(kind)
}

fn inline_mark(name: &str, attr: impl Fn(&str) -> Option<String>) -> Option<Mark> {
    match name {
        "strong" | "b" => Some(Mark::Bold),
        "em" | "i" => Some(Mark::Italic),
        "code" => Some(Mark::Code),
        "s" | "strike" | "del" => Some(Mark::Strike),
        "u" => Some(Mark::Underline),
        "a" => attr("href").map(|href| Mark::Link {
            href,
            target: attr("target"),
        }),
        _ => None,
    }
}

/// Turn line breaks in the source, with the whitespace around them, into
/// single spaces. Returns the text and whether it started or ended with
/// such a break.
fn collapse_breaks(text: &str) -> (String, bool, bool) {
    fn flush(run: &mut String, out: &mut String) -> bool {
        let is_break = run.contains(['\n', '\r']);
        if is_break {
            out.push(' ');
        } else {
            out.push_str(run);
        }
        run.clear();
        is_break
    }

    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    let mut leading = false;
    let mut at_start = true;

    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            run.push(ch);
            continue;
        }
        if !run.is_empty() {
            leading |= flush(&mut run, &mut out) && at_start;
        }
        at_start = false;
        out.push(ch);
    }

    let mut trailing = false;
    if !run.is_empty() {
        trailing = flush(&mut run, &mut out);
        leading |= trailing && at_start;
    }
    (out, leading, trailing)
}

enum Entry {
    Block,
    /// Block-level wrapper without a node of its own
    Boundary,
    Inline(Option<Mark>),
    Skip,
}

struct Open {
    name: String,
    entry: Entry,
}

struct Frame {
    kind: NodeKind,
    content: Vec<Node>,
    /// Opened for stray inline content rather than by a tag
    implicit: bool,
    /// The last text pushed ended with a source line break
    trailing_break: bool,
}

impl Frame {
    fn new(kind: NodeKind, implicit: bool) -> Self {
        Self {
            kind,
            content: Vec::new(),
            implicit,
            trailing_break: false,
        }
    }

    fn finish(mut self) -> Node {
        if self.kind.is_textblock() {
            if self.trailing_break
                && let Some(Node::Text(run)) = self.content.last_mut()
                && run.text.ends_with(' ')
            {
                run.text.pop();
            }
            inline::normalize(&mut self.content);
        }
        Node::element(self.kind, self.content)
    }
}

#[derive(Default)]
struct HtmlParser {
    root: Vec<Node>,
    frames: Vec<Frame>,
    open: Vec<Open>,
}

impl HtmlParser {
    fn push_node(&mut self, node: Node) {
        match self.frames.last_mut() {
            Some(frame) => frame.content.push(node),
            None => self.root.push(node),
        }
    }

    fn in_textblock(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.kind.is_textblock())
    }

    fn in_code(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| matches!(frame.kind, NodeKind::CodeBlock { .. }))
    }

    fn skipping(&self) -> bool {
        self.open.iter().any(|open| matches!(open.entry, Entry::Skip))
    }

    fn active_marks(&self) -> MarkSet {
        self.open
            .iter()
            .filter_map(|open| match &open.entry {
                Entry::Inline(mark) => mark.clone(),
                _ => None,
            })
            .collect()
    }

    fn ensure_textblock(&mut self) {
        if !self.in_textblock() {
            self.frames.push(Frame::new(NodeKind::Paragraph, true));
        }
    }

    fn close_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            let node = frame.finish();
            self.push_node(node);
        }
    }

    fn close_implicit(&mut self) {
        while self.frames.last().is_some_and(|frame| frame.implicit) {
            self.close_frame();
        }
    }

    fn feed(&mut self, html: &str) {
        let mut reader = Reader::from_str(html);
        reader.check_end_names(false);
        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => self.start(&start, false),
                Ok(Event::Empty(start)) => self.start(&start, true),
                Ok(Event::End(end)) => self.end(&tag_name(end.name().as_ref())),
                Ok(Event::Text(text)) => self.text(&String::from_utf8_lossy(&text)),
                Ok(Event::CData(data)) => self.text(&String::from_utf8_lossy(&data)),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    log::warn!(
                        "stopped reading HTML at byte {}: {err}",
                        reader.buffer_position()
                    );
                    break;
                }
            }
        }
    }

    /// A `<` that does not open a tag, read by the tokenizer as one.
    ///
    /// `raw` is everything between the `<` and the closing `>`. A real tag
    /// starting inside it is parsed again on its own.
    fn stray_tag(&mut self, raw: &str, empty: bool) {
        let close = if empty { "/>" } else { ">" };
        match raw.rfind('<') {
            Some(index) => {
                self.text(&format!("<{}", &raw[..index]));
                self.feed(&format!("{}{close}", &raw[index..]));
            }
            None => self.text(&format!("<{raw}{close}")),
        }
    }

    fn start(&mut self, start: &BytesStart<'_>, empty: bool) {
        if !start.name().as_ref().first().is_some_and(u8::is_ascii_alphabetic) {
            self.stray_tag(&String::from_utf8_lossy(start), empty);
            return;
        }
        let name = tag_name(start.name().as_ref());
        if VOID_ELEMENTS.contains(&name.as_str()) {
            return;
        }
        if self.skipping() {
            if !empty {
                self.open.push(Open { name, entry: Entry::Skip });
            }
            return;
        }

        let attrs = attributes(start);
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.clone())
        };

        let entry = if name == "br" {
            self.hard_break();
            return;
        } else if name == "hr" {
            self.horizontal_rule();
            return;
        } else if SKIPPED_ELEMENTS.contains(&name.as_str()) {
            Entry::Skip
        } else if BOUNDARY_ELEMENTS.contains(&name.as_str()) {
            self.close_implicit();
            Entry::Boundary
        } else if let Some(kind) = block_kind(&name, attr) {
            self.open_block(kind)
        } else if let Some(id) = attr(COMMENT_ID_ATTR) {
            if id.is_empty() {
                log::warn!("dropping <{name}> comment without an id");
                Entry::Inline(None)
            } else {
                let text = attr(COMMENT_TEXT_ATTR).unwrap_or_default();
                Entry::Inline(Some(Mark::comment(id, text)))
            }
        } else if name == "code" && self.in_code() {
            let language = attr("class").and_then(|class| {
                class
                    .split_ascii_whitespace()
                    .find_map(|class| class.strip_prefix("language-").map(str::to_string))
            });
            if let Some(frame) = self.frames.last_mut() {
                frame.kind = NodeKind::CodeBlock { language };
            }
            Entry::Inline(None)
        } else {
            Entry::Inline(inline_mark(&name, attr))
        };

        self.open.push(Open {
            name: name.clone(),
            entry,
        });
        if empty {
            self.end(&name);
        }
    }

    fn open_block(&mut self, kind: NodeKind) -> Entry {
        // Block tags nested in a textblock only contribute their content
        if self.in_textblock() && !self.frames.last().is_some_and(|frame| frame.implicit) {
            return Entry::Inline(None);
        }
        self.close_implicit();
        self.frames.push(Frame::new(kind, false));
        Entry::Block
    }

    fn hard_break(&mut self) {
        if self.in_code() {
            let marks = self.active_marks();
            self.push_node(Node::text("\n", marks));
            return;
        }
        self.ensure_textblock();
        if let Some(frame) = self.frames.last_mut() {
            frame.trailing_break = false;
        }
        self.push_node(Node::hard_break());
    }

    fn horizontal_rule(&mut self) {
        self.close_implicit();
        if !self.in_textblock() {
            self.push_node(Node::element(NodeKind::HorizontalRule, Vec::new()));
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skipping() {
            return;
        }
        let decoded = decode_html_entities(raw);
        let marks = self.active_marks();

        if self.in_code() {
            self.push_node(Node::text(decoded.into_owned(), marks));
            return;
        }
        if !self.in_textblock() && decoded.trim_ascii().is_empty() {
            return;
        }
        self.ensure_textblock();

        let (mut text, leading, trailing) = collapse_breaks(&decoded);
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if leading && frame.content.is_empty() {
            text.remove(0);
        }
        if text.is_empty() {
            return;
        }
        frame.trailing_break = trailing;
        frame.content.push(Node::text(text, marks));
    }

    fn end(&mut self, name: &str) {
        let Some(index) = self.open.iter().rposition(|open| open.name == name) else {
            return;
        };
        while self.open.len() > index {
            if let Some(open) = self.open.pop() {
                self.close_entry(open.entry);
            }
        }
    }

    fn close_entry(&mut self, entry: Entry) {
        match entry {
            Entry::Block => {
                self.close_implicit();
                self.close_frame();
            }
            Entry::Boundary => self.close_implicit(),
            Entry::Inline(_) | Entry::Skip => {}
        }
    }

    fn finish(mut self) -> Document {
        while let Some(open) = self.open.pop() {
            self.close_entry(open.entry);
        }
        while !self.frames.is_empty() {
            self.close_frame();
        }
        Document::new(self.root)
    }
}
