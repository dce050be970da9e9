use crate::models::MarkSet;

/// Element node types known to the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Heading { level: u8 },
    Blockquote,
    BulletList,
    OrderedList { start: u32 },
    ListItem,
    CodeBlock { language: Option<String> },
    HorizontalRule, // leaf block
    HardBreak,      // leaf inline
}

impl NodeKind {
    /// Name used in the interchange tree
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList { .. } => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::CodeBlock { .. } => "codeBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::HardBreak => "hardBreak",
        }
    }

    /// Blocks whose content is inline (text runs and hard breaks)
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::CodeBlock { .. }
        )
    }

    /// Nodes without content; they occupy a single position
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::HorizontalRule | NodeKind::HardBreak)
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::HardBreak)
    }
}

/// A run of text sharing one set of marks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::new())
    }

    /// Number of positions this run occupies (one per character)
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// An element with child content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: NodeKind,
    pub content: Vec<Node>,
}

impl Element {
    pub fn new(kind: NodeKind, content: Vec<Node>) -> Self {
        Self { kind, content }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::new(NodeKind::Paragraph, content)
    }

    /// Size of the content between the opening and closing positions
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::size).sum()
    }
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(TextRun),
}

impl Node {
    pub fn text(text: impl Into<String>, marks: MarkSet) -> Self {
        Node::Text(TextRun::new(text, marks))
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Node::Text(TextRun::plain(text))
    }

    pub fn element(kind: NodeKind, content: Vec<Node>) -> Self {
        Node::Element(Element::new(kind, content))
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Element(Element::paragraph(content))
    }

    pub fn hard_break() -> Self {
        Node::element(NodeKind::HardBreak, Vec::new())
    }

    /// Number of positions the node occupies in its parent
    pub fn size(&self) -> usize {
        match self {
            Node::Text(run) => run.len(),
            Node::Element(element) if element.kind.is_leaf() => 1,
            Node::Element(element) => element.content_size() + 2,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Element(_) => None,
        }
    }

    /// Marks carried by the node; only text runs carry marks
    pub fn marks(&self) -> Option<&MarkSet> {
        self.as_text().map(|run| &run.marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_follow_token_convention() {
        let paragraph = Node::paragraph(vec![Node::plain("Hello"), Node::hard_break()]);
        assert_eq!(paragraph.size(), 5 + 1 + 2);

        let rule = Node::element(NodeKind::HorizontalRule, Vec::new());
        assert_eq!(rule.size(), 1);

        let quote = Node::element(NodeKind::Blockquote, vec![paragraph]);
        assert_eq!(quote.size(), 10);
    }

    #[test]
    fn test_text_run_len_counts_characters() {
        let run = TextRun::plain("héllo 🦀");
        assert_eq!(run.len(), 7);
    }

    #[test]
    fn test_textblock_classification() {
        assert!(NodeKind::Paragraph.is_textblock());
        assert!(NodeKind::Heading { level: 2 }.is_textblock());
        assert!(NodeKind::CodeBlock { language: None }.is_textblock());
        assert!(!NodeKind::Blockquote.is_textblock());
        assert!(!NodeKind::HardBreak.is_textblock());
    }
}
