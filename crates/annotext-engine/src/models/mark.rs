use serde::{Deserialize, Serialize};

/// Attributes carried by a comment mark
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentAttrs {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl CommentAttrs {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Mark types known to the schema, in rank order.
///
/// The rank decides the order marks are stored in a [`MarkSet`] and the
/// nesting order when rendering (lower rank wraps higher rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkKind {
    Bold,
    Code,
    Italic,
    Strike,
    Underline,
    Link,
    Comment,
}

impl MarkKind {
    pub const ALL: [MarkKind; 7] = [
        MarkKind::Bold,
        MarkKind::Code,
        MarkKind::Italic,
        MarkKind::Strike,
        MarkKind::Underline,
        MarkKind::Link,
        MarkKind::Comment,
    ];

    /// Name used in the interchange tree
    pub fn type_name(self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Code => "code",
            MarkKind::Italic => "italic",
            MarkKind::Strike => "strike",
            MarkKind::Underline => "underline",
            MarkKind::Link => "link",
            MarkKind::Comment => "comment",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(MarkKind::Bold),
            "code" => Some(MarkKind::Code),
            "italic" => Some(MarkKind::Italic),
            "strike" => Some(MarkKind::Strike),
            "underline" => Some(MarkKind::Underline),
            "link" => Some(MarkKind::Link),
            "comment" => Some(MarkKind::Comment),
            _ => None,
        }
    }

    /// Whether text typed at the edge of a span carrying this mark inherits it.
    ///
    /// Comments must not creep when someone types next to them.
    pub fn inclusive(self) -> bool {
        !matches!(self, MarkKind::Comment | MarkKind::Link)
    }

    /// The mark value for kinds that carry no attributes
    pub fn plain_mark(self) -> Option<Mark> {
        match self {
            MarkKind::Bold => Some(Mark::Bold),
            MarkKind::Code => Some(Mark::Code),
            MarkKind::Italic => Some(Mark::Italic),
            MarkKind::Strike => Some(Mark::Strike),
            MarkKind::Underline => Some(Mark::Underline),
            MarkKind::Link | MarkKind::Comment => None,
        }
    }
}

/// A formatting or semantic tag attached to a run of text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Code,
    Italic,
    Strike,
    Underline,
    Link {
        href: String,
        target: Option<String>,
    },
    Comment(CommentAttrs),
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Code => MarkKind::Code,
            Mark::Italic => MarkKind::Italic,
            Mark::Strike => MarkKind::Strike,
            Mark::Underline => MarkKind::Underline,
            Mark::Link { .. } => MarkKind::Link,
            Mark::Comment(_) => MarkKind::Comment,
        }
    }

    pub fn comment(id: impl Into<String>, text: impl Into<String>) -> Self {
        Mark::Comment(CommentAttrs::new(id, text))
    }

    pub fn as_comment(&self) -> Option<&CommentAttrs> {
        match self {
            Mark::Comment(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// Ordered set of marks on a text run.
///
/// Holds at most one mark per [`MarkKind`], sorted by rank. Every kind
/// excludes itself, so inserting a mark replaces any mark of the same kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.iter().any(|m| m == mark)
    }

    pub fn has_kind(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind() == kind)
    }

    /// The comment carried by this run, if any
    pub fn comment(&self) -> Option<&CommentAttrs> {
        self.get(MarkKind::Comment).and_then(Mark::as_comment)
    }

    /// Insert a mark, replacing a mark of the same kind.
    ///
    /// Returns `true` when the set changed.
    pub fn insert(&mut self, mark: Mark) -> bool {
        let kind = mark.kind();
        match self.0.binary_search_by(|m| m.kind().cmp(&kind)) {
            Ok(index) if self.0[index] == mark => false,
            Ok(index) => {
                self.0[index] = mark;
                true
            }
            Err(index) => {
                self.0.insert(index, mark);
                true
            }
        }
    }

    /// Remove the mark of the given kind. Returns `true` when one was present.
    pub fn remove_kind(&mut self, kind: MarkKind) -> bool {
        let before = self.0.len();
        self.0.retain(|m| m.kind() != kind);
        before != self.0.len()
    }

    /// Drop every mark for which `keep` returns false
    pub fn retain(&mut self, keep: impl FnMut(&Mark) -> bool) {
        self.0.retain(keep);
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<T: IntoIterator<Item = Mark>>(iter: T) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
