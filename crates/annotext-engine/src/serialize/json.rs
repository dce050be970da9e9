use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::editing::{Document, inline};
use crate::models::{CommentAttrs, Element, Mark, MarkKind, MarkSet, Node, NodeKind};

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("invalid interchange JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a 'doc' node at the root, found '{0}'")]
    NotADocument(String),
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),
    #[error("unknown mark type '{0}'")]
    UnknownMarkType(String),
    #[error("'{child}' is not allowed inside '{parent}'")]
    InvalidContent {
        parent: &'static str,
        child: &'static str,
    },
}

/// Node of the interchange tree: `{type, attrs?, content?, marks?, text?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<JsonNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<JsonMark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl JsonNode {
    fn new(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            attrs: None,
            content: None,
            marks: None,
            text: None,
        }
    }

    /// Root of an empty document
    pub fn empty_doc() -> Self {
        Document::default().to_json()
    }

    fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(name))
    }
}

impl Default for JsonNode {
    fn default() -> Self {
        Self::empty_doc()
    }
}

fn attrs(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

impl Document {
    pub fn to_json(&self) -> JsonNode {
        JsonNode {
            content: Some(self.blocks.iter().map(node_to_json).collect()),
            ..JsonNode::new("doc")
        }
    }

    /// Build a document from the interchange tree.
    ///
    /// Comment marks without a usable id are dropped with a warning; the rest
    /// of the document still loads.
    pub fn from_json(root: &JsonNode) -> Result<Self, InterchangeError> {
        if root.node_type != "doc" {
            return Err(InterchangeError::NotADocument(root.node_type.clone()));
        }
        let blocks = root
            .content
            .iter()
            .flatten()
            .map(|child| {
                let node = node_from_json(child)?;
                check_child("doc", false, &node)?;
                Ok(node)
            })
            .collect::<Result<Vec<_>, InterchangeError>>()?;
        Ok(Self::new(blocks))
    }

    pub fn from_json_str(json: &str) -> Result<Self, InterchangeError> {
        let root: JsonNode = serde_json::from_str(json)?;
        Self::from_json(&root)
    }

    pub fn to_json_string(&self) -> Result<String, InterchangeError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }
}

fn node_to_json(node: &Node) -> JsonNode {
    match node {
        Node::Text(run) => JsonNode {
            text: Some(run.text.clone()),
            marks: (!run.marks.is_empty()).then(|| run.marks.iter().map(mark_to_json).collect()),
            ..JsonNode::new("text")
        },
        Node::Element(element) => {
            let node_attrs = match &element.kind {
                NodeKind::Heading { level } => attrs(json!({ "level": level })),
                NodeKind::OrderedList { start } => attrs(json!({ "start": start })),
                NodeKind::CodeBlock { language } => attrs(json!({ "language": language })),
                _ => None,
            };
            JsonNode {
                attrs: node_attrs,
                content: (!element.content.is_empty())
                    .then(|| element.content.iter().map(node_to_json).collect()),
                ..JsonNode::new(element.kind.type_name())
            }
        }
    }
}

fn mark_to_json(mark: &Mark) -> JsonMark {
    let mark_attrs = match mark {
        Mark::Link { href, target } => attrs(json!({ "href": href, "target": target })),
        Mark::Comment(CommentAttrs { id, text }) => attrs(json!({ "id": id, "text": text })),
        _ => None,
    };
    JsonMark {
        mark_type: mark.kind().type_name().to_string(),
        attrs: mark_attrs,
    }
}

fn kind_from_json(node: &JsonNode) -> Result<NodeKind, InterchangeError> {
    let kind = match node.node_type.as_str() {
        "paragraph" => NodeKind::Paragraph,
        "heading" => {
            let level = node
                .attr("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            NodeKind::Heading { level: level as u8 }
        }
        "blockquote" => NodeKind::Blockquote,
        "bulletList" => NodeKind::BulletList,
        "orderedList" => NodeKind::OrderedList {
            start: node
                .attr("start")
                .and_then(Value::as_u64)
                .and_then(|start| u32::try_from(start).ok())
                .unwrap_or(1),
        },
        "listItem" => NodeKind::ListItem,
        "codeBlock" => NodeKind::CodeBlock {
            language: node
                .attr("language")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "horizontalRule" => NodeKind::HorizontalRule,
        "hardBreak" => NodeKind::HardBreak,
        other => return Err(InterchangeError::UnknownNodeType(other.to_string())),
    };
    Ok(kind)
}

fn node_from_json(node: &JsonNode) -> Result<Node, InterchangeError> {
    if node.node_type == "text" {
        let marks = node
            .marks
            .iter()
            .flatten()
            .map(mark_from_json)
            .filter_map(Result::transpose)
            .collect::<Result<MarkSet, _>>()?;
        return Ok(Node::text(node.text.clone().unwrap_or_default(), marks));
    }

    let kind = kind_from_json(node)?;
    if kind.is_leaf() {
        return Ok(Node::element(kind, Vec::new()));
    }

    let textblock = kind.is_textblock();
    let mut content = Vec::new();
    for child in node.content.iter().flatten() {
        let child = node_from_json(child)?;
        check_child(kind.type_name(), textblock, &child)?;
        content.push(child);
    }
    if textblock {
        inline::normalize(&mut content);
    }
    Ok(Node::Element(Element::new(kind, content)))
}

/// Textblocks hold inline nodes only, every other parent holds blocks only
fn check_child(parent: &'static str, textblock: bool, child: &Node) -> Result<(), InterchangeError> {
    let inline = match child {
        Node::Text(_) => true,
        Node::Element(element) => element.kind.is_inline(),
    };
    if inline == textblock {
        return Ok(());
    }
    let child = match child {
        Node::Text(_) => "text",
        Node::Element(element) => element.kind.type_name(),
    };
    Err(InterchangeError::InvalidContent { parent, child })
}

/// Parse one mark; `Ok(None)` for a malformed comment, which is dropped
fn mark_from_json(mark: &JsonMark) -> Result<Option<Mark>, InterchangeError> {
    let kind = MarkKind::from_type_name(&mark.mark_type)
        .ok_or_else(|| InterchangeError::UnknownMarkType(mark.mark_type.clone()))?;
    let attr = |name: &str| {
        mark.attrs
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .and_then(Value::as_str)
    };

    let parsed = match kind {
        MarkKind::Link => Some(Mark::Link {
            href: attr("href").unwrap_or_default().to_string(),
            target: attr("target").map(str::to_string),
        }),
        MarkKind::Comment => match attr("id") {
            Some(id) if !id.is_empty() => Some(Mark::comment(id, attr("text").unwrap_or_default())),
            _ => {
                log::warn!("dropping comment mark without an id: {:?}", mark.attrs);
                None
            }
        },
        other => other.plain_mark(),
    };
    Ok(parsed)
}
