//! Rendered form of comment marks and click interception.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use indexmap::IndexMap;

/// Attribute holding the comment id on the rendered element
pub const COMMENT_ID_ATTR: &str = "data-comment-id";
/// Attribute holding the comment text on the rendered element
pub const COMMENT_TEXT_ATTR: &str = "data-comment-text";
pub const COMMENT_CLASS: &str = "comment-mark";

/// Attribute lookup on a rendered element
pub trait ElementAttributes {
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl ElementAttributes for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ElementAttributes for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ElementAttributes for IndexMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Payload reported when a click lands on a comment
#[derive(Debug, Clone, PartialEq)]
pub struct CommentClick<'a, E> {
    pub id: String,
    pub text: String,
    /// The native event, untouched
    pub event: &'a E,
}

type ClickCallback<E> = Box<dyn FnMut(CommentClick<'_, E>)>;

/// Observes clicks on rendered comments.
///
/// The hook never changes the document and never claims the event:
/// [`CommentClickHook::handle_click`] always returns `false` so the host
/// keeps its default handling.
pub struct CommentClickHook<E> {
    callback: Option<ClickCallback<E>>,
}

impl<E> Default for CommentClickHook<E> {
    fn default() -> Self {
        Self { callback: None }
    }
}

impl<E> fmt::Debug for CommentClickHook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentClickHook")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl<E> CommentClickHook<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: impl FnMut(CommentClick<'_, E>) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn set_callback(&mut self, callback: impl FnMut(CommentClick<'_, E>) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Report a click to the callback.
    ///
    /// `path` is the hit element followed by its ancestors; the closest one
    /// with a non-empty comment id wins. A missing text attribute reports
    /// an empty text.
    pub fn handle_click<'p, A>(&mut self, path: impl IntoIterator<Item = &'p A>, event: &E) -> bool
    where
        A: ElementAttributes + ?Sized + 'p,
    {
        let Some(callback) = self.callback.as_mut() else {
            return false;
        };
        let hit = path.into_iter().find_map(|element| {
            element
                .attribute(COMMENT_ID_ATTR)
                .filter(|id| !id.is_empty())
                .map(|id| (id, element.attribute(COMMENT_TEXT_ATTR).unwrap_or_default()))
        });
        if let Some((id, text)) = hit {
            log::debug!("comment {id} clicked");
            callback(CommentClick {
                id: id.to_string(),
                text: text.to_string(),
                event,
            });
        }
        false
    }
}
