//! Interchange tree (JSON) and HTML codecs for [`Document`](crate::editing::Document)

pub mod html;
pub mod json;

pub use html::parse_html;
pub use json::{InterchangeError, JsonMark, JsonNode};
