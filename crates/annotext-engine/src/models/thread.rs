use serde::{Deserialize, Serialize};

/// Comment metadata keyed by comment id.
///
/// Mirrors the `text` attribute of a live comment mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub text: String,
}

impl Thread {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Case-insensitive substring match on the thread text
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty() || self.text.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_case_insensitive() {
        let thread = Thread::new("c1", "Check the Spelling");
        assert!(thread.matches("spelling"));
        assert!(thread.matches("CHECK"));
        assert!(!thread.matches("grammar"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(Thread::new("c1", "").matches(""));
    }
}
