use indexmap::IndexMap;

use crate::models::Thread;
use crate::serialize::JsonNode;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Sink for the document tree and the comment threads.
///
/// Last write wins; no transactional guarantees are expected.
pub trait Storage {
    fn load_document(&self) -> Result<JsonNode, StorageError>;
    fn save_document(&mut self, doc: JsonNode) -> Result<(), StorageError>;
    /// Threads in insertion order
    fn list_threads(&self) -> Result<Vec<Thread>, StorageError>;
    fn upsert_thread(&mut self, thread: Thread) -> Result<(), StorageError>;
    fn delete_thread(&mut self, id: &str) -> Result<(), StorageError>;
}

/// In-memory store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStorage {
    document: JsonNode,
    threads: IndexMap<String, Thread>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: JsonNode) -> Self {
        Self {
            document,
            threads: IndexMap::new(),
        }
    }

    pub fn with_threads(mut self, threads: impl IntoIterator<Item = Thread>) -> Self {
        for thread in threads {
            self.threads.insert(thread.id.clone(), thread);
        }
        self
    }

    pub fn document(&self) -> &JsonNode {
        &self.document
    }
}

impl Storage for MemoryStorage {
    fn load_document(&self) -> Result<JsonNode, StorageError> {
        Ok(self.document.clone())
    }

    fn save_document(&mut self, doc: JsonNode) -> Result<(), StorageError> {
        self.document = doc;
        Ok(())
    }

    fn list_threads(&self) -> Result<Vec<Thread>, StorageError> {
        Ok(self.threads.values().cloned().collect())
    }

    fn upsert_thread(&mut self, thread: Thread) -> Result<(), StorageError> {
        // Replacing keeps the original position
        self.threads.insert(thread.id.clone(), thread);
        Ok(())
    }

    fn delete_thread(&mut self, id: &str) -> Result<(), StorageError> {
        self.threads.shift_remove(id);
        Ok(())
    }
}
