use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::Document;
use crate::serialize::InterchangeError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: InterchangeError,
    },
}

fn read_file(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

/// Read a document stored as an interchange JSON tree
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    let content = read_file(path)?;
    Document::from_json_str(&content).map_err(|source| IoError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a document as an interchange JSON tree
pub fn write_document(path: &Path, doc: &Document) -> Result<(), IoError> {
    let json = doc
        .to_json_string()
        .map_err(|source| IoError::InvalidDocument {
            path: path.to_path_buf(),
            source,
        })?;
    write_file(path, &json)
}

/// Read an HTML file; malformed markup never fails the read
pub fn read_html(path: &Path) -> Result<Document, IoError> {
    let content = read_file(path)?;
    Ok(Document::from_html(&content))
}

pub fn write_html(path: &Path, doc: &Document) -> Result<(), IoError> {
    write_file(path, &doc.to_html())
}
