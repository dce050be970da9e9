//! Keeps stored threads in step with the comments present in the document.

use std::collections::HashSet;

use crate::editing::Document;
use crate::models::Thread;
use crate::storage::{Storage, StorageError};

/// Delete every stored thread whose id no longer appears on any comment.
///
/// Returns the ids that were removed. Running it twice without a document
/// change in between removes nothing the second time.
pub fn reconcile_threads<S: Storage + ?Sized>(
    doc: &Document,
    storage: &mut S,
) -> Result<Vec<String>, StorageError> {
    let live = doc.comment_ids();
    let mut pruned = Vec::new();
    for thread in storage.list_threads()? {
        if !live.contains(&thread.id) {
            storage.delete_thread(&thread.id)?;
            pruned.push(thread.id);
        }
    }
    if !pruned.is_empty() {
        log::debug!("pruned {} orphaned thread(s): {:?}", pruned.len(), pruned);
    }
    Ok(pruned)
}

/// Store a thread for every comment in `doc` that has none yet.
///
/// The thread text is taken from the first span of the comment.
pub fn hydrate_threads<S: Storage + ?Sized>(
    doc: &Document,
    storage: &mut S,
) -> Result<Vec<String>, StorageError> {
    let mut known: HashSet<String> = storage
        .list_threads()?
        .into_iter()
        .map(|thread| thread.id)
        .collect();
    let mut added = Vec::new();
    for range in doc.comment_ranges() {
        if known.insert(range.id.clone()) {
            storage.upsert_thread(Thread::new(range.id.clone(), range.text))?;
            added.push(range.id);
        }
    }
    if !added.is_empty() {
        log::debug!("created {} missing thread(s)", added.len());
    }
    Ok(added)
}

/// Threads whose text contains `query`, ignoring case
pub fn search_threads<'a>(threads: &'a [Thread], query: &'a str) -> impl Iterator<Item = &'a Thread> {
    threads.iter().filter(move |thread| thread.matches(query))
}
