use std::ops::Range;

use uuid::Uuid;

use crate::comment::{CommentClickHook, ElementAttributes};
use crate::editing::{
    Cmd, CommentRange, Document, EditError, Mode, Patch, Rejection, Transaction, compile_command,
    filter_transaction, next_comment, prev_comment,
};
use crate::models::Thread;
use crate::serialize::InterchangeError;
use crate::storage::{MemoryStorage, Storage, StorageError};
use crate::threads::{hydrate_threads, reconcile_threads, search_threads};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of dispatching an edit
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Applied(Patch),
    /// Refused by the mode guard; nothing changed
    Rejected(Rejection),
    /// Nothing to apply (selection-only or no-op edit)
    Unchanged,
}

impl Dispatch {
    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied(_))
    }
}

/// One open document with its mode, store and click hook.
///
/// Every edit goes through [`EditorSession::dispatch_transaction`]: the mode
/// guard runs first, then the transaction is applied, the document saved,
/// and orphaned threads pruned.
#[derive(Debug)]
pub struct EditorSession<S: Storage = MemoryStorage, E = ()> {
    document: Document,
    mode: Mode,
    storage: S,
    click_hook: CommentClickHook<E>,
}

impl<S: Storage> EditorSession<S> {
    pub fn open(storage: S, mode: Mode) -> Result<Self, SessionError> {
        Self::open_with_hook(storage, mode, CommentClickHook::new())
    }
}

impl<S: Storage, E> EditorSession<S, E> {
    /// Load the stored document, create threads for comments that lack one
    /// and prune threads without a comment
    pub fn open_with_hook(
        mut storage: S,
        mode: Mode,
        click_hook: CommentClickHook<E>,
    ) -> Result<Self, SessionError> {
        let document = Document::from_json(&storage.load_document()?)?;
        hydrate_threads(&document, &mut storage)?;
        reconcile_threads(&document, &mut storage)?;
        log::info!(
            "Opened document with {} comment(s) in {mode} mode",
            document.comment_ids().len()
        );
        Ok(Self {
            document,
            mode,
            storage,
            click_hook,
        })
    }

    /// End the session, handing back the store
    pub fn close(self) -> S {
        log::debug!("Closing session at version {}", self.document.version());
        self.storage
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::info!("Mode changed from {} to {mode}", self.mode);
            self.mode = mode;
        }
    }

    pub fn selection(&self) -> Range<usize> {
        self.document.selection()
    }

    pub fn set_selection(&mut self, selection: Range<usize>) {
        self.document.set_selection(selection);
    }

    pub fn click_hook_mut(&mut self) -> &mut CommentClickHook<E> {
        &mut self.click_hook
    }

    pub fn dispatch(&mut self, cmd: &Cmd) -> Result<Dispatch, SessionError> {
        let tr = compile_command(&self.document, cmd)?;
        self.dispatch_transaction(&tr)
    }

    /// Guard, apply, save, reconcile
    pub fn dispatch_transaction(&mut self, tr: &Transaction) -> Result<Dispatch, SessionError> {
        if let Err(rejection) = filter_transaction(self.mode, tr) {
            log::debug!("Rejected transaction in {} mode: {rejection}", self.mode);
            return Ok(Dispatch::Rejected(rejection));
        }
        if !tr.doc_changed() {
            if let Some(selection) = tr.selection() {
                self.document.set_selection(selection);
            }
            return Ok(Dispatch::Unchanged);
        }

        let patch = self.document.apply(tr)?;
        self.storage.save_document(self.document.to_json())?;
        reconcile_threads(&self.document, &mut self.storage)?;
        Ok(Dispatch::Applied(patch))
    }

    /// Comment the current selection with a fresh id.
    ///
    /// Returns the new id, or `None` when the selection is empty, the text
    /// is blank or the mode refused the edit.
    pub fn add_comment(&mut self, text: &str) -> Result<Option<String>, SessionError> {
        let id = Uuid::new_v4().to_string();
        let outcome = self.add_comment_with_id(&id, text)?;
        Ok(outcome.is_applied().then_some(id))
    }

    /// Comment the current selection with a caller-chosen id.
    ///
    /// The thread is stored only once the mark is applied.
    pub fn add_comment_with_id(&mut self, id: &str, text: &str) -> Result<Dispatch, SessionError> {
        let selection = self.selection();
        if selection.is_empty() || text.trim().is_empty() {
            return Ok(Dispatch::Unchanged);
        }
        let outcome = self.dispatch(&Cmd::SetComment {
            range: selection,
            id: id.to_string(),
            text: text.to_string(),
        })?;
        if outcome.is_applied() {
            self.storage.upsert_thread(Thread::new(id, text))?;
            log::info!("Added comment {id}");
        }
        Ok(outcome)
    }

    /// Detach comments from the selected text.
    ///
    /// A comment reaching past the selection keeps its marks outside it,
    /// possibly as two fragments sharing one id.
    pub fn remove_comment_on_selection(&mut self) -> Result<Dispatch, SessionError> {
        let range = self.selection();
        self.dispatch(&Cmd::UnsetComment { range })
    }

    /// Mark a comment as solved: detach it and drop its thread.
    ///
    /// The thread survives when the mode refuses the detach.
    pub fn resolve_comment(&mut self, id: &str) -> Result<Dispatch, SessionError> {
        let outcome = match self.document.comment_range_for_id(id) {
            Some(target) => self.detach(&target)?,
            None => Dispatch::Unchanged,
        };
        if !matches!(outcome, Dispatch::Rejected(_)) {
            self.storage.delete_thread(id)?;
            log::info!("Resolved comment {id}");
        }
        Ok(outcome)
    }

    /// Delete/Backspace inside a comment while typing: remove the whole
    /// comment around the cursor and its thread.
    ///
    /// Only active in [`Mode::StudentInput`]. Returns the removed range.
    pub fn delete_comment_at_cursor(&mut self) -> Result<Option<CommentRange>, SessionError> {
        if self.mode != Mode::StudentInput {
            return Ok(None);
        }
        let Some(target) = self.document.comment_range_near(self.selection().start) else {
            return Ok(None);
        };
        if !self.detach(&target)?.is_applied() {
            return Ok(None);
        }
        self.storage.delete_thread(&target.id)?;
        Ok(Some(target))
    }

    fn detach(&mut self, target: &CommentRange) -> Result<Dispatch, SessionError> {
        let tr = compile_command(&self.document, &Cmd::UnsetComment { range: target.range() })?
            .with_selection(target.range());
        self.dispatch_transaction(&tr)
    }

    /// Select the comment with `id`
    pub fn focus_comment(&mut self, id: &str) -> Option<CommentRange> {
        let target = self.document.comment_range_for_id(id)?;
        self.document.set_selection(target.range());
        Some(target)
    }

    /// Select the next comment after the selection start, wrapping around
    pub fn next_comment(&mut self) -> Option<CommentRange> {
        let ranges = self.document.comment_ranges();
        let target = next_comment(&ranges, self.selection().start)?.clone();
        self.document.set_selection(target.range());
        Some(target)
    }

    /// Select the comment before the selection start, wrapping around
    pub fn prev_comment(&mut self) -> Option<CommentRange> {
        let ranges = self.document.comment_ranges();
        let target = prev_comment(&ranges, self.selection().start)?.clone();
        self.document.set_selection(target.range());
        Some(target)
    }

    /// Number of distinct comment ids in the document
    pub fn comment_count(&self) -> usize {
        self.document.comment_ids().len()
    }

    pub fn comment_ranges(&self) -> Vec<CommentRange> {
        self.document.comment_ranges()
    }

    pub fn threads(&self) -> Result<Vec<Thread>, SessionError> {
        Ok(self.storage.list_threads()?)
    }

    pub fn search_threads(&self, query: &str) -> Result<Vec<Thread>, SessionError> {
        let threads = self.threads()?;
        Ok(search_threads(&threads, query).cloned().collect())
    }

    /// Forward a click to the comment hook; never claims the event
    pub fn click<'p, A>(&mut self, path: impl IntoIterator<Item = &'p A>, event: &E) -> bool
    where
        A: ElementAttributes + ?Sized + 'p,
    {
        self.click_hook.handle_click(path, event)
    }
}
