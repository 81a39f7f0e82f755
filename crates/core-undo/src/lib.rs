//! Linear undo/redo history.
//!
//! The engine is domain-agnostic: it stores entries implementing [`Command`]
//! and a cursor `index` into them. Entries `[0, index)` are done and can be
//! undone; entries `[index, count)` were undone and can be redone. Recording a
//! fresh entry after one or more undos discards the redo tail.
//!
//! Each entry must describe an exact inverse pair: `redo` after `undo` (or the
//! reverse) restores the prior state of the target. The engine does not check
//! this.
//!
//! Telemetry: history changes emit trace events under the `undo` target
//! (`history_add`, `redo_tail_truncated`, `history_trimmed`, `undo_apply`,
//! `redo_apply`).

use std::fmt;

use tracing::{debug, trace};

mod fn_command;

pub use fn_command::{FnCommand, FnCommandBuilder};

/// Errors raised while assembling history entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UndoError {
    /// One side of an undo/redo pair was never supplied.
    #[error("missing {0} action")]
    MissingAction(&'static str),
}

/// A reversible history entry operating on a `Target`.
pub trait Command {
    type Target: ?Sized;
    type Error;

    /// Restore the state that existed before this entry was applied.
    fn undo(&self, target: &mut Self::Target) -> Result<(), Self::Error>;

    /// Re-apply this entry.
    fn redo(&self, target: &mut Self::Target) -> Result<(), Self::Error>;

    /// Short label for menus and logs.
    fn description(&self) -> String {
        String::from("edit")
    }
}

pub struct UndoEngine<C> {
    history: Vec<C>,
    index: usize,
    limit: Option<usize>,
}

impl<C> Default for UndoEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for UndoEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoEngine")
            .field("count", &self.history.len())
            .field("index", &self.index)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<C> UndoEngine<C> {
    /// Unbounded history.
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            index: 0,
            limit: None,
        }
    }

    /// History keeping at most `limit` entries; `None` is unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::new()
        }
    }

    /// Total recorded entries (done + undone).
    pub fn count(&self) -> usize {
        self.history.len()
    }

    /// Number of entries that can still be undone.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.history.len()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Change the retention limit, trimming the oldest entries if needed.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Entry the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&C> {
        self.index.checked_sub(1).map(|i| &self.history[i])
    }

    /// Entry the next `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&C> {
        self.history.get(self.index)
    }

    /// Record a new entry at the cursor, discarding any redo tail.
    pub fn add(&mut self, entry: C) {
        if self.index < self.history.len() {
            let dropped = self.history.len() - self.index;
            self.history.truncate(self.index);
            debug!(target: "undo", dropped, "redo_tail_truncated");
        }
        self.history.push(entry);
        self.index += 1;
        self.enforce_limit();
        trace!(target: "undo", count = self.history.len(), index = self.index, "history_add");
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.index = 0;
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
            self.index = self.index.saturating_sub(excess);
            debug!(target: "undo", excess, limit, "history_trimmed");
        }
    }

    /// Revert the most recent done entry. Returns `Ok(false)` when there is
    /// nothing to undo. If the entry fails, the cursor is left unchanged.
    pub fn undo(&mut self, target: &mut C::Target) -> Result<bool, C::Error>
    where
        C: Command,
    {
        if !self.can_undo() {
            return Ok(false);
        }
        self.index -= 1;
        if let Err(e) = self.history[self.index].undo(target) {
            self.index += 1;
            return Err(e);
        }
        trace!(target: "undo", count = self.history.len(), index = self.index, "undo_apply");
        Ok(true)
    }

    /// Re-apply the most recently undone entry. Returns `Ok(false)` when there
    /// is nothing to redo. If the entry fails, the cursor is left unchanged.
    pub fn redo(&mut self, target: &mut C::Target) -> Result<bool, C::Error>
    where
        C: Command,
    {
        if !self.can_redo() {
            return Ok(false);
        }
        self.history[self.index].redo(target)?;
        self.index += 1;
        trace!(target: "undo", count = self.history.len(), index = self.index, "redo_apply");
        Ok(true)
    }

    pub fn undo_description(&self) -> Option<String>
    where
        C: Command,
    {
        self.peek_undo().map(|entry| entry.description())
    }

    pub fn redo_description(&self) -> Option<String>
    where
        C: Command,
    {
        self.peek_redo().map(|entry| entry.description())
    }
}
