//! Editable buffer with linear undo/redo.
//!
//! Every mutator captures the state it is about to destroy, runs the forward
//! edit on the inner buffer and, once that succeeded, records the matching
//! [`BufferEdit`]. A call that fails leaves both the contents and the history
//! untouched. Undo and redo replay recorded edits through the inner buffer,
//! so observers are notified exactly as for direct edits.

use std::ops::Deref;

use core_selection::IndexSelection;
use core_undo::{Command, UndoEngine};
use tracing::trace;

use crate::buffer::{ContentsObserver, EditableBuffer};
use crate::edit::BufferEdit;
use crate::sparse::SparseIndexedValues;
use crate::{BufferError, Element};

#[derive(Debug)]
pub struct UndoableEditableBuffer<T> {
    buffer: EditableBuffer<T>,
    history: UndoEngine<BufferEdit<T>>,
}

impl<T: Element> Default for UndoableEditableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> From<EditableBuffer<T>> for UndoableEditableBuffer<T> {
    fn from(buffer: EditableBuffer<T>) -> Self {
        Self {
            buffer,
            history: UndoEngine::new(),
        }
    }
}

impl<T: Element> Deref for UndoableEditableBuffer<T> {
    type Target = EditableBuffer<T>;

    fn deref(&self) -> &EditableBuffer<T> {
        &self.buffer
    }
}

impl<T: Element> UndoableEditableBuffer<T> {
    pub fn new() -> Self {
        Self::from(EditableBuffer::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(EditableBuffer::with_capacity(capacity))
    }

    pub fn from_slice(items: &[T]) -> Self {
        Self::from(EditableBuffer::from_slice(items))
    }

    /// Keep at most `limit` history entries; `None` is unbounded.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history.set_limit(limit);
        self
    }

    pub fn history(&self) -> &UndoEngine<BufferEdit<T>> {
        &self.history
    }

    pub fn into_inner(self) -> EditableBuffer<T> {
        self.buffer
    }

    pub fn subscribe(&mut self, observer: impl ContentsObserver + 'static) {
        self.buffer.subscribe(observer);
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), BufferError> {
        self.buffer.set_capacity(capacity)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_count(&self) -> usize {
        self.history.count()
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    /// Forget all recorded edits. Contents are kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Revert the latest edit. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, BufferError> {
        self.history.undo(&mut self.buffer)
    }

    /// Re-apply the latest undone edit. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, BufferError> {
        self.history.redo(&mut self.buffer)
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), BufferError> {
        let old = self.buffer.get(index)?;
        self.apply(BufferEdit::Set {
            index,
            old,
            new: value,
        })
    }

    pub fn push(&mut self, value: T) {
        let index = self.buffer.len();
        self.buffer.push(value);
        self.record(BufferEdit::Insert { index, value });
    }

    pub fn extend_from(&mut self, items: &[T]) {
        let index = self.buffer.len();
        self.buffer.extend_from(items);
        self.record(BufferEdit::InsertRange {
            index,
            items: items.to_vec(),
        });
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<(), BufferError> {
        self.apply(BufferEdit::Insert { index, value })
    }

    pub fn insert_range(&mut self, index: usize, items: &[T]) -> Result<(), BufferError> {
        self.apply(BufferEdit::InsertRange {
            index,
            items: items.to_vec(),
        })
    }

    pub fn insert_self(&mut self, index: usize) -> Result<(), BufferError> {
        let count = self.buffer.len();
        self.apply(BufferEdit::InsertSelf { index, count })
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, BufferError> {
        let value = self.buffer.get(index)?;
        self.apply(BufferEdit::RemoveAt { index, value })?;
        Ok(value)
    }

    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<(), BufferError> {
        let items = self.buffer.to_vec_range(index, count)?;
        self.apply(BufferEdit::RemoveRange { index, items })
    }

    pub fn remove_item(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.buffer.index_of(item) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    pub fn set_range(&mut self, index: usize, items: &[T]) -> Result<(), BufferError> {
        let old = self.buffer.to_vec_range(index, items.len())?;
        self.apply(BufferEdit::SetRange {
            index,
            old,
            new: items.to_vec(),
        })
    }

    /// In-place edit through a slice callback, recorded as a full overwrite.
    pub fn write_with<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R {
        let old = self.buffer.to_vec();
        let result = self.buffer.write_with(f);
        let new = self.buffer.to_vec();
        self.record(BufferEdit::SetRange { index: 0, old, new });
        result
    }

    pub fn clear(&mut self) {
        let items = self.buffer.to_vec();
        self.buffer.clear();
        self.record(BufferEdit::Clear { items });
    }

    pub fn clear_selection(&mut self, selection: &IndexSelection) -> Result<(), BufferError> {
        self.transform_selection(selection, |_| T::default())
    }

    pub fn transform_selection(
        &mut self,
        selection: &IndexSelection,
        f: impl FnMut(T) -> T,
    ) -> Result<(), BufferError> {
        let old = self.buffer.snapshot(selection)?;
        let new = old.map(f);
        self.apply(BufferEdit::WriteSelection { old, new })
    }

    pub fn write_selection(&mut self, values: &SparseIndexedValues<T>) -> Result<(), BufferError> {
        let old = self.buffer.snapshot(values.selection())?;
        self.apply(BufferEdit::WriteSelection {
            old,
            new: values.clone(),
        })
    }

    pub fn insert_selection(
        &mut self,
        values: &SparseIndexedValues<T>,
    ) -> Result<(), BufferError> {
        self.apply(BufferEdit::InsertSelection {
            values: values.clone(),
        })
    }

    pub fn remove_selection(&mut self, selection: &IndexSelection) -> Result<(), BufferError> {
        let values = self.buffer.snapshot(selection)?;
        self.apply(BufferEdit::RemoveSelection { values })
    }

    fn apply(&mut self, edit: BufferEdit<T>) -> Result<(), BufferError> {
        edit.redo(&mut self.buffer)?;
        self.record(edit);
        Ok(())
    }

    fn record(&mut self, edit: BufferEdit<T>) {
        trace!(
            target: "buffer.undo",
            edit = %edit.description(),
            version = self.buffer.version(),
            "record"
        );
        self.history.add(edit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_edit_is_not_recorded() {
        let mut buf = UndoableEditableBuffer::from_slice(&[1, 2, 3]);
        assert!(buf.set(7, 0).is_err());
        assert!(buf.insert_range(9, &[1]).is_err());
        assert!(buf.remove_selection(&IndexSelection::single(3)).is_err());
        assert_eq!(buf.history_count(), 0);
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn every_mutator_round_trips() {
        let mut buf = UndoableEditableBuffer::from_slice(&[1, 2, 3, 4]);
        let start = buf.to_vec();
        buf.push(5);
        buf.extend_from(&[6, 7]);
        buf.insert(0, 0).unwrap();
        buf.insert_self(2).unwrap();
        buf.remove_range(1, 4).unwrap();
        assert!(buf.remove_item(&7));
        buf.set_range(0, &[9, 9]).unwrap();
        buf.write_with(|items| items.reverse());
        buf.clear();
        assert!(buf.is_empty());

        let steps = buf.history_count();
        assert_eq!(steps, 9);
        for _ in 0..steps {
            assert!(buf.undo().unwrap());
        }
        assert_eq!(buf.to_vec(), start);
        assert!(!buf.can_undo());
        for _ in 0..steps {
            assert!(buf.redo().unwrap());
        }
        assert!(buf.is_empty());
        assert!(!buf.can_redo());
    }

    #[test]
    fn transform_undo_restores_old_values() {
        let mut buf = UndoableEditableBuffer::from_slice(&[1u8, 2, 3]);
        let selection = IndexSelection::from_indices([0, 2]).unwrap();
        buf.transform_selection(&selection, |v| v ^ 0xff).unwrap();
        assert_eq!(buf.as_slice(), &[0xfe, 2, 0xfc]);
        assert_eq!(buf.undo_description().as_deref(), Some("write selection"));
        buf.undo().unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn insert_selection_undo_removes_exactly_the_inserted_slots() {
        let mut buf = UndoableEditableBuffer::from_slice(&[10, 30, 50]);
        let values = SparseIndexedValues::from_parts(
            IndexSelection::from_indices([1, 3, 5]).unwrap(),
            vec![20, 40, 60],
        )
        .unwrap();
        buf.insert_selection(&values).unwrap();
        assert_eq!(buf.as_slice(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.undo_description().as_deref(), Some("insert selection"));

        assert!(buf.undo().unwrap());
        assert_eq!(buf.as_slice(), &[10, 30, 50]);
        assert_eq!(buf.redo_description().as_deref(), Some("insert selection"));
        assert!(buf.redo().unwrap());
        assert_eq!(buf.as_slice(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.history_count(), 1);
    }

    #[test]
    fn history_limit_applies() {
        let mut buf = UndoableEditableBuffer::<u8>::new().with_history_limit(Some(2));
        for v in 0..5 {
            buf.push(v);
        }
        assert_eq!(buf.history_count(), 2);
        buf.undo().unwrap();
        buf.undo().unwrap();
        assert!(!buf.can_undo());
        assert_eq!(buf.as_slice(), &[0, 1, 2]);
    }
}
