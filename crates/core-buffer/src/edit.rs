//! Reversible buffer edits.
//!
//! Each variant carries exactly what is needed to replay the edit forward and
//! backward on an [`EditableBuffer`]: the position, plus the old and/or new
//! values (a full snapshot for selection edits).

use core_undo::Command;

use crate::buffer::EditableBuffer;
use crate::sparse::SparseIndexedValues;
use crate::{BufferError, Element};

#[derive(Debug, Clone, PartialEq)]
pub enum BufferEdit<T> {
    Set { index: usize, old: T, new: T },
    Insert { index: usize, value: T },
    InsertRange { index: usize, items: Vec<T> },
    /// Copy of the `count` elements present before the edit, inserted at `index`.
    InsertSelf { index: usize, count: usize },
    RemoveAt { index: usize, value: T },
    RemoveRange { index: usize, items: Vec<T> },
    SetRange { index: usize, old: Vec<T>, new: Vec<T> },
    Clear { items: Vec<T> },
    /// Covers write, transform and clear of a selection.
    WriteSelection {
        old: SparseIndexedValues<T>,
        new: SparseIndexedValues<T>,
    },
    InsertSelection { values: SparseIndexedValues<T> },
    /// `values` is the snapshot taken just before removal.
    RemoveSelection { values: SparseIndexedValues<T> },
}

impl<T: Element> Command for BufferEdit<T> {
    type Target = EditableBuffer<T>;
    type Error = BufferError;

    fn undo(&self, buffer: &mut EditableBuffer<T>) -> Result<(), BufferError> {
        match self {
            Self::Set { index, old, .. } => buffer.set(*index, *old),
            Self::Insert { index, .. } => buffer.remove_at(*index).map(drop),
            Self::InsertRange { index, items } => buffer.remove_range(*index, items.len()),
            Self::InsertSelf { index, count } => buffer.remove_range(*index, *count),
            Self::RemoveAt { index, value } => buffer.insert(*index, *value),
            Self::RemoveRange { index, items } => buffer.insert_range(*index, items),
            Self::SetRange { index, old, .. } => buffer.set_range(*index, old),
            Self::Clear { items } => {
                buffer.extend_from(items);
                Ok(())
            }
            Self::WriteSelection { old, .. } => buffer.write_selection(old),
            Self::InsertSelection { values } => buffer.remove_selection(values.selection()),
            Self::RemoveSelection { values } => buffer.insert_selection(values),
        }
    }

    fn redo(&self, buffer: &mut EditableBuffer<T>) -> Result<(), BufferError> {
        match self {
            Self::Set { index, new, .. } => buffer.set(*index, *new),
            Self::Insert { index, value } => buffer.insert(*index, *value),
            Self::InsertRange { index, items } => buffer.insert_range(*index, items),
            Self::InsertSelf { index, .. } => buffer.insert_self(*index),
            Self::RemoveAt { index, .. } => buffer.remove_at(*index).map(drop),
            Self::RemoveRange { index, items } => buffer.remove_range(*index, items.len()),
            Self::SetRange { index, new, .. } => buffer.set_range(*index, new),
            Self::Clear { .. } => {
                buffer.clear();
                Ok(())
            }
            Self::WriteSelection { new, .. } => buffer.write_selection(new),
            Self::InsertSelection { values } => buffer.insert_selection(values),
            Self::RemoveSelection { values } => buffer.remove_selection(values.selection()),
        }
    }

    fn description(&self) -> String {
        let label = match self {
            Self::Set { .. } => "set",
            Self::Insert { .. } => "insert",
            Self::InsertRange { .. } => "insert range",
            Self::InsertSelf { .. } => "duplicate",
            Self::RemoveAt { .. } => "remove",
            Self::RemoveRange { .. } => "remove range",
            Self::SetRange { .. } => "overwrite range",
            Self::Clear { .. } => "clear",
            Self::WriteSelection { .. } => "write selection",
            Self::InsertSelection { .. } => "insert selection",
            Self::RemoveSelection { .. } => "remove selection",
        };
        String::from(label)
    }
}
