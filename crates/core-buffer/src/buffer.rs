//! Dynamic array with explicit capacity, a version counter and selection edits.
//!
//! Storage is a `Vec<T>` whose length is the capacity; slots past `len` hold
//! `T::default()`. Growth doubles the capacity (minimum 4) and never shrinks
//! on its own. Every completed mutating call bumps `version` exactly once and
//! notifies observers with the new value.

use std::fmt;
use std::iter::Peekable;

use core_selection::{IndexSelection, Indices};
use tracing::trace;

use crate::sparse::SparseIndexedValues;
use crate::{BufferError, Element};

const MIN_CAPACITY: usize = 4;

/// Receives the "contents modified" notification. The payload is the new
/// version; callers re-read whatever state they care about.
pub trait ContentsObserver {
    fn contents_modified(&self, version: u64);
}

impl<F: Fn(u64)> ContentsObserver for F {
    fn contents_modified(&self, version: u64) {
        self(version)
    }
}

pub struct EditableBuffer<T> {
    items: Vec<T>,
    len: usize,
    version: u64,
    observers: Vec<Box<dyn ContentsObserver>>,
}

impl<T: Element> Default for EditableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> EditableBuffer<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
            version: 0,
            observers: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: vec![T::default(); capacity],
            ..Self::new()
        }
    }

    pub fn from_slice(items: &[T]) -> Self {
        Self {
            items: items.to_vec(),
            len: items.len(),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Resize the backing storage. Contents and version are unaffected.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), BufferError> {
        if capacity < self.len {
            return Err(BufferError::CapacityBelowLength {
                requested: capacity,
                len: self.len,
            });
        }
        self.items.resize(capacity, T::default());
        self.items.shrink_to_fit();
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe(&mut self, observer: impl ContentsObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Version-stamped position for enumeration that may interleave with
    /// mutation.
    pub fn cursor(&self) -> BufferCursor {
        BufferCursor {
            version: self.version,
            position: 0,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    pub fn to_vec_range(&self, index: usize, count: usize) -> Result<Vec<T>, BufferError> {
        self.check_window(index, count)?;
        Ok(self.items[index..index + count].to_vec())
    }

    /// Copy the elements starting at `index` into `dest`, filling it.
    pub fn copy_to(&self, index: usize, dest: &mut [T]) -> Result<(), BufferError> {
        self.check_window(index, dest.len())?;
        dest.copy_from_slice(&self.items[index..index + dest.len()]);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<T, BufferError> {
        self.check_index(index)?;
        Ok(self.items[index])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), BufferError> {
        self.check_index(index)?;
        self.items[index] = value;
        self.touch("set");
        Ok(())
    }

    pub fn push(&mut self, value: T) {
        self.reserve_total(self.len + 1);
        self.items[self.len] = value;
        self.len += 1;
        self.touch("push");
    }

    /// Append `items` at the end.
    pub fn extend_from(&mut self, items: &[T]) {
        let at = self.len;
        self.splice_in(at, items);
        self.touch("extend");
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<(), BufferError> {
        self.check_insert(index)?;
        self.splice_in(index, &[value]);
        self.touch("insert");
        Ok(())
    }

    pub fn insert_range(&mut self, index: usize, items: &[T]) -> Result<(), BufferError> {
        self.check_insert(index)?;
        self.splice_in(index, items);
        self.touch("insert_range");
        Ok(())
    }

    /// Insert a copy of the whole current contents at `index`.
    pub fn insert_self(&mut self, index: usize) -> Result<(), BufferError> {
        self.check_insert(index)?;
        let n = self.len;
        self.reserve_total(n * 2);
        // [prefix | tail] -> [prefix | prefix | tail | tail]
        self.items.copy_within(index..n, index + n);
        self.items.copy_within(0..index, index);
        self.items.copy_within(index + n..n * 2, index * 2);
        self.len = n * 2;
        self.touch("insert_self");
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, BufferError> {
        self.check_index(index)?;
        let removed = self.items[index];
        self.cut(index, 1);
        self.touch("remove_at");
        Ok(removed)
    }

    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<(), BufferError> {
        self.check_window(index, count)?;
        self.cut(index, count);
        self.touch("remove_range");
        Ok(())
    }

    /// Overwrite `items.len()` elements starting at `index`. The window must
    /// lie inside the current contents.
    pub fn set_range(&mut self, index: usize, items: &[T]) -> Result<(), BufferError> {
        self.check_window(index, items.len())?;
        self.items[index..index + items.len()].copy_from_slice(items);
        self.touch("set_range");
        Ok(())
    }

    /// Hand the live contents to `f` for in-place editing.
    pub fn write_with<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R {
        let result = f(&mut self.items[..self.len]);
        self.touch("write_with");
        result
    }

    pub fn clear(&mut self) {
        self.items[..self.len].fill(T::default());
        self.len = 0;
        self.touch("clear");
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().position(|x| x == item)
    }

    /// First occurrence of `item` inside `[index, index + count)`.
    pub fn index_of_in(
        &self,
        item: &T,
        index: usize,
        count: usize,
    ) -> Result<Option<usize>, BufferError>
    where
        T: PartialEq,
    {
        self.check_window(index, count)?;
        Ok(self.items[index..index + count]
            .iter()
            .position(|x| x == item)
            .map(|p| p + index))
    }

    /// Remove the first occurrence of `item`. Returns whether one was found.
    pub fn remove_item(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(item) {
            Some(index) => {
                self.cut(index, 1);
                self.touch("remove_item");
                true
            }
            None => false,
        }
    }

    /// Current values at every selected index.
    pub fn snapshot(
        &self,
        selection: &IndexSelection,
    ) -> Result<SparseIndexedValues<T>, BufferError> {
        self.check_selection(selection)?;
        SparseIndexedValues::from_source(selection.clone(), self.as_slice())
    }

    pub fn clear_selection(&mut self, selection: &IndexSelection) -> Result<(), BufferError> {
        self.transform_selection(selection, |_| T::default())
    }

    /// Apply `f` to every selected value. All inputs are read before any
    /// output is written.
    pub fn transform_selection(
        &mut self,
        selection: &IndexSelection,
        f: impl FnMut(T) -> T,
    ) -> Result<(), BufferError> {
        let values = self.snapshot(selection)?.map(f);
        self.write_selection(&values)
    }

    pub fn write_selection(
        &mut self,
        values: &SparseIndexedValues<T>,
    ) -> Result<(), BufferError> {
        self.check_selection(values.selection())?;
        for (index, value) in values.iter() {
            self.items[index] = *value;
        }
        trace!(target: "buffer.selection", count = values.count(), "write_selection");
        self.touch("write_selection");
        Ok(())
    }

    /// Insert each value so that it lands at its own index in the resulting
    /// sequence. Untouched elements keep their relative order.
    pub fn insert_selection(
        &mut self,
        values: &SparseIndexedValues<T>,
    ) -> Result<(), BufferError> {
        let selection = values.selection();
        let new_len = self.len + values.count();
        if selection.max_index() >= new_len {
            return Err(BufferError::IndexOutOfBounds {
                index: selection.max_index(),
                len: new_len,
            });
        }
        self.reserve_total(new_len);

        // Walk targets from the highest down. Between consecutive targets the
        // gap is filled with the block of original elements directly below
        // `src`, so every original element moves exactly once.
        let mut src = self.len;
        let mut dest = new_len;
        for (target, value) in selection.iter().rev().zip(values.values().iter().rev()) {
            let run = dest - target - 1;
            self.items.copy_within(src - run..src, target + 1);
            src -= run;
            self.items[target] = *value;
            dest = target;
        }
        debug_assert_eq!(src, dest);

        self.len = new_len;
        trace!(
            target: "buffer.selection",
            count = values.count(),
            len = new_len,
            "insert_selection"
        );
        self.touch("insert_selection");
        Ok(())
    }

    /// Remove the selected elements, compacting survivors leftward in one pass.
    pub fn remove_selection(&mut self, selection: &IndexSelection) -> Result<(), BufferError> {
        self.check_selection(selection)?;
        let mut skip: Peekable<Indices<'_>> = selection.iter().peekable();
        let mut write = selection.min_index();
        for read in write..self.len {
            if skip.next_if_eq(&read).is_some() {
                continue;
            }
            self.items[write] = self.items[read];
            write += 1;
        }
        self.items[write..self.len].fill(T::default());
        self.len = write;
        trace!(
            target: "buffer.selection",
            count = selection.count(),
            len = write,
            "remove_selection"
        );
        self.touch("remove_selection");
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), BufferError> {
        if index >= self.len {
            return Err(BufferError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn check_insert(&self, index: usize) -> Result<(), BufferError> {
        if index > self.len {
            return Err(BufferError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn check_window(&self, index: usize, count: usize) -> Result<(), BufferError> {
        self.check_insert(index)?;
        if count > self.len - index {
            return Err(BufferError::CollectionBoundsExceeded {
                index,
                count,
                len: self.len,
            });
        }
        Ok(())
    }

    fn check_selection(&self, selection: &IndexSelection) -> Result<(), BufferError> {
        let max = selection.max_index();
        if max >= self.len {
            return Err(BufferError::IndexOutOfBounds {
                index: max,
                len: self.len,
            });
        }
        Ok(())
    }

    fn reserve_total(&mut self, needed: usize) {
        let capacity = self.items.len();
        if needed <= capacity {
            return;
        }
        let grown = if capacity == 0 {
            MIN_CAPACITY
        } else {
            capacity.saturating_mul(2)
        };
        self.items.resize(grown.max(needed), T::default());
    }

    fn splice_in(&mut self, index: usize, items: &[T]) {
        let n = items.len();
        self.reserve_total(self.len + n);
        self.items.copy_within(index..self.len, index + n);
        self.items[index..index + n].copy_from_slice(items);
        self.len += n;
    }

    fn cut(&mut self, index: usize, count: usize) {
        self.items.copy_within(index + count..self.len, index);
        let new_len = self.len - count;
        self.items[new_len..self.len].fill(T::default());
        self.len = new_len;
    }

    fn touch(&mut self, op: &'static str) {
        self.version = self.version.wrapping_add(1);
        trace!(
            target: "buffer.edit",
            op,
            version = self.version,
            len = self.len,
            "contents_modified"
        );
        for observer in &self.observers {
            observer.contents_modified(self.version);
        }
    }
}

impl<T: Element> From<Vec<T>> for EditableBuffer<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            len: items.len(),
            items,
            ..Self::new()
        }
    }
}

impl<T: Element> FromIterator<T> for EditableBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: fmt::Debug> fmt::Debug for EditableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableBuffer")
            .field("items", &&self.items[..self.len])
            .field("capacity", &self.items.len())
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Detached enumeration position stamped with the buffer version it started
/// at. Any mutation in between turns further steps into
/// [`BufferError::ConcurrentModification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCursor {
    version: u64,
    position: usize,
}

impl BufferCursor {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn advance<T: Element>(
        &mut self,
        buffer: &EditableBuffer<T>,
    ) -> Option<Result<T, BufferError>> {
        if buffer.version != self.version {
            return Some(Err(BufferError::ConcurrentModification {
                expected: self.version,
                found: buffer.version,
            }));
        }
        let item = buffer.as_slice().get(self.position).copied()?;
        self.position += 1;
        Some(Ok(item))
    }
}
