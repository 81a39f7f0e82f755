//! Values keyed by a selection.
//!
//! The key domain is exactly the selection's index set. Values are stored in
//! selection order, so rank `k` of the selection owns `values()[k]`.
//! Looking up a key outside the selection through `Index`/`IndexMut` is a
//! programmer error and panics; `get`/`get_mut` are the checked forms.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use core_selection::{IndexSelection, SelectionError};

use crate::codec::ByteCodec;
use crate::{BufferError, Element};

#[derive(Clone)]
pub struct SparseIndexedValues<T> {
    selection: IndexSelection,
    values: Vec<T>,
    codec: Option<Arc<dyn ByteCodec<T>>>,
}

impl<T: Element> SparseIndexedValues<T> {
    /// Working set with every entry set to `T::default()`.
    pub fn new(selection: IndexSelection) -> Self {
        let values = vec![T::default(); selection.count()];
        Self {
            selection,
            values,
            codec: None,
        }
    }

    /// Copy the values found at each selected index of `source`.
    pub fn from_source(selection: IndexSelection, source: &[T]) -> Result<Self, BufferError> {
        let values = selection
            .values_in(source)
            .map_err(|_| BufferError::IndexOutOfBounds {
                index: selection.max_index(),
                len: source.len(),
            })?
            .map(|(_, v)| *v)
            .collect();
        Ok(Self {
            selection,
            values,
            codec: None,
        })
    }

    /// Pair `values` (in ascending index order) with `selection`.
    pub fn from_parts(selection: IndexSelection, values: Vec<T>) -> Result<Self, BufferError> {
        if values.len() != selection.count() {
            return Err(BufferError::CollectionBoundsExceeded {
                index: selection.min_index(),
                count: values.len(),
                len: selection.count(),
            });
        }
        Ok(Self {
            selection,
            values,
            codec: None,
        })
    }

    /// Decode each selected element from `bytes` at
    /// `base_offset + index * codec.size_of_item()`.
    pub fn from_bytes(
        selection: IndexSelection,
        bytes: &[u8],
        base_offset: usize,
        codec: Arc<dyn ByteCodec<T>>,
    ) -> Result<Self, BufferError> {
        let size = codec.size_of_item();
        let last_end = codec
            .offset(base_offset, selection.max_index())
            .and_then(|start| start.checked_add(size))
            .ok_or(SelectionError::Overflow)?;
        if last_end > bytes.len() {
            return Err(BufferError::IndexOutOfBounds {
                index: last_end - 1,
                len: bytes.len(),
            });
        }
        // Offsets below are bounded by last_end, so the arithmetic cannot overflow.
        let values = selection
            .iter()
            .map(|i| {
                let start = base_offset + i * size;
                codec.decode(&bytes[start..start + size])
            })
            .collect();
        Ok(Self {
            selection,
            values,
            codec: Some(codec),
        })
    }

    pub fn selection(&self) -> &IndexSelection {
        &self.selection
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn is_byte_backed(&self) -> bool {
        self.codec.is_some()
    }

    pub fn codec(&self) -> Option<&Arc<dyn ByteCodec<T>>> {
        self.codec.as_ref()
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.selection.contains(key)
    }

    pub fn get(&self, key: usize) -> Option<&T> {
        self.selection.position(key).map(|k| &self.values[k])
    }

    pub fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.selection.position(key).map(|k| &mut self.values[k])
    }

    /// Overwrite the value at `key`.
    ///
    /// # Panics
    /// If `key` is not a member of the selection.
    pub fn set(&mut self, key: usize, value: T) {
        self[key] = value;
    }

    /// Values in ascending index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.selection.iter().zip(self.values.iter())
    }

    /// New snapshot over the same selection with every value passed through `f`.
    pub fn map(&self, mut f: impl FnMut(T) -> T) -> Self {
        Self {
            selection: self.selection.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
            codec: self.codec.clone(),
        }
    }

    /// Write every entry's encoded bytes at `offset + index * size_of_item()`.
    /// Nothing is written unless every entry fits in `dest`.
    pub fn encode_to_bytes(&self, dest: &mut [u8], offset: usize) -> Result<(), BufferError> {
        let codec = self.codec.as_ref().ok_or(BufferError::NotByteBacked)?;
        let size = codec.size_of_item();
        let last_end = codec
            .offset(offset, self.selection.max_index())
            .and_then(|start| start.checked_add(size))
            .ok_or(SelectionError::Overflow)?;
        if last_end > dest.len() {
            return Err(BufferError::IndexOutOfBounds {
                index: last_end - 1,
                len: dest.len(),
            });
        }
        for (index, value) in self.iter() {
            let start = offset + index * size;
            codec.encode(value, &mut dest[start..start + size]);
        }
        Ok(())
    }
}

impl<T: Element> Index<usize> for SparseIndexedValues<T> {
    type Output = T;

    fn index(&self, key: usize) -> &T {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key {key} is not part of the selection {}", self.selection),
        }
    }
}

impl<T: Element> IndexMut<usize> for SparseIndexedValues<T> {
    fn index_mut(&mut self, key: usize) -> &mut T {
        match self.selection.position(key) {
            Some(k) => &mut self.values[k],
            None => panic!("key {key} is not part of the selection {}", self.selection),
        }
    }
}

impl<T: PartialEq> PartialEq for SparseIndexedValues<T> {
    fn eq(&self, other: &Self) -> bool {
        self.selection == other.selection && self.values == other.values
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseIndexedValues<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseIndexedValues")
            .field("selection", &format_args!("{}", self.selection))
            .field("values", &self.values)
            .field("byte_backed", &self.codec.is_some())
            .finish()
    }
}
