//! Selection-addressable editable buffers with optional linear undo/redo.
//!
//! Layers, leaf first:
//! - [`codec`]: fixed-size byte codecs translating one element to/from raw bytes.
//! - [`SparseIndexedValues`]: a snapshot of values keyed by an [`IndexSelection`],
//!   optionally decoded from (and encodable back into) a byte blob.
//! - [`EditableBuffer`]: the dynamic array. Point and range operations plus
//!   selection-scoped clear / transform / write / insert / remove.
//! - [`UndoableEditableBuffer`]: records a [`BufferEdit`] for every mutation in
//!   a `core_undo::UndoEngine` before returning.
//!
//! Every completed mutating call bumps the buffer's version counter exactly
//! once and notifies subscribed [`ContentsObserver`]s. Enumeration through a
//! [`BufferCursor`] reports [`BufferError::ConcurrentModification`] once the
//! version moves under it.
//!
//! Element types are plain values (`Copy + Default`). Byte round-tripping of
//! arbitrary layouts goes through [`PodCodec`], which additionally requires
//! `bytemuck::Pod`.

pub mod codec;
mod buffer;
mod edit;
mod sparse;
mod undoable;

pub use buffer::{BufferCursor, ContentsObserver, EditableBuffer};
pub use codec::{ByteCodec, LittleEndian, PodCodec};
pub use core_selection::{IndexSelection, SelectionBuilder, SelectionError};
pub use edit::BufferEdit;
pub use sparse::SparseIndexedValues;
pub use undoable::UndoableEditableBuffer;

/// Values a buffer can hold: fixed-size, no owned indirection.
pub trait Element: Copy + Default + 'static {}

impl<T: Copy + Default + 'static> Element for T {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// Point index, or a selection's max index, outside the valid domain.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// A bulk write of `count` items at `index` does not fit in `len`.
    #[error("{count} items at index {index} exceed length {len}")]
    CollectionBoundsExceeded {
        index: usize,
        count: usize,
        len: usize,
    },
    #[error("capacity {requested} is below current length {len}")]
    CapacityBelowLength { requested: usize, len: usize },
    /// Byte export on values that were not created with a codec.
    #[error("values are not backed by a byte codec")]
    NotByteBacked,
    /// Enumeration continued after the buffer was mutated.
    #[error("buffer modified during enumeration (version {expected} -> {found})")]
    ConcurrentModification { expected: u64, found: u64 },
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
