//! Index selections: immutable, ordered, duplicate-free sets of element indices.
//!
//! A selection addresses the elements an edit touches. It may be a contiguous
//! run, an arbitrary hashed list, or a rectangular block inside a strided 2D
//! layout. All shapes share one contract (bounds, membership, rank lookup,
//! ascending enumeration, translation), so buffer code never needs to know
//! which shape it was handed.
//!
//! Selections are built either directly (`IndexSelection::range`,
//! `IndexSelection::from_indices`, `IndexSelection::grid`) or incrementally
//! through a [`SelectionBuilder`], whose `build` is the only way from the
//! mutable accumulator to the immutable type.
//!
//! Invariants:
//! - Enumeration is strictly increasing.
//! - `count() >= 1`; constructing an empty selection fails with
//!   [`SelectionError::EmptyCollection`].
//! - A translated (`move_by`) selection is a new value sharing nothing with
//!   the original.

mod builder;
mod selection;

pub use builder::SelectionBuilder;
pub use selection::{GridSelection, IndexRange, IndexSelection, IndexSet, Indices};

/// Failures raised while constructing or translating a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The source sequence produced no indices.
    #[error("selection must contain at least one index")]
    EmptyCollection,
    /// Translating `index` by `offset` would leave the non-negative index domain.
    #[error("index {index} moved by {offset} leaves the valid index domain")]
    IndexOutOfBounds { index: usize, offset: isize },
    /// An index lies beyond the end of the sequence the selection is applied to.
    #[error("selection index {index} is outside a sequence of length {len}")]
    OutOfRange { index: usize, len: usize },
    /// Computing an index overflowed `usize`.
    #[error("selection exceeds the addressable index range")]
    Overflow,
    /// The requested shape cannot produce a duplicate-free ordered set.
    #[error("invalid selection shape: {0}")]
    InvalidShape(&'static str),
}
