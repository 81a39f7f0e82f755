//! Mutable accumulator producing immutable selections.
//!
//! Union and difference never fail. Degenerate shapes (zero count, zero
//! width/height) contribute nothing, and so does a run or box whose last
//! index would pass `usize::MAX`; it is skipped whole rather than truncated.
//! Only `build` can fail, when the accumulation is empty.

use ahash::AHashSet;
use tracing::trace;

use crate::{IndexSelection, SelectionError};

/// Not thread-safe; each editor view owns its own builder.
#[derive(Debug, Default, Clone)]
pub struct SelectionBuilder {
    working: AHashSet<usize>,
}

impl SelectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Set union with an existing selection.
    pub fn add(&mut self, selection: &IndexSelection) -> &mut Self {
        self.working.extend(selection.iter());
        self
    }

    pub fn add_index(&mut self, index: usize) -> &mut Self {
        self.working.insert(index);
        self
    }

    /// Add the contiguous run `[index, index + count)`.
    pub fn add_linear(&mut self, index: usize, count: usize) -> &mut Self {
        if count == 0 {
            return self;
        }
        match index.checked_add(count - 1) {
            Some(last) => self.working.extend(index..=last),
            None => {
                trace!(target: "selection.builder", index, count, "linear_overflow_skipped");
            }
        }
        self
    }

    /// Add a `width x height` box whose rows are `stride` indices apart.
    pub fn add_box(
        &mut self,
        index: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> &mut Self {
        if width == 0 || height == 0 {
            return self;
        }
        let last = (height - 1)
            .checked_mul(stride)
            .and_then(|rows| rows.checked_add(width - 1))
            .and_then(|span| span.checked_add(index));
        if last.is_none() {
            trace!(
                target: "selection.builder",
                index,
                width,
                height,
                stride,
                "box_overflow_skipped"
            );
            return self;
        }
        for row in 0..height {
            let row_start = index + row * stride;
            self.working.extend(row_start..=row_start + (width - 1));
        }
        self
    }

    /// Set difference.
    pub fn remove(&mut self, selection: &IndexSelection) -> &mut Self {
        for index in selection {
            self.working.remove(&index);
        }
        self
    }

    pub fn clear(&mut self) {
        self.working.clear();
    }

    /// Sorted snapshot of the current accumulation.
    pub fn current(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.working.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// Finalize into an immutable selection. With `clear_after` the builder is
    /// emptied for reuse; it is left untouched when the build fails.
    pub fn build(&mut self, clear_after: bool) -> Result<IndexSelection, SelectionError> {
        let selection = IndexSelection::from_indices(self.working.iter().copied())?;
        trace!(
            target: "selection.builder",
            count = selection.count(),
            min = selection.min_index(),
            max = selection.max_index(),
            clear_after,
            "build"
        );
        if clear_after {
            self.clear();
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn linear_runs_union() {
        let mut b = SelectionBuilder::new();
        b.add_linear(0, 3).add_linear(5, 2);
        let sel = b.build(true).unwrap();
        assert_eq!(sel.to_vec(), vec![0, 1, 2, 5, 6]);
        assert!(b.is_empty());
    }

    #[test]
    fn empty_build_fails_and_clear_is_idempotent() {
        let mut b = SelectionBuilder::new();
        b.clear();
        assert_eq!(b.build(true), Err(SelectionError::EmptyCollection));
        b.clear();
        assert_eq!(b.build(false), Err(SelectionError::EmptyCollection));
    }

    #[test]
    fn remove_subtracts() {
        let mut b = SelectionBuilder::new();
        b.add_linear(0, 10);
        b.remove(&IndexSelection::range(2, 3).unwrap());
        b.remove(&IndexSelection::single(42));
        assert_eq!(b.current(), vec![0, 1, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn box_rows_follow_stride() {
        let mut b = SelectionBuilder::new();
        b.add_box(2, 3, 2, 10);
        assert_eq!(b.current(), vec![2, 3, 4, 12, 13, 14]);
        let grid = IndexSelection::grid(2, 3, 2, 10).unwrap();
        assert_eq!(b.build(false).unwrap(), grid);
        assert_eq!(b.len(), 6);
    }

    #[test]
    fn degenerate_shapes_contribute_nothing() {
        let mut b = SelectionBuilder::new();
        b.add_linear(4, 0).add_box(0, 0, 3, 4).add_box(0, 3, 0, 4);
        assert!(b.is_empty());
        b.add_index(7).add_index(7);
        assert_eq!(b.build(false).unwrap().to_vec(), vec![7]);
    }

    #[test]
    fn runs_past_the_index_domain_are_skipped_whole() {
        let mut b = SelectionBuilder::new();
        b.add_linear(usize::MAX - 1, 2);
        assert_eq!(b.current(), vec![usize::MAX - 1, usize::MAX]);
        b.clear();

        b.add_linear(usize::MAX - 1, 3);
        b.add_box(usize::MAX - 4, 2, 2, 4);
        assert!(b.is_empty());

        b.add_box(usize::MAX - 5, 2, 2, 4);
        assert_eq!(
            b.current(),
            vec![usize::MAX - 5, usize::MAX - 4, usize::MAX - 1, usize::MAX]
        );
    }

    #[test]
    fn add_existing_selection_dedups() {
        let mut b = SelectionBuilder::new();
        let a = IndexSelection::from_indices([1, 3]).unwrap();
        b.add(&a).add(&a).add_index(2);
        assert_eq!(b.build(true).unwrap(), IndexSelection::range(1, 3).unwrap());
    }
}
