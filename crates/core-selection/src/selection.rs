//! Concrete selection shapes and the shared `IndexSelection` contract.

use std::fmt;
use std::iter::FusedIterator;

use ahash::AHashSet;

use crate::SelectionError;

/// Contiguous run `[start, start + count)`. The last index may be `usize::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    start: usize,
    count: usize,
}

impl IndexRange {
    pub fn new(start: usize, count: usize) -> Result<Self, SelectionError> {
        if count == 0 {
            return Err(SelectionError::EmptyCollection);
        }
        start.checked_add(count - 1).ok_or(SelectionError::Overflow)?;
        Ok(Self { start, count })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Inclusive last index of the run.
    pub fn last(&self) -> usize {
        self.start + (self.count - 1)
    }
}

/// Arbitrary indices kept as a sorted list plus a hashed membership table.
#[derive(Debug, Clone)]
pub struct IndexSet {
    sorted: Vec<usize>,
    lookup: AHashSet<usize>,
}

impl IndexSet {
    pub fn from_indices<I>(indices: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut sorted: Vec<usize> = indices.into_iter().collect();
        if sorted.is_empty() {
            return Err(SelectionError::EmptyCollection);
        }
        sorted.sort_unstable();
        sorted.dedup();
        let lookup = sorted.iter().copied().collect();
        Ok(Self { sorted, lookup })
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.sorted
    }
}

impl PartialEq for IndexSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted == other.sorted
    }
}

impl Eq for IndexSet {}

/// Rectangular block of `width x height` cells inside a row-major layout whose
/// rows are `stride` indices apart. Row `r` contributes
/// `origin + r * stride .. origin + r * stride + width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSelection {
    origin: usize,
    width: usize,
    height: usize,
    stride: usize,
}

impl GridSelection {
    pub fn new(
        origin: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, SelectionError> {
        if width == 0 || height == 0 {
            return Err(SelectionError::EmptyCollection);
        }
        width.checked_mul(height).ok_or(SelectionError::Overflow)?;
        if height > 1 && width > stride {
            return Err(SelectionError::InvalidShape(
                "box rows overlap when width exceeds stride",
            ));
        }
        // Last index must be representable.
        (height - 1)
            .checked_mul(stride)
            .and_then(|rows| rows.checked_add(width - 1))
            .and_then(|span| span.checked_add(origin))
            .ok_or(SelectionError::Overflow)?;
        Ok(Self {
            origin,
            width,
            height,
            stride,
        })
    }

    pub fn origin(&self) -> usize {
        self.origin
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn stride(&self) -> usize {
        self.stride
    }

    fn cell(&self, k: usize) -> usize {
        self.origin + (k / self.width) * self.stride + k % self.width
    }

    fn rank(&self, index: usize) -> Option<usize> {
        let rel = index.checked_sub(self.origin)?;
        let (row, col) = if self.height == 1 {
            (0, rel)
        } else {
            (rel / self.stride, rel % self.stride)
        };
        (row < self.height && col < self.width).then_some(row * self.width + col)
    }
}

/// Immutable, ordered, duplicate-free set of indices.
///
/// Equality is by content: a `Range` and a `Set` holding the same indices
/// compare equal.
#[derive(Debug, Clone)]
pub enum IndexSelection {
    Range(IndexRange),
    Set(IndexSet),
    Grid(GridSelection),
}

impl IndexSelection {
    /// Contiguous selection `[start, start + count)`.
    pub fn range(start: usize, count: usize) -> Result<Self, SelectionError> {
        IndexRange::new(start, count).map(Self::Range)
    }

    /// Single-index selection.
    pub fn single(index: usize) -> Self {
        Self::Range(IndexRange {
            start: index,
            count: 1,
        })
    }

    /// Arbitrary indices; sorted and deduplicated. Fails with
    /// `EmptyCollection` when `indices` yields nothing.
    pub fn from_indices<I>(indices: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = usize>,
    {
        IndexSet::from_indices(indices).map(Self::Set)
    }

    /// Rectangular sub-grid of a strided 2D layout.
    pub fn grid(
        origin: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, SelectionError> {
        GridSelection::new(origin, width, height, stride).map(Self::Grid)
    }

    pub fn min_index(&self) -> usize {
        match self {
            Self::Range(r) => r.start,
            Self::Set(s) => s.sorted[0],
            Self::Grid(g) => g.origin,
        }
    }

    pub fn max_index(&self) -> usize {
        match self {
            Self::Range(r) => r.last(),
            Self::Set(s) => s.sorted[s.sorted.len() - 1],
            Self::Grid(g) => g.cell(g.width * g.height - 1),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Range(r) => r.count,
            Self::Set(s) => s.sorted.len(),
            Self::Grid(g) => g.width * g.height,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        match self {
            Self::Range(r) => index >= r.start && index - r.start < r.count,
            Self::Set(s) => s.lookup.contains(&index),
            Self::Grid(g) => g.rank(index).is_some(),
        }
    }

    /// The `k`-th smallest index.
    pub fn index_at(&self, k: usize) -> Option<usize> {
        (k < self.count()).then(|| self.index_at_unchecked(k))
    }

    /// Rank of `index` inside the selection (inverse of `index_at`).
    pub fn position(&self, index: usize) -> Option<usize> {
        match self {
            Self::Range(r) => self.contains(index).then(|| index - r.start),
            Self::Set(s) => s.sorted.binary_search(&index).ok(),
            Self::Grid(g) => g.rank(index),
        }
    }

    fn index_at_unchecked(&self, k: usize) -> usize {
        match self {
            Self::Range(r) => r.start + k,
            Self::Set(s) => s.sorted[k],
            Self::Grid(g) => g.cell(k),
        }
    }

    /// Translate every index by `offset`, keeping the shape.
    pub fn move_by(&self, offset: isize) -> Result<Self, SelectionError> {
        let shift = |index: usize| {
            index
                .checked_add_signed(offset)
                .ok_or(SelectionError::IndexOutOfBounds { index, offset })
        };
        match self {
            Self::Range(r) => Self::range(shift(r.start)?, r.count),
            Self::Set(s) => {
                let moved = s
                    .sorted
                    .iter()
                    .map(|&i| shift(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Self::from_indices(moved)
            }
            Self::Grid(g) => Self::grid(shift(g.origin)?, g.width, g.height, g.stride),
        }
    }

    /// Map each element index `i` to the byte index `start_offset + i * element_size`.
    pub fn to_byte_selection(
        &self,
        start_offset: usize,
        element_size: usize,
    ) -> Result<Self, SelectionError> {
        let bytes = self
            .iter()
            .map(|i| {
                i.checked_mul(element_size)
                    .and_then(|b| b.checked_add(start_offset))
                    .ok_or(SelectionError::Overflow)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_indices(bytes)
    }

    /// Ascending enumeration. Each call starts fresh.
    pub fn iter(&self) -> Indices<'_> {
        Indices {
            selection: self,
            front: 0,
            back: self.count(),
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Pair every selected index with its value in `items`.
    pub fn values_in<'a, T>(
        &'a self,
        items: &'a [T],
    ) -> Result<impl Iterator<Item = (usize, &'a T)> + 'a, SelectionError> {
        let max = self.max_index();
        if max >= items.len() {
            return Err(SelectionError::OutOfRange {
                index: max,
                len: items.len(),
            });
        }
        Ok(self.iter().map(move |i| (i, &items[i])))
    }
}

impl PartialEq for IndexSelection {
    fn eq(&self, other: &Self) -> bool {
        self.count() == other.count() && self.iter().eq(other.iter())
    }
}

impl Eq for IndexSelection {}

impl<'a> IntoIterator for &'a IndexSelection {
    type Item = usize;
    type IntoIter = Indices<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders maximal contiguous runs, e.g. `{0..3, 5, 9..11}`. A run ending at
/// `usize::MAX` is written inclusively as `start..=end`.
impl fmt::Display for IndexSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut it = self.iter().peekable();
        let mut first = true;
        while let Some(start) = it.next() {
            let mut end = start;
            while let Some(next) = end.checked_add(1) {
                if it.peek() != Some(&next) {
                    break;
                }
                end = next;
                it.next();
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match end.checked_add(1) {
                _ if end == start => write!(f, "{start}")?,
                Some(stop) => write!(f, "{start}..{stop}")?,
                None => write!(f, "{start}..={end}")?,
            }
        }
        f.write_str("}")
    }
}

/// Ascending iterator over a selection's indices.
#[derive(Debug, Clone)]
pub struct Indices<'a> {
    selection: &'a IndexSelection,
    front: usize,
    back: usize,
}

impl Iterator for Indices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.front >= self.back {
            return None;
        }
        let index = self.selection.index_at_unchecked(self.front);
        self.front += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Indices<'_> {
    fn next_back(&mut self) -> Option<usize> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.selection.index_at_unchecked(self.back))
    }
}

impl ExactSizeIterator for Indices<'_> {}
impl FusedIterator for Indices<'_> {}
