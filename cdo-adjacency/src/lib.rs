//! Compressed bipartite relations between mesh entities.
//!
//! An [`Adjacency`] stores, for every *source* entity, a contiguous slice of *target* ids.
//! The layout is the classic CSR one: an index array `idx` of length `n_sources + 1`
//! and a concatenated array of ids, so that the targets of source `i` are
//! `ids[idx[i]..idx[i + 1]]`. Quantities attached to an incidence (e.g. the portion of
//! a dual cell inside a primal cell) are stored in arrays parallel to `ids` and
//! addressed through [`Adjacency::range`].
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Range;

/// Errors raised when assembling an adjacency from raw parts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdjacencyError {
    /// The index array is empty or does not start at zero.
    InvalidFirstOffset,
    /// The index array decreases at the given position.
    NonMonotoneIndex { position: usize },
    /// The last offset does not match the number of ids.
    LengthMismatch { last_offset: usize, num_ids: usize },
}

impl Display for AdjacencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFirstOffset => write!(f, "Index array must be non-empty and start at zero"),
            Self::NonMonotoneIndex { position } => {
                write!(f, "Index array is decreasing at position {position}")
            }
            Self::LengthMismatch { last_offset, num_ids } => write!(
                f,
                "Last offset ({last_offset}) does not match the number of ids ({num_ids})"
            ),
        }
    }
}

impl std::error::Error for AdjacencyError {}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency<T> {
    idx: Vec<usize>,
    ids: Vec<T>,
}

impl<T: Debug> Debug for Adjacency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for Adjacency<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Adjacency<T> {
    /// An adjacency without any sources.
    pub fn new() -> Self {
        Self {
            idx: vec![0],
            ids: Vec::new(),
        }
    }

    pub fn with_capacity(num_sources: usize, num_ids: usize) -> Self {
        let mut idx = Vec::with_capacity(num_sources + 1);
        idx.push(0);
        Self {
            idx,
            ids: Vec::with_capacity(num_ids),
        }
    }

    /// Assemble an adjacency from a CSR index array and the concatenated ids.
    pub fn from_parts(idx: Vec<usize>, ids: Vec<T>) -> Result<Self, AdjacencyError> {
        if idx.first() != Some(&0) {
            return Err(AdjacencyError::InvalidFirstOffset);
        }
        if let Some(position) = idx.windows(2).position(|w| w[1] < w[0]) {
            return Err(AdjacencyError::NonMonotoneIndex { position: position + 1 });
        }
        let last_offset = *idx.last().unwrap_or(&0);
        if last_offset != ids.len() {
            return Err(AdjacencyError::LengthMismatch {
                last_offset,
                num_ids: ids.len(),
            });
        }
        Ok(Self { idx, ids })
    }

    /// Return a data structure that can be used for appending single ids to the same source.
    /// When the returned data structure is dropped, the result is equivalent to
    /// adding the whole slice at once with [`Adjacency::push`].
    pub fn begin_array(&mut self) -> ArrayAppender<'_, T> {
        let initial_count = self.ids.len();
        ArrayAppender {
            initial_count,
            ids: &mut self.ids,
            idx: &mut self.idx,
        }
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.idx.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of stored incidences.
    pub fn nnz(&self) -> usize {
        self.ids.len()
    }

    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    pub fn ids(&self) -> &[T] {
        &self.ids
    }

    /// Positions in [`Adjacency::ids`] of the targets of the given source.
    pub fn range(&self, source: usize) -> Option<Range<usize>> {
        let begin = *self.idx.get(source)?;
        let end = *self.idx.get(source + 1)?;
        Some(begin..end)
    }

    pub fn get(&self, source: usize) -> Option<&[T]> {
        let range = self.range(source)?;
        self.ids.get(range)
    }

    pub fn get_mut(&mut self, source: usize) -> Option<&mut [T]> {
        let range = self.range(source)?;
        self.ids.get_mut(range)
    }

    /// Number of targets of the given source, or zero if the source does not exist.
    pub fn degree(&self, source: usize) -> usize {
        self.range(source).map(|r| r.len()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl '_ + ExactSizeIterator<Item = &'_ [T]> {
        self.idx.windows(2).map(move |w| &self.ids[w[0]..w[1]])
    }

    /// Returns an iterator over all ids of all sources.
    pub fn iter_array_elements(&self) -> impl '_ + Iterator<Item = &'_ T> {
        self.ids.iter()
    }

    pub fn clear(&mut self) {
        self.idx.clear();
        self.idx.push(0);
        self.ids.clear();
    }
}

impl<T: Clone> Adjacency<T> {
    pub fn push(&mut self, array: &[T]) {
        self.ids.extend_from_slice(array);
        self.idx.push(self.ids.len());
    }
}

impl Adjacency<usize> {
    /// Build the reverse relation, given the number of target entities.
    ///
    /// Sources appear in increasing order within each target's slice.
    ///
    /// # Panics
    ///
    /// Panics if an id is not smaller than `num_targets`.
    pub fn transpose(&self, num_targets: usize) -> Adjacency<usize> {
        let mut counts = vec![0usize; num_targets + 1];
        for &target in &self.ids {
            counts[target + 1] += 1;
        }
        for i in 0..num_targets {
            counts[i + 1] += counts[i];
        }
        let idx = counts.clone();
        let mut cursor = counts;
        let mut ids = vec![0; self.ids.len()];
        for (source, targets) in self.iter().enumerate() {
            for &target in targets {
                ids[cursor[target]] = source;
                cursor[target] += 1;
            }
        }
        Adjacency { idx, ids }
    }
}

#[derive(Debug)]
pub struct ArrayAppender<'a, T> {
    ids: &'a mut Vec<T>,
    idx: &'a mut Vec<usize>,
    initial_count: usize,
}

impl<'a, T> ArrayAppender<'a, T> {
    pub fn push_single(&mut self, element: T) -> &mut Self {
        self.ids.push(element);
        self
    }

    /// Whether the element has already been appended to the current source.
    pub fn contains(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        self.ids[self.initial_count..].contains(element)
    }

    pub fn count(&self) -> usize {
        self.ids.len() - self.initial_count
    }
}

impl<'a, T> Drop for ArrayAppender<'a, T> {
    fn drop(&mut self) {
        self.idx.push(self.ids.len());
    }
}

impl<'a, T: Clone> From<&'a Vec<Vec<T>>> for Adjacency<T> {
    fn from(nested_vec: &'a Vec<Vec<T>>) -> Self {
        let mut result = Self::with_capacity(nested_vec.len(), nested_vec.iter().map(Vec::len).sum());
        for vec in nested_vec {
            result.push(vec);
        }
        result
    }
}

impl<T: Clone> From<Vec<Vec<T>>> for Adjacency<T> {
    fn from(vec_vec: Vec<Vec<T>>) -> Self {
        Self::from(&vec_vec)
    }
}

impl<'a, T: Clone> From<&'a Adjacency<T>> for Vec<Vec<T>> {
    fn from(adjacency: &Adjacency<T>) -> Self {
        adjacency.iter().map(|slice| slice.to_vec()).collect()
    }
}

impl<T: Clone> From<Adjacency<T>> for Vec<Vec<T>> {
    fn from(adjacency: Adjacency<T>) -> Self {
        Self::from(&adjacency)
    }
}
