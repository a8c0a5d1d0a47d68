//! Fixed-capacity buffer for one element's adjacency ids.
//!
//! Connectivity producers write into a [`LocalIds`]; functors read it. The
//! capacity is a build-time constant shared by both sides, and writing past it
//! is reported as [`MeshMapError::AdjacencyOverflow`] instead of truncating.

use std::ops::Deref;

use static_assertions::const_assert;

use crate::mesh_error::MeshMapError;

/// Upper bound on simultaneously-held adjacency ids per element.
pub const MAX_LOCAL_TOPOLOGY_IDS: usize = 12;

// A hexahedron's corners and a structured node's cells must always fit.
const_assert!(MAX_LOCAL_TOPOLOGY_IDS >= 8);

/// Adjacency ids of a single element, bounded by [`MAX_LOCAL_TOPOLOGY_IDS`].
///
/// Dereferences to a slice of exactly [`len`](Self::len) ids, so readers can
/// never see stale entries beyond the reported count.
#[derive(Clone, Copy, Debug)]
pub struct LocalIds {
    ids: [usize; MAX_LOCAL_TOPOLOGY_IDS],
    len: usize,
}

impl LocalIds {
    pub const fn new() -> Self {
        Self {
            ids: [0; MAX_LOCAL_TOPOLOGY_IDS],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        MAX_LOCAL_TOPOLOGY_IDS
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append one id for `element`.
    #[inline]
    pub fn push(&mut self, element: usize, id: usize) -> Result<(), MeshMapError> {
        if self.len == MAX_LOCAL_TOPOLOGY_IDS {
            return Err(MeshMapError::AdjacencyOverflow {
                element,
                count: self.len + 1,
                capacity: MAX_LOCAL_TOPOLOGY_IDS,
            });
        }
        self.ids[self.len] = id;
        self.len += 1;
        Ok(())
    }

    /// Replace the contents with `ids`; the whole list is rejected if it
    /// does not fit, and the buffer is left empty.
    pub fn fill_from<I>(&mut self, element: usize, ids: I) -> Result<(), MeshMapError>
    where
        I: IntoIterator<Item = usize>,
        I::IntoIter: ExactSizeIterator,
    {
        let ids = ids.into_iter();
        self.len = 0;
        let count = ids.len();
        if count > MAX_LOCAL_TOPOLOGY_IDS {
            return Err(MeshMapError::AdjacencyOverflow {
                element,
                count,
                capacity: MAX_LOCAL_TOPOLOGY_IDS,
            });
        }
        for (slot, id) in self.ids.iter_mut().zip(ids) {
            *slot = id;
        }
        self.len = count;
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.ids[..self.len]
    }
}

impl Default for LocalIds {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for LocalIds {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        self.as_slice()
    }
}

impl PartialEq for LocalIds {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for LocalIds {}
