//! The adjacency contract shared by every connectivity representation.
//!
//! Executors are generic over [`Connectivity`], so each representation gets
//! its own monomorphic element loop. [`ConnectivityRef`] is the closed set of
//! representations a cell set can hand out; dispatch matches on it once per
//! operation, never per element.

use std::fmt;

use crate::mesh_error::MeshMapError;
use crate::topology::cell_type::CellType;
use crate::topology::explicit::ExplicitConnectivity;
use crate::topology::local_ids::LocalIds;
use crate::topology::regular::RegularConnectivity;

/// Maps a destination element to its shape and adjacent source ids.
pub trait Connectivity: Sync {
    /// Number of destination elements.
    fn element_count(&self) -> usize;

    /// Write the source ids adjacent to element `index` into `ids` and return
    /// the element's shape.
    ///
    /// Fails with [`MeshMapError::AdjacencyOverflow`] if the adjacency does
    /// not fit in `ids`, and [`MeshMapError::ElementOutOfRange`] past
    /// [`element_count`](Self::element_count).
    fn element_components(&self, index: usize, ids: &mut LocalIds)
    -> Result<CellType, MeshMapError>;
}

/// Concrete representation kind of a connectivity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectivityKind {
    Explicit,
    Regular,
}

impl fmt::Display for ConnectivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityKind::Explicit => f.write_str("explicit"),
            ConnectivityKind::Regular => f.write_str("regular"),
        }
    }
}

/// A connectivity borrowed from (or computed for) a cell set.
#[derive(Clone, Copy, Debug)]
pub enum ConnectivityRef<'c> {
    Explicit(&'c ExplicitConnectivity),
    Regular(RegularConnectivity),
}

impl ConnectivityRef<'_> {
    pub fn kind(&self) -> ConnectivityKind {
        match self {
            ConnectivityRef::Explicit(_) => ConnectivityKind::Explicit,
            ConnectivityRef::Regular(_) => ConnectivityKind::Regular,
        }
    }

    pub fn element_count(&self) -> usize {
        match self {
            ConnectivityRef::Explicit(conn) => conn.element_count(),
            ConnectivityRef::Regular(conn) => conn.element_count(),
        }
    }

    /// Exclusive upper bound on the ids the relation reports.
    pub fn source_count(&self) -> usize {
        match self {
            ConnectivityRef::Explicit(conn) => conn.source_count(),
            ConnectivityRef::Regular(conn) => {
                conn.structure().element_count(conn.topology().inverse())
            }
        }
    }
}
