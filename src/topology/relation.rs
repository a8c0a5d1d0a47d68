//! Topology relations: which adjacency of a cell set an operation walks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of topological entity on either side of a relation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Cell,
    Node,
}

/// Relation selector scoping which connectivity of a cell set is used.
///
/// The first entity is the *destination* (iterated, one functor call each),
/// the second the *source* (the adjacency ids handed to the functor).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Topology {
    /// Each cell sees its corner nodes.
    CellsToNodes,
    /// Each node sees the cells that touch it.
    NodesToCells,
    /// Each cell sees its face neighbours.
    CellsToCells,
}

impl Topology {
    /// Entity iterated by an operation over this relation.
    pub fn destination(self) -> EntityKind {
        match self {
            Topology::CellsToNodes | Topology::CellsToCells => EntityKind::Cell,
            Topology::NodesToCells => EntityKind::Node,
        }
    }

    /// Entity named by the adjacency ids.
    pub fn source(self) -> EntityKind {
        match self {
            Topology::CellsToNodes => EntityKind::Node,
            Topology::NodesToCells | Topology::CellsToCells => EntityKind::Cell,
        }
    }

    /// The relation walking the same adjacency the other way round.
    pub fn inverse(self) -> Self {
        match self {
            Topology::CellsToNodes => Topology::NodesToCells,
            Topology::NodesToCells => Topology::CellsToNodes,
            Topology::CellsToCells => Topology::CellsToCells,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Topology::CellsToNodes => "cell->node",
            Topology::NodesToCells => "node->cell",
            Topology::CellsToCells => "cell->cell",
        };
        f.write_str(s)
    }
}
