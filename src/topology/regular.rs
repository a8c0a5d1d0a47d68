//! Implicit connectivity of structured grids.
//!
//! A [`RegularStructure`] stores only the cell counts per axis; every adjacency
//! is recomputed from the logical `(i, j, k)` index of the queried element.
//! Numbering is row-major: cell `i + ni*(j + nj*k)`, node
//! `i + (ni+1)*(j + (nj+1)*k)`, with unused axes collapsed to extent one.

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshMapError;
use crate::topology::cell_type::CellType;
use crate::topology::connectivity::Connectivity;
use crate::topology::local_ids::LocalIds;
use crate::topology::relation::Topology;

/// Corner offsets in VTK order: bottom quad counter-clockwise, then top quad.
/// The first `2^dim` entries are the corners of a `dim`-dimensional cell.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Extents of a 1-, 2- or 3-dimensional structured grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegularStructure {
    dimension: usize,
    cell_dims: [usize; 3],
}

impl RegularStructure {
    /// Grid with `cell_dims.len()` axes (1 to 3), each with at least one cell.
    pub fn try_new(cell_dims: &[usize]) -> Result<Self, MeshMapError> {
        crate::ensure_structure!(
            (1..=3).contains(&cell_dims.len()),
            "structured grids have 1 to 3 axes, got {}",
            cell_dims.len()
        );
        crate::ensure_structure!(
            cell_dims.iter().all(|&n| n > 0),
            "every axis needs at least one cell, got {cell_dims:?}"
        );
        // node counts bound cell counts, so one checked product covers both
        let num_nodes = cell_dims
            .iter()
            .try_fold(1usize, |acc, &n| n.checked_add(1).and_then(|m| acc.checked_mul(m)));
        crate::ensure_structure!(
            num_nodes.is_some(),
            "grid {cell_dims:?} has more nodes than usize can index"
        );
        let mut dims = [1; 3];
        dims[..cell_dims.len()].copy_from_slice(cell_dims);
        Ok(Self {
            dimension: cell_dims.len(),
            cell_dims: dims,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Cells per used axis.
    pub fn cell_dims(&self) -> &[usize] {
        &self.cell_dims[..self.dimension]
    }

    /// Nodes per axis; unused axes report one.
    pub fn node_dims(&self) -> [usize; 3] {
        let mut dims = [1; 3];
        for (axis, n) in dims.iter_mut().enumerate().take(self.dimension) {
            *n = self.cell_dims[axis] + 1;
        }
        dims
    }

    pub fn num_cells(&self) -> usize {
        self.cell_dims.iter().product()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_dims().iter().product()
    }

    /// Shape of every cell.
    pub fn cell_shape(&self) -> CellType {
        match self.dimension {
            1 => CellType::Segment,
            2 => CellType::Quadrilateral,
            _ => CellType::Hexahedron,
        }
    }

    #[inline]
    pub fn cell_index(&self, [i, j, k]: [usize; 3]) -> usize {
        let [ni, nj, _] = self.cell_dims;
        i + ni * (j + nj * k)
    }

    #[inline]
    pub fn cell_logical(&self, cell: usize) -> [usize; 3] {
        let [ni, nj, _] = self.cell_dims;
        [cell % ni, (cell / ni) % nj, cell / (ni * nj)]
    }

    #[inline]
    pub fn node_index(&self, [i, j, k]: [usize; 3]) -> usize {
        let [ni, nj, _] = self.node_dims();
        i + ni * (j + nj * k)
    }

    #[inline]
    pub fn node_logical(&self, node: usize) -> [usize; 3] {
        let [ni, nj, _] = self.node_dims();
        [node % ni, (node / ni) % nj, node / (ni * nj)]
    }

    /// Destination element count of `topology` on this grid.
    pub fn element_count(&self, topology: Topology) -> usize {
        match topology {
            Topology::CellsToNodes | Topology::CellsToCells => self.num_cells(),
            Topology::NodesToCells => self.num_nodes(),
        }
    }

    fn corners(&self) -> &'static [[usize; 3]] {
        &CORNERS[..1 << self.dimension]
    }

    /// Corner nodes of `cell`.
    pub fn cell_nodes(&self, cell: usize, ids: &mut LocalIds) -> Result<CellType, MeshMapError> {
        check_index(cell, self.num_cells())?;
        let [i, j, k] = self.cell_logical(cell);
        ids.clear();
        for [di, dj, dk] in self.corners() {
            ids.push(cell, self.node_index([i + di, j + dj, k + dk]))?;
        }
        Ok(self.cell_shape())
    }

    /// Cells touching `node`, ascending.
    pub fn node_cells(&self, node: usize, ids: &mut LocalIds) -> Result<CellType, MeshMapError> {
        check_index(node, self.num_nodes())?;
        let [i, j, k] = self.node_logical(node);
        let reach = |axis: usize| usize::from(axis < self.dimension);
        ids.clear();
        // Larger offsets first so touching cells come out ascending.
        for (dk, dj, di) in iproduct!(
            (0..=reach(2)).rev(),
            (0..=reach(1)).rev(),
            (0..=reach(0)).rev()
        ) {
            let (Some(ci), Some(cj), Some(ck)) =
                (i.checked_sub(di), j.checked_sub(dj), k.checked_sub(dk))
            else {
                continue;
            };
            let [ni, nj, nk] = self.cell_dims;
            if ci < ni && cj < nj && ck < nk {
                ids.push(node, self.cell_index([ci, cj, ck]))?;
            }
        }
        Ok(CellType::Vertex)
    }

    /// Face neighbours of `cell`, ascending.
    pub fn cell_neighbors(
        &self,
        cell: usize,
        ids: &mut LocalIds,
    ) -> Result<CellType, MeshMapError> {
        check_index(cell, self.num_cells())?;
        let logical = self.cell_logical(cell);
        ids.clear();
        for axis in (0..self.dimension).rev() {
            if logical[axis] > 0 {
                let mut lower = logical;
                lower[axis] -= 1;
                ids.push(cell, self.cell_index(lower))?;
            }
        }
        for axis in 0..self.dimension {
            if logical[axis] + 1 < self.cell_dims[axis] {
                let mut upper = logical;
                upper[axis] += 1;
                ids.push(cell, self.cell_index(upper))?;
            }
        }
        Ok(self.cell_shape())
    }
}

#[inline]
fn check_index(index: usize, len: usize) -> Result<(), MeshMapError> {
    if index < len {
        Ok(())
    } else {
        Err(MeshMapError::ElementOutOfRange { index, len })
    }
}

/// Connectivity of one relation on a structured grid; holds no storage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegularConnectivity {
    structure: RegularStructure,
    topology: Topology,
}

impl RegularConnectivity {
    pub fn new(structure: RegularStructure, topology: Topology) -> Self {
        Self {
            structure,
            topology,
        }
    }

    pub fn structure(&self) -> &RegularStructure {
        &self.structure
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

impl Connectivity for RegularConnectivity {
    fn element_count(&self) -> usize {
        self.structure.element_count(self.topology)
    }

    #[inline]
    fn element_components(
        &self,
        index: usize,
        ids: &mut LocalIds,
    ) -> Result<CellType, MeshMapError> {
        match self.topology {
            Topology::CellsToNodes => self.structure.cell_nodes(index, ids),
            Topology::NodesToCells => self.structure.node_cells(index, ids),
            Topology::CellsToCells => self.structure.cell_neighbors(index, ids),
        }
    }
}
