//! Cell sets: named topological containers owning one connectivity per
//! relation.
//!
//! Every cell set reports exactly one [`Representation`], fixed at
//! construction. The combined map only knows how to iterate explicit and
//! regular sets; anything else surfaces as
//! [`MeshMapError::UnsupportedCellSet`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshMapError;
use crate::topology::cell_type::CellType;
use crate::topology::connectivity::ConnectivityRef;
use crate::topology::explicit::ExplicitConnectivity;
use crate::topology::local_ids::LocalIds;
use crate::topology::regular::{RegularConnectivity, RegularStructure};
use crate::topology::relation::Topology;

/// Concrete representation of a cell set.
#[derive(Clone, Copy, Debug)]
pub enum Representation<'a> {
    Explicit(&'a ExplicitCellSet),
    Regular(&'a RegularCellSet),
    /// A representation the map operation cannot iterate, named by kind.
    Other(&'static str),
}

impl Representation<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Representation::Explicit(_) => "explicit",
            Representation::Regular(_) => "regular",
            Representation::Other(kind) => kind,
        }
    }
}

/// Abstract topological container.
pub trait CellSet: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Topological dimension of the cells.
    fn dimension(&self) -> usize;

    fn num_cells(&self) -> usize;

    fn representation(&self) -> Representation<'_>;

    /// The connectivity scoping `topology` on this set.
    fn connectivity(&self, topology: Topology) -> Result<ConnectivityRef<'_>, MeshMapError> {
        match self.representation() {
            Representation::Explicit(set) => set
                .explicit_connectivity(topology)
                .map(ConnectivityRef::Explicit),
            Representation::Regular(set) => {
                Ok(ConnectivityRef::Regular(set.regular_connectivity(topology)))
            }
            Representation::Other(kind) => Err(MeshMapError::UnsupportedCellSet {
                name: self.name().to_string(),
                kind,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Explicit
// ---------------------------------------------------------------------------

/// Unstructured cells with stored node lists.
///
/// Carries the cell->node lists given at construction and their node->cell
/// inverse.
#[derive(Debug)]
pub struct ExplicitCellSet {
    name: String,
    dimension: usize,
    num_nodes: usize,
    cell_nodes: ExplicitConnectivity,
    node_cells: ExplicitConnectivity,
}

impl ExplicitCellSet {
    /// Start an empty set over `num_nodes` nodes.
    pub fn builder(name: impl Into<String>, num_nodes: usize) -> ExplicitCellSetBuilder {
        ExplicitCellSetBuilder {
            name: name.into(),
            num_nodes,
            shapes: Vec::new(),
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    /// Rebuild a structured grid as explicit lists with the same ids and
    /// shapes.
    pub fn from_regular(
        name: impl Into<String>,
        structure: &RegularStructure,
    ) -> Result<Self, MeshMapError> {
        let mut builder = Self::builder(name, structure.num_nodes());
        let mut ids = LocalIds::new();
        for cell in 0..structure.num_cells() {
            let shape = structure.cell_nodes(cell, &mut ids)?;
            builder.add_cell(shape, &ids)?;
        }
        builder.build()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Stored connectivity of `topology`.
    pub fn explicit_connectivity(
        &self,
        topology: Topology,
    ) -> Result<&ExplicitConnectivity, MeshMapError> {
        match topology {
            Topology::CellsToNodes => Ok(&self.cell_nodes),
            Topology::NodesToCells => Ok(&self.node_cells),
            Topology::CellsToCells => Err(MeshMapError::MissingConnectivity {
                cell_set: self.name.clone(),
                topology,
            }),
        }
    }
}

impl CellSet for ExplicitCellSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_cells(&self) -> usize {
        self.cell_nodes.element_count()
    }

    fn representation(&self) -> Representation<'_> {
        Representation::Explicit(self)
    }
}

/// Incremental construction of an [`ExplicitCellSet`].
#[derive(Debug)]
pub struct ExplicitCellSetBuilder {
    name: String,
    num_nodes: usize,
    shapes: Vec<CellType>,
    offsets: Vec<u32>,
    connectivity: Vec<u32>,
}

impl ExplicitCellSetBuilder {
    /// Append a cell and return its id.
    ///
    /// Fixed-arity shapes must list exactly their corner count; every node id
    /// must be below the node count.
    pub fn add_cell(&mut self, shape: CellType, nodes: &[usize]) -> Result<usize, MeshMapError> {
        if let Some(expected) = shape.vertex_count() {
            crate::ensure_structure!(
                nodes.len() == expected,
                "{shape:?} cell needs {expected} nodes, got {}",
                nodes.len()
            );
        }
        crate::ensure_structure!(!nodes.is_empty(), "cell without nodes");
        if let Some(&bad) = nodes.iter().find(|&&n| n >= self.num_nodes) {
            return Err(MeshMapError::InvalidStructure(format!(
                "node {bad} out of range for {} nodes",
                self.num_nodes
            )));
        }
        let end = u32::try_from(self.connectivity.len() + nodes.len()).map_err(|_| {
            MeshMapError::InvalidStructure("connectivity exceeds u32 indexing".into())
        })?;
        // node ids fit since num_nodes bounded them and offsets fit
        self.connectivity.extend(nodes.iter().map(|&n| n as u32));
        self.offsets.push(end);
        self.shapes.push(shape);
        Ok(self.shapes.len() - 1)
    }

    pub fn num_cells(&self) -> usize {
        self.shapes.len()
    }

    /// Freeze the lists and derive the node->cell inverse.
    pub fn build(self) -> Result<ExplicitCellSet, MeshMapError> {
        u32::try_from(self.num_nodes).map_err(|_| {
            MeshMapError::InvalidStructure(format!("{} nodes exceed u32 indexing", self.num_nodes))
        })?;
        let dimension = self
            .shapes
            .iter()
            .map(|shape| usize::from(shape.dimension()))
            .max()
            .unwrap_or(0);
        let cell_nodes = ExplicitConnectivity::try_from_parts(
            Topology::CellsToNodes,
            self.num_nodes,
            self.shapes,
            self.offsets,
            self.connectivity,
        )?;
        let node_cells = cell_nodes.invert()?;
        log::debug!(
            "explicit cell set `{}`: {} cells over {} nodes",
            self.name,
            cell_nodes.element_count(),
            self.num_nodes
        );
        let set = ExplicitCellSet {
            name: self.name,
            dimension,
            num_nodes: self.num_nodes,
            cell_nodes,
            node_cells,
        };
        set.debug_assert_invariants();
        Ok(set)
    }
}

impl DebugInvariants for ExplicitCellSet {
    /// Both relations are valid and describe the same incidences.
    fn validate_invariants(&self) -> Result<(), MeshMapError> {
        self.cell_nodes.validate_invariants()?;
        self.node_cells.validate_invariants()?;
        let cells = self.cell_nodes.element_count();
        crate::ensure_structure!(
            self.cell_nodes.source_count() == self.num_nodes
                && self.node_cells.element_count() == self.num_nodes,
            "`{}`: relations disagree on the node count {}",
            self.name,
            self.num_nodes
        );
        crate::ensure_structure!(
            self.node_cells.source_count() == cells,
            "`{}`: node->cell ids bounded by {} but the set has {cells} cells",
            self.name,
            self.node_cells.source_count()
        );
        crate::ensure_structure!(
            self.node_cells.total_len() == self.cell_nodes.total_len(),
            "`{}`: {} node->cell incidences for {} cell->node incidences",
            self.name,
            self.node_cells.total_len(),
            self.cell_nodes.total_len()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Regular
// ---------------------------------------------------------------------------

/// Structured grid; every relation is computed from the grid extents.
#[derive(Clone, Debug)]
pub struct RegularCellSet {
    name: String,
    structure: RegularStructure,
}

impl RegularCellSet {
    pub fn new(name: impl Into<String>, structure: RegularStructure) -> Self {
        Self {
            name: name.into(),
            structure,
        }
    }

    /// Grid with the given cell counts per axis.
    pub fn try_new(name: impl Into<String>, cell_dims: &[usize]) -> Result<Self, MeshMapError> {
        Ok(Self::new(name, RegularStructure::try_new(cell_dims)?))
    }

    pub fn structure(&self) -> &RegularStructure {
        &self.structure
    }

    pub fn num_nodes(&self) -> usize {
        self.structure.num_nodes()
    }

    pub fn regular_connectivity(&self, topology: Topology) -> RegularConnectivity {
        RegularConnectivity::new(self.structure, topology)
    }
}

impl CellSet for RegularCellSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.structure.dimension()
    }

    fn num_cells(&self) -> usize {
        self.structure.num_cells()
    }

    fn representation(&self) -> Representation<'_> {
        Representation::Regular(self)
    }
}

// ---------------------------------------------------------------------------
// Subset
// ---------------------------------------------------------------------------

/// A named selection of another cell set's cells.
#[derive(Debug)]
pub struct SubsetCellSet {
    name: String,
    parent: Arc<dyn CellSet>,
    cells: Vec<usize>,
}

impl SubsetCellSet {
    pub fn try_new(
        name: impl Into<String>,
        parent: Arc<dyn CellSet>,
        cells: Vec<usize>,
    ) -> Result<Self, MeshMapError> {
        let n = parent.num_cells();
        if let Some(&bad) = cells.iter().find(|&&c| c >= n) {
            return Err(MeshMapError::InvalidStructure(format!(
                "cell {bad} out of range for `{}` with {n} cells",
                parent.name()
            )));
        }
        Ok(Self {
            name: name.into(),
            parent,
            cells,
        })
    }

    pub fn parent(&self) -> &Arc<dyn CellSet> {
        &self.parent
    }

    pub fn cell_ids(&self) -> &[usize] {
        &self.cells
    }
}

impl CellSet for SubsetCellSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.parent.dimension()
    }

    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn representation(&self) -> Representation<'_> {
        Representation::Other("subset")
    }
}
