//! Explicit (stored) connectivity in compressed-row form.
//!
//! Element `e` owns `connectivity[offsets[e] .. offsets[e + 1]]` and has shape
//! `shapes[e]`. All three buffers are [`Array`]s so a device run can lease them
//! onto the accelerator next to the operation's own inputs. The lists are
//! written once, while the mesh is built, and validated on construction.

use itertools::Itertools;

use crate::data::array::{Array, Location};
use crate::data::residency::{Placement, ReadLease};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshMapError;
use crate::topology::cell_type::CellType;
use crate::topology::connectivity::Connectivity;
use crate::topology::local_ids::LocalIds;
use crate::topology::relation::{EntityKind, Topology};

/// Stored adjacency lists of one relation.
#[derive(Debug)]
pub struct ExplicitConnectivity {
    topology: Topology,
    source_count: usize,
    shapes: Array<CellType>,
    offsets: Array<u32>,
    connectivity: Array<u32>,
}

impl ExplicitConnectivity {
    /// Build from compressed-row parts, validating every invariant.
    ///
    /// `source_count` bounds the ids; `offsets` holds `shapes.len() + 1`
    /// non-decreasing entries starting at zero and ending at
    /// `connectivity.len()`. Lists longer than
    /// [`MAX_LOCAL_TOPOLOGY_IDS`](crate::topology::local_ids::MAX_LOCAL_TOPOLOGY_IDS)
    /// are accepted here and rejected when an operation visits them.
    pub fn try_from_parts(
        topology: Topology,
        source_count: usize,
        shapes: Vec<CellType>,
        offsets: Vec<u32>,
        connectivity: Vec<u32>,
    ) -> Result<Self, MeshMapError> {
        let conn = Self {
            topology,
            source_count,
            shapes: Array::from_vec(format!("{topology} shapes"), shapes),
            offsets: Array::from_vec(format!("{topology} offsets"), offsets),
            connectivity: Array::from_vec(format!("{topology} connectivity"), connectivity),
        };
        conn.validate_invariants()?;
        Ok(conn)
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of destination elements.
    pub fn element_count(&self) -> usize {
        self.shapes.len()
    }

    /// Exclusive upper bound on the stored ids.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Total number of stored ids.
    pub fn total_len(&self) -> usize {
        self.connectivity.len()
    }

    /// Current location of the backing arrays.
    pub fn location(&self) -> Location {
        self.connectivity.location()
    }

    /// Lease the backing arrays into `placement` for the lifetime of the
    /// returned value.
    pub fn lease(&self, placement: &Placement) -> Result<ExplicitLease<'_>, MeshMapError> {
        Ok(ExplicitLease {
            shapes: self.shapes.lease_read(placement)?,
            offsets: self.offsets.lease_read(placement)?,
            connectivity: self.connectivity.lease_read(placement)?,
        })
    }

    /// Host-side query of a single element.
    pub fn element_components(
        &self,
        index: usize,
        ids: &mut LocalIds,
    ) -> Result<CellType, MeshMapError> {
        self.lease(&Placement::Host)?
            .view()
            .element_components(index, ids)
    }

    /// Stored ids of element `index`, without the local capacity bound.
    pub fn adjacency(&self, index: usize) -> Result<Vec<usize>, MeshMapError> {
        let lease = self.lease(&Placement::Host)?;
        let view = lease.view();
        let range = view.range(index)?;
        Ok(view.connectivity[range].iter().map(|&id| id as usize).collect())
    }

    /// The reverse relation: for every source id, the destination elements
    /// that list it, ascending. Only cell-to-node lists can be inverted; the
    /// resulting node elements carry the `Vertex` shape.
    pub fn invert(&self) -> Result<Self, MeshMapError> {
        crate::ensure_structure!(
            self.topology.source() == EntityKind::Node
                && self.topology.destination() == EntityKind::Cell,
            "only cell->node connectivity can be inverted, got {}",
            self.topology
        );
        let lease = self.lease(&Placement::Host)?;
        let view = lease.view();
        let n = self.source_count;

        let mut degree = vec![0u32; n];
        for &id in view.connectivity {
            degree[id as usize] += 1;
        }
        let mut offsets = vec![0u32; n + 1];
        for i in 0..n {
            offsets[i + 1] = offsets[i] + degree[i];
        }

        let mut cursor = offsets.clone();
        let mut connectivity = vec![0u32; view.connectivity.len()];
        for element in 0..view.element_count() {
            for &id in &view.connectivity[view.range(element)?] {
                let slot = &mut cursor[id as usize];
                connectivity[*slot as usize] = element as u32;
                *slot += 1;
            }
        }

        Self::try_from_parts(
            self.topology.inverse(),
            view.element_count(),
            vec![CellType::Vertex; n],
            offsets,
            connectivity,
        )
    }
}

impl DebugInvariants for ExplicitConnectivity {
    fn validate_invariants(&self) -> Result<(), MeshMapError> {
        let lease = self.lease(&Placement::Host)?;
        let view = lease.view();
        crate::ensure_structure!(
            view.offsets.len() == view.shapes.len() + 1,
            "{}: {} offsets for {} elements",
            self.topology,
            view.offsets.len(),
            view.shapes.len()
        );
        crate::ensure_structure!(
            view.offsets[0] == 0,
            "{}: offsets must start at zero",
            self.topology
        );
        crate::ensure_structure!(
            view.offsets.iter().tuple_windows().all(|(a, b)| a <= b),
            "{}: offsets must be non-decreasing",
            self.topology
        );
        let last = view.offsets[view.offsets.len() - 1] as usize;
        crate::ensure_structure!(
            last == view.connectivity.len(),
            "{}: offsets end at {last} but {} ids are stored",
            self.topology,
            view.connectivity.len()
        );
        if let Some(&bad) = view
            .connectivity
            .iter()
            .find(|&&id| id as usize >= self.source_count)
        {
            return Err(MeshMapError::InvalidStructure(format!(
                "{}: id {bad} out of range for {} source elements",
                self.topology, self.source_count
            )));
        }
        Ok(())
    }
}

/// Backing arrays of an [`ExplicitConnectivity`] leased into one memory space.
pub struct ExplicitLease<'c> {
    shapes: ReadLease<'c, CellType>,
    offsets: ReadLease<'c, u32>,
    connectivity: ReadLease<'c, u32>,
}

impl ExplicitLease<'_> {
    pub fn location(&self) -> Location {
        self.connectivity.location()
    }

    pub fn view(&self) -> ExplicitView<'_> {
        ExplicitView {
            shapes: self.shapes.as_slice(),
            offsets: self.offsets.as_slice(),
            connectivity: self.connectivity.as_slice(),
        }
    }
}

/// Slice view over leased explicit connectivity, usable inside kernels.
#[derive(Clone, Copy, Debug)]
pub struct ExplicitView<'s> {
    shapes: &'s [CellType],
    offsets: &'s [u32],
    connectivity: &'s [u32],
}

impl ExplicitView<'_> {
    #[inline]
    fn range(&self, index: usize) -> Result<std::ops::Range<usize>, MeshMapError> {
        if index >= self.shapes.len() {
            return Err(MeshMapError::ElementOutOfRange {
                index,
                len: self.shapes.len(),
            });
        }
        Ok(self.offsets[index] as usize..self.offsets[index + 1] as usize)
    }
}

impl Connectivity for ExplicitView<'_> {
    fn element_count(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    fn element_components(
        &self,
        index: usize,
        ids: &mut LocalIds,
    ) -> Result<CellType, MeshMapError> {
        let range = self.range(index)?;
        ids.fill_from(
            index,
            self.connectivity[range].iter().map(|&id| id as usize),
        )?;
        Ok(self.shapes[index])
    }
}
