#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-topomap
//!
//! mesh-topomap expresses mesh and field algorithms as data-parallel *map
//! operations* over mesh topology. One functor runs once per destination
//! element of a relation (cell->node, node->cell, cell->cell) on either the
//! multi-core host or an accelerator device, without backend-specific code in
//! the functor.
//!
//! ## Features
//! - Cell sets over explicit (stored, compressed-row) or regular (structured
//!   grid, computed) connectivity behind one iteration contract
//! - Typed, location-tagged arrays with scoped device residency leases
//! - Compile-time specialisation of the element loop per connectivity kind and
//!   tuple shape
//! - Host execution on the rayon pool, device execution through the [`Device`]
//!   trait (an in-memory [`EmulatedDevice`] ships with the crate)
//!
//! ## Cargo features
//! - `rayon` (default): parallel host loop and emulated device launches
//! - `device-emulation` (default): compiles [`EmulatedDevice`]
//! - `check-invariants`: run structural invariant checks in release builds
//!
//! ## Example
//!
//! ```
//! use mesh_topomap::prelude::*;
//!
//! /// Sum of the node ids around every cell.
//! struct CornerSum;
//!
//! impl CombinedFunctor<(u32,), (), (u32,)> for CornerSum {
//!     fn call(&self, _shape: CellType, ids: &LocalIds, src: &(&[u32],), _dst: ()) -> (u32,) {
//!         (ids.iter().map(|&n| src.0[n]).sum(),)
//!     }
//! }
//!
//! let grid = RegularCellSet::try_new("grid", &[2, 2, 2])?;
//! let node_ids = Array::from_vec("node ids", (0..27).collect::<Vec<u32>>());
//! let sums = Array::filled("sums", 8, 0u32);
//! CombinedTopologyMap::new(&grid, Topology::CellsToNodes, (&node_ids,), (), (&sums,), CornerSum)
//!     .run_on_host()?;
//! assert_eq!(sums.to_vec()?[0], 52);
//! # Ok::<(), MeshMapError>(())
//! ```
//!
//! [`Device`]: crate::backend::device::Device
//! [`EmulatedDevice`]: crate::backend::device::EmulatedDevice

pub mod algs;
pub mod backend;
pub mod data;
pub mod debug_invariants;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshMapError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::combined_topology_map::CombinedTopologyMap;
    pub use crate::algs::functor::CombinedFunctor;
    pub use crate::backend::config::{
        ExecutionConfig, ExecutionMode, Executor, Operation, default_execution_mode,
        set_default_execution_mode,
    };
    pub use crate::backend::device::Device;
    #[cfg(feature = "device-emulation")]
    pub use crate::backend::device::EmulatedDevice;
    pub use crate::backend::executor::{BackendExecutor, DeviceExecutor, HostExecutor};
    pub use crate::data::array::{Array, Location};
    pub use crate::mesh_error::MeshMapError;
    pub use crate::topology::cell_set::{
        CellSet, ExplicitCellSet, RegularCellSet, SubsetCellSet,
    };
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::local_ids::{LocalIds, MAX_LOCAL_TOPOLOGY_IDS};
    pub use crate::topology::relation::Topology;
}
