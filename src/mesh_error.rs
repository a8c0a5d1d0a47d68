//! MeshMapError: Unified error type for mesh-topomap public APIs
//!
//! Every fallible operation in the crate (mesh construction, array residency,
//! dispatch and execution) reports through this type. None of the variants are
//! retried internally; an error aborts the current operation.

use thiserror::Error;

use crate::data::array::Location;
use crate::topology::relation::Topology;

/// Unified error type for mesh-topomap operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshMapError {
    /// The cell set's representation is neither explicit nor regular.
    #[error("Unsupported cell set `{name}`: `{kind}` representation has no combined topology map path")]
    UnsupportedCellSet { name: String, kind: &'static str },
    /// Device execution requested but no accelerator backend is available.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    /// An element's adjacency does not fit in the local id buffer.
    #[error("Adjacency overflow: element {element} has {count} adjacent ids, capacity is {capacity}")]
    AdjacencyOverflow {
        element: usize,
        count: usize,
        capacity: usize,
    },
    /// A backend path that exists in the API but has no implementation yet.
    #[error("Not yet implemented: {0}")]
    NotYetImplemented(&'static str),
    /// The cell set does not carry a connectivity for the requested relation.
    #[error("Cell set `{cell_set}` has no connectivity for {topology}")]
    MissingConnectivity { cell_set: String, topology: Topology },
    /// The output tuple asks for more elements than the relation provides.
    #[error("{topology} has {elements} destination elements but outputs hold {outputs}")]
    ElementCountMismatch {
        topology: Topology,
        elements: usize,
        outputs: usize,
    },
    /// A bound array is shorter than the element count (or outputs disagree).
    #[error("Array `{name}` has length {found}, expected {expected}")]
    ArrayLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// The array is already leased (bound twice, or held on the device).
    #[error("Array `{0}` is already leased")]
    ArrayBusy(String),
    /// The array is not resident where it was accessed.
    #[error("Array `{name}` is resident on {location}, expected {expected}")]
    ArrayNotResident {
        name: String,
        location: Location,
        expected: Location,
    },
    /// A connectivity was queried past its element count.
    #[error("Element index {index} out of range for {len} elements")]
    ElementOutOfRange { index: usize, len: usize },
    /// Malformed mesh construction input.
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    /// Malformed execution configuration.
    #[error("Invalid execution config: {0}")]
    InvalidConfig(String),
}
