//! Mesh topology: shape tags, relations and the connectivity representations
//! cell sets are built from.
//!
//! - [`explicit`]: stored compressed-row adjacency lists.
//! - [`regular`]: adjacency computed from structured-grid indices.
//! - [`cell_set`]: named containers owning one connectivity per relation.

pub mod cell_set;
pub mod cell_type;
pub mod connectivity;
pub mod explicit;
pub mod local_ids;
pub mod regular;
pub mod relation;

pub use cell_set::{CellSet, ExplicitCellSet, RegularCellSet, Representation, SubsetCellSet};
pub use cell_type::CellType;
pub use connectivity::{Connectivity, ConnectivityKind, ConnectivityRef};
pub use local_ids::{LocalIds, MAX_LOCAL_TOPOLOGY_IDS};
pub use relation::{EntityKind, Topology};
