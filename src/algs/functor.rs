//! The per-element computation handed to a combined topology map.

use crate::data::tuple::{Elements, OutputElements};
use crate::topology::cell_type::CellType;
use crate::topology::local_ids::LocalIds;

/// A pure mapping from one destination element to its output values.
///
/// `S` are the element types of the source-topology inputs, which the functor
/// sees whole (indexed by the adjacency ids); `D` are the destination-topology
/// input values gathered at the current element; `O` is the output bundle,
/// written back at the same index.
///
/// The map calls [`call`](Self::call) exactly once per destination element,
/// from any number of threads or device blocks at once and in no particular
/// order, so implementations must not carry mutable state between calls.
/// `ids` holds exactly the element's adjacency; `ids.len()` is its count.
///
/// ```
/// use mesh_topomap::prelude::*;
///
/// /// Average of a nodal field over each cell's corners.
/// #[derive(Clone, Copy)]
/// struct CellAverage;
///
/// impl CombinedFunctor<(f64,), (), (f64,)> for CellAverage {
///     fn call(&self, _shape: CellType, ids: &LocalIds, src: &(&[f64],), _dst: ()) -> (f64,) {
///         let sum: f64 = ids.iter().map(|&n| src.0[n]).sum();
///         (sum / ids.len() as f64,)
///     }
/// }
/// ```
pub trait CombinedFunctor<S: Elements, D: Elements, O: OutputElements>: Sync {
    fn call(&self, shape: CellType, ids: &LocalIds, src: &S::Slices<'_>, dst: D) -> O;
}
