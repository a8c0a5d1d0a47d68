//! Map operations over mesh topology.

pub mod combined_topology_map;
pub mod dispatch;
pub mod functor;

pub use combined_topology_map::CombinedTopologyMap;
pub use functor::CombinedFunctor;
