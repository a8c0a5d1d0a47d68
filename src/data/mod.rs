//! Data module: location-tagged arrays, residency leases and array tuples.

pub mod array;
pub mod residency;
pub mod tuple;

pub use array::{Array, ArrayValue, Location};
pub use residency::{DeviceResident, Placement, ReadLease, WriteLease};
pub use tuple::{ArrayTuple, Elements, OutputArrayTuple, OutputElements};
