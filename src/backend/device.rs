//! Accelerator device abstraction.
//!
//! A [`Device`] is the memory space arrays migrate into for device runs, and
//! the launcher for bulk-parallel kernels. Kernels are handed over as
//! [`Block`]s: each block owns a disjoint chunk of the output domain and runs
//! one logical thread per destination element inside it.
//!
//! # Implementations
//! - [`EmulatedDevice`] (feature `device-emulation`): device buffers kept in
//!   separate host memory, blocks launched on the rayon pool.
//! - Devices that only provide residency inherit the default
//!   [`Device::launch`], which reports [`MeshMapError::NotYetImplemented`].

use std::fmt::Debug;

use crate::mesh_error::MeshMapError;

/// Direction of a residency transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferDirection {
    ToDevice,
    ToHost,
}

/// One array copy between host and device memory.
#[derive(Clone, Copy, Debug)]
pub struct Transfer<'a> {
    pub array: &'a str,
    pub direction: TransferDirection,
    pub bytes: usize,
}

/// A unit of device work owning a disjoint chunk of the outputs.
pub type Block<'k> = Box<dyn FnOnce() -> Result<(), MeshMapError> + Send + 'k>;

/// Accelerator backend.
pub trait Device: Send + Sync + Debug {
    /// Backend name, used in logs and errors.
    fn name(&self) -> &str;

    /// Hook called for every host/device copy.
    fn record_transfer(&self, _transfer: Transfer<'_>) {}

    /// Run every block to completion, returning the first failure.
    fn launch(&self, blocks: Vec<Block<'_>>) -> Result<(), MeshMapError> {
        drop(blocks);
        Err(MeshMapError::NotYetImplemented("kernel launch on this device"))
    }
}

#[cfg(feature = "device-emulation")]
pub use emulated::{DeviceStats, EmulatedDevice};

#[cfg(feature = "device-emulation")]
mod emulated {
    use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

    #[cfg(feature = "rayon")]
    use rayon::prelude::*;

    use super::{Block, Device, Transfer, TransferDirection};
    use crate::mesh_error::MeshMapError;

    /// Snapshot of an [`EmulatedDevice`]'s counters.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct DeviceStats {
        pub transfers: usize,
        pub bytes_to_device: usize,
        pub bytes_to_host: usize,
        pub launches: usize,
        pub blocks: usize,
    }

    /// Device emulated in host memory.
    #[derive(Debug, Default)]
    pub struct EmulatedDevice {
        name: String,
        transfers: AtomicUsize,
        bytes_to_device: AtomicUsize,
        bytes_to_host: AtomicUsize,
        launches: AtomicUsize,
        blocks: AtomicUsize,
    }

    impl EmulatedDevice {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                ..Default::default()
            }
        }

        pub fn stats(&self) -> DeviceStats {
            DeviceStats {
                transfers: self.transfers.load(Relaxed),
                bytes_to_device: self.bytes_to_device.load(Relaxed),
                bytes_to_host: self.bytes_to_host.load(Relaxed),
                launches: self.launches.load(Relaxed),
                blocks: self.blocks.load(Relaxed),
            }
        }
    }

    impl Device for EmulatedDevice {
        fn name(&self) -> &str {
            &self.name
        }

        fn record_transfer(&self, transfer: Transfer<'_>) {
            self.transfers.fetch_add(1, Relaxed);
            let counter = match transfer.direction {
                TransferDirection::ToDevice => &self.bytes_to_device,
                TransferDirection::ToHost => &self.bytes_to_host,
            };
            counter.fetch_add(transfer.bytes, Relaxed);
        }

        fn launch(&self, blocks: Vec<Block<'_>>) -> Result<(), MeshMapError> {
            self.launches.fetch_add(1, Relaxed);
            self.blocks.fetch_add(blocks.len(), Relaxed);
            #[cfg(feature = "rayon")]
            {
                blocks.into_par_iter().try_for_each(|block| block())
            }
            #[cfg(not(feature = "rayon"))]
            {
                blocks.into_iter().try_for_each(|block| block())
            }
        }
    }
}
