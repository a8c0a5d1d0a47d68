//! Location-tagged typed buffers.
//!
//! An [`Array`] owns a host buffer and, while resident on an accelerator, a
//! device-side copy. Residency only changes through the leases in
//! [`residency`](crate::data::residency): a lease holds the array's lock for
//! its lifetime, so host code cannot mutate an array while a device run owns
//! it, and dropping the lease always restores host residency.

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backend::device::{Device, Transfer, TransferDirection};
use crate::data::residency::{DeviceResident, Placement, ReadLease, WriteLease};
use crate::mesh_error::MeshMapError;

/// Values that can live in an [`Array`] and cross the host/device boundary.
pub trait ArrayValue: Copy + Send + Sync + 'static {}

impl<T: Copy + Send + Sync + 'static> ArrayValue for T {}

/// Memory space holding the authoritative copy of an array.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Location {
    Host,
    Device,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Host => f.write_str("host"),
            Location::Device => f.write_str("device"),
        }
    }
}

pub(crate) struct DeviceBuffer<T> {
    pub(crate) device: Arc<dyn Device>,
    pub(crate) data: Vec<T>,
    /// Set once a write to the device copy was committed.
    pub(crate) dirty: bool,
}

pub(crate) struct ArrayStorage<T> {
    pub(crate) host: Vec<T>,
    pub(crate) device: Option<DeviceBuffer<T>>,
}

impl<T> ArrayStorage<T> {
    #[inline]
    pub(crate) fn current(&self) -> &[T] {
        match &self.device {
            Some(buffer) => &buffer.data,
            None => &self.host,
        }
    }

    /// Mutable access to the authoritative copy. Device writes are not copied
    /// back until [`mark_written`](Self::mark_written).
    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut [T] {
        match &mut self.device {
            Some(buffer) => &mut buffer.data,
            None => &mut self.host,
        }
    }

    #[inline]
    pub(crate) fn mark_written(&mut self) {
        if let Some(buffer) = &mut self.device {
            buffer.dirty = true;
        }
    }
}

/// Homogeneously-typed, resizable buffer tagged with its current location.
pub struct Array<T> {
    name: String,
    len: usize,
    on_device: AtomicBool,
    pub(super) storage: RwLock<ArrayStorage<T>>,
}

impl<T> Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("location", &self.location())
            .finish()
    }
}

impl<T> Array<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Where the authoritative copy currently lives.
    pub fn location(&self) -> Location {
        if self.on_device.load(Ordering::Acquire) {
            Location::Device
        } else {
            Location::Host
        }
    }
}

impl<T: ArrayValue> Array<T> {
    /// Wrap an existing host buffer.
    pub fn from_vec(name: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            name: name.into(),
            len: data.len(),
            on_device: AtomicBool::new(false),
            storage: RwLock::new(ArrayStorage {
                host: data,
                device: None,
            }),
        }
    }

    /// A host buffer of `len` copies of `value`.
    pub fn filled(name: impl Into<String>, len: usize, value: T) -> Self {
        Self::from_vec(name, vec![value; len])
    }

    /// Resize to `new_len`, filling new slots with `fill`.
    ///
    /// Only host-resident arrays can be resized.
    pub fn resize(&mut self, new_len: usize, fill: T) -> Result<(), MeshMapError> {
        let storage = self.storage.get_mut();
        if storage.device.is_some() {
            return Err(MeshMapError::ArrayNotResident {
                name: self.name.clone(),
                location: Location::Device,
                expected: Location::Host,
            });
        }
        storage.host.resize(new_len, fill);
        self.len = new_len;
        Ok(())
    }

    /// Make the device copy authoritative. No-op if already resident.
    pub fn need_on_device(&self, device: &Arc<dyn Device>) -> Result<(), MeshMapError> {
        let mut storage = self.try_lock_write()?;
        self.migrate_to_device(&mut storage, device);
        Ok(())
    }

    /// Make the host copy authoritative. No-op if already resident.
    pub fn need_on_host(&self) -> Result<(), MeshMapError> {
        let mut storage = self.try_lock_write()?;
        self.migrate_to_host(&mut storage);
        Ok(())
    }

    /// Scoped device residency: the array stays on `device`, locked against
    /// host access, until the returned guard is dropped.
    pub fn acquire_device(
        &self,
        device: &Arc<dyn Device>,
    ) -> Result<DeviceResident<'_, T>, MeshMapError> {
        DeviceResident::acquire(self, device)
    }

    /// Host read access (migrating back from the device first if needed).
    pub fn read(&self) -> Result<ReadLease<'_, T>, MeshMapError> {
        self.lease_read(&Placement::Host)
    }

    /// Host write access (migrating back from the device first if needed).
    pub fn write(&self) -> Result<WriteLease<'_, T>, MeshMapError> {
        self.lease_write(&Placement::Host)
    }

    /// Copy of the host data.
    pub fn to_vec(&self) -> Result<Vec<T>, MeshMapError> {
        Ok(self.read()?.to_vec())
    }

    /// Consume the array, returning its authoritative data.
    pub fn into_vec(self) -> Vec<T> {
        let mut storage = self.storage.into_inner();
        match storage.device.take() {
            Some(buffer) if buffer.dirty => buffer.data,
            _ => storage.host,
        }
    }

    pub(crate) fn lease_read(&self, placement: &Placement) -> Result<ReadLease<'_, T>, MeshMapError> {
        match placement {
            Placement::Host => ReadLease::host(self),
            Placement::Device(device) => Ok(ReadLease::device(DeviceResident::acquire(self, device)?)),
        }
    }

    pub(crate) fn lease_write(
        &self,
        placement: &Placement,
    ) -> Result<WriteLease<'_, T>, MeshMapError> {
        match placement {
            Placement::Host => WriteLease::host(self),
            Placement::Device(device) => Ok(WriteLease::device(DeviceResident::acquire(self, device)?)),
        }
    }

    pub(super) fn try_lock_write(
        &self,
    ) -> Result<parking_lot::RwLockWriteGuard<'_, ArrayStorage<T>>, MeshMapError> {
        self.storage
            .try_write()
            .ok_or_else(|| MeshMapError::ArrayBusy(self.name.clone()))
    }

    pub(super) fn migrate_to_device(&self, storage: &mut ArrayStorage<T>, device: &Arc<dyn Device>) {
        if storage.device.is_some() {
            return;
        }
        let bytes = std::mem::size_of_val(storage.host.as_slice());
        log::trace!("array `{}`: {} bytes host -> {}", self.name, bytes, device.name());
        device.record_transfer(Transfer {
            array: &self.name,
            direction: TransferDirection::ToDevice,
            bytes,
        });
        storage.device = Some(DeviceBuffer {
            device: Arc::clone(device),
            data: storage.host.clone(),
            dirty: false,
        });
        self.on_device.store(true, Ordering::Release);
    }

    pub(super) fn migrate_to_host(&self, storage: &mut ArrayStorage<T>) {
        let Some(buffer) = storage.device.take() else {
            return;
        };
        if buffer.dirty {
            let bytes = std::mem::size_of_val(buffer.data.as_slice());
            log::trace!(
                "array `{}`: {} bytes {} -> host",
                self.name,
                bytes,
                buffer.device.name()
            );
            buffer.device.record_transfer(Transfer {
                array: &self.name,
                direction: TransferDirection::ToHost,
                bytes,
            });
            storage.host.copy_from_slice(&buffer.data);
        }
        self.on_device.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_array_is_host_resident() {
        let a = Array::from_vec("pressure", vec![1.0f32, 2.0, 3.0]);
        assert_eq!(a.len(), 3);
        assert_eq!(a.location(), Location::Host);
        assert_eq!(a.to_vec().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn resize_fills_new_slots() {
        let mut a = Array::filled("ids", 2, 7u32);
        a.resize(4, 0).unwrap();
        assert_eq!(a.to_vec().unwrap(), vec![7, 7, 0, 0]);
        a.resize(1, 0).unwrap();
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn writes_through_host_lease_are_visible() {
        let a = Array::filled("out", 3, 0i64);
        {
            let mut lease = a.write().unwrap();
            lease[1] = 42;
        }
        assert_eq!(a.into_vec(), vec![0, 42, 0]);
    }

    #[test]
    fn second_writer_is_busy() {
        let a = Array::filled("out", 3, 0u8);
        let _first = a.write().unwrap();
        assert!(matches!(a.write(), Err(MeshMapError::ArrayBusy(ref n)) if n == "out"));
    }

    #[test]
    fn readers_share_the_array() {
        let a = Array::filled("in", 3, 1u8);
        let r1 = a.read().unwrap();
        let r2 = a.read().unwrap();
        assert_eq!(r1.len() + r2.len(), 6);
    }
}
