//! Scoped residency leases over [`Array`] storage.
//!
//! A lease pins an array in one memory space for as long as it lives:
//! - [`ReadLease`]/[`WriteLease`] on the host hold the array's read/write lock
//!   after migrating any device copy back.
//! - [`DeviceResident`] holds the write lock while the device copy is
//!   authoritative and restores host residency on drop, on every exit path.
//!
//! Leases are taken with `try_*` locking: an array bound twice in conflicting
//! roles, or already pinned on the device, reports
//! [`MeshMapError::ArrayBusy`] instead of blocking.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::backend::device::Device;
use crate::data::array::{Array, ArrayStorage, ArrayValue, Location};
use crate::mesh_error::MeshMapError;

/// Memory space an operation runs in.
#[derive(Clone, Debug)]
pub enum Placement {
    Host,
    Device(Arc<dyn Device>),
}

impl Placement {
    pub fn location(&self) -> Location {
        match self {
            Placement::Host => Location::Host,
            Placement::Device(_) => Location::Device,
        }
    }
}

/// Device residency of one array; dropping it migrates the array back.
pub struct DeviceResident<'a, T: ArrayValue> {
    array: &'a Array<T>,
    storage: RwLockWriteGuard<'a, ArrayStorage<T>>,
}

impl<'a, T: ArrayValue> DeviceResident<'a, T> {
    pub(crate) fn acquire(
        array: &'a Array<T>,
        device: &Arc<dyn Device>,
    ) -> Result<Self, MeshMapError> {
        let mut storage = array.try_lock_write()?;
        array.migrate_to_device(&mut storage, device);
        Ok(Self { array, storage })
    }

    pub fn name(&self) -> &str {
        self.array.name()
    }

    /// Device-side data.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.current()
    }

    /// Device-side data; marks the device copy for write-back on release.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.mark_written();
        self.storage.current_mut()
    }

    /// Device-side data without scheduling a write-back; see
    /// [`commit`](Self::commit).
    #[inline]
    pub(crate) fn staged_mut(&mut self) -> &mut [T] {
        self.storage.current_mut()
    }

    /// Schedule the device copy for write-back on release.
    pub(crate) fn commit(&mut self) {
        self.storage.mark_written();
    }

    /// Release residency now instead of at end of scope.
    pub fn release(self) {}
}

impl<T: ArrayValue> Drop for DeviceResident<'_, T> {
    fn drop(&mut self) {
        self.array.migrate_to_host(&mut self.storage);
    }
}

/// Host access found the array left on a device by `need_on_device`.
fn warn_if_stranded<T: ArrayValue>(array: &Array<T>, storage: &ArrayStorage<T>) {
    if let Some(buffer) = &storage.device {
        log::warn!(
            "array `{}` still resident on `{}`; migrating back for host access",
            array.name(),
            buffer.device.name()
        );
    }
}

enum ReadInner<'a, T: ArrayValue> {
    Host(RwLockReadGuard<'a, ArrayStorage<T>>),
    Device(DeviceResident<'a, T>),
}

/// Shared access to an array in one memory space.
pub struct ReadLease<'a, T: ArrayValue> {
    inner: ReadInner<'a, T>,
}

impl<'a, T: ArrayValue> ReadLease<'a, T> {
    pub(crate) fn host(array: &'a Array<T>) -> Result<Self, MeshMapError> {
        if array.location() == Location::Host {
            if let Some(storage) = array.storage.try_read() {
                if storage.device.is_none() {
                    return Ok(Self {
                        inner: ReadInner::Host(storage),
                    });
                }
            }
        }
        let mut storage = array.try_lock_write()?;
        warn_if_stranded(array, &storage);
        array.migrate_to_host(&mut storage);
        Ok(Self {
            inner: ReadInner::Host(RwLockWriteGuard::downgrade(storage)),
        })
    }

    pub(crate) fn device(resident: DeviceResident<'a, T>) -> Self {
        Self {
            inner: ReadInner::Device(resident),
        }
    }

    pub fn location(&self) -> Location {
        match self.inner {
            ReadInner::Host(_) => Location::Host,
            ReadInner::Device(_) => Location::Device,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.inner {
            ReadInner::Host(storage) => &storage.host,
            ReadInner::Device(resident) => resident.as_slice(),
        }
    }
}

impl<T: ArrayValue> Deref for ReadLease<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

enum WriteInner<'a, T: ArrayValue> {
    Host(RwLockWriteGuard<'a, ArrayStorage<T>>),
    Device(DeviceResident<'a, T>),
}

/// Exclusive access to an array in one memory space.
///
/// Writes through a device lease stay on the device unless the lease is
/// [committed](Self::commit) before it drops.
pub struct WriteLease<'a, T: ArrayValue> {
    inner: WriteInner<'a, T>,
}

impl<'a, T: ArrayValue> WriteLease<'a, T> {
    pub(crate) fn host(array: &'a Array<T>) -> Result<Self, MeshMapError> {
        let mut storage = array.try_lock_write()?;
        warn_if_stranded(array, &storage);
        array.migrate_to_host(&mut storage);
        Ok(Self {
            inner: WriteInner::Host(storage),
        })
    }

    pub(crate) fn device(resident: DeviceResident<'a, T>) -> Self {
        Self {
            inner: WriteInner::Device(resident),
        }
    }

    pub fn location(&self) -> Location {
        match self.inner {
            WriteInner::Host(_) => Location::Host,
            WriteInner::Device(_) => Location::Device,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.inner {
            WriteInner::Host(storage) => &storage.host,
            WriteInner::Device(resident) => resident.as_slice(),
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.inner {
            WriteInner::Host(storage) => &mut storage.host,
            WriteInner::Device(resident) => resident.staged_mut(),
        }
    }

    /// Keep the writes made so far: a device copy is migrated back on drop.
    pub fn commit(&mut self) {
        if let WriteInner::Device(resident) = &mut self.inner {
            resident.commit();
        }
    }
}

impl<T: ArrayValue> Deref for WriteLease<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: ArrayValue> DerefMut for WriteLease<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}
