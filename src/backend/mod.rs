//! Execution backends: devices, executors and backend selection.

pub mod config;
pub mod device;
pub mod executor;

pub use config::{
    ExecutionConfig, ExecutionMode, Executor, Operation, default_execution_mode,
    set_default_execution_mode,
};
pub use device::{Block, Device, Transfer, TransferDirection};
#[cfg(feature = "device-emulation")]
pub use device::{DeviceStats, EmulatedDevice};
pub use executor::{BackendExecutor, DEFAULT_BLOCK_SIZE, DeviceExecutor, HostExecutor};
