//! Execution configuration and backend selection.
//!
//! [`Executor`] picks the backend an [`Operation`] runs on from its
//! [`ExecutionConfig`] and the device it was given, if any. Configuration
//! comes from code, from serde (kebab-case mode names) or from the
//! environment:
//!
//! | variable | values |
//! |----------|--------|
//! | `TOPOMAP_EXECUTION_MODE` | `host`, `device`, `prefer-device` |
//! | `TOPOMAP_BLOCK_SIZE` | elements per block, non-zero |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backend::device::Device;
use crate::backend::executor::{BackendExecutor, DEFAULT_BLOCK_SIZE, DeviceExecutor, HostExecutor};
use crate::mesh_error::MeshMapError;

pub const ENV_EXECUTION_MODE: &str = "TOPOMAP_EXECUTION_MODE";
pub const ENV_BLOCK_SIZE: &str = "TOPOMAP_BLOCK_SIZE";

/// Which backend operations run on.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Always the host.
    #[default]
    #[serde(alias = "host")]
    ForceHost,
    /// Always the device; fails when none is configured.
    #[serde(alias = "device")]
    ForceDevice,
    /// The device when one is configured, the host otherwise.
    PreferDevice,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionMode::ForceHost => "host",
            ExecutionMode::ForceDevice => "device",
            ExecutionMode::PreferDevice => "prefer-device",
        })
    }
}

impl FromStr for ExecutionMode {
    type Err = MeshMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" | "force-host" => Ok(ExecutionMode::ForceHost),
            "device" | "force-device" => Ok(ExecutionMode::ForceDevice),
            "prefer-device" => Ok(ExecutionMode::PreferDevice),
            other => Err(MeshMapError::InvalidConfig(format!(
                "unknown execution mode `{other}` (expected host, device or prefer-device)"
            ))),
        }
    }
}

static DEFAULT_MODE: Lazy<RwLock<ExecutionMode>> =
    Lazy::new(|| RwLock::new(ExecutionMode::ForceHost));

/// Set the mode new [`ExecutionConfig`]s start from.
pub fn set_default_execution_mode(mode: ExecutionMode) {
    *DEFAULT_MODE.write() = mode;
}

/// The mode new [`ExecutionConfig`]s start from.
pub fn default_execution_mode() -> ExecutionMode {
    *DEFAULT_MODE.read()
}

/// Backend selection and loop tuning.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Consecutive elements per block, on both backends.
    pub block_size: usize,
    /// Spread host blocks over the rayon pool.
    pub host_parallel: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: default_execution_mode(),
            block_size: DEFAULT_BLOCK_SIZE,
            host_parallel: true,
        }
    }
}

impl ExecutionConfig {
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Defaults overridden by `TOPOMAP_EXECUTION_MODE` and
    /// `TOPOMAP_BLOCK_SIZE` when set.
    pub fn from_env() -> Result<Self, MeshMapError> {
        let mut config = Self::default();
        if let Ok(mode) = std::env::var(ENV_EXECUTION_MODE) {
            config.mode = mode.parse()?;
        }
        if let Ok(size) = std::env::var(ENV_BLOCK_SIZE) {
            config.block_size = size.trim().parse().map_err(|_| {
                MeshMapError::InvalidConfig(format!("{ENV_BLOCK_SIZE}=`{size}` is not a block size"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MeshMapError> {
        if self.block_size == 0 {
            return Err(MeshMapError::InvalidConfig("block_size must be positive".into()));
        }
        Ok(())
    }

    pub fn host_executor(&self) -> HostExecutor {
        HostExecutor::new(self.block_size, self.host_parallel)
    }
}

/// Work that can run on either backend.
pub trait Operation {
    type Output;

    /// Human-readable description for logs.
    fn describe(&self) -> String;

    fn run_with<E: BackendExecutor>(self, backend: &E) -> Result<Self::Output, MeshMapError>;
}

/// Runs operations on the backend chosen by its configuration.
#[derive(Clone, Debug, Default)]
pub struct Executor {
    config: ExecutionConfig,
    device: Option<Arc<dyn Device>>,
}

impl Executor {
    pub fn new(config: ExecutionConfig) -> Result<Self, MeshMapError> {
        config.validate()?;
        Ok(Self {
            config,
            device: None,
        })
    }

    /// Executor configured from the environment.
    pub fn from_env() -> Result<Self, MeshMapError> {
        Self::new(ExecutionConfig::from_env()?)
    }

    pub fn with_device(mut self, device: Arc<dyn Device>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn device(&self) -> Option<&Arc<dyn Device>> {
        self.device.as_ref()
    }

    /// Run `op` once on the selected backend.
    ///
    /// `ForceDevice` without a device fails before `op` touches any array.
    pub fn run<Op: Operation>(&self, op: Op) -> Result<Op::Output, MeshMapError> {
        match (self.config.mode, &self.device) {
            (ExecutionMode::ForceHost, _) => op.run_with(&self.config.host_executor()),
            (ExecutionMode::ForceDevice | ExecutionMode::PreferDevice, Some(device)) => {
                let backend =
                    DeviceExecutor::new(Arc::clone(device)).with_block_size(self.config.block_size);
                op.run_with(&backend)
            }
            (ExecutionMode::ForceDevice, None) => Err(MeshMapError::BackendUnavailable(
                if cfg!(feature = "device-emulation") {
                    format!("no device configured to run {}", op.describe())
                } else {
                    format!(
                        "built without device support and no device configured to run {}",
                        op.describe()
                    )
                },
            )),
            (ExecutionMode::PreferDevice, None) => {
                log::info!("no device configured, running {} on the host", op.describe());
                op.run_with(&self.config.host_executor())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_names() {
        assert_eq!("host".parse::<ExecutionMode>().unwrap(), ExecutionMode::ForceHost);
        assert_eq!(" Device ".parse::<ExecutionMode>().unwrap(), ExecutionMode::ForceDevice);
        assert_eq!(
            "prefer-device".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::PreferDevice
        );
        assert!(matches!(
            "gpu".parse::<ExecutionMode>(),
            Err(MeshMapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn display_parses_back() {
        for mode in [
            ExecutionMode::ForceHost,
            ExecutionMode::ForceDevice,
            ExecutionMode::PreferDevice,
        ] {
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let config = ExecutionConfig {
            block_size: 0,
            ..ExecutionConfig::default()
        };
        assert!(matches!(
            Executor::new(config),
            Err(MeshMapError::InvalidConfig(_))
        ));
    }
}
