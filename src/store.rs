//! Store Module
//!
//! The top-level object that owns every device, the geometry defaults, and
//! the control plane.
//!
//! ## Responsibilities
//! - Create the device array at startup, seeded from the config
//! - Hand out device handles (the open collaborator)
//! - Route control-plane commands
//! - Free everything on drop (chains are plain owned data)

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::device::Device;
use crate::error::{Result, StoreError};
use crate::geometry::{Geometry, GeometryDefaults};
use crate::handle::{DeviceHandle, OpenMode};
use crate::introspect;
use crate::protocol::ControlPlane;

/// A set of independent sparse byte devices sharing one pair of geometry
/// defaults
pub struct Store {
    config: Config,
    defaults: GeometryDefaults,
    devices: Vec<Arc<Device>>,
    control: ControlPlane,
}

impl Store {
    /// Create a store with `config.nr_devices` empty devices.
    ///
    /// Every device snapshots the initial geometry defaults; later default
    /// changes reach a device only through trim.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let defaults = GeometryDefaults::new(&config);
        let devices = (0..config.nr_devices)
            .map(|i| Arc::new(Device::new(i, defaults.clone())))
            .collect();
        let control = ControlPlane::new(defaults.clone());

        info!(
            nr_devices = config.nr_devices,
            quantum = config.quantum,
            qset = config.qset,
            "store created"
        );

        Ok(Self {
            config,
            defaults,
            devices,
            control,
        })
    }

    /// Create a store with the default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Look up a device by index
    pub fn device(&self, index: usize) -> Result<&Arc<Device>> {
        self.devices.get(index).ok_or_else(|| {
            StoreError::InvalidArgument(format!(
                "device index {index} out of range (store has {})",
                self.devices.len()
            ))
        })
    }

    /// Open a handle on a device. Write-only opens trim the device before
    /// first use; closing a handle needs no store-side action.
    pub fn open(&self, index: usize, mode: OpenMode) -> Result<DeviceHandle> {
        let device = Arc::clone(self.device(index)?);
        Ok(DeviceHandle::open(device, mode))
    }

    /// The control plane for this store's geometry defaults
    pub fn control(&self) -> &ControlPlane {
        &self.control
    }

    /// Snapshot of the current geometry defaults
    pub fn defaults(&self) -> Geometry {
        self.defaults.snapshot()
    }

    /// Number of devices in the store
    pub fn nr_devices(&self) -> usize {
        self.devices.len()
    }

    /// Text dump of every device's structure state (diagnostics only)
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for device in &self.devices {
            out.push_str(&introspect::dump_device(device));
        }
        out
    }

    /// The configuration this store was created with
    pub fn config(&self) -> &Config {
        &self.config
    }
}
