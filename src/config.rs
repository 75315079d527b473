//! Configuration for quantastore
//!
//! Centralized configuration with compiled-in defaults.

/// Compiled-in default quantum size in bytes.
///
/// RESET on the control plane restores the global default to this value.
pub const DEFAULT_QUANTUM: usize = 4000;

/// Compiled-in default number of quantum slots per chain node.
pub const DEFAULT_QSET: usize = 1000;

/// Compiled-in default number of devices per store.
pub const DEFAULT_NR_DEVICES: usize = 4;

/// Main configuration for a quantastore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Number of independent devices the store exposes
    pub nr_devices: usize,

    // -------------------------------------------------------------------------
    // Geometry Configuration
    // -------------------------------------------------------------------------
    /// Initial global default quantum size (bytes per data buffer)
    pub quantum: usize,

    /// Initial global default qset size (quantum slots per chain node)
    pub qset: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nr_devices: DEFAULT_NR_DEVICES,
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// Geometry parameters must be positive; zero would make offset
    /// decomposition divide by zero.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.quantum == 0 {
            return Err(crate::StoreError::InvalidArgument(
                "quantum must be positive".to_string(),
            ));
        }
        if self.qset == 0 {
            return Err(crate::StoreError::InvalidArgument(
                "qset must be positive".to_string(),
            ));
        }
        if self.nr_devices == 0 {
            return Err(crate::StoreError::InvalidArgument(
                "nr_devices must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of devices
    pub fn nr_devices(mut self, count: usize) -> Self {
        self.config.nr_devices = count;
        self
    }

    /// Set the initial default quantum size (in bytes)
    pub fn quantum(mut self, bytes: usize) -> Self {
        self.config.quantum = bytes;
        self
    }

    /// Set the initial default qset size (slots per node)
    pub fn qset(mut self, slots: usize) -> Self {
        self.config.qset = slots;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
