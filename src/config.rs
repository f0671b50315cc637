//! Runtime configuration: which backends and devices the device cache exposes
//!
//! The device cache is populated once per process. By default it is built
//! from the environment:
//!
//! - `GPUFLOW_BACKENDS`: comma-separated `backend[:device_count]` list, e.g.
//!   `"cuda:1,opencl:2,cpu"`. Defaults to a single CPU device.
//! - `GPUFLOW_NO_DOUBLE`: comma-separated backends whose devices lack
//!   double-precision support.
//!
//! Embedders that want a fixed set call `DeviceCache::install` with a config
//! built through [`RuntimeConfig::builder`] before any block is constructed.

use crate::error::{Error, Result};
use crate::runtime::Backend;

/// Environment variable listing the backends to expose
pub const BACKENDS_ENV: &str = "GPUFLOW_BACKENDS";

/// Environment variable listing backends without double support
pub const NO_DOUBLE_ENV: &str = "GPUFLOW_NO_DOUBLE";

/// Devices exposed for one backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend identifier
    pub backend: Backend,
    /// Number of devices, indexed from 0
    pub device_count: usize,
    /// Whether the devices support float64/complex_float64
    pub supports_double: bool,
}

/// Set of backends and devices the runtime exposes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    backends: Vec<BackendConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backends: vec![BackendConfig {
                backend: Backend::Cpu,
                device_count: 1,
                supports_double: true,
            }],
        }
    }
}

impl RuntimeConfig {
    /// Start an empty builder
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Configured backends, in insertion order
    pub fn backends(&self) -> &[BackendConfig] {
        &self.backends
    }

    /// Read `GPUFLOW_BACKENDS` / `GPUFLOW_NO_DOUBLE`
    ///
    /// Falls back to [`RuntimeConfig::default`] when `GPUFLOW_BACKENDS` is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BACKENDS_ENV) {
            Ok(backends) => {
                let no_double = std::env::var(NO_DOUBLE_ENV).ok();
                Self::parse(&backends, no_double.as_deref())
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parse the environment-variable syntax
    pub fn parse(backends: &str, no_double: Option<&str>) -> Result<Self> {
        let mut builder = Self::builder();

        for item in backends.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, count) = match item.split_once(':') {
                Some((name, count)) => {
                    let count = count.trim().parse::<usize>().map_err(|_| {
                        Error::invalid_argument(
                            "device_count",
                            format!("invalid device count in \"{item}\""),
                        )
                    })?;
                    (name, count)
                }
                None => (item, 1),
            };
            builder = builder.backend(name.parse()?, count);
        }

        if let Some(list) = no_double {
            for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                builder = builder.without_double(name.parse()?);
            }
        }

        builder.build()
    }
}

/// Builder for [`RuntimeConfig`]
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfigBuilder {
    backends: Vec<BackendConfig>,
    no_double: Vec<Backend>,
}

impl RuntimeConfigBuilder {
    /// Expose `device_count` devices of `backend`
    pub fn backend(mut self, backend: Backend, device_count: usize) -> Self {
        self.backends.push(BackendConfig {
            backend,
            device_count,
            supports_double: true,
        });
        self
    }

    /// Mark `backend`'s devices as lacking double precision
    pub fn without_double(mut self, backend: Backend) -> Self {
        self.no_double.push(backend);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<RuntimeConfig> {
        if self.backends.is_empty() {
            return Err(Error::invalid_argument(
                "backends",
                "at least one backend must be configured",
            ));
        }

        let mut backends: Vec<BackendConfig> = Vec::with_capacity(self.backends.len());
        for mut config in self.backends {
            if config.device_count == 0 {
                return Err(Error::invalid_argument(
                    "device_count",
                    format!("{} needs at least one device", config.backend),
                ));
            }
            if backends.iter().any(|b| b.backend == config.backend) {
                return Err(Error::invalid_argument(
                    "backends",
                    format!("{} configured twice", config.backend),
                ));
            }
            config.supports_double = !self.no_double.contains(&config.backend);
            backends.push(config);
        }

        for backend in &self.no_double {
            if !backends.iter().any(|b| b.backend == *backend) {
                return Err(Error::invalid_argument(
                    "no_double",
                    format!("{backend} is not a configured backend"),
                ));
            }
        }

        Ok(RuntimeConfig { backends })
    }
}
