//! Process-wide device cache
//!
//! Populated once, on first use or by an explicit `install`, and immutable
//! afterwards. Every device name lookup and availability check goes through
//! it.

use super::{ALL_BACKENDS, ArrayContext, Backend};
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use std::sync::OnceLock;

static DEVICE_CACHE: OnceLock<DeviceCache> = OnceLock::new();

/// One device known to the runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceCacheEntry {
    /// Unique device name, e.g. "OpenCL:1"
    pub name: String,
    /// Owning backend
    pub backend: Backend,
    /// Index within the backend
    pub device_index: usize,
    /// Platform description
    pub platform: String,
    /// float64/complex_float64 support
    pub supports_double: bool,
}

impl DeviceCacheEntry {
    /// The context selecting this device
    pub fn context(&self) -> ArrayContext {
        ArrayContext::new(self.backend, self.device_index)
    }
}

/// All devices available to this process
#[derive(Debug)]
pub struct DeviceCache {
    config: RuntimeConfig,
    entries: Vec<DeviceCacheEntry>,
}

impl DeviceCache {
    /// Enumerate the devices described by `config`
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut entries = Vec::new();

        // Entries are kept in "Auto" priority order regardless of config order.
        for backend in ALL_BACKENDS {
            let Some(backend_config) = config.backends().iter().find(|b| b.backend == backend)
            else {
                continue;
            };
            let platform = if backend.is_gpu() {
                format!("emulated {backend}")
            } else {
                format!("host {}", std::env::consts::ARCH)
            };
            for device_index in 0..backend_config.device_count {
                entries.push(DeviceCacheEntry {
                    name: format!("{backend}:{device_index}"),
                    backend,
                    device_index,
                    platform: platform.clone(),
                    supports_double: backend_config.supports_double,
                });
            }
        }

        Self {
            config: config.clone(),
            entries,
        }
    }

    /// The process cache, populated from the environment on first use
    pub fn global() -> &'static DeviceCache {
        DEVICE_CACHE.get_or_init(|| {
            let config = RuntimeConfig::from_env().unwrap_or_else(|err| {
                tracing::warn!("ignoring runtime configuration from environment: {err}");
                RuntimeConfig::default()
            });
            let cache = DeviceCache::from_config(&config);
            tracing::debug!(devices = cache.entries.len(), "device cache populated");
            cache
        })
    }

    /// Populate the process cache from `config`
    ///
    /// Succeeds if the cache is empty or already holds the same configuration.
    pub fn install(config: RuntimeConfig) -> Result<&'static DeviceCache> {
        let mut installed = false;
        let cache = DEVICE_CACHE.get_or_init(|| {
            installed = true;
            DeviceCache::from_config(&config)
        });

        if installed {
            tracing::debug!(devices = cache.entries.len(), "device cache installed");
        } else if cache.config != config {
            return Err(Error::state(
                "device cache already populated with a different configuration",
            ));
        }
        Ok(cache)
    }

    /// Every device, highest-priority backend first
    pub fn entries(&self) -> &[DeviceCacheEntry] {
        &self.entries
    }

    /// Backends with at least one device, in priority order
    pub fn backends(&self) -> Vec<Backend> {
        let mut backends: Vec<Backend> = self.entries.iter().map(|e| e.backend).collect();
        backends.dedup();
        backends
    }

    /// Devices belonging to `backend`
    pub fn devices(&self, backend: Backend) -> impl Iterator<Item = &DeviceCacheEntry> {
        self.entries.iter().filter(move |e| e.backend == backend)
    }

    /// Entry for (backend, device index)
    pub fn find(&self, ctx: ArrayContext) -> Option<&DeviceCacheEntry> {
        self.devices(ctx.backend).find(|e| e.device_index == ctx.device)
    }

    /// Entry named `name` within `backend`
    pub fn find_by_name(&self, backend: Backend, name: &str) -> Option<&DeviceCacheEntry> {
        self.devices(backend).find(|e| e.name == name)
    }

    /// Entry named `name` in any backend
    pub fn find_any_by_name(&self, name: &str) -> Option<&DeviceCacheEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// First device of `backend`
    pub fn default_device(&self, backend: Backend) -> Option<&DeviceCacheEntry> {
        self.devices(backend).next()
    }

    /// First device of the highest-priority backend
    pub fn default_context(&self) -> Result<ArrayContext> {
        self.entries
            .first()
            .map(DeviceCacheEntry::context)
            .ok_or_else(|| Error::internal("device cache is empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> DeviceCache {
        let config = RuntimeConfig::builder()
            .backend(Backend::Cpu, 1)
            .backend(Backend::OpenCl, 2)
            .without_double(Backend::OpenCl)
            .build()
            .unwrap();
        DeviceCache::from_config(&config)
    }

    #[test]
    fn test_entries_in_priority_order() {
        let cache = cache();
        let names: Vec<&str> = cache.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["OpenCL:0", "OpenCL:1", "CPU:0"]);
        assert_eq!(cache.backends(), vec![Backend::OpenCl, Backend::Cpu]);
        assert_eq!(
            cache.default_context().unwrap(),
            ArrayContext::new(Backend::OpenCl, 0)
        );
    }

    #[test]
    fn test_lookups() {
        let cache = cache();
        let entry = cache.find(ArrayContext::new(Backend::OpenCl, 1)).unwrap();
        assert_eq!(entry.name, "OpenCL:1");
        assert!(!entry.supports_double);

        assert!(cache.find(ArrayContext::new(Backend::Cuda, 0)).is_none());
        assert!(cache.find_by_name(Backend::Cpu, "OpenCL:0").is_none());
        assert_eq!(
            cache.find_any_by_name("CPU:0").unwrap().context(),
            ArrayContext::new(Backend::Cpu, 0)
        );
        assert_eq!(cache.default_device(Backend::OpenCl).unwrap().device_index, 0);
    }
}
