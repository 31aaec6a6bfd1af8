//! The processor registry
//!
//! A process typically manages a handful of remote cores, so the
//! registry is a plain locked list with O(N) name lookups. Lookups
//! clone out an `Arc` and release the registry lock before touching
//! the record, so the registry lock and a record lock are never held
//! together.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use crate::backend::{Backend, OwnerPin, StaticOwner};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::fetch::{DirFetcher, FirmwareFetcher};
use crate::mapping::HostMemory;
use crate::rproc::{Handle, Rproc, MAX_NAME_LEN};
use crate::translate::AddressMap;

/// Registry-wide tunables.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Bound on waiting for a processor's lock in `get`; past it the
    /// acquire gives up with [`Error::Interrupted`].
    pub lock_deadline: Duration,
    /// Source of firmware blobs for the async loader.
    pub fetcher: Arc<dyn FirmwareFetcher>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lock_deadline: Duration::from_secs(5),
            fetcher: Arc::new(DirFetcher::new("firmware")),
        }
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("lock_deadline", &self.lock_deadline)
            .finish_non_exhaustive()
    }
}

/// Everything needed to register one remote processor.
///
/// The memory source and backend are mandatory; firmware, address map
/// and owner are optional extras layered on with builder methods.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use rproc_core::{Backend, BackendError, RamWindow, Registration, Registry};
///
/// struct NoopBackend;
/// impl Backend for NoopBackend {
///     fn start(&self, _bootaddr: u64) -> Result<(), BackendError> { Ok(()) }
///     fn stop(&self) -> Result<(), BackendError> { Ok(()) }
/// }
///
/// let registry = Registry::new();
/// registry.register(
///     Registration::new("dsp0", Arc::new(RamWindow::new(0, 0x1000)), Arc::new(NoopBackend))
///         .firmware("dsp0.img"),
/// )?;
/// # Ok::<(), rproc_core::Error>(())
/// ```
pub struct Registration {
    name: String,
    firmware: Option<String>,
    maps: Option<AddressMap>,
    backend: Arc<dyn Backend>,
    memory: Arc<dyn HostMemory>,
    owner: Arc<dyn OwnerPin>,
}

impl Registration {
    pub fn new(
        name: impl Into<String>,
        memory: Arc<dyn HostMemory>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            name: name.into(),
            firmware: None,
            maps: None,
            backend,
            memory,
            owner: Arc::new(StaticOwner),
        }
    }

    /// Name of the firmware image to load on first acquire.
    pub fn firmware(mut self, name: impl Into<String>) -> Self {
        self.firmware = Some(name.into());
        self
    }

    /// Address-translation table for cores behind a translation unit.
    pub fn maps(mut self, maps: AddressMap) -> Self {
        self.maps = Some(maps);
        self
    }

    /// Pin for the module supplying the backend.
    pub fn owner(mut self, owner: Arc<dyn OwnerPin>) -> Self {
        self.owner = owner;
        self
    }
}

/// Process-wide set of remote processors.
///
/// An explicit value rather than a global: embedders create one and
/// thread it to whoever registers or acquires processors.
pub struct Registry {
    rprocs: RwLock<Vec<Arc<Rproc>>>,
    config: RegistryConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rprocs: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Register a new remote processor.
    ///
    /// The record starts offline with no users.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidName`] for an empty, over-long or unprintable
    /// name; [`Error::Exists`] when the name is taken.
    pub fn register(&self, registration: Registration) -> Result<()> {
        let Registration {
            name,
            firmware,
            maps,
            backend,
            memory,
            owner,
        } = registration;

        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || name.chars().any(|c| c.is_control())
        {
            return Err(Error::InvalidName(name));
        }

        let mut rprocs = self.rprocs.write();
        if rprocs.iter().any(|r| r.name == name) {
            return Err(Error::Exists(name));
        }

        info!("{} is available", name);
        rprocs.push(Arc::new(Rproc::new(
            name, firmware, maps, backend, memory, owner,
        )));
        Ok(())
    }

    /// Unregister a remote processor.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no such processor exists, and
    /// [`Error::Busy`] while it still has users (including an
    /// acquisition whose firmware is still loading).
    pub fn unregister(&self, name: &str) -> Result<()> {
        let rproc = self.find(name).ok_or_else(|| Error::NotFound(name.to_string()))?;

        {
            let body = rproc.body.lock();
            if body.count > 0 {
                return Err(Error::Busy(name.to_string()));
            }
        }

        let mut rprocs = self.rprocs.write();
        // a get racing this removal keeps the record alive via its own Arc
        match rprocs.iter().position(|r| Arc::ptr_eq(r, &rproc)) {
            Some(index) => {
                rprocs.remove(index);
                info!("removed {}", name);
                Ok(())
            }
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Acquire a processor by name, booting it on first use.
    ///
    /// Returns as soon as the boot is underway; see [`Handle`] for the
    /// completion and failure model.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, name: &str) -> Result<Handle> {
        let rproc = self.find(name).ok_or_else(|| {
            tracing::error!("can't find remote processor {}", name);
            Error::NotFound(name.to_string())
        })?;
        rproc.acquire(Arc::clone(&self.config.fetcher), self.config.lock_deadline)
    }

    /// Read-only diagnostics view of a processor.
    pub fn diagnostics(&self, name: &str) -> Result<Diagnostics> {
        let rproc = self.find(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(Diagnostics::new(rproc))
    }

    /// Names of all registered processors, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.rprocs.read().iter().map(|r| r.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rprocs.read().iter().any(|r| r.name == name)
    }

    fn find(&self, name: &str) -> Option<Arc<Rproc>> {
        self.rprocs
            .read()
            .iter()
            .find(|r| r.name == name)
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::mapping::RamWindow;

    struct NoopBackend;

    impl Backend for NoopBackend {
        fn start(&self, _bootaddr: u64) -> std::result::Result<(), BackendError> {
            Ok(())
        }

        fn stop(&self) -> std::result::Result<(), BackendError> {
            Ok(())
        }
    }

    fn registration(name: &str) -> Registration {
        Registration::new(
            name,
            Arc::new(RamWindow::new(0, 0x1000)),
            Arc::new(NoopBackend),
        )
    }

    #[test]
    fn test_register_then_lookup() {
        let registry = Registry::new();
        registry.register(registration("p0")).unwrap();
        assert!(registry.contains("p0"));
        assert_eq!(registry.names(), vec!["p0"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = Registry::new();
        registry.register(registration("p0")).unwrap();
        assert!(matches!(
            registry.register(registration("p0")),
            Err(Error::Exists(_))
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let registry = Registry::new();
        assert!(matches!(
            registry.register(registration("")),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            registry.register(registration("bad\nname")),
            Err(Error::InvalidName(_))
        ));
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            registry.register(registration(&long)),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_name_at_limit_accepted() {
        let registry = Registry::new();
        let name = "x".repeat(MAX_NAME_LEN);
        registry.register(registration(&name)).unwrap();
        assert!(registry.contains(&name));
    }

    #[test]
    fn test_unregister_restores_prior_state() {
        let registry = Registry::new();
        registry.register(registration("p0")).unwrap();
        registry.unregister("p0").unwrap();
        assert!(!registry.contains("p0"));
        assert!(matches!(
            registry.unregister("p0"),
            Err(Error::NotFound(_))
        ));
        // the name is free again
        registry.register(registration("p0")).unwrap();
    }

    #[test]
    fn test_get_unknown_name() {
        let registry = Registry::new();
        assert!(matches!(registry.get("ghost"), Err(Error::NotFound(_))));
    }
}
