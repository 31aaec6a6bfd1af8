//! # rproc-core - Remote Processor Lifecycle Framework
//!
//! Boots and manages secondary cores (DSPs, co-processors) on a
//! heterogeneous platform: fetch a firmware image, place its sections
//! where the remote core expects them, honour the embedded resource
//! table, and ask a platform backend to power the core on. Users share
//! a booted core through reference-counted handles; the last release
//! powers it off and tears the host side down.
//!
//! ## Architecture
//!
//! ```text
//!            ┌───────────────────────────────────────────┐
//!            │                 Registry                   │
//!            │   register / unregister / get / put        │
//!            └─────┬──────────────────────────────────────┘
//!                  │ Arc<Rproc> (state machine, refcount)
//!        ┌─────────┼──────────────┬───────────────┐
//!        ▼         ▼              ▼               ▼
//!  FirmwareFetcher │         HostMemory        Backend
//!  (blob by name)  │      (temp mappings)   (start / stop)
//!                  ▼
//!        loader + resource table
//!   (rproc-image: parse, sections, entries)
//! ```
//!
//! The three traits on the bottom row are the platform seams: firmware
//! delivery, host-visible memory mappings, and physical power control.
//! Everything between them (parsing, placement, address translation,
//! the state machine and its concurrency rules) is this crate.
//!
//! ## Lifecycle
//!
//! The first `get` starts an asynchronous boot and returns
//! immediately; later `get`s ride along on the same boot. Failures
//! during the async pipeline rewind the processor to offline and
//! surface on the caller's next operation, or through
//! [`Diagnostics`]. Each `get` is balanced by a [`Handle::put`]; the
//! last one stops the core.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rproc_core::{Backend, BackendError, RamWindow, Registration, Registry};
//!
//! struct M3Backend;
//! impl Backend for M3Backend {
//!     fn start(&self, bootaddr: u64) -> Result<(), BackendError> {
//!         // release reset, program boot address...
//!         let _ = bootaddr;
//!         Ok(())
//!     }
//!     fn stop(&self) -> Result<(), BackendError> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::new();
//! registry.register(
//!     Registration::new("m3", Arc::new(RamWindow::new(0x8000_0000, 0x10_0000)), Arc::new(M3Backend))
//!         .firmware("m3-core.img"),
//! )?;
//!
//! let handle = registry.get("m3")?;
//! handle.wait_until_settled();
//! println!("{}", registry.diagnostics("m3")?.state_text());
//! handle.put()?;
//! # Ok::<(), rproc_core::Error>(())
//! ```

pub mod backend;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod mapping;
pub mod registry;
pub mod rproc;
pub mod translate;

mod completion;
mod loader;
mod resource_table;

pub use backend::{Backend, BackendError, OwnerPin, StaticOwner};
pub use diagnostics::{state_string, Diagnostics};
pub use error::{Error, Result};
pub use fetch::{DirFetcher, FirmwareFetcher, MemFetcher};
pub use mapping::{HostMemory, MappedRegion, RamWindow};
pub use registry::{Registration, Registry, RegistryConfig};
pub use rproc::{Handle, State, MAX_NAME_LEN};
pub use translate::{translate, AddressMap, MemEntry, IDENTITY_ADDR_MAX};
