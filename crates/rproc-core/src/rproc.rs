//! Processor records and the acquire/release lifecycle
//!
//! One [`Rproc`] exists per registered remote core. Users share it
//! through reference-counted [`Handle`]s: the first acquire boots the
//! core (firmware fetch and load run on a worker thread), later
//! acquires ride along, and the last release powers it off and tears
//! down host resources.
//!
//! ```text
//! OFFLINE --get(first)--> LOADING --load ok, start ok--> RUNNING
//!    ^                       │                              │
//!    └── load/start failed ──┘        last put ─────────────┘
//! ```
//!
//! All mutable record state lives behind one mutex; the backend is
//! only ever called with that mutex held.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::backend::{Backend, OwnerPin};
use crate::completion::Completion;
use crate::error::{Error, Result};
use crate::fetch::FirmwareFetcher;
use crate::loader::{load_image, LoadContext, TraceBinding};
use crate::mapping::HostMemory;
use crate::translate::AddressMap;

/// Names may not exceed this many bytes.
pub const MAX_NAME_LEN: usize = 100;

/// Remote processor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Powered off.
    Offline,
    /// Suspended; must be woken to receive a message.
    Suspended,
    /// Up and running.
    Running,
    /// Asynchronous firmware loading has started.
    Loading,
    /// Crashed; waits for recovery.
    Crashed,
}

impl State {
    /// Numeric code, as exposed by the diagnostics state view.
    pub fn code(self) -> u32 {
        match self {
            State::Offline => 0,
            State::Suspended => 1,
            State::Running => 2,
            State::Loading => 3,
            State::Crashed => 4,
        }
    }

    /// Lower-case label for logs and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            State::Offline => "offline",
            State::Suspended => "suspended",
            State::Running => "running",
            State::Loading => "loading",
            State::Crashed => "crashed",
        }
    }
}

// ================================================================================================
// Record
// ================================================================================================

/// Mutable fields of a processor record. Guarded by `Rproc::body`.
pub(crate) struct Body {
    pub state: State,
    pub count: u32,
    pub traces: [Option<TraceBinding>; 2],
}

/// One registered remote processor.
///
/// Immutable configuration lives directly on the struct; everything a
/// concurrent operation may touch sits inside `body`. The registry
/// hands out `Arc<Rproc>` clones, so a record outlives its
/// registration for as long as anyone still refers to it.
pub(crate) struct Rproc {
    pub(crate) name: String,
    pub(crate) firmware: Option<String>,
    pub(crate) maps: Option<AddressMap>,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) memory: Arc<dyn HostMemory>,
    pub(crate) owner: Arc<dyn OwnerPin>,
    pub(crate) body: Mutex<Body>,
    pub(crate) load_done: Completion,
}

impl Rproc {
    pub(crate) fn new(
        name: String,
        firmware: Option<String>,
        maps: Option<AddressMap>,
        backend: Arc<dyn Backend>,
        memory: Arc<dyn HostMemory>,
        owner: Arc<dyn OwnerPin>,
    ) -> Self {
        Self {
            name,
            firmware,
            maps,
            backend,
            memory,
            owner,
            body: Mutex::new(Body {
                state: State::Offline,
                count: 0,
                traces: [None, None],
            }),
            load_done: Completion::new(),
        }
    }

    /// Acquire one use of this processor, booting it if nobody else
    /// already has.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        fetcher: Arc<dyn FirmwareFetcher>,
        lock_deadline: Duration,
    ) -> Result<Handle> {
        let mut body = self
            .body
            .try_lock_for(lock_deadline)
            .ok_or(Error::Interrupted)?;

        // prevent the underlying implementation from being removed
        if !self.owner.try_pin() {
            error!("can't pin owner of {}", self.name);
            return Err(Error::Busy(self.name.clone()));
        }

        body.count += 1;
        if body.count > 1 {
            // already (being) powered up; ride along
            return Ok(Handle {
                rproc: Arc::clone(self),
            });
        }

        // puts must wait until the async loader settles
        self.load_done.arm();

        let Some(firmware) = self.firmware.clone() else {
            body.count -= 1;
            self.owner.unpin();
            self.load_done.complete();
            return Err(Error::MissingFirmware(self.name.clone()));
        };

        info!("powering up {}", self.name);
        body.state = State::Loading;

        let rproc = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("rproc-load-{}", self.name))
            .spawn(move || load_worker(rproc, fetcher, firmware));

        if let Err(e) = spawned {
            error!("can't spawn firmware loader for {}: {}", self.name, e);
            body.state = State::Offline;
            body.count -= 1;
            self.owner.unpin();
            self.load_done.complete();
            return Err(Error::FetchFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            });
        }

        Ok(Handle {
            rproc: Arc::clone(self),
        })
    }

    /// Abandon an in-flight boot: drop bindings, rewind every user's
    /// count (and owner pin), return to offline.
    fn abort_load(&self) {
        let mut body = self.body.lock();
        body.traces = [None, None];
        let users = body.count;
        body.count = 0;
        body.state = State::Offline;
        drop(body);

        for _ in 0..users {
            self.owner.unpin();
        }
    }
}

// ================================================================================================
// Async load
// ================================================================================================

/// Runs on a dedicated thread per boot: fetch the blob, place its
/// sections, interpret the resource table, then start the core.
///
/// Every exit path settles `load_done`, and failures leave the record
/// exactly as a last release would: no users, no bindings, offline.
#[tracing::instrument(skip_all, fields(rproc = %rproc.name, firmware = %firmware))]
fn load_worker(rproc: Arc<Rproc>, fetcher: Arc<dyn FirmwareFetcher>, firmware: String) {
    let blob = match fetcher.fetch(&firmware) {
        Ok(blob) => blob,
        Err(e) => {
            error!("failed to load {}: {}", firmware, e);
            rproc.abort_load();
            rproc.load_done.complete();
            return;
        }
    };

    let mut ctx = LoadContext::new(&rproc.name, rproc.maps.as_ref(), &*rproc.memory);
    match load_image(&blob, &mut ctx) {
        Ok(bootaddr) => {
            let mut body = rproc.body.lock();
            let mut bindings = ctx.traces.into_iter();
            body.traces = [bindings.next(), bindings.next()];

            match rproc.backend.start(bootaddr) {
                Ok(()) => {
                    body.state = State::Running;
                    info!("remote processor {} is now up", rproc.name);
                }
                Err(e) => {
                    error!("can't start {}: {}", rproc.name, e);
                    drop(body);
                    rproc.abort_load();
                }
            }
        }
        Err(e) => {
            error!("failed to process the image: {}", e);
            rproc.abort_load();
        }
    }

    rproc.load_done.complete();
}

// ================================================================================================
// Handle
// ================================================================================================

/// A live acquisition of a remote processor.
///
/// Obtained from [`Registry::get`]; every handle must eventually be
/// returned through [`Handle::put`]. Dropping a handle without `put`
/// leaks one use (the core stays up), mirroring the explicit
/// get/put discipline of the underlying protocol.
///
/// A successful `get` means "boot requested", not "booted": the
/// firmware pipeline runs asynchronously and failures surface on the
/// next operation or through the diagnostics view.
///
/// [`Registry::get`]: crate::registry::Registry::get
pub struct Handle {
    pub(crate) rproc: Arc<Rproc>,
}

impl Handle {
    pub fn name(&self) -> &str {
        &self.rproc.name
    }

    /// Current state. Blocks briefly on the record lock.
    pub fn state(&self) -> State {
        self.rproc.body.lock().state
    }

    /// Block until the in-flight firmware load (if any) settles.
    pub fn wait_until_settled(&self) {
        self.rproc.load_done.wait();
    }

    /// Release this use; the last release powers the core off.
    ///
    /// # Errors
    ///
    /// [`Error::AsymmetricRelease`] when the processor has no users:
    /// either a genuinely unbalanced `put`, or a handle whose boot
    /// failed and was rewound. [`Error::Backend`] when the core was
    /// running and the backend's `stop` failed; the processor is
    /// offline regardless.
    #[tracing::instrument(skip_all, fields(rproc = %self.rproc.name))]
    pub fn put(self) -> Result<()> {
        let rproc = self.rproc;

        if rproc.body.lock().count == 0 {
            error!("asymmetric release of {} (forgot to call get?)", rproc.name);
            return Err(Error::AsymmetricRelease);
        }

        // if the rproc is just being loaded now, wait
        rproc.load_done.wait();

        let mut body = rproc.body.lock();
        if body.count == 0 {
            // a failed load rewound the count while we waited
            error!("asymmetric release of {} (forgot to call get?)", rproc.name);
            return Err(Error::AsymmetricRelease);
        }

        body.count -= 1;
        if body.count > 0 {
            drop(body);
            rproc.owner.unpin();
            return Ok(());
        }

        body.traces = [None, None];

        let mut stop_failure = None;
        if body.state == State::Running {
            if let Err(e) = rproc.backend.stop() {
                error!("can't stop {}: {}", rproc.name, e);
                stop_failure = Some(e);
            }
        }
        body.state = State::Offline;
        drop(body);

        rproc.owner.unpin();
        info!("stopped remote processor {}", rproc.name);

        match stop_failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_match_labels() {
        let states = [
            (State::Offline, 0, "offline"),
            (State::Suspended, 1, "suspended"),
            (State::Running, 2, "running"),
            (State::Loading, 3, "loading"),
            (State::Crashed, 4, "crashed"),
        ];
        for (state, code, label) in states {
            assert_eq!(state.code(), code);
            assert_eq!(state.label(), label);
        }
    }
}
