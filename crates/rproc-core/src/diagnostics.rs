//! Read-only diagnostics views
//!
//! Users poking at a live system get three things per processor: its
//! name, its state, and whatever trace text the remote core has
//! written. The views render the same text a procfs-style file would
//! hold, newline included, so they can be dumped as-is.

use std::sync::Arc;

use crate::error::Result;
use crate::rproc::{Rproc, State};

/// Label for a raw state code, `"invalid state"` for anything unknown.
pub fn state_string(code: u32) -> &'static str {
    match code {
        0 => "offline",
        1 => "suspended",
        2 => "running",
        3 => "loading",
        4 => "crashed",
        _ => "invalid state",
    }
}

/// Read-only view of one processor.
///
/// The view keeps the record alive but never mutates it; it stays
/// usable (frozen at the record's live state) even after the
/// processor is unregistered.
pub struct Diagnostics {
    rproc: Arc<Rproc>,
}

impl Diagnostics {
    pub(crate) fn new(rproc: Arc<Rproc>) -> Self {
        Self { rproc }
    }

    pub fn name(&self) -> &str {
        &self.rproc.name
    }

    /// The name file: `"<name>\n"`.
    pub fn name_text(&self) -> String {
        format!("{}\n", self.rproc.name)
    }

    pub fn state(&self) -> State {
        self.rproc.body.lock().state
    }

    /// The state file: `"<label> (<code>)\n"`, e.g. `"running (2)\n"`.
    pub fn state_text(&self) -> String {
        let state = self.state();
        format!("{} ({})\n", state_string(state.code()), state.code())
    }

    /// Declared length of a bound trace buffer, `None` while unbound.
    pub fn trace_len(&self, index: usize) -> Option<usize> {
        let body = self.rproc.body.lock();
        body.traces.get(index)?.as_ref().map(|t| t.len)
    }

    /// Name the firmware gave a bound trace buffer.
    pub fn trace_name(&self, index: usize) -> Option<String> {
        let body = self.rproc.body.lock();
        body.traces.get(index)?.as_ref().map(|t| t.name.clone())
    }

    /// Read a trace buffer: the prefix up to the first NUL byte.
    ///
    /// `Ok(None)` while the slot is unbound. Does not account for
    /// wrapping; a ring-buffer format is a desirable improvement.
    pub fn trace(&self, index: usize) -> Result<Option<Vec<u8>>> {
        let body = self.rproc.body.lock();
        let Some(binding) = body.traces.get(index).and_then(|t| t.as_ref()) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; binding.len];
        binding.region.read(0, &mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        buf.truncate(end);
        Ok(Some(buf))
    }
}
