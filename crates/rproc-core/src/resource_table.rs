//! Resource-table interpretation
//!
//! The resource section is a little protocol between the firmware and
//! the host: each entry announces something the remote core wants the
//! host to know or provide before boot. This revision acts on trace
//! buffers and the boot address; everything else is parsed and skipped
//! so newer firmware keeps loading.

use rproc_image::{resource_entries, ResourceKind};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::loader::{LoadContext, TraceBinding};
use crate::translate::translate;

/// Trace buffers per processor. Two covers the dual-core devices this
/// framework grew up on; generalize when a third shows up.
pub(crate) const MAX_TRACE_BUFFERS: usize = 2;

/// Walk a resource table and apply each entry to the load context.
///
/// The first failing entry aborts the walk; the caller drops the load
/// context, releasing any trace mapping acquired during this load.
pub(crate) fn interpret(table: &[u8], ctx: &mut LoadContext<'_>) -> Result<()> {
    for entry in resource_entries(table) {
        debug!(
            kind = ?entry.kind,
            da = entry.da,
            len = entry.len,
            name = %entry.name(),
            "resource entry"
        );

        match entry.kind {
            ResourceKind::Trace => handle_trace(ctx, entry.da, entry.len, entry.name())?,
            ResourceKind::Bootaddr => {
                if ctx.bootaddr.is_some() {
                    warn!(rproc = ctx.name, "bootaddr already set, keeping the first");
                } else {
                    ctx.bootaddr = Some(entry.da);
                }
            }
            other => {
                // not much is supported yet, so don't be noisy
                debug!(rproc = ctx.name, kind = ?other, "unsupported resource");
            }
        }
    }
    Ok(())
}

fn handle_trace(ctx: &mut LoadContext<'_>, da: u64, len: u32, name: String) -> Result<()> {
    let pa = translate(ctx.maps, da)?;

    if ctx.traces.len() >= MAX_TRACE_BUFFERS {
        warn!(rproc = ctx.name, trace = %name, "skipping extra trace resource");
        return Err(Error::TooManyTraces);
    }

    let region = ctx.memory.map(pa, len as usize)?;
    ctx.traces.push(TraceBinding {
        region,
        len: len as usize,
        name,
    });
    Ok(())
}
