//! Firmware section loading
//!
//! The loader walks a parsed image section by section: translate the
//! device address, take a temporary host mapping, copy the payload in,
//! and hand resource sections to the interpreter. Text and data are
//! placed identically today.

use rproc_image::{Image, SectionKind};
use tracing::{debug, info};

use crate::error::Result;
use crate::mapping::{HostMemory, MappedRegion};
use crate::resource_table::interpret;
use crate::translate::{translate, AddressMap};

/// A trace buffer bound during firmware load.
///
/// Holds the mapping open until the binding is dropped, which happens
/// on the last release or when a failed load rolls back.
pub(crate) struct TraceBinding {
    pub region: Box<dyn MappedRegion>,
    pub len: usize,
    pub name: String,
}

/// Working state for one firmware load.
///
/// Collects whatever the pipeline acquires; nothing is committed to
/// the processor record until the whole image processed cleanly, so
/// failure rollback is simply dropping the context.
pub(crate) struct LoadContext<'a> {
    pub name: &'a str,
    pub maps: Option<&'a AddressMap>,
    pub memory: &'a dyn HostMemory,
    pub traces: Vec<TraceBinding>,
    pub bootaddr: Option<u64>,
}

impl<'a> LoadContext<'a> {
    pub fn new(name: &'a str, maps: Option<&'a AddressMap>, memory: &'a dyn HostMemory) -> Self {
        Self {
            name,
            maps,
            memory,
            traces: Vec::new(),
            bootaddr: None,
        }
    }
}

/// Process a complete firmware image and return its boot address
/// (zero when the image announced none).
///
/// The resource interpreter runs against the bytes read back from the
/// just-written mapping, so it sees exactly the table the remote core
/// will see.
pub(crate) fn load_image(bytes: &[u8], ctx: &mut LoadContext<'_>) -> Result<u64> {
    let image = Image::parse(bytes)?;
    info!(
        rproc = ctx.name,
        version = image.version(),
        size = bytes.len(),
        "processing firmware image"
    );

    for section in image.sections() {
        let section = section?;
        debug!(
            kind = section.kind.label(),
            da = section.da,
            len = section.payload.len(),
            "section"
        );

        let pa = translate(ctx.maps, section.da)?;
        let region = ctx.memory.map(pa, section.payload.len())?;
        region.write(0, section.payload)?;

        if section.kind == SectionKind::Resource {
            let mut table = vec![0u8; section.payload.len()];
            region.read(0, &mut table)?;
            interpret(&table, ctx)?;
        }
    }

    Ok(ctx.bootaddr.unwrap_or(0))
}
