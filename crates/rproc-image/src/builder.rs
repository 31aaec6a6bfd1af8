//! Firmware image construction
//!
//! Builders emit well-formed container bytes for tests, benches and
//! packaging tools. Output uses the same explicit little-endian
//! encoding the parser reads back.

use crate::format::{ResourceKind, SectionKind, MAGIC, RESOURCE_NAME_LEN};

/// Compose a firmware image.
///
/// # Example
///
/// ```
/// use rproc_image::{ImageBuilder, ResourceTableBuilder, SectionKind};
///
/// let image = ImageBuilder::new(1)
///     .text_header(b"demo build")
///     .section(SectionKind::Text, 0x1000, &[0x90; 16])
///     .resource_table(
///         0x8000,
///         ResourceTableBuilder::new()
///             .bootaddr(0x1000)
///             .trace(0x9000, 256, "trace"),
///     )
///     .build();
/// assert_eq!(&image[0..4], b"RPRC");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
    version: u32,
    text_header: Vec<u8>,
    sections: Vec<(SectionKind, u64, Vec<u8>)>,
}

impl ImageBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            text_header: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Set the free-form text header.
    pub fn text_header(mut self, header: &[u8]) -> Self {
        self.text_header = header.to_vec();
        self
    }

    /// Append a section to be placed at device address `da`.
    pub fn section(mut self, kind: SectionKind, da: u64, payload: &[u8]) -> Self {
        self.sections.push((kind, da, payload.to_vec()));
        self
    }

    /// Append a resource section built from `table`.
    pub fn resource_table(self, da: u64, table: ResourceTableBuilder) -> Self {
        let payload = table.build();
        self.section(SectionKind::Resource, da, &payload)
    }

    /// Emit the image bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.text_header.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.text_header);

        for (kind, da, payload) in &self.sections {
            out.extend_from_slice(&kind.as_u32().to_le_bytes());
            out.extend_from_slice(&da.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }

        out
    }
}

/// Compose a resource-table payload.
#[derive(Debug, Clone, Default)]
pub struct ResourceTableBuilder {
    entries: Vec<u8>,
}

impl ResourceTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary entry. The name is truncated to the field
    /// width and NUL-padded.
    pub fn entry(
        mut self,
        kind: ResourceKind,
        da: u64,
        pa: u64,
        len: u32,
        flags: u32,
        name: &str,
    ) -> Self {
        self.entries.extend_from_slice(&kind.as_u32().to_le_bytes());
        self.entries.extend_from_slice(&da.to_le_bytes());
        self.entries.extend_from_slice(&pa.to_le_bytes());
        self.entries.extend_from_slice(&len.to_le_bytes());
        self.entries.extend_from_slice(&flags.to_le_bytes());

        let mut field = [0u8; RESOURCE_NAME_LEN];
        let bytes = name.as_bytes();
        let n = bytes.len().min(RESOURCE_NAME_LEN);
        field[..n].copy_from_slice(&bytes[..n]);
        self.entries.extend_from_slice(&field);
        self
    }

    /// Announce a trace buffer of `len` bytes at device address `da`.
    pub fn trace(self, da: u64, len: u32, name: &str) -> Self {
        self.entry(ResourceKind::Trace, da, 0, len, 0, name)
    }

    /// Announce the boot address.
    pub fn bootaddr(self, da: u64) -> Self {
        self.entry(ResourceKind::Bootaddr, da, 0, 0, 0, "bootaddr")
    }

    /// Emit the table bytes.
    pub fn build(&self) -> Vec<u8> {
        self.entries.clone()
    }
}
