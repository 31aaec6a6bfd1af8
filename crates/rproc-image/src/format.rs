//! Binary layout of the firmware container
//!
//! The container is a packed little-endian format:
//!
//! ```text
//! [magic: b"RPRC"]
//! [version: u32]
//! [header_len: u32]
//! [header: header_len bytes of free-form text]
//! [sections...]
//! ```
//!
//! Each section is a 16-byte header followed by its payload:
//!
//! ```text
//! [type: u32]  [da: u64]  [len: u32]  [content: len bytes]
//! ```
//!
//! A `Resource` section's payload is itself a sequence of fixed-size
//! resource entries (see [`crate::resource`]).
//!
//! All numeric fields are decoded with explicit `from_le_bytes` calls.
//! No unaligned structure overlays, so the decoder is portable and easy
//! to fuzz.

/// Magic bytes at the start of every firmware image.
pub const MAGIC: [u8; 4] = *b"RPRC";

/// Size of the fixed image header (magic + version + header_len).
pub const IMAGE_HEADER_LEN: usize = 12;

/// Size of a section header (type + da + len).
pub const SECTION_HEADER_LEN: usize = 16;

/// Size of one resource entry (type + da + pa + len + flags + name).
pub const RESOURCE_ENTRY_LEN: usize = 76;

/// Size of the NUL-padded name field inside a resource entry.
pub const RESOURCE_NAME_LEN: usize = 48;

/// Section kinds understood by the loader.
///
/// Text and data are placed identically today; the distinction is kept
/// for future use (partial dumps, placing text in faster memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Resource table: host-side service requests, handled before boot.
    Resource,
    /// Executable code.
    Text,
    /// Initialized data.
    Data,
}

impl SectionKind {
    /// Decode a section type field. Unknown values are not accepted.
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SectionKind::Resource),
            1 => Some(SectionKind::Text),
            2 => Some(SectionKind::Data),
            _ => None,
        }
    }

    /// The on-disk encoding of this kind.
    pub fn as_u32(self) -> u32 {
        match self {
            SectionKind::Resource => 0,
            SectionKind::Text => 1,
            SectionKind::Data => 2,
        }
    }

    /// Lower-case label for logs and summaries.
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Resource => "resource",
            SectionKind::Text => "text",
            SectionKind::Data => "data",
        }
    }
}

/// Resource entry kinds.
///
/// Only trace buffers and the boot address are acted upon; the remaining
/// kinds are parsed and skipped so newer images keep loading on older
/// hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Carveout,
    Devmem,
    Device,
    Irq,
    /// Shared trace buffer the remote core writes log text into.
    Trace,
    /// Address of the first instruction to boot from (in `da`).
    Bootaddr,
    /// Anything this revision does not know about.
    Unknown(u32),
}

impl ResourceKind {
    /// Decode a resource type field. Never fails; unknown values are
    /// carried through as [`ResourceKind::Unknown`].
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => ResourceKind::Carveout,
            1 => ResourceKind::Devmem,
            2 => ResourceKind::Device,
            3 => ResourceKind::Irq,
            4 => ResourceKind::Trace,
            5 => ResourceKind::Bootaddr,
            other => ResourceKind::Unknown(other),
        }
    }

    /// The on-disk encoding of this kind.
    pub fn as_u32(self) -> u32 {
        match self {
            ResourceKind::Carveout => 0,
            ResourceKind::Devmem => 1,
            ResourceKind::Device => 2,
            ResourceKind::Irq => 3,
            ResourceKind::Trace => 4,
            ResourceKind::Bootaddr => 5,
            ResourceKind::Unknown(other) => other,
        }
    }
}

pub(crate) fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

pub(crate) fn read_u64(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
        buf[off + 4],
        buf[off + 5],
        buf[off + 6],
        buf[off + 7],
    ])
}
