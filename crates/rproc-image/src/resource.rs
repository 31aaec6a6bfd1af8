//! Resource-table entries
//!
//! A `Resource` section's payload is a sequence of fixed-size entries.
//! Entries describe services the remote core requests from the host:
//! trace buffers, a boot address, carveouts, device memory. Fields are
//! interpreted per kind; unused fields are zero by convention.

use crate::format::{read_u32, read_u64, ResourceKind, RESOURCE_ENTRY_LEN, RESOURCE_NAME_LEN};

/// One decoded resource entry.
///
/// The meaning of `da`, `pa`, `len` and `flags` depends on the kind:
/// a trace entry uses `da`/`len` to place the buffer, a bootaddr entry
/// carries the entry point in `da`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEntry {
    pub kind: ResourceKind,
    pub da: u64,
    pub pa: u64,
    pub len: u32,
    pub flags: u32,
    name: [u8; RESOURCE_NAME_LEN],
}

impl ResourceEntry {
    /// Decode one entry from the start of `bytes`.
    ///
    /// Callers guarantee `bytes.len() >= RESOURCE_ENTRY_LEN`; the
    /// iterator below is the only decoder entry point that deals with
    /// short tails.
    pub(crate) fn decode(bytes: &[u8]) -> Self {
        let mut name = [0u8; RESOURCE_NAME_LEN];
        name.copy_from_slice(&bytes[28..28 + RESOURCE_NAME_LEN]);
        Self {
            kind: ResourceKind::from_u32(read_u32(bytes, 0)),
            da: read_u64(bytes, 4),
            pa: read_u64(bytes, 12),
            len: read_u32(bytes, 20),
            flags: read_u32(bytes, 24),
            name,
        }
    }

    /// The NUL-trimmed entry name, lossily decoded as UTF-8.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(RESOURCE_NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Raw NUL-padded name field.
    pub fn name_bytes(&self) -> &[u8; RESOURCE_NAME_LEN] {
        &self.name
    }
}

/// Iterate the complete entries in a resource-table payload.
///
/// Trailing bytes shorter than one entry are ignored, so a table whose
/// producer padded the section keeps decoding cleanly.
pub fn resource_entries(payload: &[u8]) -> ResourceEntries<'_> {
    ResourceEntries { payload, offset: 0 }
}

/// Iterator over resource entries. See [`resource_entries`].
#[derive(Debug, Clone)]
pub struct ResourceEntries<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl Iterator for ResourceEntries<'_> {
    type Item = ResourceEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = &self.payload[self.offset..];
        if remaining.len() < RESOURCE_ENTRY_LEN {
            return None;
        }
        self.offset += RESOURCE_ENTRY_LEN;
        Some(ResourceEntry::decode(remaining))
    }
}
