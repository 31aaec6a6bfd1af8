//! # rproc-image - Remote Processor Firmware Container
//!
//! Decoder, builder and tooling formats for the packed firmware
//! container that remote-processor images ship in.
//!
//! ## Architecture
//!
//! ```text
//! bytes ──> Image::parse ──> Sections (lazy) ──> Section { kind, da, payload }
//!                                   │
//!                                   └─ Resource payload ──> resource_entries
//! ```
//!
//! - Parsing validates the fixed header eagerly and sections lazily,
//!   so huge images cost nothing until iterated.
//! - Section payloads are zero-copy borrows of the input buffer.
//! - All multi-byte fields are little-endian, decoded with explicit
//!   `from_le_bytes` calls; there are no unaligned structure overlays.
//! - [`ImageBuilder`] emits the same format for tests and packaging
//!   tools, and [`ImageSummary`] gives tools a JSON view.

pub mod builder;
pub mod format;
pub mod image;
pub mod resource;
pub mod summary;

pub use builder::{ImageBuilder, ResourceTableBuilder};
pub use format::{
    ResourceKind, SectionKind, IMAGE_HEADER_LEN, MAGIC, RESOURCE_ENTRY_LEN, RESOURCE_NAME_LEN,
    SECTION_HEADER_LEN,
};
pub use image::{Image, ImageError, Section, Sections};
pub use resource::{resource_entries, ResourceEntries, ResourceEntry};
pub use summary::{ImageSummary, SectionSummary};
