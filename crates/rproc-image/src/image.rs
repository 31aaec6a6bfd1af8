//! Container parsing and the lazy section stream

use crate::format::{
    read_u32, read_u64, SectionKind, IMAGE_HEADER_LEN, MAGIC, SECTION_HEADER_LEN,
};

/// Errors produced while decoding a firmware image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// The buffer cannot even hold the fixed image header.
    #[error("image too small ({len} bytes)")]
    TooSmall { len: usize },

    /// The first four bytes are not `RPRC`.
    #[error("image is corrupted (bad magic)")]
    BadMagic,

    /// A declared length overruns the remaining bytes.
    #[error("firmware image is truncated")]
    Truncated,

    /// A section carries a type this revision does not understand.
    #[error("unknown section type {raw} at offset {offset}")]
    UnknownSection { raw: u32, offset: usize },
}

/// Result type for image decoding.
pub type Result<T> = std::result::Result<T, ImageError>;

/// A parsed firmware image.
///
/// Parsing validates only the fixed header and the text-header bounds;
/// sections are decoded lazily by the [`Sections`] iterator, so a
/// damaged tail is not noticed until iteration reaches it.
///
/// The image borrows the input buffer; section payloads are zero-copy
/// sub-slices of it.
///
/// # Example
///
/// ```
/// use rproc_image::{Image, ImageBuilder, SectionKind};
///
/// let bytes = ImageBuilder::new(1)
///     .section(SectionKind::Data, 0x1000, &[0xde, 0xad, 0xbe, 0xef])
///     .build();
///
/// let image = Image::parse(&bytes).unwrap();
/// assert_eq!(image.version(), 1);
/// let section = image.sections().next().unwrap().unwrap();
/// assert_eq!(section.da, 0x1000);
/// assert_eq!(section.payload, &[0xde, 0xad, 0xbe, 0xef]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    version: u32,
    text_header: &'a [u8],
    sections: &'a [u8],
}

impl<'a> Image<'a> {
    /// Validate the container header and return a handle over the image.
    ///
    /// # Errors
    ///
    /// [`ImageError::TooSmall`] if the buffer is shorter than the fixed
    /// header, [`ImageError::BadMagic`] if the magic does not match, and
    /// [`ImageError::Truncated`] if the declared text header overruns
    /// the buffer.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < IMAGE_HEADER_LEN {
            return Err(ImageError::TooSmall { len: bytes.len() });
        }
        if bytes[0..4] != MAGIC {
            return Err(ImageError::BadMagic);
        }

        let version = read_u32(bytes, 4);
        let header_len = read_u32(bytes, 8) as usize;

        let body = &bytes[IMAGE_HEADER_LEN..];
        if body.len() < header_len {
            return Err(ImageError::Truncated);
        }

        Ok(Self {
            version,
            text_header: &body[..header_len],
            sections: &body[header_len..],
        })
    }

    /// Image format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The free-form text header. Usually short, human-oriented build
    /// provenance; may be empty.
    pub fn text_header(&self) -> &'a [u8] {
        self.text_header
    }

    /// Lazy iterator over the image's sections.
    ///
    /// An image holding nothing after the text header yields an empty
    /// stream, not an error.
    pub fn sections(&self) -> Sections<'a> {
        Sections {
            data: self.sections,
            offset: 0,
        }
    }
}

/// One section of a firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    /// Device address the remote core expects this section at.
    pub da: u64,
    pub payload: &'a [u8],
}

impl Section<'_> {
    /// Re-encode this section's header exactly as it appears on disk.
    pub fn header_bytes(&self) -> [u8; SECTION_HEADER_LEN] {
        let mut out = [0u8; SECTION_HEADER_LEN];
        out[0..4].copy_from_slice(&self.kind.as_u32().to_le_bytes());
        out[4..12].copy_from_slice(&self.da.to_le_bytes());
        out[12..16].copy_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out
    }
}

/// Lazy stream of sections.
///
/// Each advance reads one section header and its payload. Yields
/// `Err` once and then ends if the remaining bytes cannot hold what
/// the header declares.
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Sections<'a> {
    type Item = Result<Section<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = &self.data[self.offset..];
        if remaining.is_empty() {
            return None;
        }
        if remaining.len() < SECTION_HEADER_LEN {
            self.offset = self.data.len();
            return Some(Err(ImageError::Truncated));
        }

        let raw_kind = read_u32(remaining, 0);
        let da = read_u64(remaining, 4);
        let len = read_u32(remaining, 12) as usize;

        let Some(kind) = SectionKind::from_u32(raw_kind) else {
            let offset = self.offset;
            self.offset = self.data.len();
            return Some(Err(ImageError::UnknownSection {
                raw: raw_kind,
                offset,
            }));
        };

        let payload = &remaining[SECTION_HEADER_LEN..];
        if payload.len() < len {
            self.offset = self.data.len();
            return Some(Err(ImageError::Truncated));
        }

        self.offset += SECTION_HEADER_LEN + len;
        Some(Ok(Section {
            kind,
            da,
            payload: &payload[..len],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ImageBuilder;

    #[test]
    fn test_too_small() {
        assert!(matches!(
            Image::parse(&[0u8; 4]),
            Err(ImageError::TooSmall { len: 4 })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = ImageBuilder::new(1).build();
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(matches!(Image::parse(&bytes), Err(ImageError::BadMagic)));
    }

    #[test]
    fn test_empty_image_has_no_sections() {
        let bytes = ImageBuilder::new(3).text_header(b"built by tests").build();
        let image = Image::parse(&bytes).unwrap();
        assert_eq!(image.version(), 3);
        assert_eq!(image.text_header(), b"built by tests");
        assert_eq!(image.sections().count(), 0);
    }

    #[test]
    fn test_text_header_overrun() {
        // header_len claims 100 bytes but only 2 follow
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RPRC");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(Image::parse(&bytes), Err(ImageError::Truncated)));
    }

    #[test]
    fn test_section_exact_fit() {
        let bytes = ImageBuilder::new(1)
            .section(SectionKind::Text, 0x2000, &[1, 2, 3])
            .build();
        let image = Image::parse(&bytes).unwrap();
        let sections: Vec<_> = image.sections().collect::<Result<_>>().unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Text);
        assert_eq!(sections[0].payload, &[1, 2, 3]);
    }

    #[test]
    fn test_section_payload_overrun() {
        let mut bytes = ImageBuilder::new(1)
            .section(SectionKind::Data, 0, &[9, 9, 9, 9])
            .build();
        // chop one payload byte: declared len no longer fits
        bytes.pop();
        let image = Image::parse(&bytes).unwrap();
        let result: Result<Vec<_>> = image.sections().collect();
        assert_eq!(result, Err(ImageError::Truncated));
    }

    #[test]
    fn test_partial_section_header_is_truncated() {
        let mut bytes = ImageBuilder::new(1).build();
        bytes.extend_from_slice(&[0u8; 7]); // less than a section header
        let image = Image::parse(&bytes).unwrap();
        let result: Result<Vec<_>> = image.sections().collect();
        assert_eq!(result, Err(ImageError::Truncated));
    }

    #[test]
    fn test_unknown_section_kind() {
        let mut bytes = ImageBuilder::new(1).build();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let image = Image::parse(&bytes).unwrap();
        let result: Result<Vec<_>> = image.sections().collect();
        assert_eq!(
            result,
            Err(ImageError::UnknownSection { raw: 7, offset: 0 })
        );
    }

    #[test]
    fn test_iterator_ends_after_error() {
        let mut bytes = ImageBuilder::new(1).build();
        bytes.extend_from_slice(&[0u8; 3]);
        let image = Image::parse(&bytes).unwrap();
        let mut sections = image.sections();
        assert!(matches!(sections.next(), Some(Err(ImageError::Truncated))));
        assert!(sections.next().is_none());
    }

    #[test]
    fn test_header_bytes_roundtrip() {
        let bytes = ImageBuilder::new(1)
            .section(SectionKind::Data, 0xdead_0000, &[0xaa; 32])
            .section(SectionKind::Text, 0x10, &[])
            .build();
        let image = Image::parse(&bytes).unwrap();

        // re-encoded headers must be byte-identical to the input
        let mut cursor = IMAGE_HEADER_LEN;
        for section in image.sections() {
            let section = section.unwrap();
            let header = section.header_bytes();
            assert_eq!(&bytes[cursor..cursor + 16], &header[..]);
            cursor += 16 + section.payload.len();
        }
    }
}
