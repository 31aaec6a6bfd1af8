//! Serializable image summaries for tooling
//!
//! Packaging and inspection tools want a human-auditable view of an
//! image next to the binary itself, so the summary types serialize to
//! JSON via serde.

use serde::{Deserialize, Serialize};

use crate::image::{Image, Result};

/// Summary of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub kind: String,
    pub da: u64,
    pub len: u32,
}

/// Summary of a parsed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub version: u32,
    /// Text header, lossily decoded.
    pub text_header: String,
    pub sections: Vec<SectionSummary>,
}

impl Image<'_> {
    /// Walk the section stream and collect a summary.
    ///
    /// # Errors
    ///
    /// Propagates the first decode error the stream hits.
    pub fn summary(&self) -> Result<ImageSummary> {
        let mut sections = Vec::new();
        for section in self.sections() {
            let section = section?;
            sections.push(SectionSummary {
                kind: section.kind.label().to_string(),
                da: section.da,
                len: section.payload.len() as u32,
            });
        }
        Ok(ImageSummary {
            version: self.version(),
            text_header: String::from_utf8_lossy(self.text_header()).into_owned(),
            sections,
        })
    }
}

impl ImageSummary {
    /// Pretty-printed JSON, for inspection tools.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ImageBuilder;
    use crate::format::SectionKind;

    #[test]
    fn test_summary_contents() {
        let bytes = ImageBuilder::new(4)
            .text_header(b"v4 image")
            .section(SectionKind::Text, 0x1000, &[0; 64])
            .section(SectionKind::Data, 0x2000, &[0; 32])
            .build();
        let summary = Image::parse(&bytes).unwrap().summary().unwrap();

        assert_eq!(summary.version, 4);
        assert_eq!(summary.text_header, "v4 image");
        assert_eq!(summary.sections.len(), 2);
        assert_eq!(summary.sections[0].kind, "text");
        assert_eq!(summary.sections[1].da, 0x2000);
    }

    #[test]
    fn test_summary_json_roundtrip() {
        let bytes = ImageBuilder::new(1)
            .section(SectionKind::Data, 8, &[1, 2])
            .build();
        let summary = Image::parse(&bytes).unwrap().summary().unwrap();
        let json = summary.to_json();
        let back: ImageSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
