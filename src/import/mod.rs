//! Contact import from CSV, LinkedIn CSV and vCard files.
//!
//! Parsers take decoded text and return candidates; they never touch the
//! store. Records without enough information are dropped quietly. The only
//! hard failures are reading the file and decoding it as text.

mod fields;
mod generic;
mod linkedin;
mod vcard;

use std::path::Path;

use thiserror::Error;

pub use fields::{normalize_header, ImportedContact};
pub use generic::parse_csv;
pub use linkedin::{
    locate_header, parse_linkedin, HeaderRow, LinkedInColumns, HEADER_MARKERS, HEADER_SCAN_ROWS,
    MIN_HEADER_MARKERS,
};
pub use vcard::{parse_card, parse_line, parse_vcards, ParsedField, VCardError};

/// How much of a file is inspected when guessing its format.
pub const SNIFF_BYTES: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    LinkedIn,
    VCard,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::LinkedIn => "linkedin",
            Self::VCard => "vcard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "linkedin" => Some(Self::LinkedIn),
            "vcard" | "vcf" => Some(Self::VCard),
            _ => None,
        }
    }

    /// Format implied by a file extension, if the extension settles it.
    /// `.csv` doesn't: it could be LinkedIn or anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "vcf" | "vcard" => Some(Self::VCard),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file is not UTF-8 text (invalid byte at offset {offset})")]
    Decode {
        offset: usize,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Decode file bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode(bytes: &[u8]) -> Result<&str, ImportError> {
    let text = std::str::from_utf8(bytes).map_err(|source| ImportError::Decode {
        offset: source.valid_up_to(),
        source,
    })?;
    Ok(text.trim_start_matches('\u{feff}'))
}

/// Guess the format from the start of the file.
pub fn detect_format(content: &str) -> ImportFormat {
    let mut end = SNIFF_BYTES.min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let head = &content[..end];

    if head.contains("BEGIN:VCARD") {
        ImportFormat::VCard
    } else if locate_header(head).is_some() {
        ImportFormat::LinkedIn
    } else {
        ImportFormat::Csv
    }
}

/// Run the parser for `format` over decoded text.
pub fn parse_text(content: &str, format: ImportFormat) -> Vec<ImportedContact> {
    match format {
        ImportFormat::Csv => parse_csv(content),
        ImportFormat::LinkedIn => parse_linkedin(content),
        ImportFormat::VCard => parse_vcards(content),
    }
}

/// Decode and parse raw file bytes. Without a format the file is sniffed.
pub fn parse_contacts(
    bytes: &[u8],
    format: Option<ImportFormat>,
) -> Result<(ImportFormat, Vec<ImportedContact>), ImportError> {
    let content = decode(bytes)?;
    let format = format.unwrap_or_else(|| detect_format(content));
    let contacts = parse_text(content, format);
    log::debug!("parsed {} {} candidates", contacts.len(), format);
    Ok((format, contacts))
}

/// Read a file from disk and parse it, using the extension as a format hint.
pub fn read_contacts_file(
    path: &Path,
    format: Option<ImportFormat>,
) -> Result<(ImportFormat, Vec<ImportedContact>), ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_contacts(&bytes, format.or_else(|| ImportFormat::from_path(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_vcard() {
        let vcf = "BEGIN:VCARD\nFN:A\nTEL:1\nEND:VCARD\n";
        assert_eq!(detect_format(vcf), ImportFormat::VCard);
    }

    #[test]
    fn test_detect_linkedin() {
        let content = "Notes:\n\nFirst Name,Last Name,URL,Email Address,Company,Position\nA,B,,,,\n";
        assert_eq!(detect_format(content), ImportFormat::LinkedIn);
    }

    #[test]
    fn test_detect_generic_csv() {
        assert_eq!(detect_format("Name,Email\nA,a@x.com\n"), ImportFormat::Csv);
    }

    #[test]
    fn test_detect_only_looks_at_head() {
        let mut content = "Name,Notes\n".to_string();
        while content.len() < SNIFF_BYTES + 10 {
            content.push_str("Somebody,é filler text for the sniffing window\n");
        }
        content.push_str("BEGIN:VCARD\n");
        assert_eq!(detect_format(&content), ImportFormat::Csv);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = parse_contacts(&[b'N', b'a', 0xff, 0xfe], None).unwrap_err();
        assert!(matches!(err, ImportError::Decode { offset: 2, .. }));
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = "\u{feff}First Name,Last Name\nJane,Doe\n".as_bytes();
        let (format, contacts) = parse_contacts(bytes, None).unwrap();
        assert_eq!(format, ImportFormat::Csv);
        assert_eq!(contacts[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_explicit_format_wins() {
        let content = b"Name\nJane Doe\n";
        let (format, contacts) = parse_contacts(content, Some(ImportFormat::LinkedIn)).unwrap();
        assert_eq!(format, ImportFormat::LinkedIn);
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_read_file_uses_extension() {
        use std::io::Write;
        use tempfile::Builder;

        let mut file = Builder::new().suffix(".vcf").tempfile().unwrap();
        write!(file, "BEGIN:VCARD\nFN:File Card\nTEL:1\nEND:VCARD\n").unwrap();

        let (format, contacts) = read_contacts_file(file.path(), None).unwrap();
        assert_eq!(format, ImportFormat::VCard);
        assert_eq!(contacts[0].full_name, "File Card");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_contacts_file(Path::new("/nonexistent/contacts.csv"), None).unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/contacts.csv"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ImportFormat::parse("vcf"), Some(ImportFormat::VCard));
        assert_eq!(ImportFormat::parse("LinkedIn"), Some(ImportFormat::LinkedIn));
        assert_eq!(ImportFormat::parse("xlsx"), None);
    }
}
