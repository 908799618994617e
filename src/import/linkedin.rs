//! LinkedIn "Connections" CSV export.
//!
//! LinkedIn puts a few lines of notes above the real header, so the header is
//! found by looking for known column names in the first rows of the file.

use csv::StringRecord;

use super::fields::{csv_records, join_name, non_empty, ImportedContact};

/// Column names LinkedIn uses in its connections export.
pub const HEADER_MARKERS: [&str; 6] = [
    "First Name",
    "Last Name",
    "Email Address",
    "Company",
    "Position",
    "Profile URL",
];

/// How many non-empty rows are searched for the header before giving up.
pub const HEADER_SCAN_ROWS: usize = 10;

/// Markers a row must contain to count as the header.
pub const MIN_HEADER_MARKERS: usize = 3;

/// Column positions discovered from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInColumns {
    pub first_name: usize,
    pub last_name: usize,
    pub email: Option<usize>,
    pub company: Option<usize>,
    pub position: Option<usize>,
    pub profile_url: Option<usize>,
}

impl LinkedInColumns {
    /// `None` unless both name columns are present.
    fn from_header(header: &StringRecord) -> Option<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        Some(Self {
            first_name: find("First Name")?,
            last_name: find("Last Name")?,
            email: find("Email Address"),
            company: find("Company"),
            position: find("Position"),
            // Newer exports call the profile column just "URL".
            profile_url: find("Profile URL").or_else(|| find("URL")),
        })
    }

    /// Shortest row that still holds both name columns.
    fn min_len(&self) -> usize {
        self.first_name.max(self.last_name) + 1
    }
}

/// The located header: its index among the non-empty rows, and the row itself.
#[derive(Debug, Clone)]
pub struct HeaderRow {
    pub index: usize,
    pub record: StringRecord,
}

fn marker_count(record: &StringRecord) -> usize {
    HEADER_MARKERS
        .iter()
        .filter(|marker| record.iter().any(|field| field == **marker))
        .count()
}

fn find_header<I>(rows: &mut I) -> Option<HeaderRow>
where
    I: Iterator<Item = StringRecord>,
{
    rows.take(HEADER_SCAN_ROWS)
        .enumerate()
        .find(|(_, record)| marker_count(record) >= MIN_HEADER_MARKERS)
        .map(|(index, record)| HeaderRow { index, record })
}

/// Locate the header row within the first [`HEADER_SCAN_ROWS`] non-empty rows.
pub fn locate_header(content: &str) -> Option<HeaderRow> {
    find_header(&mut csv_records(content))
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i)).and_then(non_empty)
}

/// Parse a LinkedIn connections export.
///
/// Returns nothing if no header turns up in the first rows or the header has no
/// `First Name`/`Last Name` columns. Rows too short to reach the name columns,
/// or with both names blank, are skipped.
pub fn parse_linkedin(content: &str) -> Vec<ImportedContact> {
    let mut rows = csv_records(content);

    let Some(header) = find_header(&mut rows) else {
        log::debug!(
            "no LinkedIn header within the first {} rows",
            HEADER_SCAN_ROWS
        );
        return Vec::new();
    };

    let Some(columns) = LinkedInColumns::from_header(&header.record) else {
        log::debug!("LinkedIn header at row {} lacks name columns", header.index);
        return Vec::new();
    };

    let mut contacts = Vec::new();
    for record in rows {
        if record.len() < columns.min_len() {
            log::debug!("LinkedIn row too short ({} fields), skipped", record.len());
            continue;
        }
        let first = cell(&record, Some(columns.first_name));
        let last = cell(&record, Some(columns.last_name));
        let Some(full_name) = join_name(first.as_deref(), last.as_deref()) else {
            continue;
        };

        let mut contact = ImportedContact::new(full_name);
        contact.email = cell(&record, columns.email);
        contact.company = cell(&record, columns.company);
        contact.job_title = cell(&record, columns.position);
        contact.linkedin_url = cell(&record, columns.profile_url);
        contacts.push(contact);
    }
    contacts
}
