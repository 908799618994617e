//! Shared pieces of the import parsers: the candidate record, CSV reading,
//! and the header matchers used to find fields in arbitrary exports.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use uuid::Uuid;

/// A contact pulled out of an import file, waiting for the user to confirm it.
///
/// `selection_id` only tracks the record while it sits in a selection list; it
/// is never written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedContact {
    #[serde(skip)]
    pub selection_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub linkedin_url: Option<String>,
}

impl ImportedContact {
    pub fn new(full_name: String) -> Self {
        Self {
            selection_id: Uuid::new_v4(),
            full_name,
            email: None,
            mobile_phone: None,
            business_phone: None,
            company: None,
            job_title: None,
            linkedin_url: None,
        }
    }

    pub fn has_phone(&self) -> bool {
        self.mobile_phone.is_some() || self.business_phone.is_some()
    }

    /// One-line summary for selection lists: "Jane Doe <jane@x.com> (Acme)"
    pub fn summary(&self) -> String {
        let mut s = self.full_name.clone();
        if let Some(ref email) = self.email {
            s.push_str(&format!(" <{}>", email));
        } else if let Some(phone) = self.mobile_phone.as_ref().or(self.business_phone.as_ref()) {
            s.push_str(&format!(" [{}]", phone));
        }
        if let Some(ref company) = self.company {
            s.push_str(&format!(" ({})", company));
        }
        s
    }
}

/// Trimmed copy of `s`, or `None` if nothing is left.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Join given and family name, skipping whichever part is blank.
pub(crate) fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Lowercase and drop everything that isn't a letter or digit:
/// `"First Name"` and `"first-name"` both become `firstname`.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Records of a CSV document, tolerant of ragged rows. Rows that fail to
/// parse and rows with nothing but blank cells are dropped.
pub(crate) fn csv_records(content: &str) -> impl Iterator<Item = StringRecord> + '_ {
    let content = content.trim_start_matches('\u{feff}');
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes())
        .into_records()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(e) => {
                log::debug!("skipping unreadable CSV row: {}", e);
                None
            }
        })
        .filter(|record| record.iter().any(|field| !field.is_empty()))
}

/// One data row seen through its header, both as written and normalized.
pub(crate) struct Row<'a> {
    fields: Vec<(&'a str, String, &'a str)>,
    raw: HashMap<&'a str, &'a str>,
    normalized: HashMap<String, &'a str>,
}

impl<'a> Row<'a> {
    pub(crate) fn new(headers: &'a [String], record: &'a StringRecord) -> Self {
        let mut fields = Vec::with_capacity(headers.len());
        let mut raw = HashMap::new();
        let mut normalized = HashMap::new();

        for (header, value) in headers.iter().zip(record.iter()) {
            let key = normalize_header(header);
            raw.entry(header.as_str()).or_insert(value);
            if !value.is_empty() || !normalized.contains_key(&key) {
                normalized.insert(key.clone(), value);
            }
            fields.push((header.as_str(), key, value));
        }

        Self { fields, raw, normalized }
    }

    /// Value under an exact header as written in the file.
    pub(crate) fn raw(&self, header: &str) -> Option<&'a str> {
        self.raw.get(header).copied().filter(|v| !v.is_empty())
    }

    /// Value under a normalized header key.
    pub(crate) fn norm(&self, key: &str) -> Option<&'a str> {
        self.normalized.get(key).copied().filter(|v| !v.is_empty())
    }

    /// First non-empty value whose normalized header contains every keyword of
    /// any group and none of `exclude`.
    pub(crate) fn scan(&self, groups: &[&[&str]], exclude: &[&str]) -> Option<&'a str> {
        self.fields.iter().find_map(|(_, key, value)| {
            if value.is_empty() || exclude.iter().any(|x| key.contains(x)) {
                return None;
            }
            let hit = groups.iter().any(|group| group.iter().all(|kw| key.contains(kw)));
            hit.then_some(*value)
        })
    }
}

/// How one semantic field is found in an unknown header set: exact normalized
/// aliases first, in order, then a keyword scan across every header.
pub(crate) struct FieldMatcher {
    pub exact: &'static [&'static str],
    pub keywords: &'static [&'static [&'static str]],
    pub exclude: &'static [&'static str],
}

impl FieldMatcher {
    pub(crate) fn resolve(&self, row: &Row<'_>) -> Option<String> {
        self.exact
            .iter()
            .find_map(|key| row.norm(key))
            .or_else(|| row.scan(self.keywords, self.exclude))
            .and_then(non_empty)
    }
}

pub(crate) const EMAIL: FieldMatcher = FieldMatcher {
    exact: &["email", "emailaddress", "email1", "primaryemail"],
    keywords: &[&["email"]],
    exclude: &[],
};

pub(crate) const MOBILE_PHONE: FieldMatcher = FieldMatcher {
    exact: &["mobilephone", "phone", "phonenumber", "mobile", "cellphone"],
    keywords: &[&["mobile"], &["cell"], &["phone"]],
    exclude: &["business", "work", "office", "fax"],
};

pub(crate) const BUSINESS_PHONE: FieldMatcher = FieldMatcher {
    exact: &["businessphone", "workphone", "officephone"],
    keywords: &[&["business", "phone"], &["work", "phone"], &["office", "phone"]],
    exclude: &["fax"],
};

pub(crate) const COMPANY: FieldMatcher = FieldMatcher {
    exact: &["company", "organization", "companyname", "organisation", "employer"],
    keywords: &[&["company"], &["organization"], &["organisation"], &["employer"]],
    exclude: &[],
};

pub(crate) const JOB_TITLE: FieldMatcher = FieldMatcher {
    exact: &["jobtitle", "title", "position"],
    keywords: &[&["job", "title"], &["title"], &["position"]],
    exclude: &[],
};

pub(crate) const LINKEDIN_URL: FieldMatcher = FieldMatcher {
    exact: &["linkedin", "linkedinurl", "linkedinprofile", "profileurl"],
    keywords: &[&["linkedin"]],
    exclude: &[],
};
