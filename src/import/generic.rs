//! Generic CSV contact exports (Google, Outlook, Apple Numbers, hand-made sheets).
//!
//! The first row is the header. Column names vary wildly between vendors,
//! so every field goes through the ordered matchers in `fields`.

use super::fields::{
    csv_records, join_name, non_empty, FieldMatcher, ImportedContact, Row, BUSINESS_PHONE, COMPANY,
    EMAIL, JOB_TITLE, LINKEDIN_URL, MOBILE_PHONE,
};

type NameStrategy = fn(&Row<'_>) -> Option<String>;

/// Ways to find a person's name, tried in order. The first one that yields a
/// name wins. The first/last strategies need both parts.
pub(crate) const NAME_STRATEGIES: [(&str, NameStrategy); 4] = [
    ("normalized first/last", name_from_normalized_parts),
    ("exact first/last headers", name_from_raw_headers),
    ("full name column", name_from_full_name_column),
    ("fuzzy first/last headers", name_from_fuzzy_headers),
];

const LAST_NAME_KEYS: [&str; 3] = ["lastname", "familyname", "surname"];
const RAW_FIRST_HEADERS: [&str; 2] = ["First Name", "Given Name"];
const RAW_LAST_HEADERS: [&str; 3] = ["Last Name", "Family Name", "Surname"];

fn name_from_normalized_parts(row: &Row<'_>) -> Option<String> {
    let first = row.norm("firstname")?;
    let last = LAST_NAME_KEYS.iter().find_map(|key| row.norm(key))?;
    join_name(Some(first), Some(last))
}

fn name_from_raw_headers(row: &Row<'_>) -> Option<String> {
    let first = RAW_FIRST_HEADERS.iter().find_map(|h| row.raw(h))?;
    let last = RAW_LAST_HEADERS.iter().find_map(|h| row.raw(h))?;
    join_name(Some(first), Some(last))
}

fn name_from_full_name_column(row: &Row<'_>) -> Option<String> {
    row.norm("name").or_else(|| row.norm("fullname")).and_then(non_empty)
}

fn name_from_fuzzy_headers(row: &Row<'_>) -> Option<String> {
    let first = row.scan(&[&["first", "name"]], &[])?;
    let last = row.scan(&[&["last", "name"]], &[])?;
    join_name(Some(first), Some(last))
}

pub(crate) fn resolve_name(row: &Row<'_>) -> Option<String> {
    NAME_STRATEGIES.iter().find_map(|(label, strategy)| {
        let name = strategy(row)?;
        log::trace!("name resolved by {}", label);
        Some(name)
    })
}

const FIELD_MATCHERS: [(&str, &FieldMatcher); 6] = [
    ("email", &EMAIL),
    ("mobile phone", &MOBILE_PHONE),
    ("business phone", &BUSINESS_PHONE),
    ("company", &COMPANY),
    ("job title", &JOB_TITLE),
    ("linkedin url", &LINKEDIN_URL),
];

fn row_to_contact(row: &Row<'_>) -> Option<ImportedContact> {
    let mut contact = ImportedContact::new(resolve_name(row)?);
    let [email, mobile, business, company, title, linkedin] =
        FIELD_MATCHERS.map(|(_, matcher)| matcher.resolve(row));
    contact.email = email;
    contact.mobile_phone = mobile;
    contact.business_phone = business;
    contact.company = company;
    contact.job_title = title;
    contact.linkedin_url = linkedin;
    Some(contact)
}

/// Parse a CSV export with a header row. Rows without a usable name are skipped.
pub fn parse_csv(content: &str) -> Vec<ImportedContact> {
    let mut records = csv_records(content);
    let headers: Vec<String> = match records.next() {
        Some(header) => header.iter().map(String::from).collect(),
        None => return Vec::new(),
    };

    let mut contacts = Vec::new();
    for (idx, record) in records.enumerate() {
        let row = Row::new(&headers, &record);
        match row_to_contact(&row) {
            Some(contact) => contacts.push(contact),
            None => log::debug!("CSV data row {}: no name found, skipped", idx + 1),
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_last_email() {
        let contacts = parse_csv("First Name,Last Name,Email\nJane,Doe,jane@x.com\n");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].full_name, "Jane Doe");
        assert_eq!(contacts[0].email.as_deref(), Some("jane@x.com"));
        assert!(contacts[0].mobile_phone.is_none());
    }

    #[test]
    fn test_company_only_has_no_contacts() {
        let contacts = parse_csv("Company\nAcme Corp\nBeta LLC\n");
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("First Name,Last Name").is_empty());
    }

    #[test]
    fn test_normalized_headers() {
        let contacts = parse_csv("first-name,SURNAME,e_mail\nAda,Lovelace,ada@x.com\n");
        assert_eq!(contacts[0].full_name, "Ada Lovelace");
        assert_eq!(contacts[0].email.as_deref(), Some("ada@x.com"));
    }

    #[test]
    fn test_given_family_headers() {
        let contacts = parse_csv("Given Name,Family Name,Phone 1 - Value\nGrace,Hopper,555-0100\n");
        assert_eq!(contacts[0].full_name, "Grace Hopper");
        assert_eq!(contacts[0].mobile_phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_full_name_column() {
        let contacts = parse_csv("Name,Organization,Position\nAlan Turing,Bletchley,Cryptanalyst\n");
        assert_eq!(contacts[0].full_name, "Alan Turing");
        assert_eq!(contacts[0].company.as_deref(), Some("Bletchley"));
        assert_eq!(contacts[0].job_title.as_deref(), Some("Cryptanalyst"));
    }

    #[test]
    fn test_fuzzy_name_headers() {
        let contacts = parse_csv("Contact First Name,Contact Last Name\nLinus,Torvalds\n");
        assert_eq!(contacts[0].full_name, "Linus Torvalds");
    }

    #[test]
    fn test_first_strategy_wins_over_full_name() {
        let contacts = parse_csv("Full Name,First Name,Last Name\nIgnored Name,Jane,Doe\n");
        assert_eq!(contacts[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_falls_through_to_later_strategy_when_parts_blank() {
        let contacts = parse_csv("First Name,Last Name,Full Name\n,,Jane Doe\n");
        assert_eq!(contacts[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_first_name_alone_defers_to_name_column() {
        let contacts = parse_csv("First Name,Name,Email\nJane,Jane Doe,j@x.com\n");
        assert_eq!(contacts[0].full_name, "Jane Doe");

        assert!(parse_csv("First Name,Email\nJane,j@x.com\n").is_empty());
    }

    #[test]
    fn test_rows_without_names_are_dropped_individually() {
        let csv = "Name,Email\nJane Doe,jane@x.com\n,nobody@x.com\nJohn Roe,\n";
        let contacts = parse_csv(csv);
        let names: Vec<&str> = contacts.iter().map(|c| c.full_name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "John Roe"]);
        assert!(contacts[1].email.is_none());
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let csv = "Name,Company,Job Title\n\"Doe, Jane\",\"Acme, Inc.\",\"VP, Sales\"\n";
        let contacts = parse_csv(csv);
        assert_eq!(contacts[0].full_name, "Doe, Jane");
        assert_eq!(contacts[0].company.as_deref(), Some("Acme, Inc."));
        assert_eq!(contacts[0].job_title.as_deref(), Some("VP, Sales"));
    }

    #[test]
    fn test_escaped_quotes_and_embedded_newlines() {
        let csv = "Name,Company\n\"Jane \"\"JD\"\" Doe\",\"Acme\nEast\"\n";
        let contacts = parse_csv(csv);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].full_name, "Jane \"JD\" Doe");
        assert_eq!(contacts[0].company.as_deref(), Some("Acme\nEast"));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let contacts = parse_csv("Name,Email,Phone\nJane Doe\n");
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].email.is_none());
    }

    #[test]
    fn test_outlook_style_export() {
        let csv = "Title,First Name,Middle Name,Last Name,Company,Job Title,Business Phone,Mobile Phone,E-mail Address\n\
                   Dr.,Jane,Q,Doe,Acme,CTO,555-0001,555-0002,jane@acme.com\n";
        let contacts = parse_csv(csv);
        let c = &contacts[0];
        assert_eq!(c.full_name, "Jane Doe");
        assert_eq!(c.company.as_deref(), Some("Acme"));
        assert_eq!(c.job_title.as_deref(), Some("CTO"));
        assert_eq!(c.business_phone.as_deref(), Some("555-0001"));
        assert_eq!(c.mobile_phone.as_deref(), Some("555-0002"));
        assert_eq!(c.email.as_deref(), Some("jane@acme.com"));
    }

    #[test]
    fn test_selection_ids_are_distinct() {
        let contacts = parse_csv("Name\nA\nB\n");
        assert_ne!(contacts[0].selection_id, contacts[1].selection_id);
    }
}
