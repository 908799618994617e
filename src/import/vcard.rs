//! vCard (.vcf) files, as exported by phones, Apple Contacts and Google.
//!
//! Handles 2.1, 3.0 and 4.0 well enough to pull out names, phones, email,
//! organization and title. One bad card never sinks the rest of the file.

use std::collections::HashMap;

use thiserror::Error;

use super::fields::{join_name, non_empty, ImportedContact};

const CARD_DELIMITER: &str = "BEGIN:VCARD";
const CARD_END: &str = "END:VCARD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VCardError {
    #[error("line {line}: property has no name")]
    MissingPropertyName { line: usize },
    #[error("line {line}: parameter {param:?} has no name")]
    EmptyParameterName { line: usize, param: String },
}

/// One content line of a card: `NAME;KEY=VALUE:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    pub name: String,
    pub params: HashMap<String, String>,
    pub value: String,
}

impl ParsedField {
    fn type_param(&self) -> Option<String> {
        self.params.get("TYPE").map(|t| t.to_uppercase())
    }
}

/// Join folded lines (continuations start with a space or tab).
fn unfold(card: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in card.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(prev) = lines.last_mut() {
                prev.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

/// Split a content line at its first colon. Lines without one are not
/// properties and yield `Ok(None)`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<ParsedField>, VCardError> {
    let Some((property, value)) = line.split_once(':') else {
        return Ok(None);
    };

    let mut parts = property.split(';');
    let name = parts.next().unwrap_or_default().trim();
    // Apple groups related properties: "item1.TEL"
    let name = name.rsplit('.').next().unwrap_or(name).to_uppercase();
    if name.is_empty() {
        return Err(VCardError::MissingPropertyName { line: line_no });
    }

    let mut params: HashMap<String, String> = HashMap::new();
    for param in parts.map(str::trim).filter(|p| !p.is_empty()) {
        let (key, val) = match param.split_once('=') {
            Some((key, val)) => (key.trim().to_uppercase(), val.trim().trim_matches('"')),
            // vCard 2.1 bare types: "TEL;WORK;VOICE:"
            None => ("TYPE".to_string(), param),
        };
        if key.is_empty() {
            return Err(VCardError::EmptyParameterName {
                line: line_no,
                param: param.to_string(),
            });
        }
        params
            .entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(val);
            })
            .or_insert_with(|| val.to_string());
    }

    Ok(Some(ParsedField {
        name,
        params,
        value: value.to_string(),
    }))
}

/// Decode `\,` `\;` `\n` and `\\` escapes.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a structured value on unescaped semicolons and unescape each part.
fn components(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in value.chars() {
        match c {
            _ if escaped => {
                current.push('\\');
                current.push(c);
                escaped = false;
            }
            '\\' => escaped = true,
            ';' => parts.push(unescape(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    if escaped {
        current.push('\\');
    }
    parts.push(unescape(&current));
    parts
}

fn phone_value(value: &str) -> Option<String> {
    let value = value.trim();
    non_empty(value.strip_prefix("tel:").unwrap_or(value))
}

/// Parse the text of one card (everything after its `BEGIN:VCARD`).
///
/// `Ok(None)` means the card parsed but lacks a name or a phone number. Only
/// cell, work and untyped TEL lines count as phone numbers.
pub fn parse_card(card: &str) -> Result<Option<ImportedContact>, VCardError> {
    let mut formatted_name = None;
    let mut structured_name = None;
    let mut mobile_phone = None;
    let mut business_phone = None;
    let mut email = None;
    let mut company = None;
    let mut job_title = None;
    let mut linkedin_url = None;

    for (idx, line) in unfold(card).iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line == CARD_END {
            continue;
        }
        let Some(field) = parse_line(line, idx + 1)? else {
            continue;
        };

        match field.name.as_str() {
            "FN" => formatted_name = non_empty(&unescape(&field.value)),
            "N" => {
                let parts = components(&field.value);
                structured_name = join_name(
                    parts.get(1).map(String::as_str),
                    parts.first().map(String::as_str),
                );
            }
            "TEL" => {
                let number = phone_value(&field.value);
                match field.type_param() {
                    Some(t) if t.contains("WORK") => business_phone = number,
                    Some(t) if t.contains("CELL") => mobile_phone = number,
                    None => mobile_phone = number,
                    Some(other) => log::trace!("TEL type {} ignored", other),
                }
            }
            "EMAIL" => email = non_empty(&unescape(&field.value)),
            "ORG" => company = components(&field.value).first().and_then(|c| non_empty(c)),
            "TITLE" => job_title = non_empty(&unescape(&field.value)),
            "URL" => {
                let url = unescape(&field.value);
                if url.to_lowercase().contains("linkedin.com") {
                    linkedin_url = non_empty(&url);
                }
            }
            _ => {}
        }
    }

    let Some(full_name) = formatted_name.or(structured_name) else {
        return Ok(None);
    };

    let mut contact = ImportedContact::new(full_name);
    contact.mobile_phone = mobile_phone;
    contact.business_phone = business_phone;
    contact.email = email;
    contact.company = company;
    contact.job_title = job_title;
    contact.linkedin_url = linkedin_url;

    Ok(contact.has_phone().then_some(contact))
}

/// Parse every card in a vCard file. Cards without a name and a phone number
/// are dropped; cards that fail to parse are logged and skipped.
pub fn parse_vcards(content: &str) -> Vec<ImportedContact> {
    content
        .split(CARD_DELIMITER)
        .filter(|chunk| !chunk.trim().is_empty())
        .enumerate()
        .filter_map(|(idx, chunk)| match parse_card(chunk) {
            Ok(Some(contact)) => Some(contact),
            Ok(None) => {
                log::debug!("vCard {}: no name or phone, skipped", idx + 1);
                None
            }
            Err(e) => {
                log::warn!("vCard {}: {}; skipping card", idx + 1, e);
                None
            }
        })
        .collect()
}
