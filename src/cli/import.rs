use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use inquire::MultiSelect;
use uuid::Uuid;

use super::add::initial_frequency;
use super::ui::{minimal_render_config, page_size};
use super::ImportArgs;
use crate::config::Settings;
use crate::db::Database;
use crate::import::{read_contacts_file, ImportFormat, ImportedContact, HEADER_MARKERS};
use crate::models::Contact;
use crate::reminders::ReminderFrequency;

/// Import results summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub found: u32,
    pub duplicates: u32,
    pub skipped: u32,
    pub contacts: u32,
    pub with_phones: u32,
    pub with_emails: u32,
    pub with_reminders: u32,
    pub errors: u32,
}

/// Selection list entry.
struct Candidate<'a>(&'a ImportedContact);

impl fmt::Display for Candidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.summary())
    }
}

/// Execute the import command.
pub fn run_import(db: &Database, args: ImportArgs) -> Result<()> {
    let path = Path::new(&args.file);
    if !path.exists() {
        bail!("File not found: {}", args.file);
    }

    let hint = match args.format.as_deref() {
        Some(f) => Some(
            ImportFormat::parse(f)
                .ok_or_else(|| anyhow!("Unknown format '{}'. Use csv, linkedin or vcard", f))?,
        ),
        None => None,
    };

    let settings = Settings::load(db)?;
    let frequency = initial_frequency(args.remind.as_deref(), &settings)?;

    let (format, candidates) = read_contacts_file(path, hint)?;
    if candidates.is_empty() {
        println!("No contacts found in {} ({}).", args.file, format);
        if format == ImportFormat::LinkedIn {
            println!(
                "LinkedIn exports need a header row within the first lines with at least \
                 First Name and Last Name (columns: {}).",
                HEADER_MARKERS.join(", ")
            );
        }
        return Ok(());
    }

    let mut stats = ImportStats {
        found: candidates.len() as u32,
        ..Default::default()
    };

    let fresh = new_candidates(db, &candidates, &mut stats)?;
    if args.dry_run {
        eprintln!("Dry run: {} ({})", args.file, format);
        for c in &fresh {
            println!("  {}", c.summary());
        }
        stats.contacts = fresh.len() as u32;
        stats.with_phones = fresh.iter().filter(|c| c.has_phone()).count() as u32;
        stats.with_emails = fresh.iter().filter(|c| c.email.is_some()).count() as u32;
        print_summary(&stats, true);
        return Ok(());
    }

    let selected = if args.yes || fresh.is_empty() {
        fresh
    } else {
        match choose(&fresh)? {
            Some(ids) => {
                let chosen: Vec<&ImportedContact> = fresh
                    .into_iter()
                    .filter(|c| ids.contains(&c.selection_id))
                    .collect();
                stats.skipped = stats.found - stats.duplicates - chosen.len() as u32;
                chosen
            }
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    eprintln!("Importing: {} ({})", args.file, format);
    let saved = save_contacts(db, &selected, frequency, Utc::now(), &mut stats);
    print_summary(&stats, false);

    for id in saved {
        super::calendar::push_reminder(db, &settings, id);
    }
    Ok(())
}

/// Candidates not already in the store, matched by email first, then by
/// full name.
fn new_candidates<'a>(
    db: &Database,
    candidates: &'a [ImportedContact],
    stats: &mut ImportStats,
) -> Result<Vec<&'a ImportedContact>> {
    let mut fresh = Vec::new();
    for candidate in candidates {
        if is_duplicate(db, candidate)? {
            log::debug!("skipping existing contact {}", candidate.full_name);
            stats.duplicates += 1;
        } else {
            fresh.push(candidate);
        }
    }
    Ok(fresh)
}

fn is_duplicate(db: &Database, candidate: &ImportedContact) -> Result<bool> {
    if let Some(ref email) = candidate.email {
        if db.get_contact_by_email(email)?.is_some() {
            return Ok(true);
        }
    }
    Ok(!db.find_contacts_by_name(&candidate.full_name)?.is_empty())
}

/// Let the user untick candidates. Returns the selection ids to keep, or
/// `None` if the prompt was cancelled.
fn choose(candidates: &[&ImportedContact]) -> Result<Option<HashSet<Uuid>>> {
    let options: Vec<Candidate> = candidates.iter().map(|c| Candidate(*c)).collect();
    let chosen = MultiSelect::new("import:", options)
        .with_render_config(minimal_render_config())
        .with_page_size(page_size())
        .with_all_selected_by_default()
        .prompt_skippable()?;

    Ok(chosen.map(|list| list.into_iter().map(|c| c.0.selection_id).collect()))
}

/// Store the chosen candidates, each with a fresh contact id. A failed row
/// is counted and reported; the rest still go in. Returns the new ids.
fn save_contacts(
    db: &Database,
    selected: &[&ImportedContact],
    frequency: Option<ReminderFrequency>,
    now: DateTime<Utc>,
    stats: &mut ImportStats,
) -> Vec<Uuid> {
    let mut saved = Vec::new();
    for candidate in selected {
        // A name seen earlier in this same file counts as a duplicate too.
        match is_duplicate(db, candidate) {
            Ok(true) => {
                stats.duplicates += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                eprintln!("{}: {}", candidate.full_name, e);
                stats.errors += 1;
                continue;
            }
        }

        let contact = Contact::from((*candidate).clone());
        if let Err(e) = db.insert_contact(&contact) {
            eprintln!("{}: {}", contact.full_name, e);
            stats.errors += 1;
            continue;
        }

        stats.contacts += 1;
        if contact.primary_phone().is_some() {
            stats.with_phones += 1;
        }
        if contact.email.is_some() {
            stats.with_emails += 1;
        }
        if let Some(frequency) = frequency {
            match db.set_reminder(contact.id, Some(frequency), None, now) {
                Ok(Some(_)) => stats.with_reminders += 1,
                Ok(None) => {}
                Err(e) => {
                    eprintln!("{}: reminder not set: {}", contact.full_name, e);
                    stats.errors += 1;
                }
            }
        }
        saved.push(contact.id);
    }
    saved
}

fn print_summary(stats: &ImportStats, dry_run: bool) {
    let verb = if dry_run { "Would create" } else { "Created" };

    println!("\n{} {} of {} contacts", verb, stats.contacts, stats.found);

    if stats.with_phones > 0 || stats.with_emails > 0 || stats.with_reminders > 0 {
        let mut details = Vec::new();
        if stats.with_phones > 0 {
            details.push(format!("{} phones", stats.with_phones));
        }
        if stats.with_emails > 0 {
            details.push(format!("{} emails", stats.with_emails));
        }
        if stats.with_reminders > 0 {
            details.push(format!("{} reminders", stats.with_reminders));
        }
        println!("  with {}", details.join(", "));
    }

    if stats.duplicates > 0 {
        println!("Skipped {} duplicates", stats.duplicates);
    }
    if stats.skipped > 0 {
        println!("Left out {}", stats.skipped);
    }
    if stats.errors > 0 {
        println!("Errors: {}", stats.errors);
    }
}
