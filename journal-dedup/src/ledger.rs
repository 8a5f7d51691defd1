//! Per-journal record of every article seen so far.
//!
//! On disk a ledger is one record per line, `"identifier","date"`, with the
//! date field optional. Files written by older tooling used unquoted fields
//! and could carry extra date fields; both are accepted when reading.

use crate::types::{is_well_formed_date, ArticleRecord};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<ArticleRecord>,
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger, collapsing repeated identifiers into their first record.
    ///
    /// If the first record lacks a well-formed date and a later one has it,
    /// the later date is kept.
    pub fn from_records(records: impl IntoIterator<Item = ArticleRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            if ledger.push(record.clone()) {
                continue;
            }
            debug!("Collapsing repeated ledger record for {}", record.identifier);
            if let Some(date) = record.date.as_deref() {
                ledger.repair_date(&record.identifier, date);
            }
        }
        ledger
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&ArticleRecord> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// True when the identifier is stored with exactly this date.
    pub fn contains_pair(&self, identifier: &str, date: &str) -> bool {
        self.get(identifier)
            .map(|record| record.date.as_deref() == Some(date))
            .unwrap_or(false)
    }

    /// Append a record unless its identifier is already present.
    pub fn push(&mut self, record: ArticleRecord) -> bool {
        if self.index.contains_key(&record.identifier) {
            return false;
        }
        self.index.insert(record.identifier.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Store `candidate` as the identifier's date if the stored one is missing
    /// or malformed. A well-formed stored date is never replaced, and a
    /// malformed candidate is never written.
    pub fn repair_date(&mut self, identifier: &str, candidate: &str) -> bool {
        if !is_well_formed_date(candidate) {
            return false;
        }
        let Some(&i) = self.index.get(identifier) else {
            return false;
        };
        let record = &mut self.records[i];
        if record.has_well_formed_date() {
            return false;
        }
        record.date = Some(candidate.to_string());
        true
    }

    /// Parse the ledger file format.
    pub fn parse(content: &str) -> Self {
        let records = content.lines().enumerate().filter_map(|(line_no, line)| {
            let fields = split_fields(line);
            match fields.as_slice() {
                [] => None,
                [identifier, ..] if identifier.trim().is_empty() => {
                    debug!("Ledger line {} has no identifier, skipping", line_no + 1);
                    None
                }
                [identifier] => Some(ArticleRecord::without_date(identifier.as_str())),
                [identifier, dates @ ..] => {
                    if dates.len() > 1 {
                        debug!("Ledger line {} has {} fields", line_no + 1, fields.len());
                    }
                    let date = dates
                        .iter()
                        .find(|date| is_well_formed_date(date))
                        .unwrap_or(&dates[0]);
                    Some(ArticleRecord::new(identifier.as_str(), date.as_str()))
                }
            }
        });
        Self::from_records(records)
    }

    /// Render the ledger file format, every field quoted.
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&quote(&record.identifier));
            if let Some(date) = &record.date {
                out.push(',');
                out.push_str(&quote(date));
            }
            out.push('\n');
        }
        out
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Split one line into comma separated fields, honouring double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
