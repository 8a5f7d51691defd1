use crate::document::{Element, EntryLocation, FeedDocument};
use crate::extractor::ArticleExtractor;
use crate::ledger::Ledger;
use crate::types::{format_date, ArticleRecord, DedupReport, Traversal};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// How one feed entry relates to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    /// Identifier never seen before; kept in the feed and added to the ledger.
    New,
    /// Identifier and date already recorded.
    Unchanged,
    /// Identifier recorded under a different date.
    Variant,
    /// No identifier on the entry; left alone.
    Unidentified,
}

impl EntryDecision {
    pub fn removes_entry(self) -> bool {
        matches!(self, EntryDecision::Unchanged | EntryDecision::Variant)
    }
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub ledger: Ledger,
    pub report: DedupReport,
}

#[derive(Debug, Clone, Default)]
pub struct DedupEngine {
    extractor: ArticleExtractor,
    traversal: Traversal,
}

impl DedupEngine {
    pub fn new(extractor: ArticleExtractor, traversal: Traversal) -> Self {
        Self { extractor, traversal }
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// Drop already-seen entries from `document` and return the updated ledger.
    ///
    /// `ledger` is not modified; the returned ledger keeps its records in order
    /// and appends new identifiers in the order they were visited.
    pub fn process(&self, document: &mut FeedDocument, ledger: &Ledger, current_date: NaiveDate) -> DedupOutcome {
        let current_date = format_date(current_date);
        let mut working = ledger.clone();
        let mut report = DedupReport::default();

        let mut locations = document.entry_locations();
        if self.traversal == Traversal::Reverse {
            locations.reverse();
        }

        let mut removals: Vec<EntryLocation> = Vec::new();
        for location in locations {
            let Some(entry) = document.entry(&location) else {
                continue;
            };
            report.entries_seen += 1;

            let decision = self.decide(entry, &mut working, &current_date, &mut report);
            if decision.removes_entry() {
                removals.push(location);
            }
        }

        report.removed = document.remove_entries(&removals);

        info!(
            "Deduplicated {} entries: {} new, {} unchanged, {} variant, {} unidentified, {} dates repaired",
            report.entries_seen,
            report.new_entries,
            report.unchanged_duplicates,
            report.variant_duplicates,
            report.unidentified,
            report.dates_repaired
        );

        DedupOutcome {
            ledger: working,
            report,
        }
    }

    fn decide(
        &self,
        entry: &Element,
        ledger: &mut Ledger,
        current_date: &str,
        report: &mut DedupReport,
    ) -> EntryDecision {
        let article = self.extractor.extract(entry);
        let Some(identifier) = article.identifier.as_deref() else {
            warn!("Feed entry without identifier, leaving it in place");
            report.unidentified += 1;
            return EntryDecision::Unidentified;
        };

        let candidate_date = if article.has_sentinel_date() {
            current_date
        } else {
            article.date.as_str()
        };

        let decision = if ledger.contains_pair(identifier, &article.date) {
            report.unchanged_duplicates += 1;
            if article.has_sentinel_date() && ledger.repair_date(identifier, candidate_date) {
                report.dates_repaired += 1;
            }
            EntryDecision::Unchanged
        } else if ledger.contains(identifier) {
            report.variant_duplicates += 1;
            if ledger.repair_date(identifier, candidate_date) {
                report.dates_repaired += 1;
            }
            EntryDecision::Variant
        } else {
            report.new_entries += 1;
            ledger.push(ArticleRecord::new(identifier, article.date.as_str()));
            EntryDecision::New
        };

        debug!("{} ({}): {:?}", identifier, article.date, decision);
        decision
    }
}
