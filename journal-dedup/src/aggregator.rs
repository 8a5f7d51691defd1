use crate::dedup::DedupEngine;
use crate::namespaces::Namespaces;
use crate::rewriter::FeedRewriter;
use crate::traits::{FeedSink, FeedSource, LedgerStore, Publisher};
use crate::types::{format_date, JournalConfig, JournalOutcome, Result, RunReport};
use chrono::NaiveDate;
use tracing::{error, info, warn};

/// Runs the fetch, deduplicate, rewrite and store cycle for each journal.
pub struct FeedUpdater {
    source: Box<dyn FeedSource>,
    ledgers: Box<dyn LedgerStore>,
    sink: Box<dyn FeedSink>,
    engine: DedupEngine,
    rewriter: FeedRewriter,
    namespaces: Namespaces,
    publisher: Option<Box<dyn Publisher>>,
    continue_on_error: bool,
}

impl FeedUpdater {
    pub fn new(
        source: Box<dyn FeedSource>,
        ledgers: Box<dyn LedgerStore>,
        sink: Box<dyn FeedSink>,
        engine: DedupEngine,
        rewriter: FeedRewriter,
        namespaces: Namespaces,
    ) -> Self {
        Self {
            source,
            ledgers,
            sink,
            engine,
            rewriter,
            namespaces,
            publisher: None,
            continue_on_error: false,
        }
    }

    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Keep going after a journal fails and report the failure instead.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub async fn update_journal(&self, journal: &JournalConfig, current_date: NaiveDate) -> Result<JournalOutcome> {
        info!("Updating {} from {}", journal.name, journal.url);

        let mut document = self.source.fetch(&journal.url).await?;
        let ledger = self.ledgers.load(journal).await?;

        let outcome = self.engine.process(&mut document, &ledger, current_date);
        let (bytes, titles_rewritten) = self
            .rewriter
            .rewrite(&mut document, &journal.name, &self.namespaces)?;
        if titles_rewritten == 0 {
            warn!("No title element rewritten for {}", journal.name);
        }

        self.sink.write_feed(journal, &bytes).await?;
        self.ledgers.save(journal, &outcome.ledger).await?;

        info!(
            "{}: kept {} of {} entries, ledger now holds {} articles",
            journal.short_name,
            outcome.report.entries_seen - outcome.report.removed,
            outcome.report.entries_seen,
            outcome.ledger.len()
        );

        Ok(JournalOutcome {
            short_name: journal.short_name.clone(),
            ledger_size: outcome.ledger.len(),
            report: Some(outcome.report),
            titles_rewritten,
            error: None,
        })
    }

    /// Update every journal in order.
    ///
    /// Without `continue_on_error` the first failure aborts the run and is
    /// returned as is. Publishing happens once, after all journals, and only
    /// if at least one journal succeeded.
    pub async fn run_all(&self, journals: &[JournalConfig], current_date: NaiveDate) -> Result<RunReport> {
        info!("Starting run for {} journals ({})", journals.len(), current_date);

        let mut outcomes = Vec::with_capacity(journals.len());
        for journal in journals {
            match self.update_journal(journal, current_date).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if self.continue_on_error => {
                    error!("Failed to update {}: {}", journal.short_name, e);
                    outcomes.push(JournalOutcome::failed(&journal.short_name, &e));
                }
                Err(e) => {
                    error!("Failed to update {}, aborting run: {}", journal.short_name, e);
                    return Err(e);
                }
            }
        }

        let mut report = RunReport {
            date: current_date,
            journals: outcomes,
            published: false,
        };

        if let Some(publisher) = &self.publisher {
            if report.failures() < report.journals.len() {
                publisher.publish(&format!("Update feeds {}", format_date(current_date))).await?;
                report.published = true;
            } else {
                warn!("Nothing updated, skipping publish");
            }
        }

        info!(
            "Run finished: {}/{} journals updated",
            report.journals.len() - report.failures(),
            report.journals.len()
        );
        Ok(report)
    }
}
