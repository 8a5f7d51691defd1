use crate::document::FeedDocument;
use crate::ledger::Ledger;
use crate::types::{JournalConfig, Result};
use async_trait::async_trait;

/// Where feeds come from (HTTP in production, fixtures in tests)
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    /// A non-success response is an error; implementations do not retry.
    async fn fetch(&self, url: &str) -> Result<FeedDocument>;
}

/// Persistence for per-journal ledgers
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the journal's ledger; a journal that has never run has an empty one.
    async fn load(&self, journal: &JournalConfig) -> Result<Ledger>;

    /// Replace the journal's ledger as a whole.
    async fn save(&self, journal: &JournalConfig, ledger: &Ledger) -> Result<()>;
}

/// Destination for the rewritten feed
#[async_trait]
pub trait FeedSink: Send + Sync {
    async fn write_feed(&self, journal: &JournalConfig, bytes: &[u8]) -> Result<()>;
}

/// Publishes the run's output files somewhere readers can get them
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: &str) -> Result<()>;
}
