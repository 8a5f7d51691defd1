pub mod types;
pub mod namespaces;
pub mod document;
pub mod extractor;
pub mod ledger;
pub mod dedup;
pub mod rewriter;
pub mod traits;
pub mod fetcher;
pub mod store;
pub mod publisher;
pub mod aggregator;
pub mod scheduler;
pub mod config;

pub use types::*;
pub use namespaces::{FieldName, NamespaceBinding, Namespaces};
pub use document::{Element, EntryLocation, FeedDocument};
pub use extractor::ArticleExtractor;
pub use ledger::Ledger;
pub use dedup::{DedupEngine, DedupOutcome, EntryDecision};
pub use rewriter::{FeedRewriter, LinkRewrite};
pub use traits::{FeedSink, FeedSource, LedgerStore, Publisher};
pub use fetcher::HttpFeedSource;
pub use store::FileStore;
pub use publisher::{GitPublisher, PublishConfig};
pub use aggregator::FeedUpdater;
pub use scheduler::DailySchedule;
pub use config::AppConfig;
