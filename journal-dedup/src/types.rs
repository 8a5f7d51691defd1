use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder stored when a feed entry carries no publication date.
pub const SENTINEL_DATE: &str = "none";

/// Suffix appended to the feed title so readers can tell the filtered feed apart.
pub const TITLE_SUFFIX: &str = " (no repeats)";

/// A well-formed date is `YYYY-MM-DD`, i.e. exactly two `-` separators.
pub fn is_well_formed_date(date: &str) -> bool {
    date.matches('-').count() == 2
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Display name, also the literal text matched when patching the feed title.
    pub name: String,
    pub short_name: String,
    pub url: String,
}

impl JournalConfig {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            url: url.into(),
        }
    }

    pub fn ledger_file_name(&self) -> String {
        format!("{}_old.csv", self.short_name.to_lowercase())
    }

    pub fn feed_file_name(&self) -> String {
        format!("{}.xml", self.short_name)
    }
}

/// One line of a journal's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub identifier: String,
    pub date: Option<String>,
}

impl ArticleRecord {
    pub fn new(identifier: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            date: Some(date.into()),
        }
    }

    pub fn without_date(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            date: None,
        }
    }

    pub fn has_well_formed_date(&self) -> bool {
        self.date.as_deref().map(is_well_formed_date).unwrap_or(false)
    }
}

/// What the extractor found on a single feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub identifier: Option<String>,
    /// Date portion of the entry's date field, or [`SENTINEL_DATE`].
    pub date: String,
}

impl ExtractedArticle {
    pub fn has_sentinel_date(&self) -> bool {
        self.date == SENTINEL_DATE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub max_feed_size_mb: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.77 Safari/537.36".to_string(),
            timeout_seconds: 60,
            max_redirects: 10,
            max_feed_size_mb: 20,
        }
    }
}

/// Order in which feed entries are visited by the deduplication engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Last entry first. Publishers list newest first, so this sees older entries first.
    #[default]
    Reverse,
    Forward,
}

/// Per-journal summary of one update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupReport {
    pub entries_seen: usize,
    pub new_entries: usize,
    pub unchanged_duplicates: usize,
    pub variant_duplicates: usize,
    pub unidentified: usize,
    pub removed: usize,
    pub dates_repaired: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalOutcome {
    pub short_name: String,
    pub report: Option<DedupReport>,
    pub ledger_size: usize,
    pub titles_rewritten: usize,
    pub error: Option<String>,
}

impl JournalOutcome {
    pub fn failed(short_name: &str, error: &FeedError) -> Self {
        Self {
            short_name: short_name.to_string(),
            report: None,
            ledger_size: 0,
            titles_rewritten: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub date: NaiveDate,
    pub journals: Vec<JournalOutcome>,
    pub published: bool,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.journals.iter().filter(|j| !j.is_success()).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {url} returned HTTP {status}")]
    Transport { url: String, status: u16 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: u64 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Feed serialization error: {0}")]
    Serialize(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
