//! Run configuration.
//!
//! Everything has a default, so an empty JSON object (or no file at all)
//! reproduces the stock setup: the six Wiley journals, DOI/date fields, the
//! Wiley link fixes and a 04:00 daily trigger.

use crate::dedup::DedupEngine;
use crate::extractor::ArticleExtractor;
use crate::namespaces::{NamespaceBinding, Namespaces};
use crate::publisher::PublishConfig;
use crate::rewriter::{FeedRewriter, LinkRewrite};
use crate::types::{FeedError, FetchConfig, JournalConfig, Result, Traversal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub journals: Vec<JournalConfig>,
    pub ledger_dir: PathBuf,
    pub output_dir: PathBuf,
    pub fetch: FetchConfig,
    pub namespaces: Vec<NamespaceBinding>,
    pub identifier_fields: Vec<String>,
    pub date_fields: Vec<String>,
    pub traversal: Traversal,
    pub link_rewrites: Vec<LinkRewrite>,
    pub schedule_hour: u32,
    pub continue_on_error: bool,
    pub publish: Option<PublishConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            journals: default_journals(),
            ledger_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            fetch: FetchConfig::default(),
            namespaces: Namespaces::publisher_defaults().bindings().to_vec(),
            identifier_fields: vec!["prism:doi".to_string()],
            date_fields: vec!["dc:date".to_string()],
            traversal: Traversal::Reverse,
            link_rewrites: LinkRewrite::publisher_defaults(),
            schedule_hour: 4,
            continue_on_error: false,
            publish: None,
        }
    }
}

fn default_journals() -> Vec<JournalConfig> {
    let wiley = |id: &str| format!("https://onlinelibrary.wiley.com/feed/{}/most-recent", id);
    vec![
        JournalConfig::new("Advanced Materials", "AdvMater", wiley("15214095")),
        JournalConfig::new("Advanced Synthesis & Catalysis", "AdvSynthCatal", wiley("16154169")),
        JournalConfig::new("Angewandte Chemie International Edition", "acie", wiley("15213773")),
        JournalConfig::new("Chemistry \u{2014} A European Journal", "ChemEurJ", wiley("15213765")),
        JournalConfig::new("ChemBioChem", "ChemBioChem", wiley("14397633")),
        JournalConfig::new("European Journal of Chemistry", "ejoc", wiley("10990690")),
    ]
}

/// Only http(s) URLs make sense as feed locations.
pub fn is_valid_feed_url(url_str: &str) -> bool {
    match Url::parse(url_str) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

impl AppConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let mut short_names = HashSet::new();
        for journal in &self.journals {
            if journal.short_name.trim().is_empty() {
                return Err(FeedError::Config(format!("journal '{}' has no short name", journal.name)));
            }
            if !short_names.insert(journal.short_name.to_lowercase()) {
                return Err(FeedError::Config(format!("duplicate short name '{}'", journal.short_name)));
            }
            if !is_valid_feed_url(&journal.url) {
                return Err(FeedError::Config(format!(
                    "journal '{}' has an invalid feed URL: {}",
                    journal.short_name, journal.url
                )));
            }
        }
        if self.schedule_hour >= 24 {
            return Err(FeedError::Config(format!("schedule_hour {} out of range", self.schedule_hour)));
        }
        if self.identifier_fields.is_empty() {
            return Err(FeedError::Config("identifier_fields is empty".to_string()));
        }
        self.extractor()?;
        Ok(())
    }

    pub fn namespaces(&self) -> Namespaces {
        Namespaces::new(self.namespaces.clone())
    }

    pub fn extractor(&self) -> Result<ArticleExtractor> {
        ArticleExtractor::from_field_names(&self.identifier_fields, &self.date_fields, &self.namespaces())
    }

    pub fn engine(&self) -> Result<DedupEngine> {
        Ok(DedupEngine::new(self.extractor()?, self.traversal))
    }

    pub fn rewriter(&self) -> Result<FeedRewriter> {
        FeedRewriter::new(&self.link_rewrites)
    }

    /// Journals whose short name matches one of `short_names` (case-insensitive);
    /// all journals when the filter is empty.
    pub fn select_journals(&self, short_names: &[String]) -> Result<Vec<JournalConfig>> {
        if short_names.is_empty() {
            return Ok(self.journals.clone());
        }
        short_names
            .iter()
            .map(|wanted| {
                self.journals
                    .iter()
                    .find(|j| j.short_name.eq_ignore_ascii_case(wanted))
                    .cloned()
                    .ok_or_else(|| FeedError::Config(format!("unknown journal '{}'", wanted)))
            })
            .collect()
    }
}
