use crate::ledger::Ledger;
use crate::traits::{FeedSink, LedgerStore};
use crate::types::{JournalConfig, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Keeps ledgers and output feeds as plain files.
#[derive(Debug, Clone)]
pub struct FileStore {
    ledger_dir: PathBuf,
    output_dir: PathBuf,
}

impl FileStore {
    pub fn new(ledger_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ledger_dir: ledger_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn ledger_path(&self, journal: &JournalConfig) -> PathBuf {
        self.ledger_dir.join(journal.ledger_file_name())
    }

    pub fn feed_path(&self, journal: &JournalConfig) -> PathBuf {
        self.output_dir.join(journal.feed_file_name())
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers see
/// either the old content or the new one.
async fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl LedgerStore for FileStore {
    async fn load(&self, journal: &JournalConfig) -> Result<Ledger> {
        let path = self.ledger_path(journal);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let ledger = Ledger::parse(&content);
                debug!("Loaded {} ledger records from {}", ledger.len(), path.display());
                Ok(ledger)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No ledger at {}, starting empty", path.display());
                Ok(Ledger::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, journal: &JournalConfig, ledger: &Ledger) -> Result<()> {
        let path = self.ledger_path(journal);
        replace_file(&path, ledger.to_file_string().as_bytes()).await?;
        debug!("Saved {} ledger records to {}", ledger.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl FeedSink for FileStore {
    async fn write_feed(&self, journal: &JournalConfig, bytes: &[u8]) -> Result<()> {
        let path = self.feed_path(journal);
        replace_file(&path, bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
