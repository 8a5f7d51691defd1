use crate::traits::Publisher;
use crate::types::{FeedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub repo_dir: PathBuf,
    pub remote: String,
    pub branch: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: "master".to_string(),
        }
    }
}

/// Commits everything in the repository directory and pushes it.
pub struct GitPublisher {
    config: PublishConfig,
}

impl GitPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    async fn git(&self, args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.config.repo_dir)
            .output()
            .await?;
        Ok(output)
    }

    async fn git_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.git(args).await?;
        if !output.status.success() {
            return Err(FeedError::Publish(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, message: &str) -> Result<()> {
        self.git_checked(&["add", "."]).await?;

        // Fails when nothing changed, which is not worth aborting over.
        let commit = self.git(&["commit", "-m", message]).await?;
        if !commit.status.success() {
            warn!(
                "git commit did not succeed: {}",
                String::from_utf8_lossy(&commit.stdout).trim()
            );
        }

        self.git_checked(&["push", &self.config.remote, &self.config.branch]).await?;
        info!("Published to {}/{}", self.config.remote, self.config.branch);
        Ok(())
    }
}
