use crate::document::FeedDocument;
use crate::namespaces::Namespaces;
use crate::types::{FeedError, Result, TITLE_SUFFIX};
use regex::bytes::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Literal substring replacement applied to the serialized feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRewrite {
    pub from: String,
    pub to: String,
}

impl LinkRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Wiley keeps changing its links; these map them to stable public URLs.
    /// Order matters: the mirror host is rewritten before the abstract path.
    pub fn publisher_defaults() -> Vec<Self> {
        vec![
            Self::new("pericles.pericles-prod.literatumonline.com", "onlinelibrary.wiley.com"),
            Self::new("onlinelibrary.wiley.com/doi/abs", "doi.org"),
            Self::new("www.", ""),
            Self::new("?af=R", ""),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct FeedRewriter {
    rules: Vec<(Regex, Vec<u8>)>,
}

impl FeedRewriter {
    pub fn new(rewrites: &[LinkRewrite]) -> Result<Self> {
        let rules = rewrites
            .iter()
            .filter(|rewrite| !rewrite.from.is_empty())
            .map(|rewrite| {
                Regex::new(&regex::escape(&rewrite.from))
                    .map(|pattern| (pattern, rewrite.to.as_bytes().to_vec()))
                    .map_err(|e| FeedError::Config(format!("bad link rewrite '{}': {}", rewrite.from, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Patch the channel title, serialize, then canonicalize links.
    /// Also returns how many title elements were rewritten.
    pub fn rewrite(
        &self,
        document: &mut FeedDocument,
        journal_name: &str,
        namespaces: &Namespaces,
    ) -> Result<(Vec<u8>, usize)> {
        let titles = self.rewrite_title(document, journal_name);
        let bytes = document.to_bytes(namespaces)?;
        Ok((self.canonicalize_links(&bytes), titles))
    }

    /// Rename the channel metadata that carries the journal title.
    ///
    /// Only elements before the first entry are considered. Returns the number
    /// of elements rewritten.
    pub fn rewrite_title(&self, document: &mut FeedDocument, journal_name: &str) -> usize {
        let Some(channel) = document.channel_mut() else {
            debug!("Feed has no channel element, title left unchanged");
            return 0;
        };

        let title = format!("{}{}", journal_name, TITLE_SUFFIX);
        let mut rewritten = 0;
        for element in channel.child_elements_mut() {
            if element.is_entry() {
                break;
            }
            let is_title = element.local_name().ends_with("title");
            if is_title || element.text().as_deref() == Some(journal_name) {
                element.set_text(&title);
                rewritten += 1;
            }
        }
        rewritten
    }

    pub fn canonicalize_links(&self, bytes: &[u8]) -> Vec<u8> {
        let mut out = bytes.to_vec();
        for (pattern, replacement) in &self.rules {
            out = pattern.replace_all(&out, NoExpand(replacement.as_slice())).into_owned();
        }
        out
    }
}

impl Default for FeedRewriter {
    fn default() -> Self {
        // Escaped literals always compile.
        Self::new(&LinkRewrite::publisher_defaults()).unwrap_or(Self { rules: Vec::new() })
    }
}
