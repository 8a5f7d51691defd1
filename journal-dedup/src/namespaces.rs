use crate::types::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const RSS_1_0: &str = "http://purl.org/rss/1.0/";
pub const ATOM: &str = "http://www.w3.org/2005/Atom";
pub const CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";
pub const DUBLIN_CORE: &str = "http://purl.org/dc/elements/1.1/";
pub const PRISM: &str = "http://prismstandard.org/namespaces/basic/2.0/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

impl NamespaceBinding {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// Prefix bindings handed to the serializer and to the field resolver.
///
/// Nothing here is global: whoever serializes a document passes the set it
/// wants, and elements bound to a registered URI are written with the
/// registered prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    bindings: Vec<NamespaceBinding>,
}

/// An element name to look for on feed entries, e.g. `prism:doi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName {
    /// `None` matches the local name in any namespace.
    pub namespace: Option<String>,
    pub local: String,
}

impl FieldName {
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        if self.local != local {
            return false;
        }
        match &self.namespace {
            Some(expected) => namespace == Some(expected.as_str()),
            None => true,
        }
    }
}

impl Namespaces {
    pub fn new(bindings: Vec<NamespaceBinding>) -> Self {
        Self { bindings }
    }

    /// The bindings the Wiley feeds use.
    pub fn publisher_defaults() -> Self {
        Self::new(vec![
            NamespaceBinding::new("", RSS_1_0),
            NamespaceBinding::new("atom", ATOM),
            NamespaceBinding::new("content", CONTENT),
            NamespaceBinding::new("dc", DUBLIN_CORE),
            NamespaceBinding::new("prism", PRISM),
            NamespaceBinding::new("rdf", RDF),
        ])
    }

    pub fn bindings(&self) -> &[NamespaceBinding] {
        &self.bindings
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.as_str())
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.uri == uri)
            .map(|b| b.prefix.as_str())
    }

    /// Resolve `prefix:local` (or a bare `local`) into a [`FieldName`].
    pub fn resolve_field(&self, field: &str) -> Result<FieldName> {
        let field = field.trim();
        match field.split_once(':') {
            Some((prefix, local)) => {
                let uri = self.uri_for(prefix).ok_or_else(|| {
                    FeedError::Config(format!("unknown namespace prefix '{}' in field '{}'", prefix, field))
                })?;
                if local.is_empty() {
                    return Err(FeedError::Config(format!("empty field name in '{}'", field)));
                }
                Ok(FieldName {
                    namespace: Some(uri.to_string()),
                    local: local.to_string(),
                })
            }
            None if field.is_empty() => Err(FeedError::Config("empty field name".to_string())),
            None => Ok(FieldName {
                namespace: None,
                local: field.to_string(),
            }),
        }
    }

    /// Map from prefixes declared in a document to the registered prefix for
    /// the same URI, for every prefix that differs.
    ///
    /// A rename is skipped when the target prefix is already declared in the
    /// document for another URI.
    pub fn prefix_remap(&self, declared: &[(String, String)]) -> HashMap<String, String> {
        let mut remap = HashMap::new();
        for (prefix, uri) in declared {
            let Some(target) = self.prefix_for(uri) else {
                continue;
            };
            if target == prefix {
                continue;
            }
            let taken = declared
                .iter()
                .any(|(other_prefix, other_uri)| other_prefix == target && other_uri != uri);
            if !taken {
                remap.insert(prefix.clone(), target.to_string());
            }
        }
        remap
    }
}
