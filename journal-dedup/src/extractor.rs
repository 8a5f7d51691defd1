use crate::document::Element;
use crate::namespaces::{FieldName, Namespaces};
use crate::types::{ExtractedArticle, Result, SENTINEL_DATE};

/// Pulls the identifier and publication date out of one feed entry.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    identifier_fields: Vec<FieldName>,
    date_fields: Vec<FieldName>,
}

impl ArticleExtractor {
    pub fn new(identifier_fields: Vec<FieldName>, date_fields: Vec<FieldName>) -> Self {
        Self {
            identifier_fields,
            date_fields,
        }
    }

    /// Build from `prefix:local` field names resolved against `namespaces`.
    pub fn from_field_names(
        identifier_fields: &[String],
        date_fields: &[String],
        namespaces: &Namespaces,
    ) -> Result<Self> {
        let identifier_fields = identifier_fields
            .iter()
            .map(|field| namespaces.resolve_field(field))
            .collect::<Result<Vec<_>>>()?;
        let date_fields = date_fields
            .iter()
            .map(|field| namespaces.resolve_field(field))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(identifier_fields, date_fields))
    }

    pub fn extract(&self, entry: &Element) -> ExtractedArticle {
        let identifier = first_field_text(entry, &self.identifier_fields);

        let date = match first_field_text(entry, &self.date_fields) {
            // Timestamps keep only their date portion.
            Some(date) if date.contains('T') => date.chars().take(10).collect(),
            Some(date) => date,
            None => SENTINEL_DATE.to_string(),
        };

        ExtractedArticle { identifier, date }
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        let namespaces = Namespaces::publisher_defaults();
        let field = |name: &str| namespaces.resolve_field(name).ok();
        Self::new(
            field("prism:doi").into_iter().collect(),
            field("dc:date").into_iter().collect(),
        )
    }
}

/// Trimmed text of the first matching child, trying fields in priority order.
fn first_field_text(entry: &Element, fields: &[FieldName]) -> Option<String> {
    fields.iter().find_map(|field| {
        entry
            .child_elements()
            .find(|child| field.matches(child.namespace(), &child.local_name()))
            .and_then(|child| child.text())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    })
}
