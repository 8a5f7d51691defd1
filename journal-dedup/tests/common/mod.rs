#![allow(dead_code)]

use chrono::NaiveDate;
use journal_dedup::{ArticleExtractor, FeedDocument};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn item_body(doi: Option<&str>, date: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(doi) = doi {
        body.push_str(&format!("<prism:doi>{}</prism:doi>", doi));
    }
    if let Some(date) = date {
        body.push_str(&format!("<dc:date>{}</dc:date>", date));
    }
    body
}

/// RSS 2.0 layout: items inside the channel, after its metadata.
pub fn rss2_feed(title: &str, items: &[(Option<&str>, Option<&str>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:prism="http://prismstandard.org/namespaces/basic/2.0/">
<channel>
<title>"#,
    );
    xml.push_str(title);
    xml.push_str("</title>\n<link>https://onlinelibrary.wiley.com/journal/example</link>\n");
    xml.push_str("<description>Latest articles</description>\n");
    for (i, (doi, date)) in items.iter().enumerate() {
        xml.push_str(&format!(
            "<item><title>Article {}</title><link>https://onlinelibrary.wiley.com/doi/abs/{}?af=R</link>{}</item>\n",
            i,
            doi.unwrap_or("missing"),
            item_body(*doi, *date)
        ));
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}

/// RSS 1.0 layout: items are siblings of the channel, which lists them in an `rdf:Seq`.
pub fn rdf_feed(title: &str, items: &[(Option<&str>, Option<&str>)]) -> String {
    let about = |i: usize| format!("https://onlinelibrary.wiley.com/doi/item{}", i);
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:prism="http://prismstandard.org/namespaces/basic/2.0/">
<channel rdf:about="https://onlinelibrary.wiley.com/journal/example">
<title>"#,
    );
    xml.push_str(title);
    xml.push_str("</title>\n<items><rdf:Seq>");
    for i in 0..items.len() {
        xml.push_str(&format!("<rdf:li rdf:resource=\"{}\"/>", about(i)));
    }
    xml.push_str("</rdf:Seq></items>\n</channel>\n");
    for (i, (doi, date)) in items.iter().enumerate() {
        xml.push_str(&format!(
            "<item rdf:about=\"{}\"><title>Article {}</title>{}</item>\n",
            about(i),
            i,
            item_body(*doi, *date)
        ));
    }
    xml.push_str("</rdf:RDF>\n");
    xml
}

pub fn parse(xml: &str) -> FeedDocument {
    FeedDocument::parse(xml.as_bytes()).unwrap()
}

/// Identifiers of the entries still in the document, in document order.
pub fn identifiers(document: &FeedDocument) -> Vec<String> {
    let extractor = ArticleExtractor::default();
    document
        .entries()
        .into_iter()
        .filter_map(|entry| extractor.extract(entry).identifier)
        .collect()
}
