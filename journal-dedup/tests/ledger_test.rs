mod common;

use common::init_tracing;
use journal_dedup::{ArticleRecord, FileStore, JournalConfig, Ledger, LedgerStore};
use tempfile::TempDir;

fn journal() -> JournalConfig {
    JournalConfig::new("Example Journal", "ExJ", "https://example.org/feed")
}

#[test]
fn test_parse_accepts_quoted_unquoted_and_legacy_lines() {
    init_tracing();
    let content = concat!(
        "\"10.1/a\",\"2024-01-01\"\n",
        "10.1/b,2024-01-02\r\n",
        "\n",
        "\"10.1/c\"\n",
        "\"10.1/d\",\"none\",\"2024-03-03\"\n",
        "\"a \"\"quoted\"\", id\",\"none\"\n",
    );

    let ledger = Ledger::parse(content);

    assert_eq!(
        ledger.records(),
        &[
            ArticleRecord::new("10.1/a", "2024-01-01"),
            ArticleRecord::new("10.1/b", "2024-01-02"),
            ArticleRecord::without_date("10.1/c"),
            ArticleRecord::new("10.1/d", "2024-03-03"),
            ArticleRecord::new("a \"quoted\", id", "none"),
        ]
    );
}

#[test]
fn test_repeated_identifiers_collapse_to_first_record() {
    init_tracing();
    let ledger = Ledger::parse(concat!(
        "\"10.1/a\",\"2024-01-01\"\n",
        "\"10.1/e\",\"none\"\n",
        "\"10.1/a\",\"2023-06-06\"\n",
        "\"10.1/e\",\"2024-05-05\"\n",
    ));

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.get("10.1/a").unwrap().date.as_deref(), Some("2024-01-01"));
    assert_eq!(ledger.get("10.1/e").unwrap().date.as_deref(), Some("2024-05-05"));
}

#[test]
fn test_lines_without_identifier_are_skipped() {
    init_tracing();
    let ledger = Ledger::parse(concat!(
        "\"\",\"\"\n",
        ",2024-01-01\n",
        "\"  \",\"none\",\"2024-02-02\"\n",
        "\"10.1/a\",\"2024-01-01\"\n",
    ));

    assert_eq!(ledger.records(), &[ArticleRecord::new("10.1/a", "2024-01-01")]);
    assert!(!ledger.contains(""));
    assert_eq!(ledger.to_file_string(), "\"10.1/a\",\"2024-01-01\"\n");
}

#[test]
fn test_file_format_preserves_order_and_quotes_fields() {
    init_tracing();
    let ledger = Ledger::from_records(vec![
        ArticleRecord::new("10.1/z", "2024-01-01"),
        ArticleRecord::without_date("10.1/a"),
        ArticleRecord::new("say \"hi\"", "none"),
    ]);

    let text = ledger.to_file_string();

    assert_eq!(
        text,
        "\"10.1/z\",\"2024-01-01\"\n\"10.1/a\"\n\"say \"\"hi\"\"\",\"none\"\n"
    );
    assert_eq!(Ledger::parse(&text), ledger);
}

#[test]
fn test_repair_date_only_improves_missing_or_malformed_dates() {
    init_tracing();
    let mut ledger = Ledger::from_records(vec![
        ArticleRecord::new("good", "2024-01-01"),
        ArticleRecord::new("placeholder", "none"),
        ArticleRecord::without_date("missing"),
    ]);

    assert!(!ledger.repair_date("good", "2024-09-09"));
    assert!(!ledger.repair_date("placeholder", "none"));
    assert!(ledger.repair_date("placeholder", "2024-02-02"));
    assert!(ledger.repair_date("missing", "2024-03-03"));
    assert!(!ledger.repair_date("absent", "2024-03-03"));

    assert!(ledger.contains_pair("good", "2024-01-01"));
    assert!(ledger.contains_pair("placeholder", "2024-02-02"));
    assert!(ledger.contains_pair("missing", "2024-03-03"));
    assert!(!ledger.contains("absent"));
}

#[tokio::test]
async fn test_missing_ledger_file_loads_empty() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path(), dir.path());

    let ledger = store.load(&journal()).await.unwrap();

    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_ledger_save_and_load_through_file_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("ledgers"), dir.path().join("feeds"));
    let ledger = Ledger::from_records(vec![
        ArticleRecord::new("10.1/a", "2024-01-01"),
        ArticleRecord::new("10.1/b", "none"),
    ]);

    store.save(&journal(), &ledger).await.unwrap();

    let path = dir.path().join("ledgers").join("exj_old.csv");
    assert_eq!(store.ledger_path(&journal()), path);
    assert!(path.exists());
    assert!(!dir.path().join("ledgers").join("exj_old.csv.tmp").exists());
    assert_eq!(store.load(&journal()).await.unwrap(), ledger);
}
