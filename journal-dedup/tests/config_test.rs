mod common;

use chrono::NaiveDateTime;
use common::init_tracing;
use journal_dedup::config::is_valid_feed_url;
use journal_dedup::{AppConfig, DailySchedule, FeedError, Traversal};
use std::io::Write;
use tempfile::NamedTempFile;

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn assert_config_error(json: &str) {
    match AppConfig::from_json_str(json) {
        Err(FeedError::Config(_)) => {}
        other => panic!("Expected config error for {}, got {:?}", json, other.map(|_| ())),
    }
}

#[test]
fn test_default_config_is_valid() {
    init_tracing();
    let config = AppConfig::default();

    config.validate().unwrap();
    assert_eq!(config.journals.len(), 6);
    assert_eq!(config.schedule_hour, 4);
    assert_eq!(config.traversal, Traversal::Reverse);
    assert!(config.journals.iter().all(|j| is_valid_feed_url(&j.url)));
    assert_eq!(config.journals[2].ledger_file_name(), "acie_old.csv");
    assert_eq!(config.journals[0].feed_file_name(), "AdvMater.xml");
}

#[test]
fn test_partial_json_keeps_defaults() {
    init_tracing();
    let config = AppConfig::from_json_str(
        r#"{
            "journals": [
                {"name": "Example Journal", "short_name": "ExJ", "url": "https://example.org/feed"}
            ],
            "traversal": "forward",
            "identifier_fields": ["prism:doi", "dc:identifier"],
            "fetch": {"timeout_seconds": 5}
        }"#,
    )
    .unwrap();

    assert_eq!(config.journals.len(), 1);
    assert_eq!(config.traversal, Traversal::Forward);
    assert_eq!(config.fetch.timeout_seconds, 5);
    assert_eq!(config.fetch.max_redirects, 10);
    assert_eq!(config.date_fields, vec!["dc:date".to_string()]);
    assert_eq!(config.link_rewrites.len(), 4);
    assert!(config.publish.is_none());
    assert_eq!(config.engine().unwrap().traversal(), Traversal::Forward);
}

#[test]
fn test_invalid_configs_are_rejected() {
    init_tracing();
    assert_config_error(r#"{"journals": [{"name": "A", "short_name": "a", "url": "ftp://example.org/feed"}]}"#);
    assert_config_error(r#"{"journals": [{"name": "A", "short_name": "a", "url": "not a url"}]}"#);
    assert_config_error(
        r#"{"journals": [
            {"name": "A", "short_name": "dup", "url": "https://example.org/a"},
            {"name": "B", "short_name": "DUP", "url": "https://example.org/b"}
        ]}"#,
    );
    assert_config_error(r#"{"journals": [{"name": "A", "short_name": " ", "url": "https://example.org/a"}]}"#);
    assert_config_error(r#"{"schedule_hour": 24}"#);
    assert_config_error(r#"{"identifier_fields": []}"#);
    assert_config_error(r#"{"identifier_fields": ["nope:doi"]}"#);
    assert_config_error(r#"{"date_fields": ["dc:"]}"#);
}

#[test]
fn test_malformed_json_is_a_serialization_error() {
    init_tracing();
    assert!(matches!(
        AppConfig::from_json_str("{\"journals\": "),
        Err(FeedError::Serialization(_))
    ));
}

#[test]
fn test_load_from_file() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"schedule_hour": 7, "continue_on_error": true}}"#).unwrap();

    let config = AppConfig::load(file.path()).unwrap();

    assert_eq!(config.schedule_hour, 7);
    assert!(config.continue_on_error);
    assert_eq!(config.journals.len(), 6);
}

#[test]
fn test_select_journals_by_short_name() {
    init_tracing();
    let config = AppConfig::default();

    assert_eq!(config.select_journals(&[]).unwrap().len(), 6);

    let selected = config
        .select_journals(&["ACIE".to_string(), "ejoc".to_string()])
        .unwrap();
    let names: Vec<_> = selected.iter().map(|j| j.short_name.as_str()).collect();
    assert_eq!(names, vec!["acie", "ejoc"]);

    assert!(matches!(
        config.select_journals(&["unknown".to_string()]),
        Err(FeedError::Config(_))
    ));
}

#[test]
fn test_daily_schedule_next_run() {
    init_tracing();
    let schedule = DailySchedule::new(4).unwrap();

    assert_eq!(schedule.next_run_after(at("2024-03-01 03:59")), at("2024-03-01 04:00"));
    assert_eq!(schedule.next_run_after(at("2024-03-01 04:00")), at("2024-03-02 04:00"));
    assert_eq!(schedule.next_run_after(at("2024-12-31 23:30")), at("2025-01-01 04:00"));

    assert!(matches!(DailySchedule::new(24), Err(FeedError::Config(_))));
}
