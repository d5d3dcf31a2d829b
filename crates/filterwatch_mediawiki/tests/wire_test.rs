use filterwatch_core::SourceName;
use filterwatch_error::SourceErrorKind;
use filterwatch_interface::{LogSource, SourceConnector};
use filterwatch_mediawiki::wire::{parse_abuse_log, parse_login_result, parse_login_token};
use filterwatch_mediawiki::{MediaWikiConnector, endpoint_for};

const ABUSE_LOG: &str = r#"{
    "batchcomplete": true,
    "continue": {"aflstart": "2024-05-01T10:00:00Z", "continue": "-||"},
    "query": {
        "abuselog": [
            {
                "id": 9002,
                "filter_id": "12",
                "filter": "Page blanking",
                "user": "Vandal",
                "title": "Main Page",
                "action": "edit",
                "result": "disallow",
                "timestamp": "2024-05-01T10:02:00Z"
            },
            {
                "id": 9001,
                "filter_id": 34,
                "filter": "Link spam",
                "user": "198.51.100.7",
                "title": "Talk:Example",
                "action": "edit",
                "result": "",
                "timestamp": "2024-05-01T10:01:00Z"
            }
        ]
    }
}"#;

#[test]
fn test_abuse_log_keeps_wiki_order() {
    let entries = parse_abuse_log(ABUSE_LOG).unwrap();
    let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![9002, 9001]);
}

#[test]
fn test_abuse_log_maps_fields() {
    let entries = parse_abuse_log(ABUSE_LOG).unwrap();
    let first = &entries[0];
    assert_eq!(first.filter_id, "12");
    assert_eq!(first.filter_description, "Page blanking");
    assert_eq!(first.user, "Vandal");
    assert_eq!(first.page, "Main Page");
    assert_eq!(first.action, "edit");
    assert_eq!(first.result, "disallow");
    assert_eq!(
        first.timestamp.map(|t| t.to_rfc3339()),
        Some("2024-05-01T10:02:00+00:00".to_string())
    );
}

#[test]
fn test_numeric_filter_id_becomes_text() {
    let entries = parse_abuse_log(ABUSE_LOG).unwrap();
    assert_eq!(entries[1].filter_id, "34");
    assert!(entries[1].result.is_empty());
}

#[test]
fn test_legacy_format_with_string_ids() {
    let body = r#"{"query":{"abuselog":[
        {"id":"77","filter_id":"global-5","user":"X","title":"Y","action":"move","result":"warn"}
    ]}}"#;
    let entries = parse_abuse_log(body).unwrap();
    assert_eq!(entries[0].id, 77);
    assert_eq!(entries[0].filter_id, "global-5");
    assert!(entries[0].timestamp.is_none());
    assert!(entries[0].filter_description.is_empty());
}

#[test]
fn test_empty_log() {
    let body = r#"{"batchcomplete":true,"query":{"abuselog":[]}}"#;
    assert!(parse_abuse_log(body).unwrap().is_empty());
}

#[test]
fn test_blocked_codes_are_permanent() {
    for code in ["aflblocked", "blocked"] {
        let body = format!(
            r#"{{"error":{{"code":"{}","info":"You have been blocked from editing."}}}}"#,
            code
        );
        let err = parse_abuse_log(&body).unwrap_err();
        assert!(
            matches!(err.kind, SourceErrorKind::Blocked(_)),
            "{} should be Blocked, got {:?}",
            code,
            err.kind
        );
        assert!(err.is_permanent());
    }
}

#[test]
fn test_other_api_errors_are_transient() {
    let body = r#"{"error":{"code":"readapidenied","info":"You need read permission."}}"#;
    let err = parse_abuse_log(body).unwrap_err();
    assert!(matches!(err.kind, SourceErrorKind::Transient(_)));
    assert!(!err.is_permanent());
}

#[test]
fn test_malformed_body_is_transient() {
    for body in ["<html>Service unavailable</html>", "{}", r#"{"query":{"abuselog":[{"id":1}]}}"#] {
        let err = parse_abuse_log(body).unwrap_err();
        assert!(
            matches!(err.kind, SourceErrorKind::Transient(_)),
            "{:?} should be Transient, got {:?}",
            body,
            err.kind
        );
    }
}

#[test]
fn test_login_token() {
    let body = r#"{"batchcomplete":true,"query":{"tokens":{"logintoken":"a1b2c3+\\"}}}"#;
    assert_eq!(parse_login_token(body).unwrap(), "a1b2c3+\\");
}

#[test]
fn test_login_token_missing() {
    let err = parse_login_token(r#"{"batchcomplete":true}"#).unwrap_err();
    assert!(matches!(err.kind, SourceErrorKind::Transient(_)));
}

#[test]
fn test_login_success() {
    let body = r#"{"login":{"result":"Success","lguserid":42,"lgusername":"RelayBot"}}"#;
    assert!(parse_login_result(body).is_ok());
}

#[test]
fn test_login_rejected_is_authentication() {
    let body = r#"{"login":{"result":"Failed","reason":"Incorrect username or password entered."}}"#;
    let err = parse_login_result(body).unwrap_err();
    match err.kind {
        SourceErrorKind::Authentication(message) => {
            assert!(message.starts_with("Failed"));
            assert!(message.contains("Incorrect"));
        }
        other => panic!("expected Authentication, got {:?}", other),
    }
}

#[test]
fn test_login_needs_token_is_authentication() {
    let err = parse_login_result(r#"{"login":{"result":"NeedToken"}}"#).unwrap_err();
    assert!(matches!(err.kind, SourceErrorKind::Authentication(_)));
}

#[test]
fn test_endpoint_follows_source_name() {
    let source = SourceName::new("meta.wikimedia.org").unwrap();
    assert_eq!(endpoint_for(&source), "https://meta.wikimedia.org/w/api.php");
}

#[test]
fn test_connector_builds_named_source() {
    let connector = MediaWikiConnector::new();
    let source_name = SourceName::new("en.wikipedia.org").unwrap();
    let source = connector.connect(&source_name).unwrap();
    assert_eq!(source.name(), &source_name);

    let concrete = connector.source(&source_name).unwrap();
    assert_eq!(concrete.endpoint(), "https://en.wikipedia.org/w/api.php");
    let moved = concrete.with_endpoint("http://127.0.0.1:9/w/api.php");
    assert_eq!(moved.endpoint(), "http://127.0.0.1:9/w/api.php");
}

#[tokio::test]
async fn test_anonymous_login_skips_network() {
    let connector = MediaWikiConnector::new();
    let source = connector
        .source(&SourceName::new("en.wikipedia.org").unwrap())
        .unwrap()
        .with_endpoint("http://127.0.0.1:9/w/api.php");
    assert!(source.authenticate("", "").await.is_ok());
}

#[tokio::test]
async fn test_unreachable_wiki_is_transient() {
    let connector = MediaWikiConnector::new().with_timeout(std::time::Duration::from_secs(2));
    let source = connector
        .source(&SourceName::new("en.wikipedia.org").unwrap())
        .unwrap()
        .with_endpoint("http://127.0.0.1:9/w/api.php");
    let err = source.fetch_recent().await.unwrap_err();
    assert!(matches!(err.kind, SourceErrorKind::Transient(_)));
}
