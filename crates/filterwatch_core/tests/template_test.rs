//! Tests for line template parsing and rendering.

use filterwatch_core::{LineTemplate, LogEntry, LogEntryBuilder, SourceName};

fn sample_entry() -> LogEntry {
    LogEntryBuilder::default()
        .id(103u64)
        .filter_id("global-7")
        .user("Vandal")
        .page("Talk:Sandbox")
        .action("edit")
        .result("disallow")
        .filter_description("Blanking")
        .build()
        .expect("Valid entry")
}

#[test]
fn test_render_all_fields() {
    let template = LineTemplate::parse(
        "{user}|{filter_id}|{action}|{page}|{result}|{filter_description}|{id}|{wiki_address}",
    )
    .expect("Valid template");
    let source = SourceName::new("meta.wikimedia.org").expect("Valid source");

    assert_eq!(
        template.render(&sample_entry(), &source),
        "Vandal|global-7|edit|Talk:Sandbox|disallow|Blanking|103|meta.wikimedia.org"
    );
}

#[test]
fn test_doubled_braces_are_literal() {
    let template = LineTemplate::parse("{{{user}}}").expect("Valid template");
    let source = SourceName::new("a.org").expect("Valid source");
    assert_eq!(template.render(&sample_entry(), &source), "{Vandal}");
}

#[test]
fn test_template_without_placeholders() {
    let template = LineTemplate::parse("static text").expect("Valid template");
    let source = SourceName::new("a.org").expect("Valid source");
    assert_eq!(template.render(&sample_entry(), &source), "static text");
    assert_eq!(template.as_str(), "static text");
}

#[test]
fn test_unknown_placeholder_rejected() {
    let err = LineTemplate::parse("{user} did {something}").expect_err("Unknown field");
    assert!(err.to_string().contains("something"));
}

#[test]
fn test_unbalanced_braces_rejected() {
    assert!(LineTemplate::parse("{user").is_err());
    assert!(LineTemplate::parse("user}").is_err());
}
