use std::collections::HashMap;

use ragdb_core::config::default_expansion_table;
use ragdb_hybrid::QueryExpander;

fn expander() -> QueryExpander {
    QueryExpander::new(default_expansion_table())
}

#[test]
fn matching_phrase_appends_command_vocabulary() {
    let expanded = expander().expand("How do I create a topic?");
    assert!(expanded.starts_with("How do I create a topic?"));
    assert!(expanded.contains("kafka-topics.sh"));
    // Growth is bounded: at most three appended terms.
    let appended = expanded.trim_start_matches("How do I create a topic?");
    assert!(!appended.contains("--create"), "cap stops at three terms: {expanded}");
}

#[test]
fn unmatched_query_is_returned_unchanged() {
    let query = "what is zookeeper quorum sizing";
    assert_eq!(expander().expand(query), query);
}

#[test]
fn expansion_is_idempotent() {
    let exp = expander();
    let once = exp.expand("how does retention work?");
    assert_ne!(once, "how does retention work?");
    let twice = exp.expand(&once);
    assert_eq!(twice, once, "second application must be a no-op");
}

#[test]
fn present_vocabulary_suppresses_expansion() {
    let exp = expander();
    let query = "create a topic with kafka-topics.sh";
    assert_eq!(exp.expand(query), query, "canonical term already present");
}

#[test]
fn matching_is_case_insensitive() {
    let expanded = expander().expand("DELETE TOPIC cleanup");
    assert!(expanded.contains("kafka-topics.sh"), "{expanded}");
}

#[test]
fn empty_table_never_expands() {
    let exp = QueryExpander::new(HashMap::new());
    assert!(exp.is_empty());
    assert_eq!(exp.expand("create a topic"), "create a topic");
}

#[test]
fn custom_table_entries_apply() {
    let mut table = HashMap::new();
    table.insert(
        "Rebalance".to_string(),
        vec!["kafka-reassign-partitions.sh".to_string()],
    );
    let exp = QueryExpander::new(table);
    let expanded = exp.expand("why does a rebalance happen");
    assert!(expanded.ends_with("kafka-reassign-partitions.sh"));
}
