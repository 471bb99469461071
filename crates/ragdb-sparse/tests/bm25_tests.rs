use ragdb_core::error::Error;
use ragdb_core::store::ChunkStore;
use ragdb_core::traits::SparseSearcher;
use ragdb_core::types::DocumentChunk;
use ragdb_sparse::{tokenize, Bm25Index, Bm25Params};

fn chunk(id: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        doc_name: "ops-manual.pdf".to_string(),
        page: None,
        kind: None,
        content: content.to_string(),
        chunk_index: 0,
        total_chunks: 1,
    }
}

fn build(corpus: &[(&str, &str)]) -> Bm25Index {
    let chunks = corpus.iter().map(|(id, text)| chunk(id, text)).collect();
    let store = ChunkStore::build(chunks).expect("store");
    Bm25Index::build(&store, Bm25Params::default()).expect("index")
}

fn terms(query: &str) -> Vec<String> {
    tokenize(query)
}

#[test]
fn tokenize_preserves_command_vocabulary() {
    assert_eq!(
        tokenize("Run kafka-topics.sh --create (once)."),
        vec!["run", "kafka-topics.sh", "--create", "once"]
    );
    assert_eq!(tokenize("set log.retention.hours!"), vec!["set", "log.retention.hours"]);
}

#[test]
fn tokenize_drops_bare_punctuation() {
    assert_eq!(tokenize("a - b -- c"), vec!["a", "b", "c"]);
    assert!(tokenize("?! ... ---").is_empty());
}

#[test]
fn statistics_are_computed_from_the_store() {
    let index = build(&[("a", "one two three"), ("b", "four five")]);
    assert_eq!(index.doc_count(), 2);
    assert!((index.avg_doc_len() - 2.5).abs() < 1e-6);
}

#[test]
fn repeated_term_outscores_single_occurrence() {
    let index = build(&[
        ("a", "kafka kafka kafka runs the cluster"),
        ("b", "kafka is mentioned once here today"),
        ("c", "nothing relevant in this chunk at all"),
    ]);
    let hits = index.search(&terms("kafka"), 10).expect("search");
    assert_eq!(hits.len(), 2, "only matching chunks are returned");
    assert_eq!(hits[0].id, "a");
    assert_eq!(hits[1].id, "b");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn rare_term_carries_more_weight_than_common_term() {
    let index = build(&[
        ("a", "broker broker broker broker"),
        ("b", "broker zookeeper"),
        ("c", "broker failover"),
    ]);
    // "zookeeper" appears in one doc, "broker" in all three.
    let rare = index.search(&terms("zookeeper"), 10).expect("rare");
    let common = index.search(&terms("broker"), 10).expect("common");
    let b_rare = rare.iter().find(|h| h.id == "b").expect("b for rare term");
    let b_common = common.iter().find(|h| h.id == "b").expect("b for common term");
    assert!(b_rare.score > b_common.score);
}

#[test]
fn scores_are_non_negative_and_descending() {
    let index = build(&[
        ("a", "topic partition replication"),
        ("b", "topic partition"),
        ("c", "topic"),
        ("d", "unrelated words only"),
    ]);
    let hits = index.search(&terms("topic partition replication"), 10).expect("search");
    assert_eq!(hits.len(), 3);
    for window in hits.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
    for hit in &hits {
        assert!(hit.score >= 0.0);
    }
}

#[test]
fn equal_scores_break_ties_by_chunk_id() {
    let index = build(&[("b", "same words here"), ("a", "same words here")]);
    let hits = index.search(&terms("same words"), 10).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a", "equal scores order by id ascending");
    assert_eq!(hits[1].id, "b");
    assert!((hits[0].score - hits[1].score).abs() < 1e-6);
}

#[test]
fn k_truncates_the_result() {
    let index = build(&[
        ("a", "kafka topic"),
        ("b", "kafka topic"),
        ("c", "kafka topic"),
    ]);
    let hits = index.search(&terms("kafka"), 2).expect("search");
    assert_eq!(hits.len(), 2);
    let hits = index.search(&terms("kafka"), 0).expect("search");
    assert!(hits.is_empty());
}

#[test]
fn unknown_terms_return_empty() {
    let index = build(&[("a", "kafka topic")]);
    let hits = index.search(&terms("xyzzy quux"), 10).expect("search");
    assert!(hits.is_empty());
}

#[test]
fn empty_store_builds_and_returns_nothing() {
    let store = ChunkStore::build(Vec::new()).expect("empty store");
    let index = Bm25Index::build(&store, Bm25Params::default()).expect("empty index");
    assert_eq!(index.doc_count(), 0);
    assert!(index.search(&terms("kafka"), 5).expect("search").is_empty());
}

#[test]
fn invalid_params_are_rejected_at_build() {
    let store = ChunkStore::build(vec![chunk("a", "text")]).expect("store");
    let bad_k1 = Bm25Index::build(&store, Bm25Params { k1: -0.1, b: 0.75 });
    assert!(matches!(bad_k1, Err(Error::InvalidConfig(_))));
    let bad_b = Bm25Index::build(&store, Bm25Params { k1: 1.2, b: 1.1 });
    assert!(matches!(bad_b, Err(Error::InvalidConfig(_))));
}
