use std::fs;

use tempfile::TempDir;

use ragdb_core::config::{Config, RetrievalConfig};
use ragdb_core::error::Error;
use ragdb_core::store::ChunkStore;
use ragdb_core::types::{ChunkKind, DocumentChunk, RetrievalResult, ScoredCandidate};

fn chunk(id: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        doc_name: "kafka-guide.pdf".to_string(),
        page: Some(1),
        kind: Some(ChunkKind::Conceptual),
        content: content.to_string(),
        chunk_index: 0,
        total_chunks: 1,
    }
}

#[test]
fn default_config_is_valid() {
    let cfg = RetrievalConfig::default();
    cfg.validate().expect("defaults must validate");
    assert!((cfg.dense_weight + cfg.sparse_weight - 1.0).abs() < 1e-6);
}

#[test]
fn weights_not_summing_to_one_are_rejected() {
    let cfg = RetrievalConfig {
        dense_weight: 0.5,
        sparse_weight: 0.6,
        ..RetrievalConfig::default()
    };
    match cfg.validate() {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("sum to 1.0"), "{msg}"),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn negative_weight_is_rejected() {
    let cfg = RetrievalConfig {
        dense_weight: 1.2,
        sparse_weight: -0.2,
        ..RetrievalConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn zero_overfetch_is_rejected() {
    let cfg = RetrievalConfig {
        overfetch_factor: 0,
        ..RetrievalConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn bm25_b_outside_unit_interval_is_rejected() {
    let cfg = RetrievalConfig {
        bm25_b: 1.5,
        ..RetrievalConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn retrieval_section_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\ndense_weight = 0.6\nsparse_weight = 0.4\n",
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let retrieval = config.retrieval().expect("retrieval section");
    assert!((retrieval.dense_weight - 0.6).abs() < 1e-6);
    assert!((retrieval.sparse_weight - 0.4).abs() < 1e-6);
    // Untouched fields keep their defaults.
    assert_eq!(retrieval.overfetch_factor, 3);
}

#[test]
fn missing_retrieval_section_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path()).expect("load");
    let retrieval = config.retrieval().expect("defaults");
    assert!((retrieval.dense_weight - 0.7).abs() < 1e-6);
    assert!(retrieval.expansion.contains_key("create a topic"));
}

#[test]
fn expansion_file_entries_merge_over_builtins() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\nexpansion_file = \"expansions.toml\"\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("expansions.toml"),
        "\"rebalance\" = [\"partition reassignment\", \"kafka-reassign-partitions.sh\"]\n",
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let retrieval = config.retrieval().expect("retrieval");
    assert_eq!(
        retrieval.expansion.get("rebalance").map(Vec::len),
        Some(2),
        "file entry should be present"
    );
    assert!(retrieval.expansion.contains_key("retention"), "builtins kept");
}

#[test]
fn chunk_store_get_and_ids() {
    let store = ChunkStore::build(vec![chunk("b", "beta"), chunk("a", "alpha")]).expect("build");
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("a").unwrap().content, "alpha");
    let ids: Vec<String> = store.all_ids().into_iter().collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn chunk_store_missing_id_is_not_found() {
    let store = ChunkStore::build(vec![chunk("a", "alpha")]).expect("build");
    assert!(matches!(store.get("zzz"), Err(Error::NotFound(_))));
}

#[test]
fn chunk_store_rejects_duplicate_ids() {
    let result = ChunkStore::build(vec![chunk("a", "first"), chunk("a", "second")]);
    match result {
        Err(Error::Operation(msg)) => assert!(msg.contains("duplicate"), "{msg}"),
        other => panic!("expected duplicate-id failure, got {other:?}"),
    }
}

#[test]
fn chunk_store_iterates_in_id_order() {
    let store =
        ChunkStore::build(vec![chunk("c", "3"), chunk("a", "1"), chunk("b", "2")]).expect("build");
    let order: Vec<&str> = store.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn retrieval_result_serializes_with_score_breakdown() {
    let result = RetrievalResult {
        query: "how do I create a topic?".to_string(),
        searched_query: "how do I create a topic? kafka-topics.sh".to_string(),
        expanded: true,
        candidates: vec![ScoredCandidate {
            id: "guide:0".to_string(),
            dense_score: Some(0.92),
            sparse_score: None,
            fused_score: 0.7,
            rank: 1,
        }],
        diagnostics: None,
    };
    let json = serde_json::to_string(&result).expect("serialize");
    assert!(json.contains("\"sparse_score\":null"));
    assert!(json.contains("\"rank\":1"));
}
