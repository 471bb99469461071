use crate::error::Result;
use crate::types::SearchHit;

/// Nearest-neighbor lookup over chunk embeddings. Similarity is cosine,
/// in [-1, 1], descending, ties broken by chunk id ascending.
pub trait DenseSearcher: Send + Sync {
    fn dim(&self) -> usize;
    fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

/// Lexical lookup over frozen term postings. Scores are >= 0,
/// descending, same tie-break rule as the dense side.
pub trait SparseSearcher: Send + Sync {
    fn search(&self, terms: &[String], k: usize) -> Result<Vec<SearchHit>>;
}

/// Computes the query embedding. External collaborator with unbounded
/// latency; the orchestrator bounds each call with its own timeout and
/// never retries internally.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Optional second-pass scorer over a small surviving candidate set.
pub trait RerankStage: Send + Sync {
    fn score(&self, query_text: &str, candidate_text: &str) -> Result<f32>;
}
