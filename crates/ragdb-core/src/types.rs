//! Domain types shared by the dense, sparse, and hybrid engines.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Content classification attached by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Prose explaining a concept.
    Conceptual,
    /// A command-line or configuration example.
    Command,
}

/// A passage of a source document that is the unit of retrieval.
///
/// - `id`: globally unique chunk identifier within one index generation
/// - `doc_name`: name of the source document
/// - `page`: page number in the source, when known
/// - `kind`: optional content classification
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_name: String,
    pub page: Option<u32>,
    pub kind: Option<ChunkKind>,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Indicates which index produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Dense,
    Sparse,
}

/// The minimal surface returned by both index variants.
///
/// `id` matches `DocumentChunk::id`. `score` is index-specific but
/// higher is always better. `source` labels the origin index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// Structured restrictions applied after fusion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    pub kind: Option<ChunkKind>,
}

/// One entry of a ranked retrieval result. Produced fresh per query,
/// never persisted. A missing per-side score means the chunk was not
/// returned by that index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: ChunkId,
    pub dense_score: Option<f32>,
    pub sparse_score: Option<f32>,
    pub fused_score: f32,
    /// 1-based position in the final ordering.
    pub rank: usize,
}

/// Score breakdown for a single candidate, captured only when the
/// caller asks for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBreakdown {
    pub id: ChunkId,
    pub dense_raw: Option<f32>,
    pub sparse_raw: Option<f32>,
    pub dense_norm: f32,
    pub sparse_norm: f32,
    pub fused: f32,
    pub rerank: Option<f32>,
}

/// Side-channel capture of one query's scoring. Attached to the result
/// on request; never feeds back into the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDiagnostics {
    pub searched_query: String,
    pub dense_hits: usize,
    pub sparse_hits: usize,
    pub fused_candidates: usize,
    pub after_filters: usize,
    pub after_threshold: usize,
    pub breakdown: Vec<CandidateBreakdown>,
}

/// Ordered outcome of one `retrieve` call. A short or empty candidate
/// list is a valid value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The raw query as supplied by the caller (trimmed).
    pub query: String,
    /// The query actually sent to both indexes.
    pub searched_query: String,
    /// Whether expansion changed the query.
    pub expanded: bool,
    pub candidates: Vec<ScoredCandidate>,
    pub diagnostics: Option<QueryDiagnostics>,
}
