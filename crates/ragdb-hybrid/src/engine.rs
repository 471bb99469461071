use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use ragdb_core::config::RetrievalConfig;
use ragdb_core::error::{Error, Result};
use ragdb_core::store::ChunkStore;
use ragdb_core::traits::{DenseSearcher, EmbeddingProvider, RerankStage, SparseSearcher};
use ragdb_core::types::{
    ChunkId, DocumentChunk, QueryFilters, RetrievalResult, ScoredCandidate,
};
use ragdb_dense::CosineIndex;
use ragdb_sparse::{tokenize, Bm25Index, Bm25Params};

use crate::diagnostics::DiagnosticsRecorder;
use crate::expand::QueryExpander;
use crate::fuse::{EnsembleMerger, FusedCandidate};

/// One fully-built, immutable index generation. Shared read-only by all
/// in-flight queries; replaced wholesale by `reload`.
struct Generation {
    store: ChunkStore,
    dense: CosineIndex,
    sparse: Bm25Index,
}

/// The hybrid retrieval engine: the sole public entry point for query
/// serving, plus the administrative generation swap.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    expander: QueryExpander,
    merger: EnsembleMerger,
    provider: Arc<dyn EmbeddingProvider>,
    reranker: Option<Arc<dyn RerankStage>>,
    generation: RwLock<Option<Arc<Generation>>>,
}

impl RetrievalEngine {
    /// Configuration problems surface here, never on the query path.
    pub fn new(
        config: RetrievalConfig,
        provider: Arc<dyn EmbeddingProvider>,
        reranker: Option<Arc<dyn RerankStage>>,
    ) -> Result<Self> {
        config.validate()?;
        let merger = EnsembleMerger::new(config.dense_weight, config.sparse_weight)?;
        let expander = QueryExpander::new(config.expansion.clone());
        Ok(Self {
            config,
            expander,
            merger,
            provider,
            reranker,
            generation: RwLock::new(None),
        })
    }

    /// Builds the new generation fully off to the side, then swaps the
    /// active pointer. Any build failure leaves the previous generation
    /// serving untouched; in-flight queries keep their snapshot either
    /// way.
    pub fn reload(
        &self,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<(ChunkId, Vec<f32>)>,
    ) -> Result<()> {
        let store = ChunkStore::build(chunks)?;

        let ids = store.all_ids();
        if embeddings.len() != ids.len() {
            return Err(Error::Operation(format!(
                "{} chunks but {} embeddings",
                ids.len(),
                embeddings.len()
            )));
        }
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (id, _) in &embeddings {
            if !ids.contains(id) {
                return Err(Error::Operation(format!(
                    "embedding for unknown chunk id: {id}"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::Operation(format!(
                    "duplicate embedding for chunk id: {id}"
                )));
            }
        }

        let dense = CosineIndex::build(embeddings)?;
        if !dense.is_empty() && dense.dim() != self.provider.dim() {
            return Err(Error::Operation(format!(
                "embedding dimension {} does not match provider dimension {}",
                dense.dim(),
                self.provider.dim()
            )));
        }
        let sparse = Bm25Index::build(
            &store,
            Bm25Params { k1: self.config.bm25_k1, b: self.config.bm25_b },
        )?;

        info!(chunks = store.len(), dim = dense.dim(), "activating new index generation");
        let generation = Arc::new(Generation { store, dense, sparse });
        *self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(generation);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Looks up a chunk in the active generation, for callers that need
    /// the passage text behind a returned candidate.
    pub fn chunk(&self, id: &str) -> Result<DocumentChunk> {
        let generation = self.snapshot()?;
        generation.store.get(id).cloned()
    }

    fn snapshot(&self) -> Result<Arc<Generation>> {
        self.generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Error::IndexNotReady("no index generation loaded".to_string()))
    }

    /// Runs the full pipeline: expand, embed (bounded by the configured
    /// timeout), parallel dense/sparse lookup with over-fetch, fuse,
    /// filter, threshold, truncate, optional rerank, optional
    /// diagnostics. Fewer than `top_k` survivors is a valid result.
    pub async fn retrieve(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &QueryFilters,
        debug: bool,
    ) -> Result<RetrievalResult> {
        let query = query_text.trim();
        if query.is_empty() {
            return Err(Error::InvalidQuery("query text is empty".to_string()));
        }

        // Snapshot before any await so a concurrent reload cannot split
        // this call across generations.
        let generation = self.snapshot()?;

        let searched = if self.config.expansion_enabled {
            self.expander.expand(query)
        } else {
            query.to_string()
        };
        let expanded = searched != query;

        let timeout = Duration::from_millis(self.config.embed_timeout_ms);
        let query_vec = match tokio::time::timeout(timeout, self.provider.embed(&searched)).await
        {
            Ok(embedded) => embedded?,
            Err(_) => return Err(Error::ProviderTimeout(self.config.embed_timeout_ms)),
        };

        let pool = top_k.saturating_mul(self.config.overfetch_factor);
        let terms = tokenize(&searched);

        let dense_generation = Arc::clone(&generation);
        let sparse_generation = Arc::clone(&generation);
        let dense_task =
            tokio::task::spawn_blocking(move || dense_generation.dense.search(&query_vec, pool));
        let sparse_task =
            tokio::task::spawn_blocking(move || sparse_generation.sparse.search(&terms, pool));
        let (dense_hits, sparse_hits) = tokio::try_join!(dense_task, sparse_task)
            .map_err(|e| Error::Operation(format!("index lookup task failed: {e}")))?;
        let (dense_hits, sparse_hits) = (dense_hits?, sparse_hits?);

        let fused = self.merger.fuse(&dense_hits, &sparse_hits);
        let fused_count = fused.len();

        let filtered: Vec<FusedCandidate> = match filters.kind {
            None => fused,
            Some(kind) => fused
                .into_iter()
                .filter(|candidate| {
                    generation
                        .store
                        .get(&candidate.id)
                        .map(|chunk| chunk.kind == Some(kind))
                        .unwrap_or(false)
                })
                .collect(),
        };
        let after_filters = filtered.len();

        let mut kept: Vec<FusedCandidate> = filtered
            .into_iter()
            .filter(|candidate| candidate.fused >= self.config.similarity_threshold)
            .collect();
        let after_threshold = kept.len();
        kept.truncate(top_k);

        let mut ranked: Vec<(FusedCandidate, Option<f32>)> =
            kept.into_iter().map(|candidate| (candidate, None)).collect();
        if self.config.rerank_enabled {
            if let Some(reranker) = self.reranker.as_deref() {
                // Rerank sees the surviving candidates' text against the
                // original, unexpanded query.
                for (candidate, slot) in &mut ranked {
                    let chunk = generation.store.get(&candidate.id)?;
                    *slot = Some(reranker.score(query, &chunk.content)?);
                }
                ranked.sort_by(|a, b| {
                    let (sa, sb) = (a.1.unwrap_or(0.0), b.1.unwrap_or(0.0));
                    sb.partial_cmp(&sa)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.0.id.cmp(&b.0.id))
                });
            } else {
                warn!("rerank enabled in config but no rerank stage is plugged in");
            }
        }

        let candidates: Vec<ScoredCandidate> = ranked
            .iter()
            .enumerate()
            .map(|(i, (candidate, _))| ScoredCandidate {
                id: candidate.id.clone(),
                dense_score: candidate.dense,
                sparse_score: candidate.sparse,
                fused_score: candidate.fused,
                rank: i + 1,
            })
            .collect();

        let diagnostics = debug.then(|| {
            DiagnosticsRecorder::new(&searched)
                .counts(
                    dense_hits.len(),
                    sparse_hits.len(),
                    fused_count,
                    after_filters,
                    after_threshold,
                )
                .breakdown(&ranked)
                .finish()
        });

        debug!(
            query,
            expanded,
            returned = candidates.len(),
            "retrieve complete"
        );
        Ok(RetrievalResult {
            query: query.to_string(),
            searched_query: searched,
            expanded,
            candidates,
            diagnostics,
        })
    }
}
