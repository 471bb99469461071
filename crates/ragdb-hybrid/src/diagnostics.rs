use ragdb_core::types::{CandidateBreakdown, QueryDiagnostics};

use crate::fuse::FusedCandidate;

/// Builds the optional score breakdown attached to a result. Purely
/// observational; the ranking never reads it back.
pub struct DiagnosticsRecorder {
    diagnostics: QueryDiagnostics,
}

impl DiagnosticsRecorder {
    pub fn new(searched_query: &str) -> Self {
        Self {
            diagnostics: QueryDiagnostics {
                searched_query: searched_query.to_string(),
                dense_hits: 0,
                sparse_hits: 0,
                fused_candidates: 0,
                after_filters: 0,
                after_threshold: 0,
                breakdown: Vec::new(),
            },
        }
    }

    pub fn counts(
        mut self,
        dense_hits: usize,
        sparse_hits: usize,
        fused_candidates: usize,
        after_filters: usize,
        after_threshold: usize,
    ) -> Self {
        self.diagnostics.dense_hits = dense_hits;
        self.diagnostics.sparse_hits = sparse_hits;
        self.diagnostics.fused_candidates = fused_candidates;
        self.diagnostics.after_filters = after_filters;
        self.diagnostics.after_threshold = after_threshold;
        self
    }

    pub fn breakdown(mut self, ranked: &[(FusedCandidate, Option<f32>)]) -> Self {
        self.diagnostics.breakdown = ranked
            .iter()
            .map(|(candidate, rerank)| CandidateBreakdown {
                id: candidate.id.clone(),
                dense_raw: candidate.dense,
                sparse_raw: candidate.sparse,
                dense_norm: candidate.dense_norm,
                sparse_norm: candidate.sparse_norm,
                fused: candidate.fused,
                rerank: *rerank,
            })
            .collect();
        self
    }

    pub fn finish(self) -> QueryDiagnostics {
        self.diagnostics
    }
}
