use std::cmp::Ordering;
use std::collections::BTreeMap;

use ragdb_core::error::{Error, Result};
use ragdb_core::types::{ChunkId, SearchHit};

const WEIGHT_TOLERANCE: f32 = 1e-6;

/// Weighted fusion of the two independently-scaled ranked lists.
/// Weights are checked once here; `fuse` itself cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct EnsembleMerger {
    dense_weight: f32,
    sparse_weight: f32,
}

/// A fused candidate carrying both raw and normalized per-side scores,
/// so diagnostics can show the full breakdown without recomputation.
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub id: ChunkId,
    pub dense: Option<f32>,
    pub sparse: Option<f32>,
    pub dense_norm: f32,
    pub sparse_norm: f32,
    pub fused: f32,
}

impl EnsembleMerger {
    pub fn new(dense_weight: f32, sparse_weight: f32) -> Result<Self> {
        if dense_weight < 0.0 || sparse_weight < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must be non-negative, got dense={dense_weight} sparse={sparse_weight}"
            )));
        }
        let sum = dense_weight + sparse_weight;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(Self { dense_weight, sparse_weight })
    }

    /// Fuses the two lists into one deduplicated ranking: normalize each
    /// side to [0, 1], weight, sum (missing side contributes 0), sort
    /// descending with ties broken by chunk id ascending.
    ///
    /// Dedup is id-level only; overlapping windows over the same source
    /// span are an ingestion-time concern.
    pub fn fuse(&self, dense: &[SearchHit], sparse: &[SearchHit]) -> Vec<FusedCandidate> {
        let dense_norms = normalize(dense);
        let sparse_norms = normalize(sparse);

        let mut by_id: BTreeMap<ChunkId, FusedCandidate> = BTreeMap::new();
        for (hit, &norm) in dense.iter().zip(&dense_norms) {
            let entry = by_id.entry(hit.id.clone()).or_insert_with(|| empty(&hit.id));
            // An id repeated within one list keeps its best showing.
            if entry.dense.is_none() || norm > entry.dense_norm {
                entry.dense = Some(hit.score);
                entry.dense_norm = norm;
            }
        }
        for (hit, &norm) in sparse.iter().zip(&sparse_norms) {
            let entry = by_id.entry(hit.id.clone()).or_insert_with(|| empty(&hit.id));
            if entry.sparse.is_none() || norm > entry.sparse_norm {
                entry.sparse = Some(hit.score);
                entry.sparse_norm = norm;
            }
        }

        let mut merged: Vec<FusedCandidate> = by_id.into_values().collect();
        for candidate in &mut merged {
            candidate.fused = self.dense_weight * candidate.dense_norm
                + self.sparse_weight * candidate.sparse_norm;
        }
        merged.sort_by(|a, b| {
            b.fused
                .partial_cmp(&a.fused)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        merged
    }
}

fn empty(id: &str) -> FusedCandidate {
    FusedCandidate {
        id: id.to_string(),
        dense: None,
        sparse: None,
        dense_norm: 0.0,
        sparse_norm: 0.0,
        fused: 0.0,
    }
}

/// Min-max scaling over the candidates present in one list. A single
/// candidate or zero score variance normalizes to 1.0.
fn normalize(hits: &[SearchHit]) -> Vec<f32> {
    if hits.is_empty() {
        return Vec::new();
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for hit in hits {
        min = min.min(hit.score);
        max = max.max(hit.score);
    }
    let range = max - min;
    if range <= f32::EPSILON {
        return vec![1.0; hits.len()];
    }
    hits.iter().map(|h| (h.score - min) / range).collect()
}
