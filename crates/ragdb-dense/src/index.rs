use std::cmp::Ordering;

use tracing::debug;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::DenseSearcher;
use ragdb_core::types::{ChunkId, SearchHit, SourceKind};

/// Exact nearest-neighbor lookup over chunk embeddings.
///
/// Vectors are L2-normalized once at build time, so cosine similarity
/// reduces to a dot product at query time. Entries are kept in chunk-id
/// order; equal similarities resolve to the lower id.
#[derive(Debug)]
pub struct CosineIndex {
    ids: Vec<ChunkId>,
    vectors: Vec<Vec<f32>>,
    dim: usize,
}

impl CosineIndex {
    /// Rejects empty, non-finite, and dimension-inconsistent vectors so
    /// a malformed embedding set aborts the generation build.
    pub fn build(mut entries: Vec<(ChunkId, Vec<f32>)>) -> Result<Self> {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let dim = entries.first().map_or(0, |(_, v)| v.len());

        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (id, mut vector) in entries {
            if vector.is_empty() {
                return Err(Error::Operation(format!("empty embedding for chunk {id}")));
            }
            if vector.len() != dim {
                return Err(Error::Operation(format!(
                    "embedding for chunk {id} has dimension {}, expected {dim}",
                    vector.len()
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(Error::Operation(format!(
                    "non-finite embedding value for chunk {id}"
                )));
            }
            normalize(&mut vector);
            ids.push(id);
            vectors.push(vector);
        }
        debug!(vectors = ids.len(), dim, "built cosine index");
        Ok(Self { ids, vectors, dim })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl DenseSearcher for CosineIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query_vec.len() != self.dim {
            return Err(Error::Operation(format!(
                "query vector has dimension {}, index expects {}",
                query_vec.len(),
                self.dim
            )));
        }

        let mut query = query_vec.to_vec();
        normalize(&mut query);

        let mut hits: Vec<SearchHit> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, vector)| {
                let dot: f32 = vector.iter().zip(&query).map(|(a, b)| a * b).sum();
                SearchHit {
                    id: id.clone(),
                    score: dot.clamp(-1.0, 1.0),
                    source: SourceKind::Dense,
                }
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Scale to unit length. Zero-norm vectors are left as-is and score 0
/// against everything.
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
