use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use ragdb_core::error::{Error, Result};
use ragdb_core::store::ChunkStore;
use ragdb_core::traits::SparseSearcher;
use ragdb_core::types::{ChunkId, SearchHit, SourceKind};

use crate::tokenize::tokenize;

/// Term-frequency saturation (`k1`) and length normalization (`b`).
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

struct Posting {
    doc: u32,
    tf: u32,
}

/// In-memory inverted index with statistics frozen at build time.
///
/// Document ordinals are assigned in chunk-id order so results are
/// reproducible across rebuilds of the same chunk set.
pub struct Bm25Index {
    postings: HashMap<String, Vec<Posting>>,
    doc_ids: Vec<ChunkId>,
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
    params: Bm25Params,
}

impl Bm25Index {
    pub fn build(store: &ChunkStore, params: Bm25Params) -> Result<Self> {
        if params.k1 < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "bm25 k1 must be non-negative, got {}",
                params.k1
            )));
        }
        if !(0.0..=1.0).contains(&params.b) {
            return Err(Error::InvalidConfig(format!(
                "bm25 b must be in [0, 1], got {}",
                params.b
            )));
        }

        let mut doc_ids = Vec::with_capacity(store.len());
        let mut doc_lens = Vec::with_capacity(store.len());
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for chunk in store.iter() {
            let doc = u32::try_from(doc_ids.len())
                .map_err(|_| Error::Operation("chunk count exceeds u32 ordinals".to_string()))?;
            let tokens = tokenize(&chunk.content);
            doc_ids.push(chunk.id.clone());
            doc_lens.push(tokens.len() as u32);

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            for (term, freq) in tf {
                postings.entry(term).or_default().push(Posting { doc, tf: freq });
            }
        }

        let total: u64 = doc_lens.iter().map(|&l| u64::from(l)).sum();
        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            total as f32 / doc_lens.len() as f32
        };
        debug!(docs = doc_ids.len(), terms = postings.len(), "built bm25 index");

        Ok(Self { postings, doc_ids, doc_lens, avg_doc_len, params })
    }

    pub fn doc_count(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    /// Lucene-style IDF: strictly positive even for terms present in
    /// every document, which keeps all scores >= 0.
    fn idf(&self, df: usize) -> f32 {
        let n = self.doc_ids.len() as f32;
        ((n - df as f32 + 0.5) / (df as f32 + 0.5) + 1.0).ln()
    }
}

impl SparseSearcher for Bm25Index {
    fn search(&self, terms: &[String], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || terms.is_empty() || self.doc_ids.is_empty() {
            return Ok(Vec::new());
        }
        let avgdl = if self.avg_doc_len > 0.0 { self.avg_doc_len } else { 1.0 };

        let mut scores = vec![0.0f32; self.doc_ids.len()];
        let mut touched = vec![false; self.doc_ids.len()];
        for term in terms {
            let Some(postings) = self.postings.get(term.as_str()) else {
                continue;
            };
            let idf = self.idf(postings.len());
            for posting in postings {
                let doc = posting.doc as usize;
                let tf = posting.tf as f32;
                let doc_len = self.doc_lens[doc] as f32;
                let denom =
                    tf + self.params.k1 * (1.0 - self.params.b + self.params.b * doc_len / avgdl);
                scores[doc] += idf * (tf * (self.params.k1 + 1.0)) / denom;
                touched[doc] = true;
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .iter()
            .enumerate()
            .filter(|(doc, _)| touched[*doc])
            .map(|(doc, &score)| SearchHit {
                id: self.doc_ids[doc].clone(),
                score,
                source: SourceKind::Sparse,
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
