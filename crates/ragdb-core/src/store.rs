//! Authoritative chunk-id -> chunk mapping for one index generation.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::types::{ChunkId, DocumentChunk};

/// Built once per ingestion cycle, read-only afterwards, swapped
/// wholesale on re-ingestion. Iteration order is chunk id ascending,
/// which the sparse index relies on for stable ordinals.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkId, DocumentChunk>,
}

impl ChunkStore {
    /// Rejects empty and duplicate ids so a malformed chunk set aborts
    /// the generation build before anything is swapped in.
    pub fn build(chunks: Vec<DocumentChunk>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for chunk in chunks {
            if chunk.id.is_empty() {
                return Err(Error::InvalidConfig("chunk with empty id".to_string()));
            }
            let id = chunk.id.clone();
            if map.insert(id.clone(), chunk).is_some() {
                return Err(Error::Operation(format!("duplicate chunk id: {id}")));
            }
        }
        Ok(Self { chunks: map })
    }

    pub fn get(&self, id: &str) -> Result<&DocumentChunk> {
        self.chunks
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("chunk {id}")))
    }

    pub fn all_ids(&self) -> BTreeSet<ChunkId> {
        self.chunks.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
