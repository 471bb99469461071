use ragdb_core::error::Result;
use ragdb_core::traits::RerankStage;
use ragdb_sparse::tokenize;

const COVERAGE_WEIGHT: f32 = 0.5;
const POSITION_WEIGHT: f32 = 0.25;
const LENGTH_WEIGHT: f32 = 0.25;

/// Cheap lexical rerank stage: query-term coverage, how early the first
/// query term appears, and closeness to a moderate passage length.
/// Useful as a default when no model-backed stage is plugged in.
pub struct HeuristicReranker {
    ideal_len: usize,
}

impl HeuristicReranker {
    pub fn new(ideal_len: usize) -> Self {
        Self { ideal_len: ideal_len.max(1) }
    }
}

impl Default for HeuristicReranker {
    fn default() -> Self {
        Self::new(800)
    }
}

impl RerankStage for HeuristicReranker {
    fn score(&self, query_text: &str, candidate_text: &str) -> Result<f32> {
        let content = candidate_text.to_lowercase();
        let terms = tokenize(query_text);
        if terms.is_empty() || content.is_empty() {
            return Ok(0.0);
        }

        let matched = terms
            .iter()
            .filter(|term| content.contains(term.as_str()))
            .count();
        let coverage = matched as f32 / terms.len() as f32;

        let position = terms
            .iter()
            .filter_map(|term| content.find(term.as_str()))
            .min()
            .map_or(0.0, |first| 1.0 - first as f32 / content.len() as f32);

        let ideal = self.ideal_len as f32;
        let length = 1.0 - ((candidate_text.len() as f32 - ideal).abs() / ideal).min(1.0);

        Ok(COVERAGE_WEIGHT * coverage + POSITION_WEIGHT * position + LENGTH_WEIGHT * length)
    }
}
