use std::collections::{BTreeMap, HashMap};

use tracing::debug;

/// At most this many terms are appended to one query.
const MAX_APPENDED_TERMS: usize = 3;

/// Immutable phrase -> related-terms table, built once at engine
/// construction. Expansion is applied at most once per query by the
/// orchestrator.
pub struct QueryExpander {
    table: BTreeMap<String, Vec<String>>,
}

impl QueryExpander {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        // Lowercase phrases up front; BTreeMap fixes the match order so
        // expansion is deterministic regardless of table construction.
        let table = table
            .into_iter()
            .map(|(phrase, terms)| (phrase.to_lowercase(), terms))
            .collect();
        Self { table }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Appends related terms for each phrase found in the query, or
    /// returns the input unchanged when nothing matches.
    ///
    /// A phrase whose vocabulary already appears in the query
    /// contributes nothing, which makes the transform idempotent: the
    /// second application sees its own additions and backs off.
    pub fn expand(&self, query: &str) -> String {
        let query_lower = query.to_lowercase();
        let mut additions: Vec<&str> = Vec::new();
        for (phrase, terms) in &self.table {
            if additions.len() >= MAX_APPENDED_TERMS {
                break;
            }
            if !query_lower.contains(phrase.as_str()) {
                continue;
            }
            let already_present = terms
                .iter()
                .any(|term| query_lower.contains(term.to_lowercase().as_str()));
            if already_present {
                continue;
            }
            for term in terms {
                if additions.len() >= MAX_APPENDED_TERMS {
                    break;
                }
                if additions.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                    continue;
                }
                additions.push(term);
            }
        }
        if additions.is_empty() {
            return query.to_string();
        }
        debug!(query, added = additions.len(), "expanded query");
        format!("{} {}", query, additions.join(" "))
    }
}
