use crate::model::NodePath;
use crate::search::{FacetSelection, SearchIndex};

/// Cursor over the matches of the current query. Holds the active query
/// text, the facet selection, the ordered match list, and the current
/// position. The embedder re-queries on every keystroke and cycles with
/// its next/previous shortcuts (F3/F2 in the reference key map).
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: String,
    facets: FacetSelection,
    matches: Vec<NodePath>,
    current: usize,
}

impl SearchSession {
    /// A session with no query and every facet enabled.
    pub fn new() -> SearchSession {
        SearchSession::default()
    }

    pub fn with_facets(facets: FacetSelection) -> SearchSession {
        SearchSession {
            facets,
            ..SearchSession::default()
        }
    }

    /// Replaces the query and recomputes the match list from scratch.
    /// Substring matching means a changed query can add or drop
    /// non-adjacent matches, so there is nothing sound to diff
    /// incrementally; a full re-query keeps the ordering canonical.
    /// The cursor resets to the first match.
    pub fn set_query(&mut self, index: &SearchIndex, text: &str) {
        self.query = text.to_string();
        self.requery(index);
    }

    /// Re-runs the current query under a new facet selection.
    pub fn set_facets(&mut self, index: &SearchIndex, facets: FacetSelection) {
        self.facets = facets;
        self.requery(index);
    }

    fn requery(&mut self, index: &SearchIndex) {
        self.matches = index.query(&self.query, self.facets);
        self.current = 0;
    }

    /// Advances to the next match, wrapping from the last back to the
    /// first. No-op without matches.
    pub fn next(&mut self) {
        if !self.matches.is_empty() {
            self.current = (self.current + 1) % self.matches.len();
        }
    }

    /// Steps back to the previous match, wrapping from the first to the
    /// last. No-op without matches.
    pub fn previous(&mut self) {
        if !self.matches.is_empty() {
            self.current = (self.current + self.matches.len() - 1) % self.matches.len();
        }
    }

    /// The match to highlight, or `None` while the query has no hits.
    pub fn current(&self) -> Option<&NodePath> {
        self.matches.get(self.current)
    }

    /// Zero-based cursor position, for `Result i/N` style status lines.
    pub fn current_position(&self) -> Option<usize> {
        if self.matches.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn facets(&self) -> FacetSelection {
        self.facets
    }

    pub fn matches(&self) -> &[NodePath] {
        &self.matches
    }
}
