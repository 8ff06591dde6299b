use crate::model::{ElementTree, NodePath};
use crate::utils::format_tag;

/// Which element facets a query is matched against. Mirrors the search
/// toggles of the inspector UI; everything on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetSelection {
    pub tag: bool,
    pub name: bool,
    pub description: bool,
    pub value: bool,
}

impl FacetSelection {
    pub fn all() -> Self {
        FacetSelection {
            tag: true,
            name: true,
            description: true,
            value: true,
        }
    }

    pub fn none() -> Self {
        FacetSelection {
            tag: false,
            name: false,
            description: false,
            value: false,
        }
    }

    /// Convenience for querying a single facet.
    pub fn only_value() -> Self {
        FacetSelection {
            value: true,
            ..FacetSelection::none()
        }
    }

    fn is_none(&self) -> bool {
        !(self.tag || self.name || self.description || self.value)
    }
}

impl Default for FacetSelection {
    fn default() -> Self {
        FacetSelection::all()
    }
}

/// Searchable text of one node, lower-cased once at build time.
#[derive(Debug, Clone)]
struct IndexEntry {
    path: NodePath,
    tag_text: String,
    name_text: String,
    description_text: String,
    value_text: String,
}

/// Derived, rebuildable search structure over one tree generation.
/// Entries keep traversal order, so query results come back in the
/// same order the tree displays. Read-only once built; rebuilt when
/// the tree is replaced, not on keystrokes.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Walks the tree once and captures every facet's text.
    pub fn build(tree: &ElementTree) -> SearchIndex {
        let entries = tree
            .traverse()
            .map(|(node, path)| IndexEntry {
                tag_text: format_tag(node.tag()).to_lowercase(),
                name_text: node.name().to_lowercase(),
                description_text: node.description().to_lowercase(),
                value_text: node.display_value().to_lowercase(),
                path,
            })
            .collect::<Vec<_>>();
        log::debug!("search index built over {} elements", entries.len());
        SearchIndex { entries }
    }

    /// Case-insensitive substring match over the selected facets.
    /// A node matching several facets is reported once. An empty (or
    /// whitespace-only) query matches nothing, as does an empty facet
    /// selection; neither is an error, since queries arrive mid-typing.
    pub fn query(&self, text: &str, facets: FacetSelection) -> Vec<NodePath> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() || facets.is_none() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| {
                (facets.tag && entry.tag_text.contains(&needle))
                    || (facets.name && entry.name_text.contains(&needle))
                    || (facets.description && entry.description_text.contains(&needle))
                    || (facets.value && entry.value_text.contains(&needle))
            })
            .map(|entry| entry.path.clone())
            .collect()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
