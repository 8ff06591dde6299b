use std::cell::OnceCell;
use std::fmt;

use dicom::core::dictionary::DataDictionary;
use dicom::core::value::{PixelFragmentSequence, PrimitiveValue};
use dicom::core::{Tag, VR};
use dicom::dictionary_std::StandardDataDictionary;

use crate::utils::{node_value_to_string, spaced_keyword};

/// One data element of an open file, or a sequence container holding
/// nested items. Nodes are immutable in shape; only the edit engine
/// replaces values, and only on a tree copy.
#[derive(Debug, Clone)]
pub struct ElementNode {
    tag: Tag,
    name: String,
    description: String,
    vr: VR,
    value: NodeValue,
    display: OnceCell<String>,
}

/// Decoded payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Leaf value as decoded by the codec.
    Primitive(PrimitiveValue),
    /// Sequence items, each an ordered list of child nodes.
    Sequence(Vec<Vec<ElementNode>>),
    /// Encapsulated pixel data, carried opaquely so saving round-trips it.
    Fragments(PixelFragmentSequence<Vec<u8>>),
}

impl ElementNode {
    pub(crate) fn new(tag: Tag, vr: VR, value: NodeValue) -> Self {
        let (name, description) = match StandardDataDictionary.by_tag(tag) {
            Some(entry) => (entry.alias.to_string(), spaced_keyword(entry.alias)),
            None => ("Unknown".to_string(), "Unknown".to_string()),
        };
        ElementNode {
            tag,
            name,
            description,
            vr,
            value,
            display: OnceCell::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Dictionary keyword, e.g. `PatientName`; `Unknown` for private or
    /// unregistered tags.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable form of the keyword, e.g. `Patient Name`.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn vr(&self) -> VR {
        self.vr
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.value, NodeValue::Sequence(_))
    }

    /// Number of items under a sequence container, 0 for leaves.
    pub fn item_count(&self) -> usize {
        match &self.value {
            NodeValue::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    /// Formatted value for display and search. Computed on first use and
    /// cached; never fed back into encoding.
    pub fn display_value(&self) -> &str {
        self.display
            .get_or_init(|| node_value_to_string(&self.value, self.vr))
    }

    pub(crate) fn value_mut(&mut self) -> &mut NodeValue {
        &mut self.value
    }

    pub(crate) fn set_value(&mut self, value: PrimitiveValue) {
        self.value = NodeValue::Primitive(value);
        self.display = OnceCell::new();
    }
}

impl PartialEq for ElementNode {
    fn eq(&self, other: &Self) -> bool {
        // the display cache is derived state
        self.tag == other.tag
            && self.vr == other.vr
            && self.name == other.name
            && self.description == other.description
            && self.value == other.value
    }
}

/// One descent through a sequence container: the container's element
/// index within its dataset, then the item index under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceHop {
    pub element: usize,
    pub item: usize,
}

/// Positional identity of a node within one tree generation: the hops
/// down through nested sequences, then the element index in the final
/// dataset. Stable until the tree is replaced; stale paths are rejected,
/// never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    hops: Vec<SequenceHop>,
    element: usize,
}

impl NodePath {
    pub(crate) fn root(element: usize) -> Self {
        NodePath {
            hops: Vec::new(),
            element,
        }
    }

    /// Path of a child element inside item `item` of the sequence this
    /// path points at.
    pub(crate) fn child(&self, item: usize, element: usize) -> Self {
        let mut hops = Vec::with_capacity(self.hops.len() + 1);
        hops.extend_from_slice(&self.hops);
        hops.push(SequenceHop {
            element: self.element,
            item,
        });
        NodePath { hops, element }
    }

    pub fn hops(&self) -> &[SequenceHop] {
        &self.hops
    }

    pub fn element(&self) -> usize {
        self.element
    }

    /// Nesting depth: 0 for top-level elements.
    pub fn depth(&self) -> usize {
        self.hops.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hop in &self.hops {
            write!(f, "{}[{}]/", hop.element, hop.item)?;
        }
        write!(f, "{}", self.element)
    }
}
