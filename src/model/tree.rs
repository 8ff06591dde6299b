use dicom::core::header::Header;
use dicom::core::value::{DataSetSequence, Value};
use dicom::core::{DataElement, VR};
use dicom::dictionary_std::tags;
use dicom::object::mem::InMemElement;
use dicom::object::InMemDicomObject;

use crate::error::{CommitFailure, Error, Result};
use crate::model::{ElementNode, NodePath, NodeValue};
use crate::utils::value_conforms;

/// The element hierarchy of one open file. Built once per decode and
/// replaced wholesale when the file changes; never partially reused.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTree {
    roots: Vec<ElementNode>,
    node_count: usize,
}

impl ElementTree {
    /// Structures a decoded dataset into the node hierarchy, resolving
    /// every tag against the standard dictionary.
    pub fn build(dataset: &InMemDicomObject) -> Result<ElementTree> {
        let roots = build_nodes(dataset)?;
        let node_count = count_nodes(&roots);
        log::debug!("built element tree with {node_count} elements");
        Ok(ElementTree { roots, node_count })
    }

    /// Top-level elements in dataset order.
    pub fn roots(&self) -> &[ElementNode] {
        &self.roots
    }

    /// Total number of elements at all depths.
    pub fn len(&self) -> usize {
        self.node_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Depth-first pre-order walk: parent before children, items and
    /// siblings in declared order. This is the canonical ordering for
    /// display and search alike. The iterator is lazy and restartable.
    pub fn traverse(&self) -> Traverse<'_> {
        let stack = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(index, node)| (node, NodePath::root(index)))
            .collect();
        Traverse { stack }
    }

    pub fn node_at(&self, path: &NodePath) -> Result<&ElementNode> {
        let mut siblings = self.roots.as_slice();
        for hop in path.hops() {
            let container = siblings
                .get(hop.element)
                .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
            match container.value() {
                NodeValue::Sequence(items) => {
                    siblings = items
                        .get(hop.item)
                        .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                }
                _ => return Err(Error::PathNotFound { path: path.clone() }),
            }
        }
        siblings
            .get(path.element())
            .ok_or_else(|| Error::PathNotFound { path: path.clone() })
    }

    pub(crate) fn node_at_mut(&mut self, path: &NodePath) -> Result<&mut ElementNode> {
        let mut siblings = self.roots.as_mut_slice();
        for hop in path.hops() {
            let container = siblings
                .get_mut(hop.element)
                .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
            match container.value_mut() {
                NodeValue::Sequence(items) => {
                    siblings = items
                        .get_mut(hop.item)
                        .ok_or_else(|| Error::PathNotFound { path: path.clone() })?;
                }
                _ => return Err(Error::PathNotFound { path: path.clone() }),
            }
        }
        siblings
            .get_mut(path.element())
            .ok_or_else(|| Error::PathNotFound { path: path.clone() })
    }

    /// Rebuilds a dataset for the codec. Display strings are never part
    /// of this; only decoded values flow back out.
    pub fn to_dataset(&self) -> InMemDicomObject {
        nodes_to_dataset(&self.roots)
    }

    /// Tree-wide VR/value consistency check, run before adopting a
    /// committed tree.
    pub(crate) fn validate(&self) -> Vec<CommitFailure> {
        let mut failures = Vec::new();
        validate_nodes(&self.roots, &mut failures);
        failures
    }
}

/// Lazy pre-order iterator over `(node, path)` pairs.
pub struct Traverse<'a> {
    stack: Vec<(&'a ElementNode, NodePath)>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (&'a ElementNode, NodePath);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, path) = self.stack.pop()?;
        if let NodeValue::Sequence(items) = node.value() {
            for (item_index, item) in items.iter().enumerate().rev() {
                for (element_index, child) in item.iter().enumerate().rev() {
                    self.stack.push((child, path.child(item_index, element_index)));
                }
            }
        }
        Some((node, path))
    }
}

fn build_nodes(dataset: &InMemDicomObject) -> Result<Vec<ElementNode>> {
    let mut nodes = Vec::new();
    for element in dataset.iter() {
        let tag = element.tag();
        let vr = element.vr();
        let value = match element.value() {
            Value::Primitive(primitive) => {
                if vr == VR::SQ {
                    return Err(Error::MalformedStructure {
                        tag,
                        detail: "sequence element decoded without sequence items".to_string(),
                    });
                }
                NodeValue::Primitive(primitive.clone())
            }
            Value::Sequence(sequence) => {
                if vr != VR::SQ {
                    return Err(Error::MalformedStructure {
                        tag,
                        detail: format!("sequence items under a {} element", vr.to_string()),
                    });
                }
                let items = sequence
                    .items()
                    .iter()
                    .map(build_nodes)
                    .collect::<Result<Vec<_>>>()?;
                NodeValue::Sequence(items)
            }
            Value::PixelSequence(sequence) => {
                if tag != tags::PIXEL_DATA {
                    return Err(Error::MalformedStructure {
                        tag,
                        detail: "encapsulated fragments outside the pixel data element"
                            .to_string(),
                    });
                }
                NodeValue::Fragments(sequence.clone())
            }
        };
        nodes.push(ElementNode::new(tag, vr, value));
    }
    Ok(nodes)
}

fn count_nodes(nodes: &[ElementNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node.value() {
            NodeValue::Sequence(items) => {
                1 + items.iter().map(|item| count_nodes(item)).sum::<usize>()
            }
            _ => 1,
        })
        .sum()
}

fn nodes_to_dataset(nodes: &[ElementNode]) -> InMemDicomObject {
    InMemDicomObject::from_element_iter(nodes.iter().map(node_to_element))
}

fn node_to_element(node: &ElementNode) -> InMemElement {
    let value: Value<InMemDicomObject, Vec<u8>> = match node.value() {
        NodeValue::Primitive(primitive) => Value::Primitive(primitive.clone()),
        NodeValue::Sequence(items) => Value::Sequence(DataSetSequence::from(
            items
                .iter()
                .map(|item| nodes_to_dataset(item))
                .collect::<Vec<_>>(),
        )),
        NodeValue::Fragments(sequence) => Value::PixelSequence(sequence.clone()),
    };
    DataElement::new(node.tag(), node.vr(), value)
}

fn validate_nodes(nodes: &[ElementNode], failures: &mut Vec<CommitFailure>) {
    for node in nodes {
        match node.value() {
            NodeValue::Primitive(primitive) => {
                if node.vr() == VR::SQ {
                    failures.push(CommitFailure {
                        tag: node.tag(),
                        vr: node.vr(),
                        detail: "sequence element holds a primitive value".to_string(),
                    });
                } else if let Err(detail) = value_conforms(node.vr(), primitive) {
                    failures.push(CommitFailure {
                        tag: node.tag(),
                        vr: node.vr(),
                        detail,
                    });
                }
            }
            NodeValue::Sequence(items) => {
                if node.vr() != VR::SQ {
                    failures.push(CommitFailure {
                        tag: node.tag(),
                        vr: node.vr(),
                        detail: "sequence items under a non-sequence element".to_string(),
                    });
                }
                for item in items {
                    validate_nodes(item, failures);
                }
            }
            NodeValue::Fragments(_) => {
                if node.tag() != tags::PIXEL_DATA {
                    failures.push(CommitFailure {
                        tag: node.tag(),
                        vr: node.vr(),
                        detail: "encapsulated fragments outside the pixel data element"
                            .to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::value::PrimitiveValue;
    use dicom::core::Tag;

    fn sample_dataset() -> InMemDicomObject {
        InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from("1.2.3"),
            ),
            DataElement::new(
                tags::REFERENCED_IMAGE_SEQUENCE,
                VR::SQ,
                Value::Sequence(DataSetSequence::from(vec![InMemDicomObject::from_element_iter([
                    DataElement::new(
                        tags::REFERENCED_SOP_INSTANCE_UID,
                        VR::UI,
                        PrimitiveValue::from("1.2.4"),
                    ),
                ])])),
            ),
            DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^John")),
        ])
    }

    #[test]
    fn build_counts_nested_elements() {
        let tree = ElementTree::build(&sample_dataset()).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots().len(), 3);
    }

    #[test]
    fn traversal_is_preorder_with_parent_first() {
        let tree = ElementTree::build(&sample_dataset()).unwrap();
        let visited: Vec<(Tag, String)> = tree
            .traverse()
            .map(|(node, path)| (node.tag(), path.to_string()))
            .collect();
        // the dataset keeps elements in tag order
        assert_eq!(
            visited,
            vec![
                (tags::SOP_INSTANCE_UID, "0".to_string()),
                (tags::REFERENCED_IMAGE_SEQUENCE, "1".to_string()),
                (tags::REFERENCED_SOP_INSTANCE_UID, "1[0]/0".to_string()),
                (tags::PATIENT_NAME, "2".to_string()),
            ]
        );
    }

    #[test]
    fn traversal_is_stable_and_restartable() {
        let tree = ElementTree::build(&sample_dataset()).unwrap();
        let first: Vec<NodePath> = tree.traverse().map(|(_, path)| path).collect();
        let second: Vec<NodePath> = tree.traverse().map(|(_, path)| path).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn every_traversed_path_resolves_to_its_node() {
        let tree = ElementTree::build(&sample_dataset()).unwrap();
        for (node, path) in tree.traverse() {
            let resolved = tree.node_at(&path).unwrap();
            assert_eq!(resolved.tag(), node.tag());
        }
    }

    #[test]
    fn stale_paths_are_rejected() {
        let tree = ElementTree::build(&sample_dataset()).unwrap();
        let missing = NodePath::root(99);
        assert!(matches!(
            tree.node_at(&missing),
            Err(Error::PathNotFound { .. })
        ));
        // descending through a non-sequence element
        let bogus = NodePath::root(0).child(0, 0);
        assert!(matches!(
            tree.node_at(&bogus),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn dataset_reconstruction_round_trips() {
        let dataset = sample_dataset();
        let tree = ElementTree::build(&dataset).unwrap();
        assert_eq!(tree.to_dataset(), dataset);
    }

    #[test]
    fn sequence_vr_without_items_is_malformed() {
        let dataset = InMemDicomObject::from_element_iter([DataElement::new(
            tags::REFERENCED_IMAGE_SEQUENCE,
            VR::SQ,
            PrimitiveValue::from("not items"),
        )]);
        assert!(matches!(
            ElementTree::build(&dataset),
            Err(Error::MalformedStructure { .. })
        ));
    }

    #[test]
    fn items_under_non_sequence_vr_are_malformed() {
        let dataset = InMemDicomObject::from_element_iter([DataElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            Value::<InMemDicomObject, Vec<u8>>::Sequence(DataSetSequence::from(vec![
                InMemDicomObject::new_empty(),
            ])),
        )]);
        assert!(matches!(
            ElementTree::build(&dataset),
            Err(Error::MalformedStructure { .. })
        ));
    }
}
