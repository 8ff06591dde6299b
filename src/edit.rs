//! Staged value edits and the atomic commit onto a tree copy.

use std::collections::BTreeMap;

use dicom::core::value::PrimitiveValue;

use crate::error::{Error, Result};
use crate::model::{ElementTree, NodePath};
use crate::utils::parse_value;

/// Pending value changes keyed by node path. Edits are staged here and
/// only touch the live tree at commit time, so discarding them is
/// always possible and a failed commit leaves nothing half-applied.
#[derive(Debug, Clone, Default)]
pub struct EditLedger {
    staged: BTreeMap<NodePath, PrimitiveValue>,
}

impl EditLedger {
    pub fn new() -> EditLedger {
        EditLedger::default()
    }

    /// Validates `text` against the target node's VR and records the
    /// parsed value, overwriting any earlier edit of the same path.
    /// Fails with `PathNotFound` for stale handles and `InvalidValue`
    /// when the text does not conform; the ledger is unchanged on
    /// either failure.
    pub fn stage(&mut self, tree: &ElementTree, path: &NodePath, text: &str) -> Result<()> {
        let node = tree.node_at(path)?;
        let value = parse_value(text, node.vr()).map_err(|detail| Error::InvalidValue {
            tag: node.tag(),
            vr: node.vr(),
            detail,
        })?;
        self.staged.insert(path.clone(), value);
        Ok(())
    }

    /// Drops one staged edit. Returns whether anything was staged there.
    pub fn discard(&mut self, path: &NodePath) -> bool {
        self.staged.remove(path).is_some()
    }

    /// Drops every staged edit.
    pub fn discard_all(&mut self) {
        self.staged.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Paths with pending edits, in deterministic order.
    pub fn staged_paths(&self) -> impl Iterator<Item = &NodePath> {
        self.staged.keys()
    }

    /// Applies every staged value onto a copy of `tree`, re-validates
    /// the copy tree-wide, and returns it. All-or-nothing: on any
    /// failure the original tree and this ledger are untouched. The
    /// caller clears the ledger once it adopts the returned tree.
    pub fn commit(&self, tree: &ElementTree) -> Result<ElementTree> {
        let mut updated = tree.clone();
        for (path, value) in &self.staged {
            updated.node_at_mut(path)?.set_value(value.clone());
        }
        let failures = updated.validate();
        if failures.is_empty() {
            Ok(updated)
        } else {
            log::warn!(
                "commit rejected: {} element(s) failed validation",
                failures.len()
            );
            Err(Error::CommitValidation { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{FacetSelection, SearchIndex};
    use dicom::core::value::PrimitiveValue;
    use dicom::core::{DataElement, VR};
    use dicom::dictionary_std::tags;
    use dicom::object::InMemDicomObject;

    fn tree() -> ElementTree {
        let dataset = InMemDicomObject::from_element_iter([
            DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^John")),
            DataElement::new(tags::SERIES_NUMBER, VR::IS, PrimitiveValue::from("3")),
        ]);
        ElementTree::build(&dataset).unwrap()
    }

    fn path_of(tree: &ElementTree, tag: dicom::core::Tag) -> NodePath {
        tree.traverse()
            .find(|(node, _)| node.tag() == tag)
            .map(|(_, path)| path)
            .unwrap()
    }

    #[test]
    fn staged_edit_does_not_touch_the_tree() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "Smith^Jane").unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(tree.node_at(&path).unwrap().display_value(), "Doe^John");
    }

    #[test]
    fn commit_applies_and_preserves_vr() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "Smith^Jane").unwrap();

        let updated = ledger.commit(&tree).unwrap();
        let node = updated.node_at(&path).unwrap();
        assert_eq!(node.display_value(), "Smith^Jane");
        assert_eq!(node.vr(), VR::PN);
        // the original tree is untouched
        assert_eq!(tree.node_at(&path).unwrap().display_value(), "Doe^John");
    }

    #[test]
    fn committed_value_is_searchable() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "Smith^Jane").unwrap();
        let updated = ledger.commit(&tree).unwrap();

        let index = SearchIndex::build(&updated);
        let matches = index.query("Smith", FacetSelection::only_value());
        assert_eq!(matches, vec![path]);
    }

    #[test]
    fn invalid_integer_is_rejected_and_ledger_unchanged() {
        let tree = tree();
        let path = path_of(&tree, tags::SERIES_NUMBER);
        let mut ledger = EditLedger::new();
        let err = ledger.stage(&tree, &path, "not-a-number").unwrap_err();
        match err {
            Error::InvalidValue { tag, vr, .. } => {
                assert_eq!(tag, tags::SERIES_NUMBER);
                assert_eq!(vr, VR::IS);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ledger.is_empty());
        // committing the empty ledger is a no-op
        assert_eq!(ledger.commit(&tree).unwrap(), tree);
    }

    #[test]
    fn restaging_a_path_overwrites_the_pending_value() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "First^Try").unwrap();
        ledger.stage(&tree, &path, "Second^Try").unwrap();
        assert_eq!(ledger.len(), 1);
        let updated = ledger.commit(&tree).unwrap();
        assert_eq!(updated.node_at(&path).unwrap().display_value(), "Second^Try");
    }

    #[test]
    fn discard_all_then_commit_is_identity() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "Smith^Jane").unwrap();
        ledger.discard_all();
        assert!(ledger.is_empty());
        let updated = ledger.commit(&tree).unwrap();
        assert_eq!(updated, tree);
    }

    #[test]
    fn discard_reports_whether_an_edit_existed() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        assert!(!ledger.discard(&path));
        ledger.stage(&tree, &path, "Smith^Jane").unwrap();
        assert!(ledger.discard(&path));
        assert!(ledger.is_empty());
    }

    #[test]
    fn stale_path_is_rejected_at_stage_time() {
        let tree = tree();
        let mut ledger = EditLedger::new();
        let stale = NodePath::root(42);
        assert!(matches!(
            ledger.stage(&tree, &stale, "x"),
            Err(Error::PathNotFound { .. })
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn numeric_edit_round_trips_through_commit() {
        let tree = tree();
        let path = path_of(&tree, tags::SERIES_NUMBER);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "12").unwrap();
        let updated = ledger.commit(&tree).unwrap();
        let node = updated.node_at(&path).unwrap();
        assert_eq!(node.display_value(), "12");
        assert_eq!(node.vr(), VR::IS);
    }

    #[test]
    fn blanking_a_value_stages_empty() {
        let tree = tree();
        let path = path_of(&tree, tags::PATIENT_NAME);
        let mut ledger = EditLedger::new();
        ledger.stage(&tree, &path, "").unwrap();
        let updated = ledger.commit(&tree).unwrap();
        assert_eq!(updated.node_at(&path).unwrap().display_value(), "(empty)");
    }
}
