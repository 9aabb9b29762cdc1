//! Mutation observers
//!
//! Records child-list and character-data changes the way `MutationObserver`
//! does. The tree pushes a record to every observer whose target matches
//! (directly, or as an ancestor when `subtree` is set).

use crate::NodeId;

/// Handle returned by [`DomTree::observe`](crate::DomTree::observe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Mutation observer options
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub character_data: bool,
    pub subtree: bool,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    CharacterData,
    ChildList,
}

impl MutationRecord {
    pub(crate) fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
            old_value: None,
        }
    }

    pub(crate) fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            old_value: Some(old_value),
        }
    }
}

/// Mutation observer
#[derive(Debug)]
pub(crate) struct MutationObserver {
    pub(crate) id: ObserverId,
    observed: Vec<(NodeId, MutationObserverInit)>,
    records: Vec<MutationRecord>,
}

impl MutationObserver {
    pub(crate) fn new(id: ObserverId) -> Self {
        Self {
            id,
            observed: Vec::new(),
            records: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        match self.observed.iter_mut().find(|(node, _)| *node == target) {
            Some(entry) => entry.1 = options,
            None => self.observed.push((target, options)),
        }
    }

    pub(crate) fn observed(&self) -> &[(NodeId, MutationObserverInit)] {
        &self.observed
    }

    pub(crate) fn disconnect(&mut self) {
        self.observed.clear();
        self.records.clear();
    }

    pub(crate) fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub(crate) fn push_record(&mut self, record: MutationRecord) {
        self.records.push(record);
    }
}

impl MutationObserverInit {
    pub(crate) fn wants(&self, mutation_type: MutationType) -> bool {
        match mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::CharacterData => self.character_data,
        }
    }
}
