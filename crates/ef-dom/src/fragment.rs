//! Fragment collection
//!
//! An ordered group of nodes and nested groups that is inserted and removed
//! as a single unit. Insertion stages every flattened node into one off-tree
//! document fragment, so the target container sees exactly one child-list
//! change.

use crate::{DomError, DomResult, DomTree, NodeId, NodeType};

/// One entry of a [`Fragment`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentItem {
    Node(NodeId),
    Fragment(Fragment),
}

impl From<NodeId> for FragmentItem {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Fragment> for FragmentItem {
    fn from(fragment: Fragment) -> Self {
        Self::Fragment(fragment)
    }
}

/// Ordered collection of nodes and nested fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    items: Vec<FragmentItem>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment holding a single node
    pub fn from_node(id: NodeId) -> Self {
        Self { items: vec![FragmentItem::Node(id)] }
    }

    /// Fragment holding the given nodes, in order
    pub fn from_nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            items: ids.into_iter().map(FragmentItem::Node).collect(),
        }
    }

    pub fn push_node(&mut self, id: NodeId) {
        self.items.push(FragmentItem::Node(id));
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.items.push(FragmentItem::Fragment(fragment));
    }

    pub fn push(&mut self, item: impl Into<FragmentItem>) {
        self.items.push(item.into());
    }

    /// Number of direct items (nested fragments count once)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[FragmentItem] {
        &self.items
    }

    /// All nodes in logical order, nested fragments expanded in place
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<NodeId>) {
        for item in &self.items {
            match item {
                FragmentItem::Node(id) => out.push(*id),
                FragmentItem::Fragment(nested) => nested.flatten_into(out),
            }
        }
    }

    /// Append every node as the last children of `anchor`.
    ///
    /// Returns `false` when the anchor cannot hold children and nothing
    /// moved; the same holds for the other insertion methods.
    pub fn append_to(&self, dom: &mut DomTree, anchor: NodeId) -> DomResult<bool> {
        let kind = dom.node_type(anchor).ok_or(DomError::NotFound(anchor))?;
        if !kind.is_container() {
            tracing::trace!("append_to: {:?} cannot hold children, ignoring", anchor);
            return Ok(false);
        }
        self.attach(dom, anchor, None)?;
        Ok(true)
    }

    /// Insert every node immediately before `anchor`
    pub fn insert_before_to(&self, dom: &mut DomTree, anchor: NodeId) -> DomResult<bool> {
        let Some(parent) = container_parent(dom, anchor)? else {
            return Ok(false);
        };
        self.attach(dom, parent, Some(anchor))?;
        Ok(true)
    }

    /// Insert every node immediately after `anchor`
    pub fn insert_after_to(&self, dom: &mut DomTree, anchor: NodeId) -> DomResult<bool> {
        let Some(parent) = container_parent(dom, anchor)? else {
            return Ok(false);
        };
        // A node being moved may currently follow the anchor
        let moving = self.flatten();
        let mut reference = dom.next_sibling(anchor);
        while let Some(next) = reference.filter(|r| moving.contains(r)) {
            reference = dom.next_sibling(next);
        }
        self.attach(dom, parent, reference)?;
        Ok(true)
    }

    /// Detach every node (recursively) and empty the collection
    pub fn remove(&mut self, dom: &mut DomTree) -> DomResult<()> {
        for item in std::mem::take(&mut self.items) {
            match item {
                FragmentItem::Node(id) => dom.detach(id)?,
                FragmentItem::Fragment(mut nested) => nested.remove(dom)?,
            }
        }
        Ok(())
    }

    fn attach(&self, dom: &mut DomTree, parent: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        let nodes = self.flatten();
        if nodes.is_empty() {
            return Ok(());
        }

        for &node in &nodes {
            match dom.node_type(node) {
                None => return Err(DomError::NotFound(node)),
                Some(NodeType::Document) => {
                    return Err(DomError::HierarchyRequest { parent, child: node });
                }
                Some(_) => {}
            }
            if dom.contains(node, parent) || reference.is_some_and(|r| dom.contains(node, r)) {
                return Err(DomError::HierarchyRequest { parent, child: node });
            }
        }

        let staging = dom.create_document_fragment();
        let result = nodes
            .iter()
            .try_for_each(|&node| dom.append_child(staging, node).map(drop))
            .and_then(|()| dom.insert_before(parent, staging, reference).map(drop));

        for leftover in dom.child_ids(staging) {
            dom.detach(leftover)?;
        }
        dom.release(staging)?;

        if result.is_ok() {
            tracing::trace!("Attached {} node(s) to {:?}", nodes.len(), parent);
        }
        result
    }
}

impl FromIterator<FragmentItem> for Fragment {
    fn from_iter<I: IntoIterator<Item = FragmentItem>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

/// Parent of `anchor` when it can hold children
fn container_parent(dom: &DomTree, anchor: NodeId) -> DomResult<Option<NodeId>> {
    if dom.get(anchor).is_none() {
        return Err(DomError::NotFound(anchor));
    }
    let parent = dom
        .parent(anchor)
        .filter(|&p| dom.node_type(p).is_some_and(NodeType::is_container));
    if parent.is_none() {
        tracing::trace!("{:?} has no container parent, ignoring", anchor);
    }
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MutationObserverInit;

    fn texts(dom: &mut DomTree, values: &[&str]) -> Vec<NodeId> {
        values.iter().map(|v| dom.create_text(v)).collect()
    }

    #[test]
    fn test_flatten_nested() {
        let mut dom = DomTree::new();
        let ids = texts(&mut dom, &["a", "b", "c", "d"]);

        let mut inner = Fragment::from_node(ids[1]);
        inner.push_fragment(Fragment::from_node(ids[2]));
        let mut outer = Fragment::from_node(ids[0]);
        outer.push(inner);
        outer.push(ids[3]);

        assert_eq!(outer.len(), 3);
        assert_eq!(outer.flatten(), ids);
    }

    #[test]
    fn test_append_to_single_record() {
        let mut dom = DomTree::new();
        let host = dom.create_element("div");
        let ids = texts(&mut dom, &["x", "y", "z"]);
        let fragment = Fragment::from_nodes(ids.clone());

        let observer = dom.observe(host, MutationObserverInit { child_list: true, ..Default::default() });
        fragment.append_to(&mut dom, host).unwrap();

        assert_eq!(dom.child_ids(host), ids);
        let records = dom.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].added_nodes, ids);
    }

    #[test]
    fn test_staging_node_released() {
        let mut dom = DomTree::new();
        let host = dom.create_element("div");
        let ids = texts(&mut dom, &["x"]);
        let before = dom.len();

        Fragment::from_nodes(ids).append_to(&mut dom, host).unwrap();
        assert_eq!(dom.len(), before);
    }

    #[test]
    fn test_insert_after_last_child() {
        let mut dom = DomTree::new();
        let parent = dom.create_element("div");
        let anchor = dom.create_element("hr");
        dom.append_child(parent, anchor).unwrap();
        let ids = texts(&mut dom, &["A", "B", "C"]);

        Fragment::from_nodes(ids.clone()).insert_after_to(&mut dom, anchor).unwrap();

        let mut expected = vec![anchor];
        expected.extend(ids);
        assert_eq!(dom.child_ids(parent), expected);
    }

    #[test]
    fn test_insert_before_anchor() {
        let mut dom = DomTree::new();
        let parent = dom.create_element("p");
        let anchor = dom.create_comment("slot");
        dom.append_child(parent, anchor).unwrap();
        let ids = texts(&mut dom, &["1", "2"]);

        Fragment::from_nodes(ids.clone()).insert_before_to(&mut dom, anchor).unwrap();
        assert_eq!(dom.child_ids(parent), vec![ids[0], ids[1], anchor]);
    }

    #[test]
    fn test_non_container_anchor_ignored() {
        let mut dom = DomTree::new();
        let text = dom.create_text("leaf");
        let detached = dom.create_element("span");
        let ids = texts(&mut dom, &["a"]);
        let fragment = Fragment::from_nodes(ids.clone());

        fragment.append_to(&mut dom, text).unwrap();
        fragment.insert_before_to(&mut dom, detached).unwrap();
        fragment.insert_after_to(&mut dom, detached).unwrap();
        assert_eq!(dom.parent(ids[0]), None);
    }

    #[test]
    fn test_hierarchy_rejected_before_move() {
        let mut dom = DomTree::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("span");
        dom.append_child(outer, inner).unwrap();
        let loose = dom.create_text("loose");

        let fragment = Fragment::from_nodes([loose, outer]);
        assert_eq!(
            fragment.append_to(&mut dom, inner),
            Err(DomError::HierarchyRequest { parent: inner, child: outer })
        );
        assert_eq!(dom.parent(loose), None);
        assert_eq!(dom.parent(inner), Some(outer));
    }

    #[test]
    fn test_remove_nested() {
        let mut dom = DomTree::new();
        let host = dom.create_element("div");
        let ids = texts(&mut dom, &["n1", "n2", "n3"]);

        let mut fragment = Fragment::from_node(ids[0]);
        fragment.push_fragment(Fragment::from_nodes([ids[1], ids[2]]));
        fragment.append_to(&mut dom, host).unwrap();

        fragment.remove(&mut dom).unwrap();
        assert!(fragment.is_empty());
        assert!(dom.child_ids(host).is_empty());
        for id in ids {
            assert_eq!(dom.parent(id), None);
        }
    }
}
