//! DOM Tree (arena-based allocation)
//!
//! Every node lives in one `Vec<Node>`; links are `NodeId`s. Slot 0 is the
//! document node. Released slots go to a free list and are reused by the
//! next `create_*` call.

use crate::observer::MutationObserver;
use crate::{
    DomError, DomResult, MutationObserverInit, MutationRecord, Node, NodeData, NodeId, NodeType,
    ObserverId,
};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    observers: Vec<MutationObserver>,
    next_observer: u32,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            free: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(Node::comment(content.to_string()))
    }

    /// Create an empty, off-tree document fragment
    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(Node::fragment())
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.option())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.option())
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Children collected into a Vec
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// Whether `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Number of live nodes (document included)
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Never true: the document node always exists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `new_child` before `ref_child` (or at the end when `None`).
    ///
    /// Inserting a document fragment moves all of its children, in order,
    /// and reports them in a single child-list record on `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insert(parent, new_child, ref_child)?;

        let reference = if ref_child == Some(new_child) {
            self.next_sibling(new_child)
        } else {
            ref_child
        };

        let moving = if self.node_type(new_child) == Some(NodeType::DocumentFragment) {
            let children = self.child_ids(new_child);
            if !children.is_empty() {
                for &child in &children {
                    self.unlink(child);
                }
                self.notify(MutationRecord::child_list(new_child, Vec::new(), children.clone(), None, None));
            }
            children
        } else {
            self.detach_recorded(new_child);
            vec![new_child]
        };

        if moving.is_empty() {
            return Ok(new_child);
        }

        let previous = match reference {
            Some(r) => self.prev_sibling(r),
            None => self.last_child(parent),
        };
        for &node in &moving {
            self.link_before(parent, node, reference);
        }
        tracing::trace!("Inserted {} node(s) into {:?}", moving.len(), parent);
        self.notify(MutationRecord::child_list(parent, moving, Vec::new(), previous, reference));

        Ok(new_child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(parent).is_none() {
            return Err(DomError::NotFound(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach_recorded(child);
        Ok(child)
    }

    /// Remove a node from wherever it currently resides; detached nodes are
    /// left alone
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if self.get(id).is_none() {
            return Err(DomError::NotFound(id));
        }
        self.detach_recorded(id);
        Ok(())
    }

    /// Return a detached, childless node's slot to the free list
    pub fn release(&mut self, id: NodeId) -> DomResult<()> {
        let node = self.get(id).ok_or(DomError::NotFound(id))?;
        if id == NodeId::ROOT {
            return Err(DomError::InvalidNodeType(id));
        }
        if node.parent.is_valid() || node.has_children() {
            return Err(DomError::HierarchyRequest { parent: node.parent, child: id });
        }
        if !self.free.contains(&id) {
            self.nodes[id.index()] = Node::fragment();
            self.free.push(id);
        }
        Ok(())
    }

    /// Detach a node and return it and all of its descendants to the free
    /// list. Released slots are reused, so the ids must not be used again.
    pub fn release_subtree(&mut self, id: NodeId) -> DomResult<()> {
        if id == NodeId::ROOT {
            return Err(DomError::InvalidNodeType(id));
        }
        if self.free.contains(&id) {
            return Ok(());
        }
        self.detach(id)?;

        let mut stack = vec![id];
        let mut released = 0usize;
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.nodes[current.index()] = Node::fragment();
            self.free.push(current);
            released += 1;
        }
        tracing::trace!("Released {} node(s) under {:?}", released, id);
        Ok(())
    }

    /// Replace the data of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound(id))?;
        let old = match &mut node.data {
            NodeData::Text(text) | NodeData::Comment(text) => {
                std::mem::replace(text, content.to_string())
            }
            _ => return Err(DomError::InvalidNodeType(id)),
        };
        self.notify(MutationRecord::character_data(id, old));
        Ok(())
    }

    /// `textContent`: the node's own data for text/comments, the
    /// concatenated descendant text for containers
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) | Some(NodeData::Comment(text)) => text.clone(),
            Some(_) => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
            None => String::new(),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            match self.get(child).map(|n| &n.data) {
                Some(NodeData::Text(text)) => out.push_str(text),
                Some(NodeData::Comment(_)) | None => {}
                Some(_) => self.collect_text(child, out),
            }
        }
    }

    /// Serialize a node and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            NodeData::Text(text) => escape_into(text, false, out),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Document | NodeData::DocumentFragment => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
        }
    }

    /// Start observing `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        let mut observer = MutationObserver::new(id);
        observer.observe(target, options);
        self.observers.push(observer);
        id
    }

    /// Drain the records collected for an observer
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|o| o.id == observer)
            .map(MutationObserver::take_records)
            .unwrap_or_default()
    }

    /// Stop an observer and drop its pending records
    pub fn disconnect(&mut self, observer: ObserverId) {
        if let Some(pos) = self.observers.iter().position(|o| o.id == observer) {
            self.observers[pos].disconnect();
            self.observers.remove(pos);
        }
    }

    fn validate_insert(
        &self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_type = self.node_type(parent).ok_or(DomError::NotFound(parent))?;
        let child_type = self.node_type(new_child).ok_or(DomError::NotFound(new_child))?;

        if !parent_type.is_container() {
            return Err(DomError::InvalidNodeType(parent));
        }
        if child_type == NodeType::Document || self.contains(new_child, parent) {
            return Err(DomError::HierarchyRequest { parent, child: new_child });
        }
        if let Some(reference) = ref_child {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: reference });
            }
        }
        Ok(())
    }

    /// Unlink a node from its parent and report the removal
    fn detach_recorded(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let previous = self.prev_sibling(id);
        let next = self.next_sibling(id);
        self.unlink(id);
        self.notify(MutationRecord::child_list(parent, Vec::new(), vec![id], previous, next));
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    fn link_before(&mut self, parent: NodeId, id: NodeId, reference: Option<NodeId>) {
        let prev = match reference {
            Some(r) => self.nodes[r.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };

        {
            let node = &mut self.nodes[id.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference.unwrap_or(NodeId::NONE);
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = id;
        } else {
            self.nodes[parent.index()].first_child = id;
        }
        match reference {
            Some(r) => self.nodes[r.index()].prev_sibling = id,
            None => self.nodes[parent.index()].last_child = id,
        }
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, observer)| {
                observer.observed().iter().any(|(target, init)| {
                    init.wants(record.mutation_type)
                        && (*target == record.target
                            || (init.subtree && self.contains(*target, record.target)))
                })
            })
            .map(|(index, _)| index)
            .collect();

        for index in interested {
            self.observers[index].push_record(record.clone());
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.option()?;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(current)
    }
}
