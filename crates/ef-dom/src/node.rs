//! DOM Node - arena representation
//!
//! Nodes link to each other through `NodeId`s instead of pointers, the
//! same way the rest of the tree is addressed. `NodeId::NONE` marks an
//! absent link.

use crate::NodeId;

/// Node kind, numbered like the DOM `nodeType` constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    DocumentFragment = 11,
}

impl NodeType {
    /// Numeric `nodeType` code
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether nodes of this kind can hold children (element, document,
    /// document fragment)
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Element | Self::Document | Self::DocumentFragment)
    }
}

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    /// Create a new comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Create an empty document fragment node
    pub fn fragment() -> Self {
        Self::with_data(NodeData::DocumentFragment)
    }

    /// Kind of this node
    #[inline]
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn has_children(&self) -> bool {
        self.first_child.is_valid()
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Off-tree container whose children move out when it is inserted
    DocumentFragment,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        for (key, existing) in self.attrs.iter_mut() {
            if key == name {
                *existing = value.to_string();
                return;
            }
        }
        self.attrs.push((name.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_codes() {
        assert_eq!(NodeType::Element.code(), 1);
        assert_eq!(NodeType::Text.code(), 3);
        assert_eq!(NodeType::Comment.code(), 8);
        assert_eq!(NodeType::Document.code(), 9);
        assert_eq!(NodeType::DocumentFragment.code(), 11);
    }

    #[test]
    fn test_container_kinds() {
        assert!(NodeType::Element.is_container());
        assert!(NodeType::Document.is_container());
        assert!(NodeType::DocumentFragment.is_container());
        assert!(!NodeType::Text.is_container());
        assert!(!NodeType::Comment.is_container());
    }

    #[test]
    fn test_element_attrs() {
        let mut el = ElementData::new("div");
        el.set_attr("class", "a");
        el.set_attr("id", "main");
        el.set_attr("class", "b");

        assert_eq!(el.get_attr("class"), Some("b"));
        assert_eq!(el.get_attr("id"), Some("main"));
        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.get_attr("missing"), None);
    }
}
