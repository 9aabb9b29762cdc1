//! ef DOM - Document Object Model
//!
//! Arena-backed DOM tree that components render into, mutation observers
//! for watching child-list changes, and [`Fragment`], the ordered group of
//! nodes that is inserted and removed as one unit.

mod node;
mod tree;
mod operations;
mod observer;
mod fragment;

pub use node::{Node, NodeData, NodeType, ElementData};
pub use tree::{DomTree, Children};
pub use operations::{DomError, DomResult};
pub use observer::{MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use fragment::{Fragment, FragmentItem};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" in sibling/parent links
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this is not the `NONE` sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena slot of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}
