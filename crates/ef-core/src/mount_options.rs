//! Mount options
//!
//! Where [`Component::mount_to`](crate::Component::mount_to) places a
//! component relative to its target node.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountOption {
    /// Immediately before the target
    Before,
    /// Immediately after the target
    After,
    /// As the last children of the target
    #[default]
    Append,
    /// In place of the target, which is detached
    Replace,
}
