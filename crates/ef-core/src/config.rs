//! Engine Configuration

use serde::{Deserialize, Serialize};

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render mounting point anchors as `<!--name-->` comments instead of
    /// empty text nodes
    pub debug_anchors: bool,

    /// Job passes a single flush may run before the remaining work is
    /// dropped
    pub max_flush_passes: usize,
}

impl Config {
    /// Empty-text anchors, nothing else changed
    pub fn production() -> Self {
        Self {
            debug_anchors: false,
            ..Self::default()
        }
    }

    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_anchors: true,
            max_flush_passes: 64,
        }
    }
}
