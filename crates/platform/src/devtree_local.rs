//! In-memory device tree for the desktop emulator and tests.
//!
//! `DeviceTree` implements [`DeviceNode`] over an owned tree of [`DtNode`]s.
//! Used when the `std` feature is enabled; with the `serde` feature the tree
//! loads from JSON:
//!
//! ```json
//! {
//!   "name": "panel",
//!   "properties": { "mipi-freq-lists": [1108, 1124, 1125], "rf-table-lists": [1, 2] },
//!   "children": [
//!     { "name": "narrow", "phandle": 1, "children": [
//!       { "name": "b7", "properties": { "rf-band-id": [7], "rf-channel-range": [3040, 3179], "rating": [0, 0, 100] } }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::string::String;
use std::vec::Vec;

use crate::devtree::{ConfigError, DeviceNode};

/// One owned node of a [`DeviceTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DtNode {
    /// Node name.
    pub name: String,
    /// Phandle other nodes use to reference this one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub phandle: Option<u32>,
    /// `u32`-array properties.
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: BTreeMap<String, Vec<u32>>,
    /// Child nodes, in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<DtNode>,
}

impl DtNode {
    /// Create an empty node.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set property `key` to `cells`.
    #[must_use]
    pub fn prop(mut self, key: &str, cells: &[u32]) -> Self {
        self.properties.insert(key.into(), cells.to_vec());
        self
    }

    /// Assign a phandle.
    #[must_use]
    pub fn phandle(mut self, phandle: u32) -> Self {
        self.phandle = Some(phandle);
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, child: DtNode) -> Self {
        self.children.push(child);
        self
    }

    fn find_phandle(&self, phandle: u32) -> Option<&DtNode> {
        if self.phandle == Some(phandle) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_phandle(phandle))
    }
}

/// Errors from loading a [`DeviceTree`] from JSON.
#[cfg(feature = "serde")]
#[derive(Debug, thiserror_no_std::Error)]
pub enum DeviceTreeLoadError {
    /// The file could not be read.
    #[error("device tree read failed: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not a valid device tree document.
    #[error("device tree parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Owned device tree; phandles resolve anywhere below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTree {
    root: DtNode,
}

impl DeviceTree {
    /// Wrap `root` as a tree.
    pub fn new(root: DtNode) -> Self {
        Self { root }
    }

    /// Handle to the root node.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            root: &self.root,
            node: &self.root,
        }
    }

    /// Resolve a `/`-separated path of child names below the root.
    ///
    /// An empty path returns the root.
    pub fn node(&self, path: &str) -> Option<NodeRef<'_>> {
        let mut node = &self.root;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.children.iter().find(|c| c.name == part)?;
        }
        Some(NodeRef {
            root: &self.root,
            node,
        })
    }

    /// Parse a tree from a JSON document.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, DeviceTreeLoadError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Read and parse a JSON document from `path`.
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, DeviceTreeLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Borrowed handle to a node inside a [`DeviceTree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    root: &'t DtNode,
    node: &'t DtNode,
}

impl<'t> NodeRef<'t> {
    fn cells(&self, key: &str) -> Result<&'t [u32], ConfigError> {
        self.node
            .properties
            .get(key)
            .map(Vec::as_slice)
            .ok_or(ConfigError::MissingProperty)
    }
}

impl<'t> DeviceNode for NodeRef<'t> {
    fn name(&self) -> &str {
        &self.node.name
    }

    fn count_u32_elems(&self, key: &str) -> Result<usize, ConfigError> {
        self.cells(key).map(<[u32]>::len)
    }

    fn read_u32_index(&self, key: &str, index: usize) -> Result<u32, ConfigError> {
        self.cells(key)?
            .get(index)
            .copied()
            .ok_or(ConfigError::OutOfRange { index })
    }

    fn parse_phandle(&self, key: &str, index: usize) -> Option<Self> {
        let phandle = self.read_u32_index(key, index).ok()?;
        let node = self.root.find_phandle(phandle)?;
        Some(NodeRef {
            root: self.root,
            node,
        })
    }

    fn children(&self) -> impl Iterator<Item = Self> + '_ {
        let root = self.root;
        self.node
            .children
            .iter()
            .map(move |node| NodeRef { root, node })
    }
}
