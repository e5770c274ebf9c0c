//! Device configuration abstraction.
//!
//! Panel features are configured from a hierarchical key/value store shaped
//! like a flattened device tree: every node carries named properties holding
//! arrays of `u32` cells, may carry child nodes, and may point at other nodes
//! through phandle properties.
//!
//! [`DeviceNode`] exposes only the primitives the panel features need:
//!
//! | Method                | Device-tree equivalent          |
//! |-----------------------|---------------------------------|
//! | `count_u32_elems`     | `of_property_count_u32_elems`   |
//! | `read_u32_index`      | `of_property_read_u32_index`    |
//! | `read_u32`            | `of_property_read_u32`          |
//! | `read_u32_array`      | `of_property_read_u32_array`    |
//! | `parse_phandle`       | `of_parse_phandle`              |
//! | `children`            | `for_each_child_of_node`        |

/// Errors raised by configuration primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The property does not exist on the node.
    #[error("property not found")]
    MissingProperty,
    /// The property holds fewer cells than requested.
    #[error("property holds {available} cells, {requested} requested")]
    Overflow {
        /// Cells present in the property.
        available: usize,
        /// Cells the caller asked for.
        requested: usize,
    },
    /// A cell index past the end of the property.
    #[error("cell index {index} out of range")]
    OutOfRange {
        /// Offending index.
        index: usize,
    },
}

/// One node of the device configuration.
///
/// Nodes are cheap handles (typically a pair of references), so methods
/// return further nodes by value.
pub trait DeviceNode: Sized {
    /// Node name, used only for diagnostics.
    fn name(&self) -> &str;

    /// Number of `u32` cells in `key`.
    fn count_u32_elems(&self, key: &str) -> Result<usize, ConfigError>;

    /// Cell `index` of `key`.
    fn read_u32_index(&self, key: &str, index: usize) -> Result<u32, ConfigError>;

    /// Resolve the `index`-th phandle stored in `key`.
    ///
    /// Returns `None` when the property is missing, the index is out of
    /// range, or the phandle does not name a node.
    fn parse_phandle(&self, key: &str, index: usize) -> Option<Self>;

    /// Direct children, in declaration order.
    fn children(&self) -> impl Iterator<Item = Self> + '_;

    /// First cell of `key`.
    fn read_u32(&self, key: &str) -> Result<u32, ConfigError> {
        self.read_u32_index(key, 0).map_err(|e| match e {
            ConfigError::OutOfRange { .. } => ConfigError::Overflow {
                available: 0,
                requested: 1,
            },
            other => other,
        })
    }

    /// Fill `out` from the leading cells of `key`.
    ///
    /// Fails with [`ConfigError::Overflow`] when the property is shorter
    /// than `out`; extra cells are ignored.
    fn read_u32_array(&self, key: &str, out: &mut [u32]) -> Result<(), ConfigError> {
        let available = self.count_u32_elems(key)?;
        if available < out.len() {
            return Err(ConfigError::Overflow {
                available,
                requested: out.len(),
            });
        }
        for (index, slot) in out.iter_mut().enumerate() {
            *slot = self.read_u32_index(key, index)?;
        }
        Ok(())
    }

    /// Returns `true` if `key` exists on this node (even with zero cells).
    fn has_property(&self, key: &str) -> bool {
        self.count_u32_elems(key).is_ok()
    }

    /// Number of direct children.
    fn child_count(&self) -> usize {
        self.children().count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    /// Flat single-node implementation: enough to exercise the provided
    /// methods without the std tree.
    struct Flat(&'static [(&'static str, &'static [u32])]);

    impl DeviceNode for Flat {
        fn name(&self) -> &str {
            "flat"
        }

        fn count_u32_elems(&self, key: &str) -> Result<usize, ConfigError> {
            self.0
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.len())
                .ok_or(ConfigError::MissingProperty)
        }

        fn read_u32_index(&self, key: &str, index: usize) -> Result<u32, ConfigError> {
            let (_, v) = self
                .0
                .iter()
                .find(|(k, _)| *k == key)
                .ok_or(ConfigError::MissingProperty)?;
            v.get(index).copied().ok_or(ConfigError::OutOfRange { index })
        }

        fn parse_phandle(&self, _key: &str, _index: usize) -> Option<Self> {
            None
        }

        fn children(&self) -> impl Iterator<Item = Self> + '_ {
            core::iter::empty()
        }
    }

    const NODE: Flat = Flat(&[("range", &[3040, 3179]), ("empty", &[])]);

    #[test]
    fn read_u32_returns_first_cell() {
        assert_eq!(NODE.read_u32("range"), Ok(3040));
    }

    #[test]
    fn read_u32_of_empty_property_is_overflow() {
        assert_eq!(
            NODE.read_u32("empty"),
            Err(ConfigError::Overflow {
                available: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn read_u32_array_rejects_short_property() {
        let mut out = [0u32; 3];
        assert_eq!(
            NODE.read_u32_array("range", &mut out),
            Err(ConfigError::Overflow {
                available: 2,
                requested: 3
            })
        );
    }

    #[test]
    fn read_u32_array_fills_exact_length() {
        let mut out = [0u32; 2];
        NODE.read_u32_array("range", &mut out).unwrap();
        assert_eq!(out, [3040, 3179]);
    }

    #[test]
    fn has_property_sees_empty_properties() {
        assert!(NODE.has_property("empty"));
        assert!(!NODE.has_property("missing"));
        assert_eq!(NODE.child_count(), 0);
    }
}
