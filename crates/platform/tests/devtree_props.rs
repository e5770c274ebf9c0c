//! Property-based checks for the device-tree read primitives.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use platform::devtree_local::{DeviceTree, DtNode};
use platform::{ConfigError, DeviceNode};

proptest::proptest! {
    /// read_u32_array succeeds exactly when the property is long enough,
    /// and then agrees with read_u32_index cell by cell.
    #[test]
    fn read_array_agrees_with_index_reads(
        cells in proptest::collection::vec(proptest::num::u32::ANY, 0..12),
        want in 0usize..14,
    ) {
        let tree = DeviceTree::new(DtNode::new("n").prop("k", &cells));
        let node = tree.root();
        let mut out = vec![0u32; want];
        let result = node.read_u32_array("k", &mut out);
        if want <= cells.len() {
            assert!(result.is_ok());
            for (i, v) in out.iter().enumerate() {
                assert_eq!(node.read_u32_index("k", i), Ok(*v));
            }
        } else {
            assert_eq!(result, Err(ConfigError::Overflow { available: cells.len(), requested: want }));
        }
    }

    /// count_u32_elems always matches the stored length.
    #[test]
    fn count_matches_stored_length(cells in proptest::collection::vec(0u32..1000, 0..32)) {
        let tree = DeviceTree::new(DtNode::new("n").prop("k", &cells));
        assert_eq!(tree.root().count_u32_elems("k"), Ok(cells.len()));
    }
}
