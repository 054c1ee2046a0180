//! Rank-membership properties of mesh nodes.

use proptest::prelude::*;
use quadflow::mesh::Node;

proptest! {
    #[test]
    fn rank_set_dedups_and_keeps_first_seen_order(adds in prop::collection::vec(0usize..8, 0..32)) {
        let mut node = Node::new(0.0, 0.0);
        for &r in &adds {
            node.add_rank(r);
        }

        let mut expected = Vec::new();
        for &r in &adds {
            if !expected.contains(&r) {
                expected.push(r);
            }
        }
        prop_assert_eq!(node.ranks(), expected.as_slice());
        prop_assert_eq!(node.is_shared(), expected.len() > 1);
        for r in 0..8 {
            prop_assert_eq!(node.is_on_rank(r), expected.contains(&r));
        }
    }
}
