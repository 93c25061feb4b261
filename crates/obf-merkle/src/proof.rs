//! Multiproof support-set computation, extraction, and verification.

use std::collections::{BTreeMap, BTreeSet};

use crate::gindex::{self, Gindex, Node};
use crate::tree::{BinaryMerkleTree, TreeError};

/// The gindices a multiproof must carry so that every access in `accesses`
/// can be answered *and* re-hashed to the root.
///
/// For each accessed gindex this includes the gindex itself plus the sibling
/// of every node on its path to the root; siblings that are themselves on
/// some access path collapse into their own (deeper) coverage.
#[must_use]
pub fn support_set(accesses: &BTreeSet<Gindex>) -> BTreeSet<Gindex> {
    let mut on_path: BTreeSet<Gindex> = BTreeSet::new();
    for &g in accesses {
        let mut a = g;
        loop {
            on_path.insert(a);
            if a <= 1 {
                break;
            }
            a = gindex::parent(a);
        }
    }

    let mut support: BTreeSet<Gindex> = accesses.clone();
    for &p in &on_path {
        if p <= 1 {
            continue;
        }
        let s = gindex::sibling(p);
        if !on_path.contains(&s) {
            support.insert(s);
        }
    }
    support
}

/// Extract the minimal node dictionary for `accesses` from `tree`.
///
/// Zero-valued nodes are materialized explicitly so the result stands on its
/// own as partial-tree storage.
pub fn multiproof(
    tree: &BinaryMerkleTree,
    accesses: &BTreeSet<Gindex>,
) -> Result<BTreeMap<Gindex, Node>, TreeError> {
    let mut out = BTreeMap::new();
    for g in support_set(accesses) {
        out.insert(g, tree.peek(g)?);
    }
    Ok(out)
}

/// Check that `nodes` covers `accesses` and hashes to `root`.
pub fn verify_multiproof(
    depth: u32,
    nodes: &BTreeMap<Gindex, Node>,
    accesses: &BTreeSet<Gindex>,
    root: &Node,
) -> bool {
    let tree = BinaryMerkleTree::from_nodes(depth, nodes.clone());
    match tree.root() {
        Ok(r) if r == *root => {}
        _ => return false,
    }
    accesses.iter().all(|&g| tree.peek(g).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_of_single_leaf_is_its_sibling_path() {
        // Depth-3 tree, leaf 10 (path 0,1,0 from the root).
        let accesses: BTreeSet<Gindex> = [10u64].into_iter().collect();
        let support = support_set(&accesses);
        let expected: BTreeSet<Gindex> = [10u64, 11, 4, 3].into_iter().collect();
        assert_eq!(support, expected);
    }

    #[test]
    fn shared_paths_collapse() {
        // Two leaves under the same parent need no sibling between them.
        let accesses: BTreeSet<Gindex> = [8u64, 9].into_iter().collect();
        let support = support_set(&accesses);
        let expected: BTreeSet<Gindex> = [8u64, 9, 5, 3].into_iter().collect();
        assert_eq!(support, expected);
    }

    #[test]
    fn multiproof_roundtrip() {
        let mut tree = BinaryMerkleTree::new(3);
        for i in 0..8u64 {
            tree.set(8 + i, [i as u8 + 1; 32]).unwrap();
        }
        let root = tree.root().unwrap();

        let accesses: BTreeSet<Gindex> = [8u64, 13].into_iter().collect();
        let nodes = multiproof(&tree, &accesses).unwrap();
        assert!(verify_multiproof(3, &nodes, &accesses, &root));

        // Dropping any node breaks either coverage or the root.
        for missing in nodes.keys() {
            let mut broken = nodes.clone();
            broken.remove(missing);
            assert!(!verify_multiproof(3, &broken, &accesses, &root));
        }

        // Tampering with a node breaks the root.
        let mut tampered = nodes.clone();
        let (first, _) = tampered.iter().next().map(|(g, n)| (*g, *n)).unwrap();
        tampered.insert(first, [0xaa; 32]);
        assert!(!verify_multiproof(3, &tampered, &accesses, &root));
    }
}
