//! Script trees.
//!
//! A [`ScriptTree`] is built from a nested [`TreeSpec`] and keeps the exact shape it was given.
//! The root hash depends on how the leaves are paired, so the same description must be used when
//! funding an output and when spending it.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    constants::TAPROOT_CONTROL_MAX_NODE_COUNT,
    errors::{TreeError, TreeResult},
    hashes::{branch_hash, LeafHash, NodeHash},
    leaf::ScriptLeaf,
};

/// A nested description of a script tree.
///
/// In configuration files a leaf is a table and a group is an array, so `[[A, B], C]` describes
/// a tree where `A` and `B` are paired first and the result is paired with `C`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeSpec {
    /// A single leaf.
    Leaf(ScriptLeaf),

    /// A group of subtrees. Must contain exactly two entries.
    Group(Vec<TreeSpec>),
}

impl TreeSpec {
    /// Pairs two descriptions.
    pub fn pair(left: TreeSpec, right: TreeSpec) -> Self {
        Self::Group(vec![left, right])
    }
}

impl From<ScriptLeaf> for TreeSpec {
    fn from(leaf: ScriptLeaf) -> Self {
        Self::Leaf(leaf)
    }
}

/// A node of a validated script tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A leaf.
    Leaf(ScriptLeaf),

    /// An inner node with exactly two children.
    Branch(Box<TreeNode>, Box<TreeNode>),
}

impl TreeNode {
    /// Computes the hash of this node.
    pub fn node_hash(&self) -> NodeHash {
        match self {
            TreeNode::Leaf(leaf) => leaf.leaf_hash().into(),
            TreeNode::Branch(left, right) => branch_hash(left.node_hash(), right.node_hash()),
        }
    }

    fn from_spec(spec: TreeSpec, depth: usize) -> TreeResult<(Self, usize)> {
        if depth > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(TreeError::TooDeep(depth));
        }

        match spec {
            TreeSpec::Leaf(leaf) => Ok((TreeNode::Leaf(leaf), depth)),
            TreeSpec::Group(children) => {
                let [left, right]: [TreeSpec; 2] =
                    children.try_into().map_err(|children: Vec<TreeSpec>| {
                        TreeError::InvalidGroupSize(children.len())
                    })?;

                let (left, left_depth) = Self::from_spec(left, depth + 1)?;
                let (right, right_depth) = Self::from_spec(right, depth + 1)?;

                Ok((
                    TreeNode::Branch(Box::new(left), Box::new(right)),
                    left_depth.max(right_depth),
                ))
            }
        }
    }

    fn to_spec(&self) -> TreeSpec {
        match self {
            TreeNode::Leaf(leaf) => TreeSpec::Leaf(leaf.clone()),
            TreeNode::Branch(left, right) => TreeSpec::pair(left.to_spec(), right.to_spec()),
        }
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a ScriptLeaf>) {
        match self {
            TreeNode::Leaf(leaf) => leaves.push(leaf),
            TreeNode::Branch(left, right) => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
        }
    }

    /// Walks the tree depth-first looking for the leaf at `target`, counting leaves in `seen`.
    ///
    /// On success `path` holds the sibling hashes from the leaf up to this node.
    fn find_path(&self, target: usize, seen: &mut usize, path: &mut Vec<NodeHash>) -> bool {
        match self {
            TreeNode::Leaf(_) => {
                let found = *seen == target;
                *seen += 1;
                found
            }
            TreeNode::Branch(left, right) => {
                if left.find_path(target, seen, path) {
                    path.push(right.node_hash());
                    return true;
                }

                if right.find_path(target, seen, path) {
                    path.push(left.node_hash());
                    return true;
                }

                false
            }
        }
    }
}

/// A validated script tree.
///
/// Leaves are indexed depth-first, left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeSpec", into = "TreeSpec")]
pub struct ScriptTree {
    root: TreeNode,
    root_hash: NodeHash,
    num_leaves: usize,
    depth: usize,
}

impl ScriptTree {
    /// Builds a tree from its description.
    ///
    /// Every group must have exactly two children and no leaf may be deeper than
    /// [`TAPROOT_CONTROL_MAX_NODE_COUNT`].
    pub fn build(spec: TreeSpec) -> TreeResult<Self> {
        let (root, depth) = TreeNode::from_spec(spec, 0)?;

        Ok(Self::from_root(root, depth))
    }

    /// Creates a tree with a single leaf.
    pub fn from_leaf(leaf: ScriptLeaf) -> Self {
        Self::from_root(TreeNode::Leaf(leaf), 0)
    }

    /// Pairs two trees under a new root.
    pub fn from_branch(left: ScriptTree, right: ScriptTree) -> TreeResult<Self> {
        let depth = left.depth.max(right.depth) + 1;
        if depth > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(TreeError::TooDeep(depth));
        }

        let root = TreeNode::Branch(Box::new(left.root), Box::new(right.root));

        Ok(Self::from_root(root, depth))
    }

    fn from_root(root: TreeNode, depth: usize) -> Self {
        let root_hash = root.node_hash();

        let mut leaves = Vec::new();
        root.collect_leaves(&mut leaves);
        let num_leaves = leaves.len();

        trace!(%root_hash, %num_leaves, %depth, "built script tree");

        Self {
            root,
            root_hash,
            num_leaves,
            depth,
        }
    }

    /// Returns the root node.
    pub const fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Returns the merkle root committed to in the output key.
    pub const fn root_hash(&self) -> NodeHash {
        self.root_hash
    }

    /// Returns the number of leaves.
    pub const fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Returns the depth of the deepest leaf. A single-leaf tree has depth zero.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns all leaves in index order.
    pub fn leaves(&self) -> Vec<&ScriptLeaf> {
        let mut leaves = Vec::with_capacity(self.num_leaves);
        self.root.collect_leaves(&mut leaves);

        leaves
    }

    /// Returns the leaf at `index`.
    pub fn leaf(&self, index: usize) -> TreeResult<&ScriptLeaf> {
        self.leaves()
            .get(index)
            .copied()
            .ok_or(TreeError::LeafNotFound {
                index,
                num_leaves: self.num_leaves,
            })
    }

    /// Returns the index of the first leaf equal to `leaf`.
    pub fn leaf_index(&self, leaf: &ScriptLeaf) -> Option<usize> {
        self.leaves().into_iter().position(|candidate| candidate == leaf)
    }

    /// Returns the sibling hashes from the leaf at `index` up to the root.
    pub fn merkle_path(&self, index: usize) -> TreeResult<Vec<NodeHash>> {
        let mut path = Vec::with_capacity(self.depth);
        let mut seen = 0;

        if self.root.find_path(index, &mut seen, &mut path) {
            Ok(path)
        } else {
            Err(TreeError::LeafNotFound {
                index,
                num_leaves: self.num_leaves,
            })
        }
    }

    /// Returns the description this tree was built from.
    pub fn to_spec(&self) -> TreeSpec {
        self.root.to_spec()
    }
}

impl TryFrom<TreeSpec> for ScriptTree {
    type Error = TreeError;

    fn try_from(spec: TreeSpec) -> Result<Self, Self::Error> {
        Self::build(spec)
    }
}

impl From<ScriptTree> for TreeSpec {
    fn from(tree: ScriptTree) -> Self {
        tree.to_spec()
    }
}

/// Recomputes the root from a leaf hash and its merkle path.
pub fn compute_root(leaf_hash: LeafHash, path: &[NodeHash]) -> NodeHash {
    path.iter()
        .fold(NodeHash::from(leaf_hash), |node, sibling| {
            branch_hash(node, *sibling)
        })
}

/// Checks that `path` proves the inclusion of `leaf_hash` under `root`.
pub fn verify_merkle_path(leaf_hash: LeafHash, path: &[NodeHash], root: NodeHash) -> bool {
    path.len() <= TAPROOT_CONTROL_MAX_NODE_COUNT && compute_root(leaf_hash, path) == root
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, taproot::TaprootBuilder, ScriptBuf};
    use proptest::prelude::*;
    use secp256k1::SECP256K1;

    use super::*;
    use crate::constants::UNSPENDABLE_INTERNAL_KEY;

    fn leaf(byte: u8) -> ScriptLeaf {
        ScriptLeaf::new(ScriptBuf::from_bytes(vec![byte]))
    }

    fn spec_leaf(byte: u8) -> TreeSpec {
        TreeSpec::Leaf(leaf(byte))
    }

    fn arb_tree_spec() -> impl Strategy<Value = TreeSpec> {
        let leaf = prop::collection::vec(any::<u8>(), 0..40)
            .prop_map(|bytes| TreeSpec::Leaf(ScriptLeaf::new(ScriptBuf::from_bytes(bytes))));

        leaf.prop_recursive(6, 32, 2, |inner| {
            (inner.clone(), inner).prop_map(|(left, right)| TreeSpec::pair(left, right))
        })
    }

    #[test]
    fn single_leaf_root_is_leaf_hash() {
        let tree = ScriptTree::build(spec_leaf(0x51)).expect("single leaf is valid");

        assert_eq!(tree.root_hash(), NodeHash::from(leaf(0x51).leaf_hash()));
        assert_eq!(tree.merkle_path(0), Ok(vec![]));
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn leaves_are_indexed_depth_first() {
        let spec = TreeSpec::pair(TreeSpec::pair(spec_leaf(1), spec_leaf(2)), spec_leaf(3));
        let tree = ScriptTree::build(spec).expect("tree is valid");

        assert_eq!(tree.num_leaves(), 3);
        assert_eq!(tree.leaf(0), Ok(&leaf(1)));
        assert_eq!(tree.leaf(1), Ok(&leaf(2)));
        assert_eq!(tree.leaf(2), Ok(&leaf(3)));
        assert_eq!(tree.leaf_index(&leaf(3)), Some(2));

        let ab = branch_hash(leaf(1).leaf_hash().into(), leaf(2).leaf_hash().into());
        assert_eq!(
            tree.merkle_path(0),
            Ok(vec![leaf(2).leaf_hash().into(), leaf(3).leaf_hash().into()])
        );
        assert_eq!(tree.merkle_path(2), Ok(vec![ab]));
    }

    #[test]
    fn repairing_changes_root() {
        let left_heavy = ScriptTree::build(TreeSpec::pair(
            TreeSpec::pair(spec_leaf(1), spec_leaf(2)),
            spec_leaf(3),
        ))
        .expect("tree is valid");
        let right_heavy = ScriptTree::build(TreeSpec::pair(
            spec_leaf(1),
            TreeSpec::pair(spec_leaf(2), spec_leaf(3)),
        ))
        .expect("tree is valid");

        assert_ne!(left_heavy.root_hash(), right_heavy.root_hash());
    }

    #[test]
    fn swapping_siblings_keeps_root() {
        let ab = ScriptTree::build(TreeSpec::pair(spec_leaf(1), spec_leaf(2))).expect("valid");
        let ba = ScriptTree::build(TreeSpec::pair(spec_leaf(2), spec_leaf(1))).expect("valid");

        assert_eq!(ab.root_hash(), ba.root_hash());
    }

    #[test]
    fn groups_must_have_two_children() {
        assert_eq!(
            ScriptTree::build(TreeSpec::Group(vec![spec_leaf(1)])),
            Err(TreeError::InvalidGroupSize(1))
        );
        assert_eq!(
            ScriptTree::build(TreeSpec::Group(vec![spec_leaf(1), spec_leaf(2), spec_leaf(3)])),
            Err(TreeError::InvalidGroupSize(3))
        );
        assert_eq!(
            ScriptTree::build(TreeSpec::pair(spec_leaf(1), TreeSpec::Group(vec![]))),
            Err(TreeError::InvalidGroupSize(0))
        );
    }

    #[test]
    fn missing_leaf_is_reported() {
        let tree = ScriptTree::build(TreeSpec::pair(spec_leaf(1), spec_leaf(2))).expect("valid");

        assert_eq!(
            tree.merkle_path(2),
            Err(TreeError::LeafNotFound {
                index: 2,
                num_leaves: 2
            })
        );
        assert!(tree.leaf(5).is_err());
    }

    #[test]
    fn depth_is_bounded() {
        let mut spec = spec_leaf(0);
        for i in 0..TAPROOT_CONTROL_MAX_NODE_COUNT {
            spec = TreeSpec::pair(spec, spec_leaf(i as u8));
        }
        let tree = ScriptTree::build(spec.clone()).expect("128 levels are allowed");
        assert_eq!(tree.depth(), TAPROOT_CONTROL_MAX_NODE_COUNT);

        let too_deep = TreeSpec::pair(spec, spec_leaf(0xff));
        assert_eq!(
            ScriptTree::build(too_deep),
            Err(TreeError::TooDeep(TAPROOT_CONTROL_MAX_NODE_COUNT + 1))
        );

        assert_eq!(
            ScriptTree::from_branch(tree, ScriptTree::from_leaf(leaf(1))),
            Err(TreeError::TooDeep(TAPROOT_CONTROL_MAX_NODE_COUNT + 1))
        );
    }

    #[test]
    fn from_branch_matches_build() {
        let left = ScriptTree::build(TreeSpec::pair(spec_leaf(1), spec_leaf(2))).expect("valid");
        let right = ScriptTree::from_leaf(leaf(3));

        let combined = ScriptTree::from_branch(left, right).expect("valid");
        let built = ScriptTree::build(TreeSpec::pair(
            TreeSpec::pair(spec_leaf(1), spec_leaf(2)),
            spec_leaf(3),
        ))
        .expect("valid");

        assert_eq!(combined, built);
    }

    #[test]
    fn root_matches_bitcoin_taproot_builder() {
        let tree = ScriptTree::build(TreeSpec::pair(
            TreeSpec::pair(spec_leaf(0x51), spec_leaf(0x52)),
            spec_leaf(0x53),
        ))
        .expect("valid");

        let spend_info = TaprootBuilder::new()
            .add_leaf(2, ScriptBuf::from_bytes(vec![0x51]))
            .and_then(|builder| builder.add_leaf(2, ScriptBuf::from_bytes(vec![0x52])))
            .and_then(|builder| builder.add_leaf(1, ScriptBuf::from_bytes(vec![0x53])))
            .expect("valid builder")
            .finalize(SECP256K1, *UNSPENDABLE_INTERNAL_KEY)
            .expect("finalizable tree");

        let expected = spend_info.merkle_root().expect("tree has a root");
        assert_eq!(tree.root_hash().to_byte_array(), expected.to_byte_array());
    }

    #[test]
    fn tree_from_toml() {
        #[derive(Debug, Deserialize)]
        struct Descriptor {
            tree: ScriptTree,
        }

        let descriptor: Descriptor = toml::from_str(
            r#"
            tree = [[{ script = "51" }, { script = "52" }], { script = "53", leaf_version = 192 }]
            "#,
        )
        .expect("must parse tree");

        let expected = ScriptTree::build(TreeSpec::pair(
            TreeSpec::pair(spec_leaf(0x51), spec_leaf(0x52)),
            spec_leaf(0x53),
        ))
        .expect("valid");
        assert_eq!(descriptor.tree, expected);

        let bad = toml::from_str::<Descriptor>(r#"tree = [{ script = "51" }]"#);
        assert!(bad.is_err(), "single-child groups must be rejected");
    }

    proptest! {
        #[test]
        fn every_merkle_path_verifies(spec in arb_tree_spec()) {
            let tree = ScriptTree::build(spec).expect("generated trees are binary");
            let root = tree.root_hash();

            for (index, leaf) in tree.leaves().into_iter().enumerate() {
                let path = tree.merkle_path(index).expect("leaf exists");
                prop_assert!(path.len() <= tree.depth());
                prop_assert!(verify_merkle_path(leaf.leaf_hash(), &path, root));
            }
        }

        #[test]
        fn spec_roundtrip_preserves_root(spec in arb_tree_spec()) {
            let tree = ScriptTree::build(spec).expect("generated trees are binary");
            let rebuilt = ScriptTree::build(tree.to_spec()).expect("roundtrip is valid");

            prop_assert_eq!(rebuilt.root_hash(), tree.root_hash());
        }
    }
}
