use {
    tech_tree_assets::{NodeUid, TreeUid},
    thiserror::Error,
};

/// Why a command did nothing. Observers log these and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TechTreeError {
    #[error("tree {0} is not in the catalog or not held by this character")]
    UnknownTree(TreeUid),
    #[error("tree {tree} has no node {node}")]
    UnknownNode { tree: TreeUid, node: NodeUid },
    #[error("node {node} of tree {tree} cannot be unlocked")]
    NotUnlockable { tree: TreeUid, node: NodeUid },
    #[error("node {node} of tree {tree} is not affordable")]
    Unaffordable { tree: TreeUid, node: NodeUid },
    #[error("node {node} of tree {tree} is already active")]
    AlreadyActive { tree: TreeUid, node: NodeUid },
    #[error("node {node} of tree {tree} is not active")]
    NotActive { tree: TreeUid, node: NodeUid },
}

impl TechTreeError {
    pub(crate) fn unknown_node(tree: &str, node: &str) -> Self {
        Self::UnknownNode {
            tree: tree.to_string(),
            node: node.to_string(),
        }
    }
}
