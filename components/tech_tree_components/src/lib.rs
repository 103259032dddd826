//! Per-character tech tree state.
//!
//! A `TreeInstance` is a lightweight overlay on a catalog tree: it names the
//! tree by uid and records which node uids are active. Node shapes are always
//! read from the shared `NodeCatalog`. The costs and effects an activation
//! applied are kept next to the active flag, so they can be undone exactly
//! after the catalog changes.

use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    std::collections::{BTreeMap, BTreeSet},
    tech_tree_assets::{ClassId, NodeCosts, NodeDefinition, NodeEffects, NodeUid, TreeUid},
};

/// Where a character got a tree instance from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeOrigin {
    /// Part of the character's own allotment; never affected by class changes.
    #[default]
    CharacterOwned,
    /// Granted by holding this class.
    ClassOwned(ClassId),
}

impl TreeOrigin {
    pub fn class(self) -> Option<ClassId> {
        match self {
            TreeOrigin::CharacterOwned => None,
            TreeOrigin::ClassOwned(class) => Some(class),
        }
    }

    /// Class-owned by exactly `class`.
    pub fn is_bound_to(self, class: ClassId) -> bool {
        self == TreeOrigin::ClassOwned(class)
    }

    /// Class-owned by any class other than `class`.
    pub fn is_bound_elsewhere(self, class: ClassId) -> bool {
        matches!(self, TreeOrigin::ClassOwned(owner) if owner != class)
    }
}

/// The price and payload a node had when it was activated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedNode {
    #[serde(default)]
    pub costs: NodeCosts,
    #[serde(default)]
    pub effects: NodeEffects,
}

impl AppliedNode {
    pub fn of(node: &NodeDefinition) -> Self {
        Self {
            costs: node.costs.clone(),
            effects: node.on_activate.clone(),
        }
    }

    /// A definition carrying the recorded price and payload under `uid`.
    pub fn to_definition(&self, uid: &str) -> NodeDefinition {
        NodeDefinition {
            uid: uid.to_string(),
            costs: self.costs.clone(),
            on_activate: self.effects.clone(),
            ..default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeInstance {
    pub tree_uid: TreeUid,
    pub origin: TreeOrigin,
    active: BTreeSet<NodeUid>,
    /// What each active node applied, when it was activated with a payload.
    #[serde(default)]
    applied: BTreeMap<NodeUid, AppliedNode>,
}

impl TreeInstance {
    pub fn new(tree_uid: impl Into<TreeUid>, origin: TreeOrigin) -> Self {
        Self {
            tree_uid: tree_uid.into(),
            origin,
            active: BTreeSet::new(),
            applied: BTreeMap::new(),
        }
    }

    pub fn is_active(&self, node_uid: &str) -> bool {
        self.active.contains(node_uid)
    }

    /// Marks the node active. Returns false if it already was.
    pub fn activate(&mut self, node_uid: &str) -> bool {
        self.active.insert(node_uid.to_string())
    }

    /// Marks the node active and records the costs and effects it applies.
    /// Returns false if it already was active.
    pub fn activate_applied(&mut self, node: &NodeDefinition) -> bool {
        self.applied.insert(node.uid.clone(), AppliedNode::of(node));
        self.activate(&node.uid)
    }

    /// Marks the node inactive and forgets what it applied. Returns false if
    /// it already was.
    ///
    /// Children that depend on the node stay active.
    pub fn deactivate(&mut self, node_uid: &str) -> bool {
        self.applied.remove(node_uid);
        self.active.remove(node_uid)
    }

    /// What the node applied on activation, if it was recorded.
    pub fn applied(&self, node_uid: &str) -> Option<&AppliedNode> {
        self.applied.get(node_uid)
    }

    pub fn active_node_ids(&self) -> &BTreeSet<NodeUid> {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Everything the tech tree engine tracks for one character.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechTreeProgress {
    pub trees: Vec<TreeInstance>,
    /// Classes whose trees have already been instantiated for this character.
    pub initialized_classes: BTreeSet<ClassId>,
    /// Class held before the most recent class change.
    pub previous_class: Option<ClassId>,
    /// Active nodes per tree as they were when the last class change started.
    pub last_active: BTreeMap<TreeUid, BTreeSet<NodeUid>>,
}

impl TechTreeProgress {
    /// First instance of the tree.
    pub fn instance(&self, tree_uid: &str) -> Option<&TreeInstance> {
        self.trees.iter().find(|tree| tree.tree_uid == tree_uid)
    }

    pub fn instance_mut(&mut self, tree_uid: &str) -> Option<&mut TreeInstance> {
        self.trees.iter_mut().find(|tree| tree.tree_uid == tree_uid)
    }

    pub fn has_tree(&self, tree_uid: &str) -> bool {
        self.instance(tree_uid).is_some()
    }

    /// Index of every instance of the tree, in ownership order.
    pub fn instance_indices(&self, tree_uid: &str) -> Vec<usize> {
        self.trees
            .iter()
            .enumerate()
            .filter(|(_, tree)| tree.tree_uid == tree_uid)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn push(&mut self, instance: TreeInstance) {
        self.trees.push(instance);
    }

    /// Active node ids keyed by tree uid, merged across duplicate instances.
    pub fn active_snapshot(&self) -> BTreeMap<TreeUid, BTreeSet<NodeUid>> {
        let mut snapshot: BTreeMap<TreeUid, BTreeSet<NodeUid>> = BTreeMap::new();
        for tree in &self.trees {
            snapshot
                .entry(tree.tree_uid.clone())
                .or_default()
                .extend(tree.active_node_ids().iter().cloned());
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_binding() {
        let own = TreeOrigin::CharacterOwned;
        let class = TreeOrigin::ClassOwned(3);

        assert!(!own.is_bound_to(3));
        assert!(!own.is_bound_elsewhere(3));
        assert!(class.is_bound_to(3));
        assert!(class.is_bound_elsewhere(4));
        assert_eq!(class.class(), Some(3));
    }

    #[test]
    fn test_activate_reports_transition() {
        let mut tree = TreeInstance::new("HOLY", TreeOrigin::CharacterOwned);

        assert!(tree.activate("HOLY01"));
        assert!(!tree.activate("HOLY01"));
        assert!(tree.is_active("HOLY01"));
        assert!(tree.deactivate("HOLY01"));
        assert!(!tree.deactivate("HOLY01"));
        assert_eq!(tree.active_count(), 0);
    }

    #[test]
    fn test_applied_payload_follows_the_active_flag() {
        let mut tree = TreeInstance::new("HOLY", TreeOrigin::CharacterOwned);
        let mut node = NodeDefinition {
            uid: "HOLY01".to_string(),
            ..default()
        };
        node.on_activate.stats.insert(0, 5);
        node.costs.points = 2;

        assert!(tree.activate_applied(&node));
        node.on_activate.stats.insert(0, 10);

        let applied = tree.applied("HOLY01").unwrap();
        assert_eq!(applied.effects.stats.get(&0), Some(&5));
        assert_eq!(applied.to_definition("HOLY01").costs.points, 2);

        assert!(tree.deactivate("HOLY01"));
        assert!(tree.applied("HOLY01").is_none());
    }

    #[test]
    fn test_first_instance_wins() {
        let mut progress = TechTreeProgress::default();
        progress.push(TreeInstance::new("HOLY", TreeOrigin::CharacterOwned));
        progress.push(TreeInstance::new("HOLY", TreeOrigin::ClassOwned(2)));

        progress.instance_mut("HOLY").unwrap().activate("HOLY01");

        assert_eq!(progress.instance_indices("HOLY"), vec![0, 1]);
        assert!(progress.trees[0].is_active("HOLY01"));
        assert!(!progress.trees[1].is_active("HOLY01"));
        assert_eq!(progress.active_snapshot()["HOLY"].len(), 1);
    }
}
