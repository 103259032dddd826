//! Eligibility rules over one tree instance.

use {
    crate::host::SwitchStore,
    std::collections::BTreeSet,
    tech_tree_assets::{NodeDefinition, NodeUid, TreeDefinition},
    tech_tree_components::TreeInstance,
    tech_tree_resources::TechTreeSettings,
};

/// Read-only view pairing a catalog tree with a character's instance of it.
#[derive(Clone, Copy)]
pub struct UnlockGraph<'a> {
    tree: &'a TreeDefinition,
    instance: &'a TreeInstance,
}

impl<'a> UnlockGraph<'a> {
    pub fn new(tree: &'a TreeDefinition, instance: &'a TreeInstance) -> Self {
        Self { tree, instance }
    }

    pub fn tree(&self) -> &'a TreeDefinition {
        self.tree
    }

    /// Listed parents that exist in the tree and are active. A parent listed
    /// twice counts once; one that does not resolve never counts.
    pub fn active_parent_count(&self, node: &NodeDefinition) -> u32 {
        let unique: BTreeSet<&str> = node.parents.iter().map(String::as_str).collect();
        unique
            .into_iter()
            .filter(|parent| self.tree.find_node(parent).is_some())
            .filter(|parent| self.instance.is_active(parent))
            .count() as u32
    }

    pub fn is_unlockable(&self, node: &NodeDefinition) -> bool {
        self.active_parent_count(node) >= node.needed_parents
    }

    pub fn is_visible(
        &self,
        node: &NodeDefinition,
        switches: &dyn SwitchStore,
        active_always_visible: bool,
    ) -> bool {
        if active_always_visible && self.instance.is_active(&node.uid) {
            return true;
        }
        switches.all_on(&node.visibility.required_switches)
    }

    pub fn can_be_unlocked(
        &self,
        node: &NodeDefinition,
        level: u32,
        switches: &dyn SwitchStore,
        settings: &TechTreeSettings,
    ) -> bool {
        if self.instance.is_active(&node.uid)
            || settings.display_only
            || !self.is_visible(node, switches, settings.active_nodes_always_visible)
        {
            return false;
        }
        if node
            .level_requirement
            .is_some_and(|required| level < required)
        {
            return false;
        }
        self.is_unlockable(node)
    }

    pub fn is_active(&self, node_uid: &str) -> bool {
        self.instance.is_active(node_uid)
    }

    pub fn active_node_ids(&self) -> &'a BTreeSet<NodeUid> {
        self.instance.active_node_ids()
    }

    /// Active nodes that still resolve in the catalog tree, in the order the
    /// tree lists them.
    pub fn active_nodes(self) -> impl Iterator<Item = &'a NodeDefinition> + 'a {
        let instance = self.instance;
        self.tree
            .nodes
            .iter()
            .filter(move |node| instance.is_active(&node.uid))
    }
}
