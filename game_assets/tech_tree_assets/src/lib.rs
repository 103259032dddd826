use {
    bevy::prelude::*,
    bevy_common_assets::ron::RonAssetPlugin,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub type TreeUid = String;
pub type NodeUid = String;
pub type AbilityId = u32;
pub type SwitchId = u32;
pub type ItemId = u32;
pub type ClassId = u32;
pub type EventId = u32;
/// Index into the eight base parameters of a character.
pub type StatSlot = u8;

/// Number of stat slots a node may modify (`0..STAT_SLOTS`).
pub const STAT_SLOTS: StatSlot = 8;

pub struct TechTreeAssetsPlugin;

impl Plugin for TechTreeAssetsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<CatalogDefinition>::new(&["techtrees.ron"]));
    }
}

/// The top-level catalog document: every tree plus the class binding table.
///
/// Maps are `BTreeMap` so that serializing the same document always yields
/// the same bytes, which the catalog content hash relies on.
#[derive(Asset, TypePath, Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CatalogDefinition {
    pub trees: Vec<TreeDefinition>,
    /// Trees a class grants to whoever holds it, by tree uid.
    #[serde(default)]
    pub class_trees: BTreeMap<ClassId, Vec<TreeUid>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TreeDefinition {
    pub uid: TreeUid,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<u32>,
    /// Background asset shown behind the tree.
    #[serde(default)]
    pub background: Option<String>,
    /// Whether the menu shows the party currency next to this tree.
    #[serde(default)]
    pub show_currency: bool,
    /// Tree-wide activation animation, used when a node has none.
    #[serde(default)]
    pub animation_id: Option<u32>,
    pub nodes: Vec<NodeDefinition>,
}

impl TreeDefinition {
    /// First node with the given uid.
    pub fn find_node(&self, uid: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|node| node.uid == uid)
    }

    /// First node occupying `(depth, lane)`.
    ///
    /// Coordinates are not required to be unique; when two nodes share a
    /// position the one listed first wins.
    pub fn find_node_at(&self, depth: u32, lane: u32) -> Option<&NodeDefinition> {
        self.nodes
            .iter()
            .find(|node| node.depth == depth && node.lane == lane)
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn max_lanes(&self) -> u32 {
        self.nodes.iter().map(|node| node.lane).max().unwrap_or(0)
    }
}

/// A single unlockable point of a tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeDefinition {
    pub uid: NodeUid,
    /// Unlock-progression axis, starting at 1.
    pub depth: u32,
    /// Parallel-track axis, starting at 1.
    pub lane: u32,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<u32>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub parents: Vec<NodeUid>,
    /// How many of `parents` must be active, not necessarily all of them.
    #[serde(default)]
    pub needed_parents: u32,
    #[serde(default)]
    pub level_requirement: Option<u32>,
    #[serde(default)]
    pub visibility: NodeVisibility,
    #[serde(default)]
    pub costs: NodeCosts,
    #[serde(default)]
    pub on_activate: NodeEffects,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeVisibility {
    /// All of these switches must be on for the node to be shown.
    #[serde(default)]
    pub required_switches: Vec<SwitchId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeCosts {
    /// Party currency.
    #[serde(default)]
    pub currency: u32,
    /// Class points of the acting character's current class.
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub items: Vec<ItemCost>,
    #[serde(default)]
    pub weapons: Vec<ItemCost>,
    #[serde(default)]
    pub armors: Vec<ItemCost>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ItemCost {
    pub id: ItemId,
    pub amount: u32,
}

/// Payload applied when a node turns active and reverted when it turns inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeEffects {
    #[serde(default)]
    pub switches: Vec<SwitchToggle>,
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
    /// One-shot events, fired on a fresh activation only.
    #[serde(default)]
    pub triggered_events: Vec<TriggeredEvent>,
    /// Additive deltas per stat slot.
    #[serde(default)]
    pub stats: BTreeMap<StatSlot, i32>,
    /// Key of a registered script handler run on activation.
    #[serde(default)]
    pub activate_script: Option<String>,
    /// Key of a registered script handler run on deactivation.
    #[serde(default)]
    pub deactivate_script: Option<String>,
    #[serde(default)]
    pub animation_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwitchToggle {
    pub id: SwitchId,
    pub value: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TriggeredEvent {
    pub id: EventId,
    /// Ask the host to leave the tree menu once the event is queued.
    #[serde(default)]
    pub closes_ui: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLY: &str = r#"(
        trees: [
            (
                uid: "HOLY",
                header: "Saint",
                nodes: [
                    (
                        uid: "HOLY01",
                        depth: 1,
                        lane: 1,
                        costs: (points: 200),
                        on_activate: (
                            switches: [(id: 5, value: true)],
                            abilities: [141, 144],
                            triggered_events: [(id: 5)],
                        ),
                    ),
                    (
                        uid: "HOLY02",
                        depth: 2,
                        lane: 1,
                        parents: ["HOLY01"],
                        needed_parents: 1,
                        on_activate: (stats: {2: 5}),
                    ),
                ],
            ),
        ],
        class_trees: {3: ["HOLY"]},
    )"#;

    #[test]
    fn test_catalog_document_parses_with_defaults() {
        let catalog: CatalogDefinition = ron::from_str(HOLY).unwrap();
        let tree = &catalog.trees[0];

        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[0].costs.points, 200);
        assert_eq!(tree.nodes[0].costs.currency, 0);
        assert!(!tree.nodes[0].on_activate.triggered_events[0].closes_ui);
        assert_eq!(tree.nodes[1].on_activate.stats.get(&2), Some(&5));
        assert_eq!(catalog.class_trees.get(&3), Some(&vec!["HOLY".to_string()]));
    }

    #[test]
    fn test_find_node_at_first_match_wins() {
        let mut catalog: CatalogDefinition = ron::from_str(HOLY).unwrap();
        let tree = &mut catalog.trees[0];
        tree.nodes[1].depth = 1;

        let found = tree.find_node_at(1, 1).unwrap();
        assert_eq!(found.uid, "HOLY01");
        assert!(tree.find_node_at(2, 1).is_none());
    }

    #[test]
    fn test_bounds_cover_every_node() {
        let catalog: CatalogDefinition = ron::from_str(HOLY).unwrap();
        let tree = &catalog.trees[0];

        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.max_lanes(), 1);
    }
}
