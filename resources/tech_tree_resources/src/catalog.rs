//! The process-wide, read-only catalog of trees.

use {
    bevy::{platform::collections::HashMap, prelude::*},
    std::collections::{BTreeMap, BTreeSet},
    tech_tree_assets::{
        AbilityId, CatalogDefinition, ClassId, NodeDefinition, NodeUid, STAT_SLOTS, StatSlot,
        TreeDefinition, TreeUid,
    },
    thiserror::Error,
};

/// Problems found while loading a catalog. None of them stop the load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("tree {tree} node {node} grants ability {ability}, but only {limit} abilities exist")]
    UnknownAbility {
        tree: TreeUid,
        node: NodeUid,
        ability: AbilityId,
        limit: AbilityId,
    },
    #[error("tree {tree} node {node} lists parent {parent}, which is not in the tree")]
    UnknownParent {
        tree: TreeUid,
        node: NodeUid,
        parent: NodeUid,
    },
    #[error("tree {tree} node {node} needs {needed} parents but lists only {listed}")]
    NeededParentsExceedParents {
        tree: TreeUid,
        node: NodeUid,
        needed: u32,
        listed: usize,
    },
    #[error("tree {tree} node {node} changes stat slot {slot}, outside the eight base parameters")]
    InvalidStatSlot {
        tree: TreeUid,
        node: NodeUid,
        slot: StatSlot,
    },
    #[error("class {class} is bound to tree {tree}, which is not in the catalog")]
    UnknownClassTree { class: ClassId, tree: TreeUid },
    #[error("tree {0} is defined more than once, the first definition is used")]
    DuplicateTree(TreeUid),
    #[error("tree {tree} defines node {node} more than once")]
    DuplicateNode { tree: TreeUid, node: NodeUid },
    #[error("tree {tree} places {first} and {second} at depth {depth} lane {lane}")]
    OverlappingPosition {
        tree: TreeUid,
        depth: u32,
        lane: u32,
        first: NodeUid,
        second: NodeUid,
    },
}

/// Validated, indexed catalog shared by every character.
#[derive(Resource, Debug, Clone, Default)]
pub struct NodeCatalog {
    trees: Vec<TreeDefinition>,
    index: HashMap<TreeUid, usize>,
    class_trees: BTreeMap<ClassId, Vec<TreeUid>>,
    content_hash: u32,
}

impl NodeCatalog {
    /// Builds the catalog from a parsed document.
    ///
    /// Every validation problem is logged and returned; the catalog is built
    /// regardless. Abilities at or above `ability_limit` are removed from the
    /// node so that granting them does nothing.
    pub fn load_from(
        source: CatalogDefinition,
        ability_limit: Option<AbilityId>,
    ) -> (Self, Vec<ValidationError>) {
        let content_hash = content_hash(&source);
        let mut errors = Vec::new();

        let CatalogDefinition {
            trees: source_trees,
            class_trees: source_class_trees,
        } = source;

        let mut trees = Vec::with_capacity(source_trees.len());
        let mut index = HashMap::default();

        for mut tree in source_trees {
            if index.contains_key(&tree.uid) {
                errors.push(ValidationError::DuplicateTree(tree.uid.clone()));
                continue;
            }
            validate_tree(&mut tree, ability_limit, &mut errors);
            index.insert(tree.uid.clone(), trees.len());
            trees.push(tree);
        }

        let mut class_trees = BTreeMap::new();
        for (class, uids) in source_class_trees {
            let known: Vec<TreeUid> = uids
                .into_iter()
                .filter(|uid| {
                    let exists = index.contains_key(uid);
                    if !exists {
                        errors.push(ValidationError::UnknownClassTree {
                            class,
                            tree: uid.clone(),
                        });
                    }
                    exists
                })
                .collect();
            class_trees.insert(class, known);
        }

        for error in &errors {
            warn!(%error, "tech tree catalog validation");
        }
        info!(
            trees = trees.len(),
            hash = content_hash,
            problems = errors.len(),
            "Tech tree catalog loaded"
        );

        (
            Self {
                trees,
                index,
                class_trees,
                content_hash,
            },
            errors,
        )
    }

    pub fn find_tree(&self, uid: &str) -> Option<&TreeDefinition> {
        self.index.get(uid).map(|&position| &self.trees[position])
    }

    pub fn find_node(&self, tree_uid: &str, node_uid: &str) -> Option<&NodeDefinition> {
        self.find_tree(tree_uid)?.find_node(node_uid)
    }

    pub fn find_node_at(&self, tree_uid: &str, depth: u32, lane: u32) -> Option<&NodeDefinition> {
        self.find_tree(tree_uid)?.find_node_at(depth, lane)
    }

    /// Tree uids bound to `class`, in declaration order.
    pub fn class_trees(&self, class: ClassId) -> &[TreeUid] {
        self.class_trees
            .get(&class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn trees(&self) -> &[TreeDefinition] {
        &self.trees
    }

    /// CRC32 of the source document, used to notice catalog changes between
    /// a save and the current game data.
    pub fn content_hash(&self) -> u32 {
        self.content_hash
    }
}

fn content_hash(source: &CatalogDefinition) -> u32 {
    match ron::to_string(source) {
        Ok(serialized) => crc32fast::hash(serialized.as_bytes()),
        Err(error) => {
            warn!(%error, "could not serialize tech tree catalog for hashing");
            0
        }
    }
}

fn validate_tree(
    tree: &mut TreeDefinition,
    ability_limit: Option<AbilityId>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut positions: BTreeMap<(u32, u32), &str> = BTreeMap::new();

    for node in &tree.nodes {
        if !seen.insert(node.uid.as_str()) {
            errors.push(ValidationError::DuplicateNode {
                tree: tree.uid.clone(),
                node: node.uid.clone(),
            });
        }

        if let Some(first) = positions.get(&(node.depth, node.lane)) {
            errors.push(ValidationError::OverlappingPosition {
                tree: tree.uid.clone(),
                depth: node.depth,
                lane: node.lane,
                first: first.to_string(),
                second: node.uid.clone(),
            });
        } else {
            positions.insert((node.depth, node.lane), node.uid.as_str());
        }

        if node.needed_parents as usize > node.parents.len() {
            errors.push(ValidationError::NeededParentsExceedParents {
                tree: tree.uid.clone(),
                node: node.uid.clone(),
                needed: node.needed_parents,
                listed: node.parents.len(),
            });
        }

        for &slot in node.on_activate.stats.keys() {
            if slot >= STAT_SLOTS {
                errors.push(ValidationError::InvalidStatSlot {
                    tree: tree.uid.clone(),
                    node: node.uid.clone(),
                    slot,
                });
            }
        }
    }

    for node in &tree.nodes {
        for parent in &node.parents {
            if !seen.contains(parent.as_str()) {
                errors.push(ValidationError::UnknownParent {
                    tree: tree.uid.clone(),
                    node: node.uid.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let Some(limit) = ability_limit else {
        return;
    };

    for node in &mut tree.nodes {
        node.on_activate.abilities.retain(|&ability| {
            let valid = ability < limit;
            if !valid {
                errors.push(ValidationError::UnknownAbility {
                    tree: tree.uid.clone(),
                    node: node.uid.clone(),
                    ability,
                    limit,
                });
            }
            valid
        });
    }
}

#[cfg(test)]
mod tests {
    use {super::*, tech_tree_assets::NodeEffects};

    fn node(uid: &str, depth: u32, lane: u32, parents: &[&str], needed: u32) -> NodeDefinition {
        NodeDefinition {
            uid: uid.to_string(),
            depth,
            lane,
            parents: parents.iter().map(|p| p.to_string()).collect(),
            needed_parents: needed,
            ..default()
        }
    }

    fn tree(uid: &str, nodes: Vec<NodeDefinition>) -> TreeDefinition {
        TreeDefinition {
            uid: uid.to_string(),
            nodes,
            ..default()
        }
    }

    #[test]
    fn test_clean_catalog_has_no_errors() {
        let source = CatalogDefinition {
            trees: vec![tree(
                "FIRE",
                vec![node("A", 1, 1, &[], 0), node("B", 2, 1, &["A"], 1)],
            )],
            class_trees: BTreeMap::from([(2, vec!["FIRE".to_string()])]),
        };

        let (catalog, errors) = NodeCatalog::load_from(source, None);

        assert!(errors.is_empty());
        assert_eq!(catalog.find_node("FIRE", "B").unwrap().depth, 2);
        assert_eq!(catalog.find_node_at("FIRE", 1, 1).unwrap().uid, "A");
        assert_eq!(catalog.class_trees(2), ["FIRE".to_string()]);
        assert!(catalog.class_trees(9).is_empty());
        assert!(catalog.find_tree("ICE").is_none());
    }

    #[test]
    fn test_unknown_ability_is_stripped() {
        let mut granting = node("A", 1, 1, &[], 0);
        granting.on_activate = NodeEffects {
            abilities: vec![4, 120],
            ..default()
        };
        let source = CatalogDefinition {
            trees: vec![tree("FIRE", vec![granting])],
            ..default()
        };

        let (catalog, errors) = NodeCatalog::load_from(source, Some(100));

        assert_eq!(
            errors,
            vec![ValidationError::UnknownAbility {
                tree: "FIRE".to_string(),
                node: "A".to_string(),
                ability: 120,
                limit: 100,
            }]
        );
        assert_eq!(catalog.find_node("FIRE", "A").unwrap().on_activate.abilities, vec![4]);
    }

    #[test]
    fn test_structural_problems_are_reported() {
        let source = CatalogDefinition {
            trees: vec![
                tree(
                    "FIRE",
                    vec![
                        node("A", 1, 1, &[], 0),
                        node("B", 1, 1, &["A", "GHOST"], 3),
                    ],
                ),
                tree("FIRE", vec![]),
            ],
            class_trees: BTreeMap::from([(1, vec!["FIRE".to_string(), "ICE".to_string()])]),
        };

        let (catalog, errors) = NodeCatalog::load_from(source, None);

        assert!(errors.contains(&ValidationError::DuplicateTree("FIRE".to_string())));
        assert!(errors.contains(&ValidationError::UnknownParent {
            tree: "FIRE".to_string(),
            node: "B".to_string(),
            parent: "GHOST".to_string(),
        }));
        assert!(errors.contains(&ValidationError::NeededParentsExceedParents {
            tree: "FIRE".to_string(),
            node: "B".to_string(),
            needed: 3,
            listed: 2,
        }));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::OverlappingPosition { first, second, .. } if first == "A" && second == "B"
        )));
        assert_eq!(catalog.class_trees(1), ["FIRE".to_string()]);
        // the first definition is kept and lookups still resolve
        assert_eq!(catalog.find_tree("FIRE").unwrap().nodes.len(), 2);
        assert_eq!(catalog.find_node_at("FIRE", 1, 1).unwrap().uid, "A");
    }

    #[test]
    fn test_content_hash_tracks_changes() {
        let source = CatalogDefinition {
            trees: vec![tree("FIRE", vec![node("A", 1, 1, &[], 0)])],
            ..default()
        };
        let mut changed = source.clone();
        changed.trees[0].nodes[0].costs.currency = 10;

        let (first, _) = NodeCatalog::load_from(source.clone(), None);
        let (again, _) = NodeCatalog::load_from(source, None);
        let (other, _) = NodeCatalog::load_from(changed, None);

        assert_eq!(first.content_hash(), again.content_hash());
        assert_ne!(first.content_hash(), other.content_hash());
    }
}
