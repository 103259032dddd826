//! The command surface: everything a game or a test drives the engine with.
//!
//! Commands return `Err` when they did nothing. Effects, costs and the active
//! flag are always sequenced here, never by the callers.

use {
    crate::{
        effects::{apply_on_activate, apply_on_deactivate},
        error::TechTreeError,
        graph::UnlockGraph,
        host::EffectContext,
        ledger::{self, CostKind},
    },
    bevy::prelude::*,
    tech_tree_assets::{NodeDefinition, TreeDefinition},
    tech_tree_components::{TechTreeProgress, TreeInstance},
    tech_tree_resources::{NodeCatalog, TechTreeSettings},
};

/// Shared read-only inputs of every command.
#[derive(Clone, Copy)]
pub struct TechTreeRules<'a> {
    pub catalog: &'a NodeCatalog,
    pub settings: &'a TechTreeSettings,
}

/// Where the price of reset nodes goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refund {
    Nothing,
    /// Points go to the class currently held.
    ToCurrentClass,
    /// Points go to the class that granted the instance, or to the current
    /// class for character-owned instances.
    ToOriginClass,
}

impl Refund {
    pub fn from_flag(refund: bool, target: Refund) -> Self {
        if refund { target } else { Refund::Nothing }
    }
}

fn lookup<'a>(
    rules: TechTreeRules<'a>,
    progress: &TechTreeProgress,
    tree_uid: &str,
    node_uid: &str,
) -> Result<(&'a TreeDefinition, &'a NodeDefinition), TechTreeError> {
    if !progress.has_tree(tree_uid) {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    }
    let tree = rules
        .catalog
        .find_tree(tree_uid)
        .ok_or_else(|| TechTreeError::UnknownTree(tree_uid.to_string()))?;
    let node = tree
        .find_node(node_uid)
        .ok_or_else(|| TechTreeError::unknown_node(tree_uid, node_uid))?;
    Ok((tree, node))
}

/// Activates a node for free. Effects apply as a fresh activation.
pub fn activate_node(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    tree_uid: &str,
    node_uid: &str,
) -> Result<(), TechTreeError> {
    let (_, node) = lookup(rules, progress, tree_uid, node_uid)?;
    let Some(instance) = progress.instance_mut(tree_uid) else {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    };
    if instance.is_active(node_uid) {
        return Err(TechTreeError::AlreadyActive {
            tree: tree_uid.to_string(),
            node: node_uid.to_string(),
        });
    }

    apply_on_activate(ctx, tree_uid, node, false);
    instance.activate_applied(node);
    info!(hero = %ctx.character.name(), tree = %tree_uid, node = %node_uid, "Node activated");
    Ok(())
}

/// Deactivates a node without refunding it, reverting what its activation
/// applied. Children stay active.
pub fn deactivate_node(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    tree_uid: &str,
    node_uid: &str,
) -> Result<(), TechTreeError> {
    let (_, node) = lookup(rules, progress, tree_uid, node_uid)?;
    let Some(instance) = progress.instance_mut(tree_uid) else {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    };
    if !instance.is_active(node_uid) {
        return Err(TechTreeError::NotActive {
            tree: tree_uid.to_string(),
            node: node_uid.to_string(),
        });
    }

    let recorded = instance
        .applied(node_uid)
        .map(|applied| applied.to_definition(node_uid));
    apply_on_deactivate(ctx, tree_uid, recorded.as_ref().unwrap_or(node));
    instance.deactivate(node_uid);
    info!(hero = %ctx.character.name(), tree = %tree_uid, node = %node_uid, "Node deactivated");
    Ok(())
}

/// Player purchase: eligibility, price, effects, active flag.
///
/// Returns the activation animation the menu should play.
pub fn unlock_node(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    tree_uid: &str,
    node_uid: &str,
) -> Result<Option<u32>, TechTreeError> {
    let (tree, node) = lookup(rules, progress, tree_uid, node_uid)?;
    let Some(instance) = progress.instance_mut(tree_uid) else {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    };

    if instance.is_active(node_uid) {
        return Err(TechTreeError::AlreadyActive {
            tree: tree_uid.to_string(),
            node: node_uid.to_string(),
        });
    }
    let graph = UnlockGraph::new(tree, instance);
    if !graph.can_be_unlocked(node, ctx.character.level(), &*ctx.switches, rules.settings) {
        return Err(TechTreeError::NotUnlockable {
            tree: tree_uid.to_string(),
            node: node_uid.to_string(),
        });
    }

    ledger::pay(&mut *ctx.character, tree_uid, node)?;
    apply_on_activate(ctx, tree_uid, node, false);
    instance.activate_applied(node);
    info!(hero = %ctx.character.name(), tree = %tree_uid, node = %node_uid, "Node unlocked");

    Ok(activation_animation(rules.settings, tree, node))
}

/// Animation for a node's activation: the node's own, else the tree's, else
/// the configured default.
pub fn activation_animation(
    settings: &TechTreeSettings,
    tree: &TreeDefinition,
    node: &NodeDefinition,
) -> Option<u32> {
    node.on_activate
        .animation_id
        .or(tree.animation_id)
        .or(settings.default_animation_id)
}

/// Deactivates every active node of one instance, reverting effects and
/// optionally refunding. Returns how many nodes were reset.
///
/// Each node is reverted with the costs and effects recorded when it was
/// activated, falling back to its current catalog definition. Nodes with
/// neither are cleared without effects.
pub fn reset_instance(
    rules: TechTreeRules,
    instance: &mut TreeInstance,
    ctx: &mut EffectContext,
    refund: Refund,
) -> usize {
    let active: Vec<String> = instance.active_node_ids().iter().cloned().collect();
    let tree = rules.catalog.find_tree(&instance.tree_uid);
    let refund_class = match refund {
        Refund::Nothing => None,
        Refund::ToCurrentClass => Some(None),
        Refund::ToOriginClass => Some(instance.origin.class()),
    };

    for node_uid in &active {
        let recorded = instance
            .applied(node_uid)
            .map(|applied| applied.to_definition(node_uid));
        match recorded
            .as_ref()
            .or_else(|| tree.and_then(|tree| tree.find_node(node_uid)))
        {
            Some(node) => {
                apply_on_deactivate(ctx, &instance.tree_uid, node);
                if let Some(class) = refund_class {
                    ledger::refund(&mut *ctx.character, node, class);
                }
            }
            None => warn!(
                hero = %ctx.character.name(),
                tree = %instance.tree_uid,
                node = %node_uid,
                "resetting an unrecorded node missing from the catalog, effects skipped"
            ),
        }
        instance.deactivate(node_uid);
    }
    active.len()
}

/// Resets every instance of the tree. Refunds go to each instance's origin
/// class.
pub fn reset_tree(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    tree_uid: &str,
    refund: bool,
) -> Result<usize, TechTreeError> {
    let indices = progress.instance_indices(tree_uid);
    if indices.is_empty() {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    }

    let refund = Refund::from_flag(refund, Refund::ToOriginClass);
    let reset: usize = indices
        .into_iter()
        .map(|index| reset_instance(rules, &mut progress.trees[index], ctx, refund))
        .sum();
    info!(hero = %ctx.character.name(), tree = %tree_uid, nodes = reset, ?refund, "Tree reset");
    Ok(reset)
}

/// Resets every instance the character holds. Refunds go to the current class.
pub fn reset_all_trees(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    refund: bool,
) -> usize {
    let refund = Refund::from_flag(refund, Refund::ToCurrentClass);
    let reset: usize = progress
        .trees
        .iter_mut()
        .map(|instance| reset_instance(rules, instance, ctx, refund))
        .sum();
    info!(hero = %ctx.character.name(), nodes = reset, ?refund, "All trees reset");
    reset
}

/// Active nodes across every instance of the tree.
pub fn active_node_count(progress: &TechTreeProgress, tree_uid: &str) -> usize {
    progress
        .trees
        .iter()
        .filter(|instance| instance.tree_uid == tree_uid)
        .map(TreeInstance::active_count)
        .sum()
}

pub fn is_node_active(progress: &TechTreeProgress, tree_uid: &str, node_uid: &str) -> bool {
    progress
        .instance(tree_uid)
        .is_some_and(|instance| instance.is_active(node_uid))
}

/// What the active nodes of a tree cost in total, for one cost kind.
pub fn cost_sum(
    catalog: &NodeCatalog,
    progress: &TechTreeProgress,
    tree_uid: &str,
    kind: CostKind,
) -> u32 {
    let Some(tree) = catalog.find_tree(tree_uid) else {
        return 0;
    };
    progress
        .trees
        .iter()
        .filter(|instance| instance.tree_uid == tree_uid)
        .flat_map(|instance| UnlockGraph::new(tree, instance).active_nodes())
        .map(|node| ledger::cost_of(node, kind))
        .sum()
}

/// Re-derives every instance from the current catalog.
///
/// Each instance is reset without refund, undoing what was recorded at
/// activation, and its previously active nodes that still exist are
/// activated again from their new definitions as a replay, so one-shot
/// events never fire twice. Instances whose tree left the catalog are kept as they
/// are.
pub fn resync_trees(rules: TechTreeRules, progress: &mut TechTreeProgress, ctx: &mut EffectContext) {
    for instance in progress.trees.iter_mut() {
        let Some(tree) = rules.catalog.find_tree(&instance.tree_uid) else {
            warn!(
                hero = %ctx.character.name(),
                tree = %instance.tree_uid,
                "tree is no longer in the catalog, keeping the instance untouched"
            );
            continue;
        };

        let previously_active: Vec<String> = instance.active_node_ids().iter().cloned().collect();
        reset_instance(rules, instance, ctx, Refund::Nothing);

        for node_uid in &previously_active {
            let Some(node) = tree.find_node(node_uid) else {
                debug!(tree = %instance.tree_uid, node = %node_uid, "dropped during resync");
                continue;
            };
            apply_on_activate(ctx, &instance.tree_uid, node, true);
            instance.activate_applied(node);
        }
    }
    info!(hero = %ctx.character.name(), "Tech trees resynced with the catalog");
}
