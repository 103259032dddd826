//! Which trees a character holds, and what a class change does to them.

use {
    crate::{
        effects::{self, ScriptHook},
        error::TechTreeError,
        graph::UnlockGraph,
        host::EffectContext,
        operations::{Refund, TechTreeRules, reset_instance},
    },
    bevy::prelude::*,
    tech_tree_assets::{ClassId, NodeDefinition, TreeUid},
    tech_tree_components::{TechTreeProgress, TreeInstance, TreeOrigin},
    tech_tree_resources::NodeCatalog,
};

/// Fresh progress for a new character: its own starting trees plus the trees
/// of the class it starts in.
pub fn initialize_progress(
    catalog: &NodeCatalog,
    starting_trees: &[TreeUid],
    class: ClassId,
) -> TechTreeProgress {
    let mut progress = TechTreeProgress::default();
    for tree_uid in starting_trees {
        if catalog.find_tree(tree_uid).is_some() {
            progress.push(TreeInstance::new(tree_uid.clone(), TreeOrigin::CharacterOwned));
        } else {
            warn!(tree = %tree_uid, "starting tree is not in the catalog");
        }
    }
    ensure_class_trees(catalog, &mut progress, class);
    progress
}

/// Adds a character-owned instance of a catalog tree.
///
/// Returns `Ok(false)` when the character already owns one.
pub fn grant_tree(
    catalog: &NodeCatalog,
    progress: &mut TechTreeProgress,
    tree_uid: &str,
) -> Result<bool, TechTreeError> {
    if catalog.find_tree(tree_uid).is_none() {
        return Err(TechTreeError::UnknownTree(tree_uid.to_string()));
    }
    let owned = progress
        .trees
        .iter()
        .any(|tree| tree.tree_uid == tree_uid && tree.origin == TreeOrigin::CharacterOwned);
    if owned {
        return Ok(false);
    }
    progress.push(TreeInstance::new(tree_uid, TreeOrigin::CharacterOwned));
    Ok(true)
}

/// Instantiates the trees bound to `class` the first time the character
/// holds it. Returns how many instances were added.
pub fn ensure_class_trees(
    catalog: &NodeCatalog,
    progress: &mut TechTreeProgress,
    class: ClassId,
) -> usize {
    if !progress.initialized_classes.insert(class) {
        return 0;
    }
    let bound = catalog.class_trees(class);
    for tree_uid in bound {
        progress.push(TreeInstance::new(tree_uid.clone(), TreeOrigin::ClassOwned(class)));
    }
    if !bound.is_empty() {
        debug!(class, trees = bound.len(), "Class trees instantiated");
    }
    bound.len()
}

/// Instances a tree menu shows while the character holds `class`.
pub fn visible_trees(progress: &TechTreeProgress, class: ClassId) -> Vec<&TreeInstance> {
    progress
        .trees
        .iter()
        .filter(|tree| tree.origin == TreeOrigin::CharacterOwned || tree.origin.is_bound_to(class))
        .collect()
}

/// Switches the character to `new_class` and rebinds its trees.
///
/// Every bulk step walks a snapshot of the instance list taken when the step
/// starts; scripts run by an earlier step cannot disturb a later one.
pub fn change_class(
    rules: TechTreeRules,
    progress: &mut TechTreeProgress,
    ctx: &mut EffectContext,
    new_class: ClassId,
) {
    let policy = rules.settings.class_change;
    let old_class = ctx.character.class_id();
    let switched = old_class != new_class;

    progress.previous_class = Some(old_class);
    progress.last_active = progress.active_snapshot();

    ctx.character.set_class(new_class);

    if policy.reset_class_trees && switched {
        for instance in progress.trees.iter_mut() {
            if instance.origin.is_bound_to(old_class) {
                reset_instance(rules, instance, ctx, Refund::ToOriginClass);
            }
        }
    }

    if policy.unlearn_abilities {
        for_active_nodes(
            rules,
            progress,
            |origin| origin.is_bound_elsewhere(new_class),
            |node| effects::revoke_abilities(ctx.character, node),
        );
    }

    if policy.remove_stats && switched {
        for_active_nodes(
            rules,
            progress,
            |origin| origin.is_bound_to(old_class),
            |node| effects::apply_stats(ctx.character, node, true),
        );
    }

    if policy.run_deactivate_scripts && switched {
        for_active_tree_nodes(
            rules,
            progress,
            |origin| origin.is_bound_to(old_class),
            |tree_uid, node| effects::run_script(ctx, tree_uid, node, ScriptHook::Deactivate),
        );
    }

    ensure_class_trees(rules.catalog, progress, new_class);

    // switches of trees left behind flip back first, so the trees still held
    // win when both name the same switch
    for_active_nodes(
        rules,
        progress,
        |origin| origin.is_bound_elsewhere(new_class),
        |node| effects::set_switches(ctx.switches, node, true),
    );
    for_active_nodes(
        rules,
        progress,
        |origin| !origin.is_bound_elsewhere(new_class),
        |node| effects::set_switches(ctx.switches, node, false),
    );

    if policy.relearn_abilities {
        for_active_nodes(
            rules,
            progress,
            |origin| origin.is_bound_to(new_class),
            |node| effects::grant_abilities(ctx.character, node),
        );
    }

    if policy.readd_stats && switched {
        for_active_nodes(
            rules,
            progress,
            |origin| origin.is_bound_to(new_class),
            |node| effects::apply_stats(ctx.character, node, false),
        );
    }

    if policy.run_activate_scripts && switched {
        for_active_tree_nodes(
            rules,
            progress,
            |origin| origin.is_bound_to(new_class),
            |tree_uid, node| effects::run_script(ctx, tree_uid, node, ScriptHook::Activate),
        );
    }

    info!(
        hero = %ctx.character.name(),
        from = old_class,
        to = new_class,
        "Class changed"
    );
}

fn for_active_nodes(
    rules: TechTreeRules,
    progress: &TechTreeProgress,
    select: impl Fn(TreeOrigin) -> bool,
    mut each: impl FnMut(&NodeDefinition),
) {
    for_active_tree_nodes(rules, progress, select, |_, node| each(node));
}

/// Calls `each` for every active node of every selected instance, walking a
/// snapshot of the instances.
fn for_active_tree_nodes(
    rules: TechTreeRules,
    progress: &TechTreeProgress,
    select: impl Fn(TreeOrigin) -> bool,
    mut each: impl FnMut(&str, &NodeDefinition),
) {
    let snapshot: Vec<TreeInstance> = progress
        .trees
        .iter()
        .filter(|instance| select(instance.origin))
        .cloned()
        .collect();

    for instance in &snapshot {
        let Some(tree) = rules.catalog.find_tree(&instance.tree_uid) else {
            warn!(tree = %instance.tree_uid, "held tree is not in the catalog");
            continue;
        };
        for node in UnlockGraph::new(tree, instance).active_nodes() {
            each(&instance.tree_uid, node);
        }
    }
}
