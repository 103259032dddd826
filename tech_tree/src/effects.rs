//! Applies and reverts a node's payload.
//!
//! The granular helpers are public because a class change runs them one
//! kind at a time over many nodes.

use {
    crate::host::{
        CharacterStore, EffectContext, EventDispatcher, ScriptRunner, ScriptScope, SwitchStore,
    },
    bevy::prelude::*,
    tech_tree_assets::{NodeDefinition, STAT_SLOTS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHook {
    Activate,
    Deactivate,
}

/// Applies the node's payload. A replay (load or catalog resync) never fires
/// the node's one-shot events.
pub fn apply_on_activate(
    ctx: &mut EffectContext,
    tree_uid: &str,
    node: &NodeDefinition,
    replay: bool,
) {
    set_switches(ctx.switches, node, false);
    grant_abilities(ctx.character, node);
    apply_stats(ctx.character, node, false);
    if !replay {
        fire_events(ctx.events, node);
    }
    run_script(ctx, tree_uid, node, ScriptHook::Activate);
}

/// Reverts everything [`apply_on_activate`] did except the fired events.
pub fn apply_on_deactivate(ctx: &mut EffectContext, tree_uid: &str, node: &NodeDefinition) {
    set_switches(ctx.switches, node, true);
    revoke_abilities(ctx.character, node);
    apply_stats(ctx.character, node, true);
    run_script(ctx, tree_uid, node, ScriptHook::Deactivate);
}

/// Sets each listed switch to its activation value, or to the opposite when
/// `inverted`.
pub fn set_switches(switches: &mut dyn SwitchStore, node: &NodeDefinition, inverted: bool) {
    for toggle in &node.on_activate.switches {
        switches.set_switch(toggle.id, toggle.value != inverted);
    }
}

pub fn grant_abilities(character: &mut dyn CharacterStore, node: &NodeDefinition) {
    for &ability in &node.on_activate.abilities {
        character.learn_ability(ability);
    }
}

pub fn revoke_abilities(character: &mut dyn CharacterStore, node: &NodeDefinition) {
    for &ability in &node.on_activate.abilities {
        character.forget_ability(ability);
    }
}

/// Adds the node's stat deltas, or subtracts them when `removing`.
/// Slots outside the eight base parameters are skipped.
pub fn apply_stats(character: &mut dyn CharacterStore, node: &NodeDefinition, removing: bool) {
    for (&slot, &delta) in &node.on_activate.stats {
        if slot >= STAT_SLOTS || delta == 0 {
            continue;
        }
        let delta = if removing {
            delta.saturating_neg()
        } else {
            delta
        };
        character.add_stat(slot, delta);
    }
}

pub fn fire_events(events: &mut dyn EventDispatcher, node: &NodeDefinition) {
    for event in &node.on_activate.triggered_events {
        events.dispatch(event.id, event.closes_ui);
    }
}

/// Runs the node's script for `hook`, if it has one.
///
/// A failing script is logged with the character and the script key and
/// otherwise ignored, so the caller's batch always continues.
pub fn run_script(ctx: &mut EffectContext, tree_uid: &str, node: &NodeDefinition, hook: ScriptHook) {
    let key = match hook {
        ScriptHook::Activate => node.on_activate.activate_script.as_deref(),
        ScriptHook::Deactivate => node.on_activate.deactivate_script.as_deref(),
    };
    let Some(key) = key else {
        return;
    };

    let mut scope = ScriptScope {
        character: &mut *ctx.character,
        switches: &mut *ctx.switches,
        tree_uid,
        node_uid: &node.uid,
    };
    if let Err(error) = ctx.scripts.run(key, &mut scope) {
        warn!(
            hero = %ctx.character.name(),
            tree = %tree_uid,
            node = %node.uid,
            script = %key,
            ?hook,
            %error,
            "tech tree script failed"
        );
    }
}
