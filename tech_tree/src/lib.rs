//! The tech tree engine.
//!
//! Catalog trees are shared and read-only; each hero carries a
//! `TechTreeProgress` overlay with its instances and their active nodes.
//! The engine functions in [`operations`] and [`binding`] work purely
//! through the host traits in [`host`]. The plugin wires them to ECS state
//! through observers for the events in `tech_tree_events`.

pub mod binding;
pub mod effects;
pub mod error;
pub mod graph;
pub mod host;
pub mod ledger;
pub mod operations;
pub mod store;
pub mod systems;


use {
    bevy::prelude::*,
    shared_components::GameSwitches,
    tech_tree_assets::TechTreeAssetsPlugin,
    tech_tree_resources::{NodeCatalog, TechTreeSettings},
    wallet::Wallet,
};

pub use {
    binding::{change_class, ensure_class_trees, grant_tree, initialize_progress, visible_trees},
    error::TechTreeError,
    graph::UnlockGraph,
    host::{
        CharacterStore, EffectContext, EventDispatcher, InventoryKind, ScriptError, ScriptRunner,
        ScriptScope, SwitchStore,
    },
    ledger::{CostKind, CostLine},
    operations::{
        Refund, TechTreeRules, activate_node, active_node_count, cost_sum, deactivate_node,
        is_node_active, reset_all_trees, reset_tree, resync_trees, unlock_node,
    },
    store::{HeroStore, QueuedEvents, ScriptRegistry, TechTreeWorld},
};

pub struct TechTreePlugin;

impl Plugin for TechTreePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(TechTreeAssetsPlugin)
            .register_type::<TechTreeSettings>()
            .init_resource::<TechTreeSettings>()
            .init_resource::<ScriptRegistry>()
            .init_resource::<GameSwitches>()
            .init_resource::<Wallet>()
            .add_systems(Startup, systems::load_catalog)
            .add_systems(
                Update,
                (
                    systems::build_catalog,
                    systems::initialize_hero_trees.run_if(resource_exists::<NodeCatalog>),
                )
                    .chain(),
            )
            .add_observer(systems::on_grant_tree)
            .add_observer(systems::on_activate_node)
            .add_observer(systems::on_deactivate_node)
            .add_observer(systems::on_unlock_node)
            .add_observer(systems::on_reset_tree)
            .add_observer(systems::on_reset_all_trees)
            .add_observer(systems::on_change_class)
            .add_observer(systems::on_resync_trees);
    }
}
