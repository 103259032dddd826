use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    tech_tree_assets::AbilityId,
};

/// Animation played on activation when neither the node nor its tree names one.
pub const DEFAULT_ACTIVATION_ANIMATION: u32 = 15;

/// Game-wide tech tree options, read from `techtree.settings.ron`.
#[derive(Resource, Reflect, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct TechTreeSettings {
    /// Asset path of the catalog document.
    pub catalog_path: String,
    /// Exclusive upper bound for ability ids; `None` skips the check.
    pub ability_limit: Option<AbilityId>,
    /// Active nodes stay visible even when their switches are off.
    pub active_nodes_always_visible: bool,
    /// The menu can be browsed but nothing can be unlocked from it.
    pub display_only: bool,
    /// Re-derive every instance when a save was made with a different catalog.
    pub resync_on_catalog_change: bool,
    pub default_animation_id: Option<u32>,
    pub class_change: ClassChangePolicy,
}

impl Default for TechTreeSettings {
    fn default() -> Self {
        Self {
            catalog_path: "techtrees/catalog.techtrees.ron".to_string(),
            ability_limit: None,
            active_nodes_always_visible: false,
            display_only: false,
            resync_on_catalog_change: false,
            default_animation_id: Some(DEFAULT_ACTIVATION_ANIMATION),
            class_change: ClassChangePolicy::default(),
        }
    }
}

/// Which effects a class change reverts and reapplies.
///
/// Every flag is independent; with all of them off a class change only
/// instantiates the new class's trees and toggles switches.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassChangePolicy {
    pub unlearn_abilities: bool,
    pub remove_stats: bool,
    pub run_deactivate_scripts: bool,
    pub relearn_abilities: bool,
    pub readd_stats: bool,
    pub run_activate_scripts: bool,
    /// Reset the trees of the class being left, refunding into that class.
    pub reset_class_trees: bool,
}

impl Default for ClassChangePolicy {
    fn default() -> Self {
        Self {
            unlearn_abilities: true,
            remove_stats: true,
            run_deactivate_scripts: true,
            relearn_abilities: true,
            readd_stats: true,
            run_activate_scripts: true,
            reset_class_trees: false,
        }
    }
}

impl ClassChangePolicy {
    /// Every class-change effect disabled.
    pub fn inert() -> Self {
        Self {
            unlearn_abilities: false,
            remove_stats: false,
            run_deactivate_scripts: false,
            relearn_abilities: false,
            readd_stats: false,
            run_activate_scripts: false,
            reset_class_trees: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: TechTreeSettings = ron::from_str(
            "(display_only: true, class_change: (relearn_abilities: false))",
        )
        .unwrap();

        assert!(settings.display_only);
        assert_eq!(settings.default_animation_id, Some(DEFAULT_ACTIVATION_ANIMATION));
        assert!(!settings.class_change.relearn_abilities);
        assert!(settings.class_change.unlearn_abilities);
        assert!(!settings.class_change.reset_class_trees);
        assert_eq!(settings.catalog_path, "techtrees/catalog.techtrees.ron");
    }
}
