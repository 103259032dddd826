use {
    bevy::prelude::*,
    hero_components::{ClassPoints, Hero, HeroClass, HeroId, StartingTrees},
    std::collections::HashMap,
    tech_tree::{CharacterStore, ScriptRegistry, ScriptScope, SwitchStore},
    wallet::{InventoryKind, Wallet},
};

pub fn spawn_starting_party(mut commands: Commands, mut wallet: ResMut<Wallet>) {
    info!("spawning starting party");
    commands.spawn((
        Hero,
        HeroId(1),
        Name::new("Aldric"),
        HeroClass(1),
        ClassPoints(HashMap::from([(1, 3)])),
        StartingTrees(vec!["VETERAN".to_string()]),
    ));
    commands.spawn((
        Hero,
        HeroId(2),
        Name::new("Mira"),
        HeroClass(2),
        ClassPoints(HashMap::from([(2, 3)])),
        StartingTrees(vec!["VETERAN".to_string()]),
    ));

    wallet.gain_gold(500);
    wallet.gain(InventoryKind::Item, 1, 3);
    wallet.gain(InventoryKind::Weapon, 4, 1);
}

/// Handlers for the script keys used by the shipped catalog.
pub fn register_scripts(mut scripts: ResMut<ScriptRegistry>) {
    scripts.register("veteran_focus", |scope: &mut ScriptScope| {
        let level = scope.character.level();
        scope.character.add_stat(7, level as i32);
        Ok(())
    });
    scripts.register("veteran_unfocus", |scope: &mut ScriptScope| {
        let level = scope.character.level();
        scope.character.add_stat(7, -(level as i32));
        Ok(())
    });
    scripts.register("open_armory", |scope: &mut ScriptScope| {
        if scope.switches.switch(20) {
            return Err("the armory is already open".to_string());
        }
        scope.switches.set_switch(20, true);
        Ok(())
    });
}
