//! Save/Load of tech tree progress.
//!
//! This crate provides:
//! - F5 keyboard shortcut for manual saves
//! - F9 keyboard shortcut to load the latest save
//! - DateTime-based save file naming
//! - Catalog change detection: the save carries the catalog's content hash
//!   and a mismatch on load can trigger a resync of every hero's trees

mod document;

use {
    bevy::prelude::*,
    hero_components::{ClassPoints, Hero, HeroClass, HeroId, HeroStats, KnownAbilities, Level},
    shared_components::{GameSwitches, IncludeInSave},
    std::path::PathBuf,
    tech_tree_components::TechTreeProgress,
    tech_tree_events::ResyncTrees,
    tech_tree_resources::{NodeCatalog, TechTreeSettings},
    wallet::Wallet,
};

pub use document::{
    SAVE_PREFIX, SaveError, SavedHero, TechTreeSave, find_latest_save, read_save, write_save,
};

/// Event to write a new save file.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SaveGame;

/// Event to load a save file; the latest one when `path` is `None`.
#[derive(Event, Debug, Clone, Default)]
pub struct LoadGame {
    pub path: Option<PathBuf>,
}

/// Where save files go.
#[derive(Resource, Debug, Clone)]
pub struct SaveDirectory(pub PathBuf);

impl Default for SaveDirectory {
    fn default() -> Self {
        Self(PathBuf::from("saves"))
    }
}

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveDirectory>()
            .add_systems(
                Update,
                trigger_save_load_on_keypress.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_observer(execute_save)
            .add_observer(execute_load);
    }
}

/// Triggers a save on F5 and a load on F9.
fn trigger_save_load_on_keypress(keyboard: Res<ButtonInput<KeyCode>>, mut commands: Commands) {
    if keyboard.just_pressed(KeyCode::F5) {
        info!("Manual save triggered (F5)");
        commands.trigger(SaveGame);
    }

    if keyboard.just_pressed(KeyCode::F9) {
        info!("Load triggered (F9)");
        commands.trigger(LoadGame::default());
    }
}

type SavedHeroData = (
    &'static HeroId,
    &'static HeroClass,
    &'static Level,
    &'static KnownAbilities,
    &'static HeroStats,
    &'static ClassPoints,
    &'static TechTreeProgress,
);

/// Observer that collects every hero's progression and writes it out.
fn execute_save(
    _trigger: On<SaveGame>,
    dir: Res<SaveDirectory>,
    catalog: Option<Res<NodeCatalog>>,
    switches: Res<GameSwitches>,
    wallet: Res<Wallet>,
    heroes: Query<SavedHeroData, (With<Hero>, With<IncludeInSave>)>,
) {
    let Some(catalog) = catalog else {
        warn!("Nothing to save before the tech tree catalog loaded");
        return;
    };

    let heroes = heroes
        .iter()
        .map(
            |(id, class, level, abilities, stats, points, progress)| SavedHero {
                hero_id: id.0,
                class: class.0,
                level: level.0,
                abilities: abilities.iter().copied().collect(),
                stats: stats.0,
                points: points.clone(),
                progress: progress.clone(),
            },
        )
        .collect();
    let save = TechTreeSave {
        catalog_hash: catalog.content_hash(),
        heroes,
        switches: switches.clone(),
        wallet: wallet.clone(),
    };

    match write_save(&dir.0, &save) {
        Ok(path) => info!("Game saved to {}", path.display()),
        Err(e) => error!("Failed to write save file: {}", e),
    }
}

type LoadedHeroData = (
    Entity,
    &'static HeroId,
    &'static mut HeroClass,
    &'static mut Level,
    &'static mut KnownAbilities,
    &'static mut HeroStats,
    &'static mut ClassPoints,
    Option<&'static mut TechTreeProgress>,
);

/// Observer that handles the LoadGame event.
#[allow(clippy::too_many_arguments)]
fn execute_load(
    trigger: On<LoadGame>,
    mut commands: Commands,
    dir: Res<SaveDirectory>,
    catalog: Option<Res<NodeCatalog>>,
    settings: Res<TechTreeSettings>,
    mut switches: ResMut<GameSwitches>,
    mut wallet: ResMut<Wallet>,
    mut heroes: Query<LoadedHeroData, With<Hero>>,
) {
    let path = match &trigger.event().path {
        Some(path) => path.clone(),
        None => match find_latest_save(&dir.0) {
            Some(path) => path,
            None => {
                warn!("No save files found in {}", dir.0.display());
                return;
            }
        },
    };

    info!("Loading save file: {}", path.display());
    let save = match read_save(&path) {
        Ok(save) => save,
        Err(e) => {
            error!("Failed to load save file {}: {}", path.display(), e);
            return;
        }
    };

    *switches = save.switches.clone();
    *wallet = save.wallet.clone();

    let mut restored = 0;
    for (entity, id, mut class, mut level, mut abilities, mut stats, mut points, progress) in
        heroes.iter_mut()
    {
        let Some(saved) = save.hero(id.0) else {
            debug!(hero = id.0, "Hero missing from the save, left as is");
            continue;
        };
        class.0 = saved.class;
        level.0 = saved.level;
        abilities.0 = saved.abilities.iter().copied().collect();
        stats.0 = saved.stats;
        *points = saved.points.clone();
        match progress {
            Some(mut progress) => *progress = saved.progress.clone(),
            None => {
                commands.entity(entity).insert(saved.progress.clone());
            }
        }
        restored += 1;
    }
    if restored < save.heroes.len() {
        warn!(
            saved = save.heroes.len(),
            restored, "Some saved heroes have no matching hero"
        );
    }

    let Some(catalog) = catalog else {
        return;
    };
    if catalog.content_hash() != save.catalog_hash {
        warn!(
            saved = save.catalog_hash,
            current = catalog.content_hash(),
            "Tech tree catalog changed since this save"
        );
        if settings.resync_on_catalog_change {
            commands.trigger(ResyncTrees);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{collections::BTreeMap, fs},
        tech_tree::TechTreePlugin,
        tech_tree_assets::{
            CatalogDefinition, NodeDefinition, NodeEffects, SwitchToggle, TreeDefinition,
        },
        tech_tree_components::{TreeInstance, TreeOrigin},
        tech_tree_events::UnlockNodeRequest,
    };

    fn catalog_source(switches: Vec<SwitchToggle>) -> CatalogDefinition {
        CatalogDefinition {
            trees: vec![TreeDefinition {
                uid: "WARRIOR".to_string(),
                nodes: vec![NodeDefinition {
                    uid: "GRIT".to_string(),
                    depth: 1,
                    lane: 1,
                    on_activate: NodeEffects {
                        abilities: vec![3],
                        stats: BTreeMap::from([(0, 5)]),
                        switches,
                        ..default()
                    },
                    ..default()
                }],
                ..default()
            }],
            class_trees: BTreeMap::new(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("techtrees_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn setup(dir: PathBuf, settings: TechTreeSettings) -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(AssetPlugin::default())
            .insert_resource(TechTreeSettings {
                catalog_path: String::new(),
                ..settings
            })
            .add_plugins(TechTreePlugin)
            .add_plugins(SaveLoadPlugin)
            .insert_resource(SaveDirectory(dir));

        let (catalog, _) = NodeCatalog::load_from(catalog_source(Vec::new()), None);
        app.insert_resource(catalog);

        let hero = app
            .world_mut()
            .spawn((
                Hero,
                HeroId(7),
                hero_components::StartingTrees(vec!["WARRIOR".to_string()]),
            ))
            .id();
        app.update();
        (app, hero)
    }

    fn unlock_grit(app: &mut App, hero: Entity) {
        app.world_mut().trigger(UnlockNodeRequest {
            hero,
            tree_uid: "WARRIOR".to_string(),
            node_uid: "GRIT".to_string(),
        });
        app.update();
    }

    #[test]
    fn test_save_file_holds_hash_and_progress() {
        let dir = scratch_dir("hash");
        let (mut app, hero) = setup(dir.clone(), TechTreeSettings::default());
        unlock_grit(&mut app, hero);

        app.world_mut().trigger(SaveGame);

        let path = find_latest_save(&dir).unwrap();
        let save = read_save(&path).unwrap();
        let expected_hash = app.world().resource::<NodeCatalog>().content_hash();
        assert_eq!(save.catalog_hash, expected_hash);

        let saved = save.hero(7).unwrap();
        assert_eq!(saved.abilities, vec![3]);
        assert_eq!(saved.stats[0], 5);
        assert_eq!(saved.progress.trees.len(), 1);
        assert!(saved.progress.trees[0].is_active("GRIT"));
        assert_eq!(saved.progress.trees[0].origin, TreeOrigin::CharacterOwned);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_restores_progress() {
        let dir = scratch_dir("restore");
        let (mut app, hero) = setup(dir.clone(), TechTreeSettings::default());
        unlock_grit(&mut app, hero);
        app.world_mut().trigger(SaveGame);

        app.world_mut().trigger(tech_tree_events::ResetAllTrees {
            hero,
            refund: false,
        });
        assert_eq!(app.world().get::<HeroStats>(hero).unwrap().get(0), 0);

        app.world_mut().trigger(LoadGame::default());
        app.update();

        let progress = app.world().get::<TechTreeProgress>(hero).unwrap();
        assert!(tech_tree::is_node_active(progress, "WARRIOR", "GRIT"));
        assert_eq!(app.world().get::<HeroStats>(hero).unwrap().get(0), 5);
        assert!(app.world().get::<KnownAbilities>(hero).unwrap().contains(&3));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_changed_catalog_resyncs_when_enabled() {
        let dir = scratch_dir("resync");
        let settings = TechTreeSettings {
            resync_on_catalog_change: true,
            ..default()
        };
        let (mut app, hero) = setup(dir.clone(), settings);

        let mut progress = TechTreeProgress::default();
        let mut instance = TreeInstance::new("WARRIOR", TreeOrigin::CharacterOwned);
        instance.activate("GRIT");
        progress.push(instance);
        let save = TechTreeSave {
            catalog_hash: 0,
            heroes: vec![SavedHero {
                hero_id: 7,
                class: 1,
                level: 1,
                abilities: vec![3],
                stats: [5, 0, 0, 0, 0, 0, 0, 0],
                points: ClassPoints::default(),
                progress,
            }],
            switches: GameSwitches::default(),
            wallet: Wallet::default(),
        };
        let path = write_save(&dir, &save).unwrap();

        // the current catalog also turns a switch on
        let (catalog, _) = NodeCatalog::load_from(
            catalog_source(vec![SwitchToggle { id: 11, value: true }]),
            None,
        );
        app.insert_resource(catalog);
        app.world_mut().trigger(LoadGame { path: Some(path) });
        app.update();

        assert!(app.world().resource::<GameSwitches>().get(11));
        assert_eq!(app.world().get::<HeroStats>(hero).unwrap().get(0), 5);
        let progress = app.world().get::<TechTreeProgress>(hero).unwrap();
        assert!(tech_tree::is_node_active(progress, "WARRIOR", "GRIT"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_save_is_ignored() {
        let dir = scratch_dir("missing");
        let (mut app, hero) = setup(dir, TechTreeSettings::default());

        app.world_mut().trigger(LoadGame::default());
        app.update();

        assert!(app.world().get::<TechTreeProgress>(hero).is_some());
    }
}
