//! Tech tree menu state.
//!
//! This crate keeps the menu's selection in the [`TreeCursor`] resource and
//! drives it through the cursor events in `tech_tree_events`. Confirming a
//! node asks the engine to unlock it; drawing is left to the host.

mod navigator;

use {
    bevy::prelude::*,
    hero_components::{Hero, HeroClass},
    tech_tree_assets::{NodeUid, TreeDefinition, TreeUid},
    tech_tree_components::TechTreeProgress,
    tech_tree_events::*,
    tech_tree_resources::NodeCatalog,
};

pub use navigator::{CursorNavigator, VISIBLE_DEPTHS, VISIBLE_LANES};

pub struct TechTreeUiPlugin;

impl Plugin for TechTreeUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TreeCursor>()
            .add_systems(
                Update,
                cursor_keys.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_observer(on_open_tech_tree)
            .add_observer(on_close_tech_tree)
            .add_observer(on_move_tree_cursor)
            .add_observer(on_cycle_tree)
            .add_observer(on_confirm_tree_node)
            .add_observer(on_unlock_rejected)
            .add_observer(on_triggered_event)
            .add_observer(on_class_changed);
    }
}

/// The open menu: whose trees, which one is shown, and where the cursor is.
#[derive(Resource, Default, Debug)]
pub struct TreeCursor {
    pub hero: Option<Entity>,
    pub trees: Vec<TreeUid>,
    pub tree_index: usize,
    pub navigator: Option<CursorNavigator>,
}

impl TreeCursor {
    pub fn is_open(&self) -> bool {
        self.hero.is_some()
    }

    pub fn tree_uid(&self) -> Option<&str> {
        self.trees.get(self.tree_index).map(String::as_str)
    }

    pub fn tree<'a>(&self, catalog: &'a NodeCatalog) -> Option<&'a TreeDefinition> {
        self.tree_uid().and_then(|uid| catalog.find_tree(uid))
    }

    pub fn selected_node(&self, catalog: &NodeCatalog) -> Option<NodeUid> {
        let tree = self.tree(catalog)?;
        let node = self.navigator?.selected(tree)?;
        Some(node.uid.clone())
    }

    fn focus_tree(&mut self, catalog: &NodeCatalog) {
        self.navigator = self
            .tree(catalog)
            .and_then(|tree| CursorNavigator::new(tree, VISIBLE_DEPTHS, VISIBLE_LANES));
    }
}

fn on_open_tech_tree(
    trigger: On<OpenTechTree>,
    mut cursor: ResMut<TreeCursor>,
    catalog: Option<Res<NodeCatalog>>,
    heroes: Query<(&TechTreeProgress, &HeroClass), With<Hero>>,
) {
    let hero = trigger.event().hero;
    let Some(catalog) = catalog else {
        warn!(?hero, "tech tree menu opened before the catalog loaded");
        return;
    };
    let Ok((progress, class)) = heroes.get(hero) else {
        warn!(?hero, "tech tree menu opened for an entity without trees");
        return;
    };

    let trees: Vec<TreeUid> = tech_tree::visible_trees(progress, class.0)
        .into_iter()
        .map(|instance| instance.tree_uid.clone())
        .collect();
    // keep the shown tree when reopening for the same hero
    let tree_index = match (cursor.hero, cursor.tree_uid()) {
        (Some(open), Some(shown)) if open == hero => {
            trees.iter().position(|uid| uid == shown).unwrap_or(0)
        }
        _ => 0,
    };

    *cursor = TreeCursor {
        hero: Some(hero),
        trees,
        tree_index,
        navigator: None,
    };
    cursor.focus_tree(&catalog);
    info!(?hero, trees = cursor.trees.len(), "Tech tree menu opened");
}

fn on_close_tech_tree(_trigger: On<CloseTechTree>, mut cursor: ResMut<TreeCursor>) {
    if cursor.is_open() {
        debug!("Tech tree menu closed");
    }
    *cursor = TreeCursor::default();
}

fn on_move_tree_cursor(
    trigger: On<MoveTreeCursor>,
    mut cursor: ResMut<TreeCursor>,
    catalog: Option<Res<NodeCatalog>>,
) {
    let Some(catalog) = catalog else {
        return;
    };
    let Some(tree) = cursor.tree(&catalog) else {
        return;
    };
    if let Some(navigator) = cursor.navigator.as_mut() {
        let moved = navigator.move_cursor(tree, trigger.event().direction);
        trace!(
            depth = navigator.depth,
            lane = navigator.lane,
            moved,
            "Tree cursor moved"
        );
    }
}

fn on_cycle_tree(
    trigger: On<CycleTree>,
    mut cursor: ResMut<TreeCursor>,
    catalog: Option<Res<NodeCatalog>>,
) {
    let Some(catalog) = catalog else {
        return;
    };
    let count = cursor.trees.len();
    if count < 2 {
        return;
    }
    cursor.tree_index = if trigger.event().forward {
        (cursor.tree_index + 1) % count
    } else {
        (cursor.tree_index + count - 1) % count
    };
    cursor.focus_tree(&catalog);
    debug!(tree = ?cursor.tree_uid(), "Tech tree switched");
}

fn on_confirm_tree_node(
    _trigger: On<ConfirmTreeNode>,
    mut commands: Commands,
    cursor: Res<TreeCursor>,
    catalog: Option<Res<NodeCatalog>>,
) {
    let Some(catalog) = catalog else {
        return;
    };
    let (Some(hero), Some(tree_uid), Some(node_uid)) = (
        cursor.hero,
        cursor.tree_uid(),
        cursor.selected_node(&catalog),
    ) else {
        debug!("Nothing selected to unlock");
        return;
    };
    commands.trigger(UnlockNodeRequest {
        hero,
        tree_uid: tree_uid.to_string(),
        node_uid,
    });
}

fn on_unlock_rejected(trigger: On<UnlockRejected>, cursor: Res<TreeCursor>) {
    let event = trigger.event();
    if cursor.hero == Some(event.hero) {
        info!(node = %event.node_uid, reason = %event.reason, "Unlock refused");
    }
}

fn on_triggered_event(
    trigger: On<TriggeredEventFired>,
    mut commands: Commands,
    cursor: Res<TreeCursor>,
) {
    let event = trigger.event();
    if event.closes_ui && cursor.hero == Some(event.hero) {
        commands.trigger(CloseTechTree);
    }
}

/// The shown trees depend on the class, so an open menu is rebuilt.
fn on_class_changed(trigger: On<ClassChanged>, mut commands: Commands, cursor: Res<TreeCursor>) {
    let hero = trigger.event().hero;
    if cursor.hero == Some(hero) {
        commands.trigger(OpenTechTree { hero });
    }
}

fn cursor_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    cursor: Res<TreeCursor>,
    heroes: Query<Entity, (With<Hero>, With<TechTreeProgress>)>,
) {
    if !cursor.is_open() {
        if keyboard.just_pressed(KeyCode::KeyT)
            && let Some(hero) = heroes.iter().next()
        {
            commands.trigger(OpenTechTree { hero });
        }
        return;
    }

    let moves = [
        (KeyCode::ArrowUp, CursorDirection::Up),
        (KeyCode::ArrowDown, CursorDirection::Down),
        (KeyCode::ArrowLeft, CursorDirection::Left),
        (KeyCode::ArrowRight, CursorDirection::Right),
    ];
    for (key, direction) in moves {
        if keyboard.just_pressed(key) {
            commands.trigger(MoveTreeCursor { direction });
        }
    }
    if keyboard.just_pressed(KeyCode::PageDown) {
        commands.trigger(CycleTree { forward: true });
    }
    if keyboard.just_pressed(KeyCode::PageUp) {
        commands.trigger(CycleTree { forward: false });
    }
    if keyboard.just_pressed(KeyCode::Enter) {
        commands.trigger(ConfirmTreeNode);
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        commands.trigger(CloseTechTree);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::collections::BTreeMap,
        tech_tree::TechTreePlugin,
        tech_tree_assets::{CatalogDefinition, NodeCosts, NodeDefinition},
        tech_tree_resources::TechTreeSettings,
        wallet::Wallet,
    };

    fn node(uid: &str, depth: u32, lane: u32) -> NodeDefinition {
        NodeDefinition {
            uid: uid.to_string(),
            depth,
            lane,
            costs: NodeCosts {
                currency: 10,
                ..default()
            },
            ..default()
        }
    }

    fn setup() -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(AssetPlugin::default())
            .insert_resource(TechTreeSettings {
                catalog_path: String::new(),
                ..default()
            })
            .add_plugins(TechTreePlugin)
            .add_plugins(TechTreeUiPlugin);

        let source = CatalogDefinition {
            trees: vec![
                TreeDefinition {
                    uid: "SWORD".to_string(),
                    nodes: vec![node("S1", 1, 1), node("S2", 4, 3)],
                    ..default()
                },
                TreeDefinition {
                    uid: "SHIELD".to_string(),
                    nodes: vec![node("H1", 1, 2)],
                    ..default()
                },
                TreeDefinition {
                    uid: "MAGE".to_string(),
                    nodes: vec![node("M1", 1, 1)],
                    ..default()
                },
            ],
            class_trees: BTreeMap::from([(2, vec!["MAGE".to_string()])]),
        };
        let (catalog, _) = NodeCatalog::load_from(source, None);
        app.insert_resource(catalog);
        app.world_mut().resource_mut::<Wallet>().gold = 10;

        let hero = app
            .world_mut()
            .spawn((
                Hero,
                HeroClass(1),
                hero_components::StartingTrees(vec!["SWORD".to_string(), "SHIELD".to_string()]),
            ))
            .id();
        app.update();
        (app, hero)
    }

    fn cursor(app: &App) -> &TreeCursor {
        app.world().resource::<TreeCursor>()
    }

    #[test]
    fn test_open_lists_the_heroes_trees() {
        let (mut app, hero) = setup();

        app.world_mut().trigger(OpenTechTree { hero });

        let cursor = cursor(&app);
        assert!(cursor.is_open());
        assert_eq!(cursor.trees, vec!["SWORD".to_string(), "SHIELD".to_string()]);
        let navigator = cursor.navigator.unwrap();
        assert_eq!((navigator.depth, navigator.lane), (1, 1));
    }

    #[test]
    fn test_move_and_cycle() {
        let (mut app, hero) = setup();
        app.world_mut().trigger(OpenTechTree { hero });

        app.world_mut().trigger(MoveTreeCursor {
            direction: CursorDirection::Right,
        });
        let catalog = app.world().resource::<NodeCatalog>();
        assert_eq!(cursor(&app).selected_node(catalog), Some("S2".to_string()));

        app.world_mut().trigger(CycleTree { forward: true });
        let catalog = app.world().resource::<NodeCatalog>();
        assert_eq!(cursor(&app).tree_uid(), Some("SHIELD"));
        assert_eq!(cursor(&app).selected_node(catalog), Some("H1".to_string()));

        app.world_mut().trigger(CycleTree { forward: true });
        assert_eq!(cursor(&app).tree_uid(), Some("SWORD"));
    }

    #[test]
    fn test_confirm_unlocks_the_selected_node() {
        let (mut app, hero) = setup();
        app.world_mut().trigger(OpenTechTree { hero });

        app.world_mut().trigger(ConfirmTreeNode);
        app.update();

        let progress = app.world().get::<TechTreeProgress>(hero).unwrap();
        assert!(tech_tree::is_node_active(progress, "SWORD", "S1"));
        assert_eq!(app.world().resource::<Wallet>().gold, 0);
    }

    #[test]
    fn test_class_change_refreshes_the_open_menu() {
        let (mut app, hero) = setup();
        app.world_mut().trigger(OpenTechTree { hero });
        app.world_mut().trigger(CycleTree { forward: true });

        app.world_mut().trigger(ChangeClass { hero, class: 2 });
        app.update();

        let cursor = cursor(&app);
        assert_eq!(
            cursor.trees,
            vec!["SWORD".to_string(), "SHIELD".to_string(), "MAGE".to_string()]
        );
        assert_eq!(cursor.tree_uid(), Some("SHIELD"));
    }

    #[test]
    fn test_close_clears_the_cursor() {
        let (mut app, hero) = setup();
        app.world_mut().trigger(OpenTechTree { hero });

        app.world_mut().trigger(CloseTechTree);
        assert!(!cursor(&app).is_open());

        app.world_mut().trigger(ConfirmTreeNode);
        app.update();
        let progress = app.world().get::<TechTreeProgress>(hero).unwrap();
        assert_eq!(tech_tree::active_node_count(progress, "SWORD"), 0);
    }
}
