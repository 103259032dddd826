use {
    crate::{binding, operations, store::TechTreeWorld},
    bevy::prelude::*,
    hero_components::{Hero, HeroClass, StartingTrees},
    tech_tree_assets::CatalogDefinition,
    tech_tree_components::TechTreeProgress,
    tech_tree_events::*,
    tech_tree_resources::{NodeCatalog, TechTreeSettings},
};

/// Handle keeping the catalog document loaded.
#[derive(Resource)]
pub struct CatalogHandle(pub Handle<CatalogDefinition>);

pub fn load_catalog(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<TechTreeSettings>,
) {
    if settings.catalog_path.is_empty() {
        debug!("No tech tree catalog path configured");
        return;
    }
    info!(path = %settings.catalog_path, "Loading tech tree catalog");
    let handle = asset_server.load(settings.catalog_path.clone());
    commands.insert_resource(CatalogHandle(handle));
}

/// Rebuilds the `NodeCatalog` whenever the catalog document is (re)loaded.
pub fn build_catalog(
    mut commands: Commands,
    mut events: MessageReader<AssetEvent<CatalogDefinition>>,
    assets: Res<Assets<CatalogDefinition>>,
    handle: Option<Res<CatalogHandle>>,
    settings: Res<TechTreeSettings>,
) {
    let Some(handle) = handle else {
        events.clear();
        return;
    };

    let changed = events.read().any(|event| match event {
        AssetEvent::Added { id } | AssetEvent::Modified { id } => *id == handle.0.id(),
        _ => false,
    });
    if !changed {
        return;
    }

    let Some(source) = assets.get(&handle.0) else {
        warn!("tech tree catalog event arrived without the asset");
        return;
    };
    let (catalog, _) = NodeCatalog::load_from(source.clone(), settings.ability_limit);
    commands.insert_resource(catalog);
}

/// Gives every hero without tree progress its starting and class trees.
pub fn initialize_hero_trees(
    mut commands: Commands,
    catalog: Res<NodeCatalog>,
    heroes: Query<(Entity, &StartingTrees, &HeroClass), (With<Hero>, Without<TechTreeProgress>)>,
) {
    for (entity, starting, class) in heroes.iter() {
        let progress = binding::initialize_progress(&catalog, &starting.0, class.0);
        debug!(hero = ?entity, trees = progress.trees.len(), "Tech tree progress initialized");
        commands.entity(entity).insert(progress);
    }
}

pub fn on_grant_tree(trigger: On<GrantTree>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let result = world.run(event.hero, |rules, progress, _| {
        binding::grant_tree(rules.catalog, progress, &event.tree_uid)
    });
    match result {
        Some(Ok(true)) => info!(hero = ?event.hero, tree = %event.tree_uid, "Tree granted"),
        Some(Ok(false)) => debug!(hero = ?event.hero, tree = %event.tree_uid, "Tree already owned"),
        Some(Err(error)) => warn!(hero = ?event.hero, %error, "grant tree ignored"),
        None => {}
    }
}

pub fn on_activate_node(trigger: On<ActivateNode>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let result = world.run(event.hero, |rules, progress, ctx| {
        operations::activate_node(rules, progress, ctx, &event.tree_uid, &event.node_uid)
    });
    match result {
        Some(Ok(())) => world.commands().trigger(NodeActivated {
            hero: event.hero,
            tree_uid: event.tree_uid.clone(),
            node_uid: event.node_uid.clone(),
        }),
        Some(Err(error)) => warn!(hero = ?event.hero, %error, "activate node ignored"),
        None => {}
    }
}

pub fn on_deactivate_node(trigger: On<DeactivateNode>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let result = world.run(event.hero, |rules, progress, ctx| {
        operations::deactivate_node(rules, progress, ctx, &event.tree_uid, &event.node_uid)
    });
    match result {
        Some(Ok(())) => world.commands().trigger(NodeDeactivated {
            hero: event.hero,
            tree_uid: event.tree_uid.clone(),
            node_uid: event.node_uid.clone(),
        }),
        Some(Err(error)) => warn!(hero = ?event.hero, %error, "deactivate node ignored"),
        None => {}
    }
}

pub fn on_unlock_node(trigger: On<UnlockNodeRequest>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let result = world.run(event.hero, |rules, progress, ctx| {
        operations::unlock_node(rules, progress, ctx, &event.tree_uid, &event.node_uid)
    });
    let Some(result) = result else {
        return;
    };

    match result {
        Ok(animation_id) => {
            world.commands().trigger(NodeActivated {
                hero: event.hero,
                tree_uid: event.tree_uid.clone(),
                node_uid: event.node_uid.clone(),
            });
            world.commands().trigger(NodeUnlocked {
                hero: event.hero,
                tree_uid: event.tree_uid.clone(),
                node_uid: event.node_uid.clone(),
                animation_id,
            });
        }
        Err(error) => {
            debug!(hero = ?event.hero, %error, "Unlock rejected");
            world.commands().trigger(UnlockRejected {
                hero: event.hero,
                tree_uid: event.tree_uid.clone(),
                node_uid: event.node_uid.clone(),
                reason: error.to_string(),
            });
        }
    }
}

pub fn on_reset_tree(trigger: On<ResetTree>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let result = world.run(event.hero, |rules, progress, ctx| {
        operations::reset_tree(rules, progress, ctx, &event.tree_uid, event.refund)
    });
    if let Some(Err(error)) = result {
        warn!(hero = ?event.hero, %error, "reset tree ignored");
    }
}

pub fn on_reset_all_trees(trigger: On<ResetAllTrees>, mut world: TechTreeWorld) {
    let event = trigger.event();
    world.run(event.hero, |rules, progress, ctx| {
        operations::reset_all_trees(rules, progress, ctx, event.refund)
    });
}

pub fn on_change_class(trigger: On<ChangeClass>, mut world: TechTreeWorld) {
    let event = trigger.event();
    let from = world.run(event.hero, |rules, progress, ctx| {
        let from = ctx.character.class_id();
        binding::change_class(rules, progress, ctx, event.class);
        from
    });
    if let Some(from) = from {
        world.commands().trigger(ClassChanged {
            hero: event.hero,
            from,
            to: event.class,
        });
    }
}

pub fn on_resync_trees(_trigger: On<ResyncTrees>, mut world: TechTreeWorld) {
    for hero in world.heroes() {
        world.run(hero, operations::resync_trees);
    }
}
