use {
    bevy::prelude::*,
    hero_components::HeroComponentsPlugin,
    save_load::SaveLoadPlugin,
    shared_components::SharedComponentsPlugin,
    tech_tree::TechTreePlugin,
    tech_tree_events::TriggeredEventFired,
    tech_tree_ui::TechTreeUiPlugin,
    wallet::WalletPlugin,
};

mod systems;

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            SharedComponentsPlugin,
            WalletPlugin,
            HeroComponentsPlugin,
            TechTreePlugin,
            TechTreeUiPlugin,
            SaveLoadPlugin,
        ))
        .add_systems(
            Startup,
            (
                setup_camera,
                systems::spawn_starting_party,
                systems::register_scripts,
            ),
        )
        .add_observer(log_triggered_event);
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Nodes fire game events by id; the demo game has no event interpreter,
/// so they are only logged.
fn log_triggered_event(trigger: On<TriggeredEventFired>) {
    let event = trigger.event();
    info!(
        hero = ?event.hero,
        event = event.event_id,
        closes_ui = event.closes_ui,
        "Game event fired"
    );
}
