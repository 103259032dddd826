use {
    bevy::{log::LogPlugin, prelude::*},
    game_core::CorePlugin,
    std::fs,
    tech_tree_resources::TechTreeSettings,
};

const SETTINGS_PATH: &str = "assets/techtree.settings.ron";

fn main() {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(LogPlugin {
        filter: "error,techtrees=info,\
                game_core=info,\
                tech_tree=debug,\
                tech_tree_resources=debug,\
                tech_tree_ui=debug,\
                save_load=trace"
            .into(),
        level: bevy::log::Level::TRACE,
        ..Default::default()
    }));

    // logging is up only after `DefaultPlugins`, so settings are read here
    app.insert_resource(load_settings())
        .add_plugins(CorePlugin)
        .run();
}

fn load_settings() -> TechTreeSettings {
    let contents = match fs::read_to_string(SETTINGS_PATH) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("No tech tree settings at {SETTINGS_PATH} ({e}), using defaults");
            return TechTreeSettings::default();
        }
    };
    match ron::from_str(&contents) {
        Ok(settings) => {
            info!("Tech tree settings loaded from {SETTINGS_PATH}");
            settings
        }
        Err(e) => {
            warn!("Malformed tech tree settings in {SETTINGS_PATH} ({e}), using defaults");
            TechTreeSettings::default()
        }
    }
}
