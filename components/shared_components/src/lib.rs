use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub struct SharedComponentsPlugin;

impl Plugin for SharedComponentsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<GameSwitches>()
            .init_resource::<GameSwitches>();
    }
}

/// Marker for entities that should be included in save files.
/// Add `#[require(IncludeInSave)]` to root components like Hero.
#[derive(Component, Default)]
pub struct IncludeInSave;

/// Global boolean flags shared by events, menus and tech tree nodes.
///
/// Unknown ids read as `false`.
#[derive(Resource, Reflect, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[reflect(Resource, Default)]
pub struct GameSwitches {
    values: BTreeMap<u32, bool>,
}

impl GameSwitches {
    pub fn get(&self, id: u32) -> bool {
        self.values.get(&id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: u32, value: bool) {
        self.values.insert(id, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_switch_is_off() {
        let switches = GameSwitches::default();
        assert!(!switches.get(12));
    }
}
