use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    shared_components::IncludeInSave,
    std::collections::{BTreeSet, HashMap},
};

pub struct HeroComponentsPlugin;

impl Plugin for HeroComponentsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Hero>()
            .register_type::<HeroId>()
            .register_type::<Level>()
            .register_type::<HeroClass>()
            .register_type::<HeroStats>();
    }
}

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
#[require(
    IncludeInSave,
    HeroId,
    Level,
    HeroClass,
    KnownAbilities,
    HeroStats,
    ClassPoints,
    StartingTrees
)]
pub struct Hero;

/// Stable identifier that survives save/load, unlike `Entity`.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[reflect(Component, Default)]
pub struct HeroId(pub u32);

#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Level(pub u32);

impl Default for Level {
    fn default() -> Self {
        Self(1)
    }
}

/// The class the hero currently holds.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct HeroClass(pub u32);

impl Default for HeroClass {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Component, Default, Debug, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct KnownAbilities(pub BTreeSet<u32>);

/// Flat bonuses on the eight base parameters.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct HeroStats(pub [i32; 8]);

impl HeroStats {
    pub fn get(&self, slot: u8) -> i32 {
        self.0.get(slot as usize).copied().unwrap_or(0)
    }

    /// Slots outside `0..8` are ignored.
    pub fn add(&mut self, slot: u8, delta: i32) {
        if let Some(value) = self.0.get_mut(slot as usize) {
            *value = value.saturating_add(delta);
        }
    }
}

/// Secondary points, tracked separately for every class the hero has held.
#[derive(Component, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPoints(pub HashMap<u32, u32>);

impl ClassPoints {
    pub fn get(&self, class: u32) -> u32 {
        self.0.get(&class).copied().unwrap_or(0)
    }

    pub fn gain(&mut self, class: u32, amount: u32) {
        let entry = self.0.entry(class).or_default();
        *entry = entry.saturating_add(amount);
    }

    pub fn lose(&mut self, class: u32, amount: u32) {
        if let Some(entry) = self.0.get_mut(&class) {
            *entry = entry.saturating_sub(amount);
        }
    }
}

/// Tree uids the hero owns regardless of class.
#[derive(Component, Default, Debug, Clone, PartialEq, Eq)]
pub struct StartingTrees(pub Vec<String>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_ignore_unknown_slot() {
        let mut stats = HeroStats::default();
        stats.add(2, 5);
        stats.add(9, 100);

        assert_eq!(stats.get(2), 5);
        assert_eq!(stats.get(9), 0);
    }

    #[test]
    fn test_stats_saturate() {
        let mut stats = HeroStats::default();
        stats.add(0, i32::MAX);
        stats.add(0, 1);
        stats.add(1, i32::MIN);
        stats.add(1, -1);

        assert_eq!(stats.get(0), i32::MAX);
        assert_eq!(stats.get(1), i32::MIN);
    }

    #[test]
    fn test_class_points_per_class() {
        let mut points = ClassPoints::default();
        points.gain(1, 30);
        points.gain(2, 10);
        points.lose(1, 50);

        assert_eq!(points.get(1), 0);
        assert_eq!(points.get(2), 10);
        assert_eq!(points.get(3), 0);
    }
}
