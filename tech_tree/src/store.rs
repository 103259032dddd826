//! Bevy-side implementations of the host traits.

use {
    crate::{
        host::{
            CharacterStore, EffectContext, EventDispatcher, InventoryKind, ScriptError,
            ScriptRunner, ScriptScope, SwitchStore,
        },
        operations::TechTreeRules,
    },
    bevy::{ecs::system::SystemParam, platform::collections::HashMap, prelude::*},
    hero_components::{ClassPoints, Hero, HeroClass, HeroId, HeroStats, KnownAbilities, Level},
    shared_components::GameSwitches,
    tech_tree_assets::{AbilityId, ClassId, EventId, ItemId, StatSlot},
    tech_tree_components::TechTreeProgress,
    tech_tree_events::TriggeredEventFired,
    tech_tree_resources::{NodeCatalog, TechTreeSettings},
    wallet::Wallet,
};

/// A hero's components plus the party wallet, seen as one character.
pub struct HeroStore<'a> {
    pub name: String,
    pub level: u32,
    pub class: &'a mut HeroClass,
    pub abilities: &'a mut KnownAbilities,
    pub stats: &'a mut HeroStats,
    pub points: &'a mut ClassPoints,
    pub wallet: &'a mut Wallet,
}

impl HeroStore<'_> {
    fn points_class(&self, class: Option<ClassId>) -> ClassId {
        class.unwrap_or(self.class.0)
    }
}

impl CharacterStore for HeroStore<'_> {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn class_id(&self) -> ClassId {
        self.class.0
    }

    fn set_class(&mut self, class: ClassId) {
        self.class.0 = class;
    }

    fn knows_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    fn learn_ability(&mut self, ability: AbilityId) {
        self.abilities.insert(ability);
    }

    fn forget_ability(&mut self, ability: AbilityId) {
        self.abilities.remove(&ability);
    }

    fn stat(&self, slot: StatSlot) -> i32 {
        self.stats.get(slot)
    }

    fn add_stat(&mut self, slot: StatSlot, delta: i32) {
        self.stats.add(slot, delta);
    }

    fn currency(&self) -> u32 {
        self.wallet.gold
    }

    fn gain_currency(&mut self, amount: u32) {
        self.wallet.gain_gold(amount);
    }

    fn lose_currency(&mut self, amount: u32) {
        self.wallet.lose_gold(amount);
    }

    fn points(&self, class: Option<ClassId>) -> u32 {
        self.points.get(self.points_class(class))
    }

    fn gain_points(&mut self, amount: u32, class: Option<ClassId>) {
        let class = self.points_class(class);
        self.points.gain(class, amount);
    }

    fn lose_points(&mut self, amount: u32, class: Option<ClassId>) {
        let class = self.points_class(class);
        self.points.lose(class, amount);
    }

    fn item_count(&self, kind: InventoryKind, id: ItemId) -> u32 {
        self.wallet.count(kind, id)
    }

    fn gain_items(&mut self, kind: InventoryKind, id: ItemId, amount: u32) {
        self.wallet.gain(kind, id, amount);
    }

    fn lose_items(&mut self, kind: InventoryKind, id: ItemId, amount: u32) {
        self.wallet.lose(kind, id, amount);
    }
}

impl SwitchStore for GameSwitches {
    fn switch(&self, id: u32) -> bool {
        self.get(id)
    }

    fn set_switch(&mut self, id: u32, value: bool) {
        self.set(id, value);
    }
}

pub type ScriptHandler = Box<dyn Fn(&mut ScriptScope) -> Result<(), String> + Send + Sync>;

/// Script handlers by the key nodes refer to them with.
#[derive(Resource, Default)]
pub struct ScriptRegistry {
    handlers: HashMap<String, ScriptHandler>,
}

impl ScriptRegistry {
    pub fn register(
        &mut self,
        key: impl Into<String>,
        handler: impl Fn(&mut ScriptScope) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.handlers.insert(key.into(), Box::new(handler));
    }
}

impl ScriptRunner for ScriptRegistry {
    fn run(&self, key: &str, scope: &mut ScriptScope) -> Result<(), ScriptError> {
        let handler = self
            .handlers
            .get(key)
            .ok_or_else(|| ScriptError::Unregistered(key.to_string()))?;
        handler(scope).map_err(|message| ScriptError::Failed {
            key: key.to_string(),
            message,
        })
    }
}

/// Collects a node's one-shot events so they can be triggered once the
/// engine call has finished with the world.
#[derive(Default, Debug)]
pub struct QueuedEvents {
    pub fired: Vec<(EventId, bool)>,
}

impl EventDispatcher for QueuedEvents {
    fn dispatch(&mut self, event_id: EventId, closes_ui: bool) {
        self.fired.push((event_id, closes_ui));
    }
}

type HeroData = (
    Entity,
    &'static HeroId,
    Option<&'static Name>,
    &'static Level,
    &'static mut HeroClass,
    &'static mut KnownAbilities,
    &'static mut HeroStats,
    &'static mut ClassPoints,
    &'static mut TechTreeProgress,
);

/// Everything an observer needs to run an engine command for one hero.
#[derive(SystemParam)]
pub struct TechTreeWorld<'w, 's> {
    commands: Commands<'w, 's>,
    catalog: Option<Res<'w, NodeCatalog>>,
    settings: Res<'w, TechTreeSettings>,
    scripts: Res<'w, ScriptRegistry>,
    switches: ResMut<'w, GameSwitches>,
    wallet: ResMut<'w, Wallet>,
    heroes: Query<'w, 's, HeroData, With<Hero>>,
}

impl<'w, 's> TechTreeWorld<'w, 's> {
    /// Runs `command` against the hero's progress and stores, then triggers
    /// any events the command fired. `None` when the catalog is not loaded
    /// yet or the entity is not an initialized hero.
    pub fn run<R>(
        &mut self,
        hero: Entity,
        command: impl FnOnce(TechTreeRules, &mut TechTreeProgress, &mut EffectContext) -> R,
    ) -> Option<R> {
        let Some(catalog) = self.catalog.as_deref() else {
            warn!(?hero, "tech tree catalog is not loaded yet");
            return None;
        };
        let Ok((_, id, name, level, class, abilities, stats, points, progress)) =
            self.heroes.get_mut(hero)
        else {
            warn!(?hero, "entity is not a hero with tech tree progress");
            return None;
        };

        let mut character = HeroStore {
            name: name.map_or_else(|| format!("hero {}", id.0), |name| name.as_str().to_string()),
            level: level.0,
            class: class.into_inner(),
            abilities: abilities.into_inner(),
            stats: stats.into_inner(),
            points: points.into_inner(),
            wallet: &mut *self.wallet,
        };
        let mut events = QueuedEvents::default();
        let mut ctx = EffectContext {
            character: &mut character,
            switches: &mut *self.switches,
            scripts: &*self.scripts,
            events: &mut events,
        };
        let rules = TechTreeRules {
            catalog,
            settings: &*self.settings,
        };

        let result = command(rules, progress.into_inner(), &mut ctx);

        for (event_id, closes_ui) in events.fired {
            self.commands.trigger(TriggeredEventFired {
                hero,
                event_id,
                closes_ui,
            });
        }
        Some(result)
    }

    pub fn commands(&mut self) -> &mut Commands<'w, 's> {
        &mut self.commands
    }

    /// Every initialized hero.
    pub fn heroes(&self) -> Vec<Entity> {
        self.heroes.iter().map(|(entity, ..)| entity).collect()
    }
}
