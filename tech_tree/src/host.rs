//! Capabilities the engine needs from the game hosting it.
//!
//! Nothing in the engine touches ECS state directly. Each operation receives
//! an [`EffectContext`] and works through these traits, so the same code runs
//! against Bevy components in the game and plain structs in tests.

use {
    tech_tree_assets::{AbilityId, ClassId, EventId, ItemId, StatSlot},
    thiserror::Error,
};

pub use wallet::InventoryKind;

/// The acting character plus the party resources it spends.
pub trait CharacterStore {
    /// Display name, used as log context.
    fn name(&self) -> String;
    fn level(&self) -> u32;
    fn class_id(&self) -> ClassId;
    fn set_class(&mut self, class: ClassId);

    fn knows_ability(&self, ability: AbilityId) -> bool;
    fn learn_ability(&mut self, ability: AbilityId);
    fn forget_ability(&mut self, ability: AbilityId);

    fn stat(&self, slot: StatSlot) -> i32;
    fn add_stat(&mut self, slot: StatSlot, delta: i32);

    fn currency(&self) -> u32;
    fn gain_currency(&mut self, amount: u32);
    fn lose_currency(&mut self, amount: u32);

    /// Class points held for `class`, or for the current class when `None`.
    fn points(&self, class: Option<ClassId>) -> u32;
    fn gain_points(&mut self, amount: u32, class: Option<ClassId>);
    fn lose_points(&mut self, amount: u32, class: Option<ClassId>);

    fn item_count(&self, kind: InventoryKind, id: ItemId) -> u32;
    fn gain_items(&mut self, kind: InventoryKind, id: ItemId, amount: u32);
    fn lose_items(&mut self, kind: InventoryKind, id: ItemId, amount: u32);
}

/// Global boolean flags.
pub trait SwitchStore {
    fn switch(&self, id: u32) -> bool;
    fn set_switch(&mut self, id: u32, value: bool);

    fn all_on(&self, ids: &[u32]) -> bool {
        ids.iter().all(|&id| self.switch(id))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("no script handler is registered under `{0}`")]
    Unregistered(String),
    #[error("script `{key}` failed: {message}")]
    Failed { key: String, message: String },
}

/// What a script handler may touch while it runs.
pub struct ScriptScope<'a> {
    pub character: &'a mut dyn CharacterStore,
    pub switches: &'a mut dyn SwitchStore,
    pub tree_uid: &'a str,
    pub node_uid: &'a str,
}

/// Resolves the opaque script keys stored on nodes.
pub trait ScriptRunner {
    fn run(&self, key: &str, scope: &mut ScriptScope) -> Result<(), ScriptError>;
}

/// Fire-and-forget sink for a node's one-shot events.
pub trait EventDispatcher {
    fn dispatch(&mut self, event_id: EventId, closes_ui: bool);
}

/// Everything an operation on one character may read or change besides the
/// character's own tree progress.
pub struct EffectContext<'a> {
    pub character: &'a mut dyn CharacterStore,
    pub switches: &'a mut dyn SwitchStore,
    pub scripts: &'a dyn ScriptRunner,
    pub events: &'a mut dyn EventDispatcher,
}
