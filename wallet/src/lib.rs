use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// The three inventory pools a cost or refund can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum InventoryKind {
    Item,
    Weapon,
    Armor,
}

/// Party-wide currency and inventory.
#[derive(Resource, Reflect, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Resource, Default)]
#[serde(default)]
pub struct Wallet {
    pub gold: u32,
    pub items: HashMap<u32, u32>,
    pub weapons: HashMap<u32, u32>,
    pub armors: HashMap<u32, u32>,
}

impl Wallet {
    fn pool(&self, kind: InventoryKind) -> &HashMap<u32, u32> {
        match kind {
            InventoryKind::Item => &self.items,
            InventoryKind::Weapon => &self.weapons,
            InventoryKind::Armor => &self.armors,
        }
    }

    fn pool_mut(&mut self, kind: InventoryKind) -> &mut HashMap<u32, u32> {
        match kind {
            InventoryKind::Item => &mut self.items,
            InventoryKind::Weapon => &mut self.weapons,
            InventoryKind::Armor => &mut self.armors,
        }
    }

    pub fn count(&self, kind: InventoryKind, id: u32) -> u32 {
        self.pool(kind).get(&id).copied().unwrap_or(0)
    }

    pub fn gain(&mut self, kind: InventoryKind, id: u32, amount: u32) {
        let entry = self.pool_mut(kind).entry(id).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Removes up to `amount`; the count never goes below zero.
    pub fn lose(&mut self, kind: InventoryKind, id: u32, amount: u32) {
        if let Some(entry) = self.pool_mut(kind).get_mut(&id) {
            *entry = entry.saturating_sub(amount);
        }
    }

    pub fn gain_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub fn lose_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
    }
}

pub struct WalletPlugin;

impl Plugin for WalletPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Wallet>().init_resource::<Wallet>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pools_are_separate() {
        let mut wallet = Wallet::default();
        wallet.gain(InventoryKind::Item, 3, 2);
        wallet.gain(InventoryKind::Armor, 3, 5);

        assert_eq!(wallet.count(InventoryKind::Item, 3), 2);
        assert_eq!(wallet.count(InventoryKind::Weapon, 3), 0);
        assert_eq!(wallet.count(InventoryKind::Armor, 3), 5);
    }

    #[test]
    fn test_lose_saturates() {
        let mut wallet = Wallet::default();
        wallet.gain_gold(10);
        wallet.lose_gold(25);
        wallet.gain(InventoryKind::Weapon, 1, 1);
        wallet.lose(InventoryKind::Weapon, 1, 4);

        assert_eq!(wallet.gold, 0);
        assert_eq!(wallet.count(InventoryKind::Weapon, 1), 0);
    }
}
