//! Node prices: breakdown, affordability, payment and refunds.

use {
    crate::{
        error::TechTreeError,
        host::{CharacterStore, InventoryKind},
    },
    bevy::prelude::*,
    tech_tree_assets::{ClassId, ItemCost, ItemId, NodeCosts, NodeDefinition},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    /// Party currency.
    Currency,
    /// Class points.
    Points,
    Inventory { kind: InventoryKind, id: ItemId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostLine {
    pub kind: CostKind,
    pub amount: u32,
    /// Filled in only when the breakdown was built against a character.
    pub affordable: Option<bool>,
}

/// Every nonzero line of the node's price, in display order. Entries naming
/// the same cost kind are merged into one line.
pub fn cost_breakdown(node: &NodeDefinition) -> Vec<CostLine> {
    let NodeCosts {
        currency,
        points,
        items,
        weapons,
        armors,
    } = &node.costs;

    let inventory = |kind: InventoryKind, costs: &[ItemCost]| {
        costs
            .iter()
            .map(move |cost| (CostKind::Inventory { kind, id: cost.id }, cost.amount))
            .collect::<Vec<_>>()
    };

    let mut lines: Vec<CostLine> = Vec::new();
    for (kind, amount) in [(CostKind::Currency, *currency), (CostKind::Points, *points)]
        .into_iter()
        .chain(inventory(InventoryKind::Item, items.as_slice()))
        .chain(inventory(InventoryKind::Weapon, weapons.as_slice()))
        .chain(inventory(InventoryKind::Armor, armors.as_slice()))
        .filter(|(_, amount)| *amount > 0)
    {
        match lines.iter_mut().find(|line| line.kind == kind) {
            Some(line) => line.amount = line.amount.saturating_add(amount),
            None => lines.push(CostLine {
                kind,
                amount,
                affordable: None,
            }),
        }
    }
    lines
}

/// Like [`cost_breakdown`], with each line checked against the character.
pub fn cost_breakdown_for(node: &NodeDefinition, character: &dyn CharacterStore) -> Vec<CostLine> {
    cost_breakdown(node)
        .into_iter()
        .map(|line| CostLine {
            affordable: Some(balance(character, line.kind) >= line.amount),
            ..line
        })
        .collect()
}

/// What the character holds of a cost kind. Points are the current class's.
pub fn balance(character: &dyn CharacterStore, kind: CostKind) -> u32 {
    match kind {
        CostKind::Currency => character.currency(),
        CostKind::Points => character.points(None),
        CostKind::Inventory { kind, id } => character.item_count(kind, id),
    }
}

/// Every line is covered by the matching balance.
pub fn can_pay(character: &dyn CharacterStore, node: &NodeDefinition) -> bool {
    cost_breakdown(node)
        .iter()
        .all(|line| balance(character, line.kind) >= line.amount)
}

/// Deducts the node's price.
///
/// Affordability is checked again first; an unaffordable node deducts
/// nothing.
pub fn pay(
    character: &mut dyn CharacterStore,
    tree_uid: &str,
    node: &NodeDefinition,
) -> Result<(), TechTreeError> {
    if !can_pay(character, node) {
        warn!(
            hero = %character.name(),
            tree = %tree_uid,
            node = %node.uid,
            "refusing to charge for an unaffordable node"
        );
        return Err(TechTreeError::Unaffordable {
            tree: tree_uid.to_string(),
            node: node.uid.clone(),
        });
    }

    for line in cost_breakdown(node) {
        match line.kind {
            CostKind::Currency => character.lose_currency(line.amount),
            CostKind::Points => character.lose_points(line.amount, None),
            CostKind::Inventory { kind, id } => character.lose_items(kind, id, line.amount),
        }
    }
    Ok(())
}

/// Gives the node's price back. Points go to `class`, or to the current
/// class when `None`.
pub fn refund(character: &mut dyn CharacterStore, node: &NodeDefinition, class: Option<ClassId>) {
    for line in cost_breakdown(node) {
        match line.kind {
            CostKind::Currency => character.gain_currency(line.amount),
            CostKind::Points => character.gain_points(line.amount, class),
            CostKind::Inventory { kind, id } => character.gain_items(kind, id, line.amount),
        }
    }
}

/// The node's contribution to one cost kind.
pub fn cost_of(node: &NodeDefinition, kind: CostKind) -> u32 {
    cost_breakdown(node)
        .iter()
        .filter(|line| line.kind == kind)
        .map(|line| line.amount)
        .sum()
}
