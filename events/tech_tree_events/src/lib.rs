use {
    bevy::prelude::*,
    tech_tree_assets::{ClassId, EventId, NodeUid, TreeUid},
};

// Requests. Each names the hero entity it acts on and is handled by an
// observer in the tech_tree crate.

/// Give the hero a character-owned instance of a catalog tree.
#[derive(Event, Debug, Clone)]
pub struct GrantTree {
    pub hero: Entity,
    pub tree_uid: TreeUid,
}

/// Activate a node without paying for it. Effects apply as a fresh activation.
#[derive(Event, Debug, Clone)]
pub struct ActivateNode {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
}

#[derive(Event, Debug, Clone)]
pub struct DeactivateNode {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
}

/// Player purchase: eligibility, cost, effects, then the active flag.
/// Answered with [`NodeUnlocked`] or [`UnlockRejected`].
#[derive(Event, Debug, Clone)]
pub struct UnlockNodeRequest {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
}

#[derive(Event, Debug, Clone)]
pub struct ResetTree {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub refund: bool,
}

#[derive(Event, Debug, Clone)]
pub struct ResetAllTrees {
    pub hero: Entity,
    pub refund: bool,
}

/// The hero switches to `class`. Runs the full class binding sequence.
#[derive(Event, Debug, Clone)]
pub struct ChangeClass {
    pub hero: Entity,
    pub class: ClassId,
}

/// Re-derive every instance of every hero from the current catalog.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ResyncTrees;

// Notifications.

#[derive(Event, Debug, Clone)]
pub struct NodeActivated {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
}

#[derive(Event, Debug, Clone)]
pub struct NodeDeactivated {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
}

/// A purchase went through. `animation_id` is what the menu should play.
#[derive(Event, Debug, Clone)]
pub struct NodeUnlocked {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
    pub animation_id: Option<u32>,
}

/// A purchase was refused; the menu answers with a buzz.
#[derive(Event, Debug, Clone)]
pub struct UnlockRejected {
    pub hero: Entity,
    pub tree_uid: TreeUid,
    pub node_uid: NodeUid,
    pub reason: String,
}

/// A node's one-shot event fired. The host decides what the id means.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggeredEventFired {
    pub hero: Entity,
    pub event_id: EventId,
    /// The tree menu should close and hand control back.
    pub closes_ui: bool,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ClassChanged {
    pub hero: Entity,
    pub from: ClassId,
    pub to: ClassId,
}

// Menu input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Open the tree menu for a hero on their first visible tree.
#[derive(Event, Debug, Clone, Copy)]
pub struct OpenTechTree {
    pub hero: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CloseTechTree;

#[derive(Event, Debug, Clone, Copy)]
pub struct MoveTreeCursor {
    pub direction: CursorDirection,
}

/// Switch to the next (or previous) tree the hero can see.
#[derive(Event, Debug, Clone, Copy)]
pub struct CycleTree {
    pub forward: bool,
}

/// Try to unlock the node under the cursor.
#[derive(Event, Debug, Clone, Copy)]
pub struct ConfirmTreeNode;
