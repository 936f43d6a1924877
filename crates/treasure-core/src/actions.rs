//! Player actions and the events they produce.
//!
//! Actions carry only plain payloads (positions, colours, card ids, booleans)
//! so they can be submitted from any thread or shipped across a process
//! boundary.

use crate::cards::{CardId, GoldCard, PathCard, TreasureCard};
use crate::error::IllegalAction;
use crate::hex::TilePosition;
use crate::player::PlayerId;
use crate::trail::TrailColor;
use serde::{Deserialize, Serialize};

/// All possible actions a player can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    // ==================== Setup ====================
    /// Choose the starting tile
    SelectPosition(TilePosition),

    // ==================== Regular Turn ====================
    /// Play a path card from hand onto a trail
    PlayPathCard { card: CardId, color: TrailColor },
    /// Begin a drive session
    StartDrive,
    /// Pick up the amulet lying on the current tile
    CollectAmulet,
    /// Spend an amulet on a special action
    UseAmulet(AmuletAction),
    /// Dig up the treasure of a fully resolved trail
    CollectTreasure(TrailColor),

    // ==================== Driving ====================
    /// Drive to a tile in the same area or next to the current one
    Drive(TilePosition),
    /// Stop driving and end the turn
    EndTurn,

    // ==================== Amulet Effects ====================
    /// Exclude a candidate tile from a trail
    SelectTileToRemove {
        position: TilePosition,
        color: TrailColor,
    },

    // ==================== Treasure Distribution ====================
    /// Draw the allotted treasure cards
    DrawTreasureCards,
    /// Acknowledge the drawn cards
    ConfirmTreasureCards,
    /// Accept or decline the offered gold card
    AcceptTreasure(bool),
    /// Take the curse penalty
    AcceptCurse,
}

/// Discriminant of a [`PlayerAction`], used by the objective table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    SelectPosition,
    PlayPathCard,
    StartDrive,
    CollectAmulet,
    UseAmulet,
    CollectTreasure,
    Drive,
    EndTurn,
    SelectTileToRemove,
    DrawTreasureCards,
    ConfirmTreasureCards,
    AcceptTreasure,
    AcceptCurse,
}

impl PlayerAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlayerAction::SelectPosition(_) => ActionKind::SelectPosition,
            PlayerAction::PlayPathCard { .. } => ActionKind::PlayPathCard,
            PlayerAction::StartDrive => ActionKind::StartDrive,
            PlayerAction::CollectAmulet => ActionKind::CollectAmulet,
            PlayerAction::UseAmulet(_) => ActionKind::UseAmulet,
            PlayerAction::CollectTreasure(_) => ActionKind::CollectTreasure,
            PlayerAction::Drive(_) => ActionKind::Drive,
            PlayerAction::EndTurn => ActionKind::EndTurn,
            PlayerAction::SelectTileToRemove { .. } => ActionKind::SelectTileToRemove,
            PlayerAction::DrawTreasureCards => ActionKind::DrawTreasureCards,
            PlayerAction::ConfirmTreasureCards => ActionKind::ConfirmTreasureCards,
            PlayerAction::AcceptTreasure(_) => ActionKind::AcceptTreasure,
            PlayerAction::AcceptCurse => ActionKind::AcceptCurse,
        }
    }
}

/// What an amulet can be spent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmuletAction {
    /// Remove one candidate tile from a trail
    RemoveTile,
    /// Play an extra path card
    PlayHint,
    /// One more partial drive this round
    ExtraDrive,
    /// Swap the whole hand for new path cards
    RedrawPathCards,
}

impl AmuletAction {
    pub const ALL: [AmuletAction; 4] = [
        AmuletAction::RemoveTile,
        AmuletAction::PlayHint,
        AmuletAction::ExtraDrive,
        AmuletAction::RedrawPathCards,
    ];

    pub fn human_readable(&self) -> &'static str {
        match self {
            AmuletAction::RemoveTile => "Remove a tile",
            AmuletAction::PlayHint => "Play a hint",
            AmuletAction::ExtraDrive => "Extra drive",
            AmuletAction::RedrawPathCards => "Redraw path cards",
        }
    }
}

/// Events emitted as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new round started
    RoundStarted { round: u32 },

    /// A player picked a starting tile
    PositionSelected {
        player: PlayerId,
        position: TilePosition,
    },

    /// A path card was moved from a hand onto a trail
    PathCardPlayed {
        player: PlayerId,
        card: PathCard,
        color: TrailColor,
        remaining: usize,
    },

    /// A player drove along a route (both ends included)
    Drove {
        player: PlayerId,
        route: Vec<TilePosition>,
    },

    AmuletCollected {
        player: PlayerId,
        position: TilePosition,
    },

    AmuletUsed {
        player: PlayerId,
        action: AmuletAction,
    },

    /// A remove-tile card was added to a trail
    TileRemoved {
        position: TilePosition,
        color: TrailColor,
    },

    /// A trail was resolved and dug up
    TreasureCollected {
        player: PlayerId,
        color: TrailColor,
        position: TilePosition,
    },

    TreasureCardsDrawn {
        player: PlayerId,
        cards: Vec<TreasureCard>,
    },

    TreasureAccepted { player: PlayerId, card: GoldCard },

    TreasureDeclined { player: PlayerId, card: GoldCard },

    /// A curse hit a player, costing an amulet or their best gold card
    Cursed {
        player: PlayerId,
        amulet_used: bool,
        lost: Option<GoldCard>,
    },

    /// Statues placed new amulets
    AmuletsSpawned { positions: Vec<TilePosition> },

    /// A submitted action was discarded
    ActionRejected {
        player: PlayerId,
        action: PlayerAction,
        reason: IllegalAction,
    },

    /// The deck ran out and the richest player won
    GameWon { player: PlayerId, gold: u32 },
}
