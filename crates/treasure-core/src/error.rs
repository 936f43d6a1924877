//! Error types.
//!
//! Two severities exist. An [`IllegalAction`] is recovered locally by the turn
//! engine: the action is discarded, nothing is mutated and the same objective
//! is awaited again. A [`GameError`] is fatal and propagates to whoever is
//! driving the game loop.

use crate::actions::ActionKind;
use crate::cards::CardId;
use crate::grid::TileType;
use crate::hex::TilePosition;
use crate::objective::PlayerObjective;
use crate::player::PlayerId;
use crate::trail::TrailColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A submitted action that cannot be executed right now
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IllegalAction {
    #[error("{action:?} is not allowed while the objective is {objective:?}")]
    NotAllowed {
        action: ActionKind,
        objective: PlayerObjective,
    },

    #[error("There is no tile at {0}")]
    UnknownTile(TilePosition),

    #[error("Player does not hold card {0:?}")]
    NoSuchCard(CardId),

    #[error("Card {card:?} does not narrow down the {color:?} trail")]
    InadmissibleCard { card: CardId, color: TrailColor },

    #[error("Area cards only accept terrain filters")]
    InvalidCardFilter,

    #[error("Cannot drive to {0}")]
    NotDrivable(TilePosition),

    #[error("Drive limit of {0} reached for this round")]
    DriveLimitReached(u32),

    #[error("Player has no amulets")]
    NoAmulet,

    #[error("There is no amulet on this tile")]
    NoAmuletHere,

    #[error("The {0:?} trail does not point to a single tile")]
    TrailNotResolved(TrailColor),

    #[error("Player is not standing on the {0:?} treasure")]
    NotOnTreasure(TrailColor),

    #[error("Tile {position} is not part of the {color:?} trail")]
    TileNotOnTrail {
        position: TilePosition,
        color: TrailColor,
    },

    #[error("No path card in hand can be played")]
    NoPlayableCard,

    #[error("No trail has a tile left to remove")]
    NothingToRemove,

    #[error("Player has not chosen a starting position yet")]
    PositionNotChosen,
}

/// Unrecoverable problems while building the island
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Two {tile_type:?} areas share the largest size of {size} tiles")]
    AmbiguousBiggestArea { tile_type: TileType, size: usize },
}

/// Fatal errors that end the game loop
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Not enough players: {count} (minimum {min})")]
    NotEnoughPlayers { count: usize, min: usize },

    #[error("Too many players: {count} (maximum {max})")]
    TooManyPlayers { count: usize, max: usize },

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Game was stopped")]
    Stopped,

    #[error("Action queue of player {0} was closed")]
    Disconnected(PlayerId),

    #[error("The grid can no longer be replaced")]
    GridLocked,

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Result of executing an action handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error(transparent)]
    Illegal(#[from] IllegalAction),

    #[error(transparent)]
    Fatal(#[from] GameError),
}
