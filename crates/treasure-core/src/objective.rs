//! Per-player objectives of the turn state machine.
//!
//! Each objective statically declares which action kinds are legal while a
//! player is in it. Anything else is discarded without touching the game.

use crate::actions::ActionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerObjective {
    /// Driving one partial route after another
    Drive,
    /// The single partial drive granted by an amulet
    ExtraDrive,
    /// Main part of a player's turn
    RegularTurn,
    DrawTreasureCards,
    ConfirmTreasureCards,
    /// Decide on an offered gold card
    AcceptTreasure,
    AcceptCurse,
    SelectTileToRemove,
    PlayPathCard,
    /// Pick a starting tile
    SelectPosition,
    /// Not the player's move
    #[default]
    Idle,
}

impl PlayerObjective {
    /// Action kinds accepted while in this objective
    pub fn allowed_actions(self) -> &'static [ActionKind] {
        use ActionKind as A;
        match self {
            PlayerObjective::Drive => &[
                A::Drive,
                A::CollectAmulet,
                A::UseAmulet,
                A::CollectTreasure,
                A::EndTurn,
            ],
            PlayerObjective::ExtraDrive => {
                &[A::Drive, A::UseAmulet, A::CollectTreasure, A::EndTurn]
            }
            PlayerObjective::RegularTurn => &[
                A::CollectAmulet,
                A::PlayPathCard,
                A::UseAmulet,
                A::StartDrive,
                A::CollectTreasure,
            ],
            PlayerObjective::DrawTreasureCards => &[A::DrawTreasureCards],
            PlayerObjective::ConfirmTreasureCards => &[A::ConfirmTreasureCards],
            PlayerObjective::AcceptTreasure => &[A::AcceptTreasure],
            PlayerObjective::AcceptCurse => &[A::AcceptCurse],
            PlayerObjective::SelectTileToRemove => &[A::SelectTileToRemove],
            PlayerObjective::PlayPathCard => &[A::PlayPathCard],
            PlayerObjective::SelectPosition => &[A::SelectPosition],
            PlayerObjective::Idle => &[],
        }
    }

    pub fn allows(self, kind: ActionKind) -> bool {
        self.allowed_actions().contains(&kind)
    }

    /// Part of a drive session
    pub fn is_driving(self) -> bool {
        matches!(self, PlayerObjective::Drive | PlayerObjective::ExtraDrive)
    }
}
