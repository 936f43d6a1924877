//! Reference bot.
//!
//! The bot only looks at its own [`PlayerState`] snapshots and answers
//! through the same queue a human would use. It picks arbitrary legal
//! actions, with two small preferences so games actually end:
//! - dig up a treasure when standing on it
//! - drive onto a resolved treasure tile when it is in reach

use crate::actions::{ActionKind, AmuletAction, PlayerAction};
use crate::controller::PlayerHandle;
use crate::hex::TilePosition;
use crate::objective::PlayerObjective;
use crate::player::PlayerId;
use crate::snapshot::PlayerState;
use rand::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    /// Pause before every answer so automated play stays observable
    pub delay: Duration,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, delay: Duration) -> Self {
        Self {
            player_id,
            delay,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, delay: Duration, seed: u64) -> Self {
        Self {
            player_id,
            delay,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Answer prompts until the game drops the seat
    pub async fn run(mut self, handle: PlayerHandle) {
        let mut updates = handle.subscribe();
        loop {
            let snapshot = updates.borrow_and_update().clone();
            if let Some(action) = self.choose_action(&snapshot) {
                tokio::time::sleep(self.delay).await;
                debug!("Bot {} answers {:?} with {:?}", self.player_id, snapshot.objective, action);
                if handle.trigger_action(action).is_err() {
                    break;
                }
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    }

    /// Choose an action for the current prompt, `None` when idle
    pub fn choose_action(&mut self, state: &PlayerState) -> Option<PlayerAction> {
        let legal = self.legal_actions(state);

        if state.objective.allows(ActionKind::CollectTreasure) {
            if let Some(color) = state.collectable_treasures.iter().next() {
                return Some(PlayerAction::CollectTreasure(*color));
            }
        }
        if let Some(target) = self.treasure_in_reach(state) {
            return Some(PlayerAction::Drive(target));
        }
        legal.choose(&mut self.rng).copied()
    }

    /// Every action the engine would currently accept
    pub fn legal_actions(&self, state: &PlayerState) -> Vec<PlayerAction> {
        let mut actions = Vec::new();
        match state.objective {
            PlayerObjective::Idle => {}

            PlayerObjective::SelectPosition => {
                actions.extend(
                    known_tiles(state)
                        .into_iter()
                        .map(PlayerAction::SelectPosition),
                );
            }

            PlayerObjective::RegularTurn => {
                if state.can_collect_amulet {
                    actions.push(PlayerAction::CollectAmulet);
                }
                actions.extend(
                    state
                        .playable_cards()
                        .map(|(card, color)| PlayerAction::PlayPathCard { card, color }),
                );
                actions.push(PlayerAction::StartDrive);
                if state.amulets > 0 {
                    actions.extend(usable_amulets(state).into_iter().map(PlayerAction::UseAmulet));
                }
            }

            PlayerObjective::Drive | PlayerObjective::ExtraDrive => {
                if state.drives_remaining > 0 {
                    actions.extend(state.drivable.iter().copied().map(PlayerAction::Drive));
                }
                if state.objective == PlayerObjective::Drive && state.can_collect_amulet {
                    actions.push(PlayerAction::CollectAmulet);
                }
                actions.push(PlayerAction::EndTurn);
            }

            PlayerObjective::PlayPathCard => {
                actions.extend(
                    state
                        .playable_cards()
                        .map(|(card, color)| PlayerAction::PlayPathCard { card, color }),
                );
            }

            PlayerObjective::SelectTileToRemove => {
                for (color, candidates) in &state.trail_candidates {
                    if candidates.len() > 1 {
                        actions.extend(candidates.iter().map(|position| {
                            PlayerAction::SelectTileToRemove {
                                position: *position,
                                color: *color,
                            }
                        }));
                    }
                }
            }

            PlayerObjective::DrawTreasureCards => actions.push(PlayerAction::DrawTreasureCards),
            PlayerObjective::ConfirmTreasureCards => {
                actions.push(PlayerAction::ConfirmTreasureCards)
            }
            PlayerObjective::AcceptTreasure => {
                actions.push(PlayerAction::AcceptTreasure(true));
                actions.push(PlayerAction::AcceptTreasure(false));
            }
            PlayerObjective::AcceptCurse => actions.push(PlayerAction::AcceptCurse),
        }
        actions
    }

    /// A drivable tile that is the only candidate of some trail
    fn treasure_in_reach(&self, state: &PlayerState) -> Option<TilePosition> {
        if !state.objective.is_driving() || state.drives_remaining == 0 {
            return None;
        }
        state
            .trail_candidates
            .values()
            .filter(|candidates| candidates.len() == 1)
            .filter_map(|candidates| candidates.first())
            .find(|position| state.drivable.contains(position))
            .copied()
    }
}

/// All tiles the snapshot mentions. An empty trail covers the whole island.
fn known_tiles(state: &PlayerState) -> BTreeSet<TilePosition> {
    state
        .trail_candidates
        .values()
        .flat_map(|candidates| candidates.iter().copied())
        .collect()
}

fn usable_amulets(state: &PlayerState) -> Vec<AmuletAction> {
    let mut usable = vec![AmuletAction::ExtraDrive, AmuletAction::RedrawPathCards];
    if state.playable_cards().next().is_some() {
        usable.push(AmuletAction::PlayHint);
    }
    if state.trail_candidates.values().any(|c| c.len() > 1) {
        usable.push(AmuletAction::RemoveTile);
    }
    usable
}
