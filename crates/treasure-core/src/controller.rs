//! Turn state machine.
//!
//! Every seat owns an unbounded action queue. The engine sets an objective,
//! publishes a fresh [`PlayerState`], then blocks on the queue. Actions whose
//! kind the objective does not allow are discarded, as are actions a handler
//! rejects with an [`IllegalAction`]; in both cases nothing was mutated and the
//! same objective is awaited again. Handlers validate everything before they
//! touch the game, and some of them wait for follow-up actions themselves
//! (a drive asks for the next drive, an amulet asks for its target).

use crate::actions::{ActionKind, AmuletAction, GameEvent, PlayerAction};
use crate::cards::{CardId, GoldCard, PathCard, TreasureCard};
use crate::error::{GameError, IllegalAction, TurnError};
use crate::game::GameController;
use crate::hex::TilePosition;
use crate::objective::PlayerObjective;
use crate::player::PlayerId;
use crate::snapshot::PlayerState;
use crate::trail::TrailColor;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Engine-side bookkeeping of one player
#[derive(Debug)]
pub(crate) struct Seat {
    actions: mpsc::UnboundedReceiver<PlayerAction>,
    state_tx: watch::Sender<PlayerState>,
    pub objective: PlayerObjective,
    /// Partial drives taken this round
    pub drive_count: u32,
    pub treasure_cards_to_draw: usize,
    pub drawn_treasure_cards: Vec<TreasureCard>,
    pub offered_gold_card: Option<GoldCard>,
    pub accepted_treasure: bool,
    revision: u64,
}

impl Seat {
    /// Create the seat together with the handle collaborators use to reach it
    pub(crate) fn new(id: PlayerId, stopped: Arc<AtomicBool>) -> (Self, PlayerHandle) {
        let (actions_tx, actions) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PlayerState::idle(id));
        let seat = Self {
            actions,
            state_tx,
            objective: PlayerObjective::Idle,
            drive_count: 0,
            treasure_cards_to_draw: 0,
            drawn_treasure_cards: Vec::new(),
            offered_gold_card: None,
            accepted_treasure: false,
            revision: 0,
        };
        let handle = PlayerHandle {
            id,
            actions: actions_tx,
            state,
            stopped,
        };
        (seat, handle)
    }

    pub(crate) fn reset_round(&mut self) {
        self.drive_count = 0;
    }
}

/// Collaborator side of a seat: submit actions, read snapshots.
///
/// Handles are cheap to clone and may be used from any thread or task. The
/// engine fails with [`GameError::Disconnected`] once every handle of a
/// prompted seat has been dropped, and handles refuse new actions with
/// [`GameError::Stopped`] once the game has been stopped.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    id: PlayerId,
    actions: mpsc::UnboundedSender<PlayerAction>,
    state: watch::Receiver<PlayerState>,
    stopped: Arc<AtomicBool>,
}

impl PlayerHandle {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Queue an action for the engine
    pub fn trigger_action(&self, action: PlayerAction) -> Result<(), GameError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(GameError::Stopped);
        }
        self.actions
            .send(action)
            .map_err(|_| GameError::Disconnected(self.id))
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.clone()
    }
}

impl GameController {
    pub(crate) fn seat(&self, player: PlayerId) -> Result<&Seat, GameError> {
        self.seats
            .get(player as usize)
            .ok_or(GameError::UnknownPlayer(player))
    }

    pub(crate) fn seat_mut(&mut self, player: PlayerId) -> Result<&mut Seat, GameError> {
        self.seats
            .get_mut(player as usize)
            .ok_or(GameError::UnknownPlayer(player))
    }

    /// Current objective of a player
    pub fn objective(&self, player: PlayerId) -> Result<PlayerObjective, GameError> {
        Ok(self.seat(player)?.objective)
    }

    /// Change the objective. Idling a player always republishes the snapshot.
    pub(crate) fn set_objective(
        &mut self,
        player: PlayerId,
        objective: PlayerObjective,
    ) -> Result<(), GameError> {
        self.seat_mut(player)?.objective = objective;
        if objective == PlayerObjective::Idle {
            self.publish(player)?;
        }
        Ok(())
    }

    /// Build the player's snapshot and push it to their watch channel
    pub(crate) fn publish(&mut self, player: PlayerId) -> Result<(), GameError> {
        let mut snapshot = self.build_snapshot(player)?;
        let seat = self.seat_mut(player)?;
        seat.revision += 1;
        snapshot.revision = seat.revision;
        seat.state_tx.send_replace(snapshot);
        Ok(())
    }

    fn build_snapshot(&self, player: PlayerId) -> Result<PlayerState, GameError> {
        let seat = self.seat(player)?;
        let state = &self.state;
        let current = state.player(player)?;
        let drives_remaining = self.config.drive_limit.saturating_sub(seat.drive_count);

        let drivable = if seat.objective.allows(ActionKind::Drive) && drives_remaining > 0 {
            state.drivable_tiles(player)?
        } else {
            BTreeSet::new()
        };
        let can_collect_amulet = current
            .position
            .and_then(|position| state.grid().tile(&position))
            .is_some_and(|tile| tile.has_amulet());
        let trail_candidates = TrailColor::ALL
            .into_iter()
            .map(|color| (color, state.evaluate_treasure_trail(color).clone()))
            .collect();

        Ok(PlayerState {
            player,
            objective: seat.objective,
            position: current.position,
            drawn_treasure_cards: seat.drawn_treasure_cards.clone(),
            offered_gold_card: seat.offered_gold_card,
            drivable,
            drives_remaining,
            valid_path_cards: state.valid_path_cards(player)?,
            collectable_treasures: state.collectable_treasures(player)?,
            amulets: current.amulets,
            can_collect_amulet,
            hand: current.path_cards.values().cloned().collect(),
            total_gold: current.total_gold(),
            trail_candidates,
            revision: 0,
        })
    }

    /// Prompt `player` with `objective` and block until an action was executed.
    ///
    /// Disallowed and rejected actions are logged, recorded as
    /// [`GameEvent::ActionRejected`] and the prompt is repeated. Only fatal
    /// errors end the wait early.
    pub fn wait_for_next_action(
        &mut self,
        player: PlayerId,
        objective: PlayerObjective,
    ) -> Result<PlayerAction, GameError> {
        loop {
            self.seat_mut(player)?.objective = objective;
            self.publish(player)?;

            debug!("Waiting for player {} ({:?})", player, objective);
            let Some(action) = self.seat_mut(player)?.actions.blocking_recv() else {
                // Handles give up once the game is stopped
                if self.is_stopped() {
                    return Err(GameError::Stopped);
                }
                return Err(GameError::Disconnected(player));
            };

            let outcome = if objective.allows(action.kind()) {
                self.execute(player, action, objective)
            } else {
                Err(IllegalAction::NotAllowed {
                    action: action.kind(),
                    objective,
                }
                .into())
            };

            match outcome {
                Ok(()) => {
                    debug!("Player {} executed {:?}", player, action);
                    return Ok(action);
                }
                Err(TurnError::Illegal(reason)) => {
                    warn!("Discarding {:?} from player {}: {}", action, player, reason);
                    self.events.push(GameEvent::ActionRejected {
                        player,
                        action,
                        reason,
                    });
                }
                Err(TurnError::Fatal(error)) => return Err(error),
            }
        }
    }

    fn execute(
        &mut self,
        player: PlayerId,
        action: PlayerAction,
        objective: PlayerObjective,
    ) -> Result<(), TurnError> {
        match action {
            PlayerAction::SelectPosition(position) => self.select_position(player, position),
            PlayerAction::PlayPathCard { card, color } => self.play_path_card(player, card, color),
            PlayerAction::StartDrive => {
                self.wait_for_next_action(player, PlayerObjective::Drive)?;
                Ok(())
            }
            PlayerAction::Drive(target) => self.drive(player, target, objective),
            PlayerAction::EndTurn => Ok(()),
            PlayerAction::CollectTreasure(color) => self.collect_treasure_at(player, color),
            PlayerAction::CollectAmulet => self.collect_amulet(player, objective),
            PlayerAction::UseAmulet(amulet) => self.use_amulet(player, amulet, objective),
            PlayerAction::SelectTileToRemove { position, color } => {
                self.select_tile_to_remove(position, color)
            }
            PlayerAction::DrawTreasureCards => self.draw_treasure_cards(player),
            PlayerAction::ConfirmTreasureCards => Ok(()),
            PlayerAction::AcceptTreasure(accept) => self.accept_treasure(player, accept),
            PlayerAction::AcceptCurse => self.accept_curse(player),
        }
    }

    // ==================== Handlers ====================

    fn select_position(&mut self, player: PlayerId, position: TilePosition) -> Result<(), TurnError> {
        if !self.state.grid().contains(&position) {
            return Err(IllegalAction::UnknownTile(position).into());
        }
        self.state.player_mut(player)?.position = Some(position);
        self.events
            .push(GameEvent::PositionSelected { player, position });
        Ok(())
    }

    fn play_path_card(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        color: TrailColor,
    ) -> Result<(), TurnError> {
        let card = self
            .state
            .player(player)?
            .path_cards
            .get(&card_id)
            .cloned()
            .ok_or(IllegalAction::NoSuchCard(card_id))?;
        if !self.state.can_add_card_to_treasure_trail(color, &card) {
            return Err(IllegalAction::InadmissibleCard {
                card: card_id,
                color,
            }
            .into());
        }

        let taken = self
            .state
            .player_mut(player)?
            .take_card(card_id)
            .ok_or(IllegalAction::NoSuchCard(card_id))?;
        if let Err(rejected) = self.state.add_card_to_treasure_trail(color, taken) {
            self.state.player_mut(player)?.add_card(rejected);
            return Err(IllegalAction::InadmissibleCard {
                card: card_id,
                color,
            }
            .into());
        }
        self.state.draw_path_card(player)?;

        let remaining = self.state.evaluate_treasure_trail(color).len();
        debug!("Player {} played {} on {:?}, {} tiles left", player, card, color, remaining);
        self.events.push(GameEvent::PathCardPlayed {
            player,
            card,
            color,
            remaining,
        });
        Ok(())
    }

    fn drive(
        &mut self,
        player: PlayerId,
        target: TilePosition,
        objective: PlayerObjective,
    ) -> Result<(), TurnError> {
        let limit = self.config.drive_limit;
        if self.seat(player)?.drive_count >= limit {
            return Err(IllegalAction::DriveLimitReached(limit).into());
        }
        let from = self
            .state
            .player(player)?
            .position
            .ok_or(IllegalAction::PositionNotChosen)?;
        let grid = self.state.grid();
        let mut region = grid.drivable_from(&from);
        if !region.contains(&target) {
            return Err(IllegalAction::NotDrivable(target).into());
        }
        region.insert(from);
        let route = grid.find_path(&from, &target, &grid.edges_within(&region), |_, _| 1);

        self.state.player_mut(player)?.position = Some(target);
        let seat = self.seat_mut(player)?;
        seat.drive_count += 1;
        let count = seat.drive_count;
        self.events.push(GameEvent::Drove { player, route });

        if count < limit {
            self.wait_for_next_action(player, objective)?;
        }
        Ok(())
    }

    fn collect_treasure_at(&mut self, player: PlayerId, color: TrailColor) -> Result<(), TurnError> {
        let position = self
            .state
            .player(player)?
            .position
            .ok_or(IllegalAction::PositionNotChosen)?;
        let treasure = self
            .state
            .trail(color)
            .treasure(self.state.grid())
            .ok_or(IllegalAction::TrailNotResolved(color))?;
        if treasure != position {
            return Err(IllegalAction::NotOnTreasure(color).into());
        }

        info!("Player {} digs up the {:?} treasure at {}", player, color, position);
        self.events.push(GameEvent::TreasureCollected {
            player,
            color,
            position,
        });
        self.collect_treasure(color)?;
        Ok(())
    }

    fn collect_amulet(&mut self, player: PlayerId, objective: PlayerObjective) -> Result<(), TurnError> {
        let position = self
            .state
            .player(player)?
            .position
            .ok_or(IllegalAction::PositionNotChosen)?;
        if !self.state.grid_mut().take_amulet(&position) {
            return Err(IllegalAction::NoAmuletHere.into());
        }
        self.state.player_mut(player)?.add_amulets(1);
        self.events
            .push(GameEvent::AmuletCollected { player, position });

        if objective.is_driving() {
            self.wait_for_next_action(player, objective)?;
        }
        Ok(())
    }

    fn use_amulet(
        &mut self,
        player: PlayerId,
        amulet: AmuletAction,
        objective: PlayerObjective,
    ) -> Result<(), TurnError> {
        if self.state.player(player)?.amulets == 0 {
            return Err(IllegalAction::NoAmulet.into());
        }
        match amulet {
            AmuletAction::PlayHint if self.state.valid_path_cards(player)?.is_empty() => {
                return Err(IllegalAction::NoPlayableCard.into());
            }
            AmuletAction::RemoveTile if !self.state.has_removable_tile() => {
                return Err(IllegalAction::NothingToRemove.into());
            }
            _ => {}
        }

        self.state.player_mut(player)?.remove_amulet();
        self.events.push(GameEvent::AmuletUsed {
            player,
            action: amulet,
        });
        debug!("Player {} uses an amulet: {}", player, amulet.human_readable());

        match amulet {
            AmuletAction::RemoveTile => {
                self.wait_for_next_action(player, PlayerObjective::SelectTileToRemove)?;
            }
            AmuletAction::PlayHint => {
                self.wait_for_next_action(player, PlayerObjective::PlayPathCard)?;
            }
            AmuletAction::ExtraDrive => {
                let limit = self.config.drive_limit;
                let seat = self.seat_mut(player)?;
                let saved = seat.drive_count;
                seat.drive_count = limit.saturating_sub(1);
                let result = self.wait_for_next_action(player, PlayerObjective::ExtraDrive);
                self.seat_mut(player)?.drive_count = saved;
                result?;
            }
            AmuletAction::RedrawPathCards => {
                self.state.player_mut(player)?.discard_hand();
                let hand_size = self.config.hand_size_for(self.state.player_count());
                self.state.draw_path_cards(player, hand_size)?;
            }
        }

        if objective.is_driving() {
            self.wait_for_next_action(player, objective)?;
        }
        Ok(())
    }

    fn select_tile_to_remove(
        &mut self,
        position: TilePosition,
        color: TrailColor,
    ) -> Result<(), TurnError> {
        if !self.state.evaluate_treasure_trail(color).contains(&position) {
            return Err(IllegalAction::TileNotOnTrail { position, color }.into());
        }
        let card = PathCard::remove_tile(self.state.peek_card_id(), position);
        if !self.state.can_add_card_to_treasure_trail(color, &card) {
            return Err(IllegalAction::InadmissibleCard {
                card: card.id,
                color,
            }
            .into());
        }

        self.state.allocate_card_id();
        self.state
            .add_card_to_treasure_trail(color, card)
            .map_err(|card| IllegalAction::InadmissibleCard {
                card: card.id,
                color,
            })?;
        self.events.push(GameEvent::TileRemoved { position, color });
        Ok(())
    }

    fn draw_treasure_cards(&mut self, player: PlayerId) -> Result<(), TurnError> {
        let amount = self.seat(player)?.treasure_cards_to_draw;
        let cards: Vec<TreasureCard> = (0..amount)
            .map(|_| self.state.draw_treasure_card())
            .collect();
        self.seat_mut(player)?.drawn_treasure_cards = cards.clone();
        self.events
            .push(GameEvent::TreasureCardsDrawn { player, cards });

        self.wait_for_next_action(player, PlayerObjective::ConfirmTreasureCards)?;
        Ok(())
    }

    fn accept_treasure(&mut self, player: PlayerId, accept: bool) -> Result<(), TurnError> {
        let seat = self.seat_mut(player)?;
        seat.accepted_treasure = accept;
        let Some(card) = seat.offered_gold_card else {
            return Ok(());
        };

        if accept {
            self.state.player_mut(player)?.gold_cards.push(card);
            self.events
                .push(GameEvent::TreasureAccepted { player, card });
        } else {
            self.events
                .push(GameEvent::TreasureDeclined { player, card });
        }
        Ok(())
    }

    fn accept_curse(&mut self, player: PlayerId) -> Result<(), TurnError> {
        let current = self.state.player_mut(player)?;
        let amulet_used = current.remove_amulet();
        let lost = if amulet_used {
            None
        } else {
            current.remove_most_valuable_gold()
        };
        info!("Player {} is cursed (amulet used: {}, lost: {:?})", player, amulet_used, lost);
        self.events.push(GameEvent::Cursed {
            player,
            amulet_used,
            lost,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardType, FilterType};
    use crate::config::{AreaPolicy, GameConfig};
    use crate::grid::{HexGrid, TileType};
    use crate::state::GameState;
    use pretty_assertions::assert_eq;

    fn pos(q: i32) -> TilePosition {
        TilePosition::new(q, 0)
    }

    /// A strip of five tiles: two plains, two jungle, one beach. Both
    /// players start on the left end.
    fn setup() -> (GameController, Vec<PlayerHandle>) {
        let types = [
            TileType::Plains,
            TileType::Plains,
            TileType::Jungle,
            TileType::Jungle,
            TileType::Beach,
        ];
        let tiles = types.iter().enumerate().map(|(q, t)| (pos(q as i32), *t));
        let grid = HexGrid::new(tiles, Vec::new(), AreaPolicy::LowestPosition).unwrap();
        let config = GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        };
        let mut state = GameState::new(grid, &config);
        for name in ["Anne", "Mary"] {
            let id = state.add_player(name, false).unwrap();
            state.player_mut(id).unwrap().position = Some(pos(0));
        }
        GameController::new(state, config)
    }

    fn queue(handle: &PlayerHandle, actions: &[PlayerAction]) {
        for action in actions {
            handle.trigger_action(*action).unwrap();
        }
    }

    fn rejections(game: &mut GameController) -> Vec<IllegalAction> {
        game.take_events()
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::ActionRejected { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_snapshot_reflects_prompt() {
        let (mut game, handles) = setup();
        game.seat_mut(0).unwrap().objective = PlayerObjective::Drive;
        game.publish(0).unwrap();

        let snapshot = handles[0].snapshot();
        assert_eq!(snapshot.objective, PlayerObjective::Drive);
        assert!(snapshot.is_prompted());
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.drives_remaining, 3);
        assert_eq!(snapshot.drivable, [pos(1)].into());
        assert_eq!(snapshot.trail_candidates[&TrailColor::White].len(), 5);

        game.set_objective(0, PlayerObjective::Idle).unwrap();
        let idle = handles[0].snapshot();
        assert_eq!(idle.revision, 2);
        assert!(idle.drivable.is_empty());
    }

    #[test]
    fn test_disallowed_actions_are_discarded() {
        let (mut game, handles) = setup();
        queue(
            &handles[0],
            &[
                PlayerAction::Drive(pos(1)),
                PlayerAction::EndTurn,
                PlayerAction::StartDrive,
                PlayerAction::EndTurn,
            ],
        );

        let action = game
            .wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        assert_eq!(action, PlayerAction::StartDrive);
        assert_eq!(game.state().player(0).unwrap().position, Some(pos(0)));
        assert_eq!(
            rejections(&mut game),
            vec![
                IllegalAction::NotAllowed {
                    action: ActionKind::Drive,
                    objective: PlayerObjective::RegularTurn,
                },
                IllegalAction::NotAllowed {
                    action: ActionKind::EndTurn,
                    objective: PlayerObjective::RegularTurn,
                },
            ]
        );
    }

    #[test]
    fn test_drive_session_stops_at_limit() {
        let (mut game, handles) = setup();
        queue(
            &handles[0],
            &[
                PlayerAction::Drive(pos(4)),
                PlayerAction::Drive(pos(1)),
                PlayerAction::Drive(pos(2)),
                PlayerAction::Drive(pos(3)),
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::Drive).unwrap();

        assert_eq!(game.state().player(0).unwrap().position, Some(pos(3)));
        assert_eq!(game.seat(0).unwrap().drive_count, 3);
        assert_eq!(rejections(&mut game), vec![IllegalAction::NotDrivable(pos(4))]);
    }

    #[test]
    fn test_collect_amulet_keeps_driving() {
        let (mut game, handles) = setup();
        game.state.grid_mut().place_amulet(&pos(1));
        queue(
            &handles[0],
            &[
                PlayerAction::CollectAmulet,
                PlayerAction::Drive(pos(1)),
                PlayerAction::CollectAmulet,
                PlayerAction::EndTurn,
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::Drive).unwrap();

        assert_eq!(game.state().player(0).unwrap().amulets, 1);
        assert!(game.state().grid().amulet_positions().is_empty());
        assert_eq!(rejections(&mut game), vec![IllegalAction::NoAmuletHere]);
    }

    #[test]
    fn test_extra_drive_after_all_drives_used() {
        let (mut game, handles) = setup();
        game.state.player_mut(0).unwrap().add_amulets(1);
        game.seat_mut(0).unwrap().drive_count = 3;
        queue(
            &handles[0],
            &[
                PlayerAction::UseAmulet(AmuletAction::ExtraDrive),
                PlayerAction::Drive(pos(1)),
            ],
        );

        let action = game
            .wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        assert_eq!(action, PlayerAction::UseAmulet(AmuletAction::ExtraDrive));
        assert_eq!(game.state().player(0).unwrap().position, Some(pos(1)));
        assert_eq!(game.state().player(0).unwrap().amulets, 0);
        assert_eq!(game.seat(0).unwrap().drive_count, 3);
    }

    #[test]
    fn test_amulet_needed_for_amulet_actions() {
        let (mut game, handles) = setup();
        queue(
            &handles[0],
            &[
                PlayerAction::UseAmulet(AmuletAction::ExtraDrive),
                PlayerAction::StartDrive,
                PlayerAction::EndTurn,
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        assert_eq!(rejections(&mut game), vec![IllegalAction::NoAmulet]);
    }

    #[test]
    fn test_remove_tile_amulet() {
        let (mut game, handles) = setup();
        game.state.player_mut(0).unwrap().add_amulets(1);
        let plains = PathCard::clue(
            game.state.allocate_card_id(),
            1,
            CardType::InArea,
            FilterType::Terrain(TileType::Plains),
        )
        .unwrap();
        game.state
            .add_card_to_treasure_trail(TrailColor::Gray, plains)
            .unwrap();
        queue(
            &handles[0],
            &[
                PlayerAction::UseAmulet(AmuletAction::RemoveTile),
                PlayerAction::SelectTileToRemove {
                    position: pos(4),
                    color: TrailColor::Gray,
                },
                PlayerAction::SelectTileToRemove {
                    position: pos(1),
                    color: TrailColor::Gray,
                },
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        assert_eq!(
            game.state().evaluate_treasure_trail(TrailColor::Gray),
            &[pos(0)].into()
        );
        // Remove-tile cards carry no owner
        assert_eq!(game.state().trail(TrailColor::Gray).contributors(), vec![1]);
        let events = game.take_events();
        assert!(events.contains(&GameEvent::TileRemoved {
            position: pos(1),
            color: TrailColor::Gray,
        }));
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::ActionRejected {
                reason: IllegalAction::TileNotOnTrail { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_redraw_path_cards() {
        let (mut game, handles) = setup();
        game.state.player_mut(0).unwrap().add_amulets(1);
        game.state.draw_path_cards(0, 2).unwrap();
        let old: Vec<CardId> = game.state().player(0).unwrap().path_cards.keys().copied().collect();
        queue(
            &handles[0],
            &[PlayerAction::UseAmulet(AmuletAction::RedrawPathCards)],
        );

        game.wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        let anne = game.state().player(0).unwrap();
        assert_eq!(anne.hand_size(), 6);
        assert!(old.iter().all(|id| !anne.path_cards.contains_key(id)));
    }

    #[test]
    fn test_play_path_card_draws_replacement() {
        let (mut game, handles) = setup();
        let card = game.state.draw_path_card(0).unwrap();
        queue(
            &handles[0],
            &[
                PlayerAction::PlayPathCard {
                    card: CardId(99),
                    color: TrailColor::Brown,
                },
                PlayerAction::PlayPathCard {
                    card,
                    color: TrailColor::Brown,
                },
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::PlayPathCard)
            .unwrap();

        let anne = game.state().player(0).unwrap();
        assert_eq!(anne.hand_size(), 1);
        assert!(!anne.path_cards.contains_key(&card));
        assert_eq!(game.state().trail(TrailColor::Brown).cards().len(), 1);
        assert_eq!(rejections(&mut game), vec![IllegalAction::NoSuchCard(CardId(99))]);
    }

    #[test]
    fn test_only_the_occupant_collects_a_treasure() {
        let (mut game, handles) = setup();
        let clues = [
            (CardType::InArea, FilterType::Terrain(TileType::Jungle)),
            (CardType::NextTo, FilterType::Terrain(TileType::Beach)),
        ];
        for (card_type, filter) in clues {
            let card = PathCard::clue(game.state.allocate_card_id(), 1, card_type, filter).unwrap();
            game.state
                .add_card_to_treasure_trail(TrailColor::Gray, card)
                .unwrap();
        }
        assert_eq!(
            game.state().trail(TrailColor::Gray).treasure(game.state().grid()),
            Some(pos(3))
        );
        queue(
            &handles[0],
            &[
                PlayerAction::CollectTreasure(TrailColor::Gray),
                PlayerAction::CollectTreasure(TrailColor::Brown),
                PlayerAction::StartDrive,
                PlayerAction::EndTurn,
            ],
        );

        game.wait_for_next_action(0, PlayerObjective::RegularTurn)
            .unwrap();

        assert_eq!(
            rejections(&mut game),
            vec![
                IllegalAction::NotOnTreasure(TrailColor::Gray),
                IllegalAction::TrailNotResolved(TrailColor::Brown),
            ]
        );
        assert_eq!(game.state().trail(TrailColor::Gray).cards().len(), 2);
    }
}
