//! Round orchestrator.
//!
//! `GameController` owns the [`GameState`] and is its only writer. It runs
//! the setup, the round loop and the treasure distribution protocol, handing
//! control to exactly one player at a time through
//! [`GameController::with_active_player`].
//!
//! Observable values (round counter, active player, winner) are published
//! through `tokio::sync::watch` channels so collaborators on other threads
//! can follow the game without touching it.

use crate::actions::{GameEvent, PlayerAction};
use crate::cards::{GoldCard, TreasureCard};
use crate::config::GameConfig;
use crate::controller::{PlayerHandle, Seat};
use crate::error::GameError;
use crate::objective::PlayerObjective;
use crate::player::PlayerId;
use crate::state::GameState;
use crate::trail::TrailColor;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Read-only views on the game's progress
#[derive(Debug, Clone)]
pub struct GameObservers {
    pub round: watch::Receiver<u32>,
    pub active_player: watch::Receiver<Option<PlayerId>>,
    pub winner: watch::Receiver<Option<PlayerId>>,
}

/// Sets the global stop flag from any thread.
///
/// Once stopped, every following activation and every action submitted
/// through a [`PlayerHandle`] fails with [`GameError::Stopped`]. A wait that
/// is already blocking is not woken.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a game from setup to the winner
#[derive(Debug)]
pub struct GameController {
    pub(crate) state: GameState,
    pub(crate) config: GameConfig,
    pub(crate) seats: Vec<Seat>,
    pub(crate) events: Vec<GameEvent>,
    round_tx: watch::Sender<u32>,
    active_tx: watch::Sender<Option<PlayerId>>,
    winner_tx: watch::Sender<Option<PlayerId>>,
    stopped: Arc<AtomicBool>,
}

impl GameController {
    /// Create the controller and one handle per seated player
    pub fn new(state: GameState, config: GameConfig) -> (Self, Vec<PlayerHandle>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let (seats, handles): (Vec<Seat>, Vec<PlayerHandle>) = state
            .players()
            .iter()
            .map(|player| Seat::new(player.id, Arc::clone(&stopped)))
            .unzip();

        let controller = Self {
            state,
            config,
            seats,
            events: Vec::new(),
            round_tx: watch::channel(0).0,
            active_tx: watch::channel(None).0,
            winner_tx: watch::channel(None).0,
            stopped,
        };
        (controller, handles)
    }

    pub fn observers(&self) -> GameObservers {
        GameObservers {
            round: self.round_tx.subscribe(),
            active_player: self.active_tx.subscribe(),
            winner: self.winner_tx.subscribe(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stopped))
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn round(&self) -> u32 {
        *self.round_tx.borrow()
    }

    pub fn active_player(&self) -> Option<PlayerId> {
        *self.active_tx.borrow()
    }

    /// Events recorded since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run the whole game and return the winner.
    ///
    /// Blocks the calling thread while waiting for actions, so call it from a
    /// dedicated thread (or `spawn_blocking`) rather than an async task.
    pub fn start_game(&mut self) -> Result<PlayerId, GameError> {
        let count = self.state.player_count();
        if count < self.config.min_players {
            return Err(GameError::NotEnoughPlayers {
                count,
                min: self.config.min_players,
            });
        }
        if count > self.config.max_players {
            return Err(GameError::TooManyPlayers {
                count,
                max: self.config.max_players,
            });
        }
        self.state.lock_grid();

        let players: Vec<PlayerId> = self.state.players().iter().map(|p| p.id).collect();
        let hand_size = self.config.hand_size_for(count);
        for &player in &players {
            self.state.top_up_hand(player, hand_size)?;
            self.with_active_player(player, |game| {
                game.wait_for_next_action(player, PlayerObjective::SelectPosition)
                    .map(|_| ())
            })?;
        }

        while !self.state.deck().is_empty() {
            let round = self.round() + 1;
            self.round_tx.send_replace(round);
            info!("Round {} starts, {} treasure cards left", round, self.state.deck().len());
            self.events.push(GameEvent::RoundStarted { round });

            for &player in &players {
                self.seat_mut(player)?.reset_round();
                self.with_active_player(player, |game| loop {
                    let action = game.wait_for_next_action(player, PlayerObjective::RegularTurn)?;
                    // Amulet uses do not end the turn
                    if !matches!(action, PlayerAction::UseAmulet(_)) {
                        return Ok(());
                    }
                })?;
            }
        }

        let winner = self
            .state
            .leading_player()
            .ok_or(GameError::NotEnoughPlayers {
                count,
                min: self.config.min_players,
            })?;
        let gold = self.state.player(winner)?.total_gold();
        self.state.set_winner(winner);
        self.winner_tx.send_replace(Some(winner));
        self.events.push(GameEvent::GameWon {
            player: winner,
            gold,
        });
        info!("Player {} wins with {} gold", winner, gold);
        Ok(winner)
    }

    /// Make `player` the active player while `f` runs.
    ///
    /// Afterwards the player is idled and the previously active player (if
    /// any) becomes active again, so nested activations still leave exactly
    /// one active player.
    pub fn with_active_player<T, F>(&mut self, player: PlayerId, f: F) -> Result<T, GameError>
    where
        F: FnOnce(&mut Self) -> Result<T, GameError>,
    {
        if self.is_stopped() {
            return Err(GameError::Stopped);
        }
        self.seat(player)?;

        let previous = self.active_tx.send_replace(Some(player));
        let result = f(self);
        let idled = self.set_objective(player, PlayerObjective::Idle);
        self.active_tx.send_replace(previous);
        let value = result?;
        idled?;
        Ok(value)
    }

    // ==================== Treasure Protocol ====================

    /// Distribute the treasure of a resolved trail, then reset the trail and
    /// let the statues spawn new amulets.
    pub(crate) fn collect_treasure(&mut self, color: TrailColor) -> Result<(), GameError> {
        let contributors = self.state.trail(color).contributors();
        let pool = self.draw_and_shuffle(&contributors)?;
        let collector = self.distribute(&contributors, pool)?;
        self.state.clear_treasure_trail(color);

        let seeder = match collector {
            Some(player) => Some(player),
            None => contributors.choose(self.state.rng()).copied(),
        };
        if let Some(seeder) = seeder {
            if self.state.valid_path_cards(seeder)?.is_empty() {
                debug!("Player {} has no card to start a new trail", seeder);
            } else {
                self.with_active_player(seeder, |game| {
                    game.wait_for_next_action(seeder, PlayerObjective::PlayPathCard)
                        .map(|_| ())
                })?;
            }
        }

        let positions = self.state.grid_mut().spawn_amulets();
        self.events.push(GameEvent::AmuletsSpawned { positions });
        Ok(())
    }

    /// Every contributor draws one card per card they placed. The drawn cards
    /// and one extra card from the deck form the shuffled pool.
    fn draw_and_shuffle(&mut self, contributors: &[PlayerId]) -> Result<Vec<TreasureCard>, GameError> {
        let mut allotments: Vec<(PlayerId, usize)> = Vec::new();
        for &player in contributors {
            match allotments.iter_mut().find(|(p, _)| *p == player) {
                Some((_, count)) => *count += 1,
                None => allotments.push((player, 1)),
            }
        }

        let mut pool = Vec::new();
        for (player, count) in allotments {
            self.seat_mut(player)?.treasure_cards_to_draw = count;
            self.with_active_player(player, |game| {
                game.wait_for_next_action(player, PlayerObjective::DrawTreasureCards)
                    .map(|_| ())
            })?;
            let seat = self.seat_mut(player)?;
            seat.treasure_cards_to_draw = 0;
            pool.append(&mut seat.drawn_treasure_cards);
        }

        pool.push(self.state.draw_treasure_card());
        pool.shuffle(self.state.rng());
        Ok(pool)
    }

    /// Hand out the pool along the windroses (contributors in reverse order).
    /// Returns the last player who accepted a gold card.
    fn distribute(
        &mut self,
        contributors: &[PlayerId],
        mut pool: Vec<TreasureCard>,
    ) -> Result<Option<PlayerId>, GameError> {
        let mut windroses: Vec<PlayerId> = contributors.iter().rev().copied().collect();
        let mut collector = None;

        while !windroses.is_empty() {
            let Some(card) = pool.pop() else {
                break;
            };
            match card {
                TreasureCard::Curse => {
                    self.curse(&windroses)?;
                    break;
                }
                TreasureCard::Gold(gold) => {
                    if let Some(player) = self.offer_treasure(gold, &mut windroses)? {
                        collector = Some(player);
                    }
                }
            }
        }
        Ok(collector)
    }

    /// Offer a gold card along the windroses. A player holding several
    /// windroses is asked once per windrose; the first acceptance takes the
    /// card and gives up that windrose.
    fn offer_treasure(
        &mut self,
        card: GoldCard,
        windroses: &mut Vec<PlayerId>,
    ) -> Result<Option<PlayerId>, GameError> {
        for index in 0..windroses.len() {
            let player = windroses[index];
            let seat = self.seat_mut(player)?;
            seat.offered_gold_card = Some(card);
            seat.accepted_treasure = false;
            self.with_active_player(player, |game| {
                game.wait_for_next_action(player, PlayerObjective::AcceptTreasure)
                    .map(|_| ())
            })?;

            let seat = self.seat_mut(player)?;
            seat.offered_gold_card = None;
            if seat.accepted_treasure {
                windroses.remove(index);
                return Ok(Some(player));
            }
        }
        Ok(None)
    }

    /// Every distinct remaining windrose owner takes the curse
    fn curse(&mut self, windroses: &[PlayerId]) -> Result<(), GameError> {
        let mut cursed: Vec<PlayerId> = Vec::new();
        for &player in windroses {
            if cursed.contains(&player) {
                continue;
            }
            cursed.push(player);
            self.with_active_player(player, |game| {
                game.wait_for_next_action(player, PlayerObjective::AcceptCurse)
                    .map(|_| ())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardType, FilterType, PathCard, TreasureDeck};
    use crate::config::AreaPolicy;
    use crate::error::IllegalAction;
    use crate::grid::{HexGrid, Structure, TileType};
    use crate::hex::{EdgeDirection, TilePosition};
    use pretty_assertions::assert_eq;

    fn pos(q: i32, r: i32) -> TilePosition {
        TilePosition::new(q, r)
    }

    /// Plains at (0, 0) next to jungle at (1, 0)
    fn setup(deck: Vec<TreasureCard>, structures: Vec<Structure>) -> (GameController, Vec<PlayerHandle>) {
        let tiles = [(pos(0, 0), TileType::Plains), (pos(1, 0), TileType::Jungle)];
        let grid = HexGrid::new(tiles, structures, AreaPolicy::LowestPosition).unwrap();
        let config = GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        };
        let mut state = GameState::new(grid, &config)
            .with_deck(TreasureDeck::from_cards(deck, config.max_gold_card_value));
        state.add_player("Anne", false).unwrap();
        state.add_player("Mary", false).unwrap();
        GameController::new(state, config)
    }

    fn plains_card(id: u32, owner: PlayerId) -> PathCard {
        PathCard::clue(CardId(id), owner, CardType::InArea, FilterType::Terrain(TileType::Plains))
            .unwrap()
    }

    fn queue(handle: &PlayerHandle, actions: &[PlayerAction]) {
        for action in actions {
            handle.trigger_action(*action).unwrap();
        }
    }

    #[test]
    fn test_scripted_game_until_deck_runs_out() {
        let (mut game, handles) = setup(vec![TreasureCard::Gold(GoldCard::new(4))], Vec::new());
        game.state.player_mut(0).unwrap().add_card(plains_card(1000, 0));

        // Player 0 is dealt first and tops up to six cards (ids 0-4), so card 0 is theirs
        queue(
            &handles[0],
            &[
                PlayerAction::SelectPosition(pos(0, 0)),
                PlayerAction::PlayPathCard {
                    card: CardId(1000),
                    color: TrailColor::Gray,
                },
                PlayerAction::DrawTreasureCards,
                PlayerAction::ConfirmTreasureCards,
                PlayerAction::AcceptTreasure(true),
                PlayerAction::PlayPathCard {
                    card: CardId(0),
                    color: TrailColor::Gray,
                },
            ],
        );
        queue(
            &handles[1],
            &[
                PlayerAction::SelectPosition(pos(1, 0)),
                PlayerAction::Drive(pos(0, 0)),
                PlayerAction::StartDrive,
                PlayerAction::Drive(pos(0, 0)),
                PlayerAction::CollectTreasure(TrailColor::Gray),
            ],
        );

        assert_eq!(game.start_game(), Ok(0));
        assert_eq!(game.round(), 1);
        assert_eq!(game.active_player(), None);
        assert_eq!(game.state().winner(), Some(0));
        assert!(game.state().deck().is_empty());

        let anne = game.state().player(0).unwrap();
        assert_eq!(anne.gold_cards.len(), 1);
        assert!(anne.total_gold() > 0);
        assert_eq!(game.state().player(1).unwrap().position, Some(pos(0, 0)));

        // The new trail holds only the seeding card
        let gray = game.state().trail(TrailColor::Gray);
        assert_eq!(gray.cards().len(), 1);
        assert_eq!(gray.cards()[0].id, CardId(0));

        let events = game.take_events();
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::ActionRejected {
                player: 1,
                reason: IllegalAction::NotAllowed { .. },
                ..
            }
        )));
        assert!(events.contains(&GameEvent::TreasureCollected {
            player: 1,
            color: TrailColor::Gray,
            position: pos(0, 0),
        }));
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameWon { player: 0, .. })
        ));
    }

    #[test]
    fn test_start_game_checks_player_count() {
        let tiles = [(pos(0, 0), TileType::Plains)];
        let grid = HexGrid::new(tiles, Vec::new(), AreaPolicy::LowestPosition).unwrap();
        let config = GameConfig::default();
        let mut state = GameState::new(grid, &config);
        state.add_player("Solo", false).unwrap();
        let (mut game, _handles) = GameController::new(state, config);

        assert_eq!(
            game.start_game(),
            Err(GameError::NotEnoughPlayers { count: 1, min: 2 })
        );
    }

    #[test]
    fn test_stopped_game_refuses_activation() {
        let (mut game, _handles) = setup(vec![TreasureCard::Gold(GoldCard::new(1))], Vec::new());
        let stop = game.stop_handle();
        stop.stop();
        assert!(stop.is_stopped());
        assert_eq!(game.start_game(), Err(GameError::Stopped));
        assert_eq!(game.active_player(), None);
    }

    #[test]
    fn test_actions_after_stop_are_refused() {
        let (mut game, handles) = setup(vec![TreasureCard::Gold(GoldCard::new(1))], Vec::new());
        queue(&handles[1], &[PlayerAction::AcceptCurse]);
        game.stop_handle().stop();

        assert_eq!(game.start_game(), Err(GameError::Stopped));
        assert_eq!(
            handles[0].trigger_action(PlayerAction::AcceptCurse),
            Err(GameError::Stopped)
        );
        assert_eq!(
            handles[1].trigger_action(PlayerAction::SelectPosition(TilePosition::new(0, 0))),
            Err(GameError::Stopped)
        );
    }

    #[test]
    fn test_players_are_dealt_when_seated() {
        let (mut game, mut handles) = setup(vec![TreasureCard::Gold(GoldCard::new(1))], Vec::new());
        drop(handles.remove(0));

        // Player 0 never picks a tile, so player 1 is never dealt
        assert_eq!(game.start_game(), Err(GameError::Disconnected(0)));
        let hand_size = game.config().hand_size_for(2);
        assert_eq!(game.state().player(0).unwrap().hand_size(), hand_size);
        assert_eq!(game.state().player(1).unwrap().hand_size(), 0);
        assert_eq!(handles[0].snapshot().objective, PlayerObjective::Idle);
    }

    #[test]
    fn test_dropped_handles_disconnect() {
        let (mut game, handles) = setup(vec![TreasureCard::Gold(GoldCard::new(1))], Vec::new());
        drop(handles);
        assert_eq!(game.start_game(), Err(GameError::Disconnected(0)));
    }

    #[test]
    fn test_handles_leaving_after_stop_is_not_a_disconnect() {
        let (mut game, handles) = setup(vec![TreasureCard::Gold(GoldCard::new(1))], Vec::new());
        game.stop_handle().stop();
        drop(handles);
        assert_eq!(
            game.wait_for_next_action(0, PlayerObjective::AcceptCurse),
            Err(GameError::Stopped)
        );
    }

    #[test]
    fn test_nested_activation_restores_previous_player() {
        let (mut game, _handles) = setup(Vec::new(), Vec::new());
        let mut observers = game.observers();

        let inner = game
            .with_active_player(0, |game| {
                let outer = game.active_player();
                let inner = game.with_active_player(1, |game| Ok(game.active_player()))?;
                assert_eq!(game.active_player(), outer);
                Ok(inner)
            })
            .unwrap();

        assert_eq!(inner, Some(1));
        assert_eq!(game.active_player(), None);
        assert_eq!(*observers.active_player.borrow_and_update(), None);
        assert_eq!(game.objective(0), Ok(PlayerObjective::Idle));
        assert_eq!(game.objective(1), Ok(PlayerObjective::Idle));
    }

    #[test]
    fn test_offer_goes_to_first_accepting_windrose() {
        let (mut game, handles) = setup(Vec::new(), Vec::new());
        queue(&handles[1], &[PlayerAction::AcceptTreasure(false)]);
        queue(&handles[0], &[PlayerAction::AcceptTreasure(true)]);
        queue(&handles[1], &[PlayerAction::AcceptTreasure(true)]);

        // Windroses are [1, 0]; the 5 is popped first
        let pool = vec![
            TreasureCard::Gold(GoldCard::new(1)),
            TreasureCard::Gold(GoldCard::new(5)),
        ];
        let collector = game.distribute(&[0, 1], pool).unwrap();

        assert_eq!(collector, Some(1));
        assert_eq!(game.state().player(0).unwrap().total_gold(), 5);
        assert_eq!(game.state().player(1).unwrap().total_gold(), 1);
        assert!(game.take_events().contains(&GameEvent::TreasureDeclined {
            player: 1,
            card: GoldCard::new(5),
        }));
    }

    #[test]
    fn test_player_with_two_windroses_is_asked_twice() {
        let (mut game, handles) = setup(Vec::new(), Vec::new());
        queue(
            &handles[0],
            &[PlayerAction::AcceptTreasure(false), PlayerAction::AcceptTreasure(true)],
        );
        queue(&handles[1], &[PlayerAction::AcceptTreasure(false)]);

        let pool = vec![TreasureCard::Gold(GoldCard::new(4))];
        let collector = game.distribute(&[0, 1, 0], pool).unwrap();

        assert_eq!(collector, Some(0));
        assert_eq!(game.state().player(0).unwrap().total_gold(), 4);
        assert_eq!(game.state().player(1).unwrap().total_gold(), 0);
        let declined = game
            .take_events()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::TreasureDeclined { .. }))
            .count();
        assert_eq!(declined, 2);
    }

    #[test]
    fn test_curse_hits_every_windrose_owner_once() {
        let (mut game, handles) = setup(Vec::new(), Vec::new());
        game.state.player_mut(0).unwrap().add_amulets(1);
        game.state
            .player_mut(1)
            .unwrap()
            .gold_cards
            .extend([GoldCard::new(2), GoldCard::new(5)]);
        queue(&handles[0], &[PlayerAction::AcceptCurse]);
        queue(&handles[1], &[PlayerAction::AcceptCurse]);

        let pool = vec![TreasureCard::Gold(GoldCard::new(3)), TreasureCard::Curse];
        let collector = game.distribute(&[0, 1, 0], pool).unwrap();

        assert_eq!(collector, None);
        let anne = game.state().player(0).unwrap();
        assert_eq!(anne.amulets, 0);
        assert_eq!(anne.total_gold(), 0);
        assert_eq!(game.state().player(1).unwrap().total_gold(), 2);

        let curses: Vec<GameEvent> = game
            .take_events()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::Cursed { .. }))
            .collect();
        assert_eq!(
            curses,
            vec![
                GameEvent::Cursed {
                    player: 0,
                    amulet_used: true,
                    lost: None,
                },
                GameEvent::Cursed {
                    player: 1,
                    amulet_used: false,
                    lost: Some(GoldCard::new(5)),
                },
            ]
        );
    }

    #[test]
    fn test_collecting_spawns_amulets() {
        let statue = Structure::statue(pos(0, 0), EdgeDirection::East);
        let (mut game, handles) = setup(Vec::new(), vec![statue]);
        game.state
            .add_card_to_treasure_trail(TrailColor::Black, plains_card(1000, 1))
            .unwrap();
        // Empty deck: the pool holds two synthetic gold cards
        queue(
            &handles[1],
            &[
                PlayerAction::DrawTreasureCards,
                PlayerAction::ConfirmTreasureCards,
                PlayerAction::AcceptTreasure(false),
            ],
        );
        // Nobody accepted, so the only contributor seeds the new trail
        game.state.player_mut(1).unwrap().add_card(plains_card(1001, 1));
        queue(
            &handles[1],
            &[
                PlayerAction::AcceptTreasure(false),
                PlayerAction::PlayPathCard {
                    card: CardId(1001),
                    color: TrailColor::Black,
                },
            ],
        );

        game.collect_treasure(TrailColor::Black).unwrap();

        assert_eq!(game.state().grid().amulet_positions(), [pos(1, 0)].into());
        let facing = game.state().grid().structure(&pos(0, 0)).unwrap().facing();
        assert_eq!(facing, Some(EdgeDirection::NorthEast));
        assert_eq!(game.state().trail(TrailColor::Black).cards().len(), 1);
        assert_eq!(game.state().player(1).unwrap().total_gold(), 0);
    }
}
