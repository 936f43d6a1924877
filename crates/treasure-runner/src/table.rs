//! One game table: island, bots, engine thread and the final summary.

use crate::settings::Settings;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use treasure_core::{
    Bot, GameController, GameError, GameEvent, GameState, MapLayout, PlayerColor, PlayerId,
    StopHandle, TilePosition,
};

/// Final standing of one player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub gold: u32,
    pub amulets: u32,
    pub position: Option<TilePosition>,
}

/// What the runner prints once the game is over
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub winner: Option<PlayerId>,
    pub rounds: u32,
    /// Whether the round limit cut the game short
    pub stopped: bool,
    pub treasures_collected: usize,
    pub actions_rejected: usize,
    pub players: Vec<PlayerSummary>,
}

impl Summary {
    fn from_game(game: &GameController, events: &[GameEvent], stopped: bool) -> Self {
        let state = game.state();
        let players = state
            .players()
            .iter()
            .map(|player| PlayerSummary {
                id: player.id,
                name: player.name.clone(),
                gold: player.total_gold(),
                amulets: player.amulets,
                position: player.position,
            })
            .collect();

        Self {
            winner: state.winner().or_else(|| state.leading_player()),
            rounds: game.round(),
            stopped,
            treasures_collected: events
                .iter()
                .filter(|event| matches!(event, GameEvent::TreasureCollected { .. }))
                .count(),
            actions_rejected: events
                .iter()
                .filter(|event| matches!(event, GameEvent::ActionRejected { .. }))
                .count(),
            players,
        }
    }
}

/// Play one game of bots to the end
pub async fn play(settings: Settings) -> anyhow::Result<Summary> {
    let config = settings.config.clone();
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let grid = MapLayout::generate(settings.map_radius, &mut rng)
        .build(config.area_policy, &mut rng)?;
    info!("Island has {} tiles and {} areas", grid.len(), grid.areas().len());

    let mut state = GameState::new(grid, &config);
    for index in 0..settings.players {
        let color = PlayerColor::for_player(index as PlayerId);
        state.add_player(format!("{:?} Bot", color), true)?;
    }
    let (mut game, handles) = GameController::new(state, config.clone());

    let delay = Duration::from_millis(config.bot_delay_ms);
    for handle in handles {
        let id = handle.id();
        let bot = match config.seed {
            Some(seed) => Bot::with_seed(id, delay, seed.wrapping_add(id as u64 + 1)),
            None => Bot::new(id, delay),
        };
        tokio::spawn(bot.run(handle));
    }

    let observers = game.observers();
    let limit = tokio::spawn(enforce_round_limit(
        observers.round,
        game.stop_handle(),
        settings.max_rounds,
    ));

    // The controller blocks on its action queues, so it gets its own thread.
    // Dropping it there closes every channel and lets the bots finish.
    let summary = tokio::task::spawn_blocking(move || {
        let result = game.start_game();
        let events = game.take_events();
        match result {
            Ok(winner) => {
                info!("Game over after {} rounds, player {} wins", game.round(), winner);
                Ok(Summary::from_game(&game, &events, false))
            }
            Err(GameError::Stopped) => {
                warn!("Game stopped after {} rounds", game.round());
                Ok(Summary::from_game(&game, &events, true))
            }
            Err(error) => Err(error),
        }
    })
    .await??;

    limit.await?;
    Ok(summary)
}

/// Stop the game once `max_rounds` rounds have been played
async fn enforce_round_limit(mut round: watch::Receiver<u32>, stop: StopHandle, max_rounds: u32) {
    while round.changed().await.is_ok() {
        let current = *round.borrow_and_update();
        debug!("Round {} of at most {}", current, max_rounds);
        if current > max_rounds {
            warn!("Round limit of {} reached, stopping the game", max_rounds);
            stop.stop();
            break;
        }
    }
}
